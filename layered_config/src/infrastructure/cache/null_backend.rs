// /////////////////////////////////////////////////////////////////////////////
// Layered Configuration Resolver
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Null Cache Backend
//!
//! Stores nothing and misses on every key. Used directly when caching is
//! unwanted, and as the semantic model for the cache manager's disabled
//! state.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use layered_config_domain::{CacheBackend, CacheEntry, CacheKey, CacheStats};

/// A cache that never holds anything.
#[derive(Debug, Default)]
pub struct NullCacheBackend {
    misses: AtomicU64,
}

impl NullCacheBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheBackend for NullCacheBackend {
    fn name(&self) -> &'static str {
        "null"
    }

    async fn get(&self, _key: &CacheKey) -> Option<CacheEntry> {
        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    async fn set(&self, _entry: CacheEntry) {}

    async fn delete(&self, _key: &CacheKey) -> bool {
        false
    }

    async fn clear(&self) {}

    fn stats(&self) -> CacheStats {
        CacheStats {
            misses: self.misses.load(Ordering::Relaxed),
            ..CacheStats::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use layered_config_domain::{ConfigValue, Fingerprint, SourceKind};

    #[tokio::test]
    async fn test_everything_misses() {
        let backend = NullCacheBackend::new();
        let key = CacheKey::derive(SourceKind::Json, "x", &Fingerprint::Unavailable);
        backend
            .set(CacheEntry::new(key.clone(), ConfigValue::empty_mapping(), None))
            .await;
        assert!(backend.get(&key).await.is_none());
        assert!(!backend.delete(&key).await);
        assert_eq!(backend.stats().misses, 1);
        assert_eq!(backend.stats().entries, 0);
    }
}
