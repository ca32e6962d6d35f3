// /////////////////////////////////////////////////////////////////////////////
// Layered Configuration Resolver
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # In-Memory Cache Backend
//!
//! Bounded LRU storage with per-entry TTL. Get, set, and delete are O(1);
//! a get promotes the entry to most-recently-used. Expired entries are
//! discovered on read, counted, and dropped. Eviction counts only capacity
//! evictions, not same-key replacement.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use layered_config_domain::{CacheBackend, CacheEntry, CacheKey, CacheStats};
use lru::LruCache;
use parking_lot::Mutex;
use tracing::trace;

/// LRU-bounded in-memory cache.
pub struct MemoryCacheBackend {
    entries: Mutex<LruCache<CacheKey, CacheEntry>>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    expirations: AtomicU64,
}

impl MemoryCacheBackend {
    /// Creates a backend bounded at `max_entries` (clamped to at least 1).
    pub fn new(max_entries: usize) -> Self {
        let capacity = NonZeroUsize::new(max_entries.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            expirations: AtomicU64::new(0),
        }
    }
}

#[async_trait]
impl CacheBackend for MemoryCacheBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &CacheKey) -> Option<CacheEntry> {
        let mut entries = self.entries.lock();
        match entries.get_mut(key) {
            Some(entry) if entry.is_expired() => {
                entries.pop(key);
                self.expirations.fetch_add(1, Ordering::Relaxed);
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            Some(entry) => {
                entry.touch();
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry.clone())
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    async fn set(&self, entry: CacheEntry) {
        let key = entry.key.clone();
        let mut entries = self.entries.lock();
        if let Some((evicted_key, _)) = entries.push(key.clone(), entry) {
            if evicted_key != key {
                self.evictions.fetch_add(1, Ordering::Relaxed);
                trace!(key = %evicted_key, "evicted least-recently-used entry");
            }
        }
    }

    async fn delete(&self, key: &CacheKey) -> bool {
        self.entries.lock().pop(key).is_some()
    }

    async fn clear(&self) {
        self.entries.lock().clear();
    }

    fn stats(&self) -> CacheStats {
        let entries = self.entries.lock();
        let approximate_bytes: u64 = entries.iter().map(|(_, entry)| entry.size_bytes as u64).sum();
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
            entries: entries.len() as u64,
            approximate_bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use layered_config_domain::{ConfigValue, Fingerprint, SourceKind};
    use std::time::Duration;

    fn key(origin: &str) -> CacheKey {
        CacheKey::derive(SourceKind::Json, origin, &Fingerprint::Mtime("1.0".into()))
    }

    fn entry(origin: &str, ttl: Option<Duration>) -> CacheEntry {
        CacheEntry::new(key(origin), ConfigValue::from(origin), ttl)
    }

    #[tokio::test]
    async fn test_get_set_roundtrip() {
        let backend = MemoryCacheBackend::new(8);
        backend.set(entry("a", None)).await;
        let found = backend.get(&key("a")).await.unwrap();
        assert_eq!(found.value, ConfigValue::from("a"));
        assert_eq!(found.access_count, 1);
        assert!(backend.get(&key("b")).await.is_none());
        let stats = backend.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[tokio::test]
    async fn test_capacity_one_evicts_on_second_key() {
        let backend = MemoryCacheBackend::new(1);
        backend.set(entry("a", None)).await;
        backend.set(entry("b", None)).await;
        assert!(backend.get(&key("a")).await.is_none());
        assert!(backend.get(&key("b")).await.is_some());
        assert_eq!(backend.stats().evictions, 1);
    }

    #[tokio::test]
    async fn test_replacement_is_not_an_eviction() {
        let backend = MemoryCacheBackend::new(2);
        backend.set(entry("a", None)).await;
        backend.set(entry("a", None)).await;
        assert_eq!(backend.stats().evictions, 0);
        assert_eq!(backend.stats().entries, 1);
    }

    #[tokio::test]
    async fn test_expired_entry_behaves_as_absent() {
        let backend = MemoryCacheBackend::new(4);
        let mut stale = entry("a", Some(Duration::from_secs(60)));
        stale.created_at = chrono::Utc::now() - chrono::Duration::seconds(120);
        backend.set(stale).await;
        assert!(backend.get(&key("a")).await.is_none());
        let stats = backend.stats();
        assert_eq!(stats.expirations, 1);
        assert_eq!(stats.entries, 0);
    }

    #[tokio::test]
    async fn test_lru_promotion_on_get() {
        let backend = MemoryCacheBackend::new(2);
        backend.set(entry("a", None)).await;
        backend.set(entry("b", None)).await;
        // Touch `a` so `b` is the least recently used.
        let _ = backend.get(&key("a")).await;
        backend.set(entry("c", None)).await;
        assert!(backend.get(&key("a")).await.is_some());
        assert!(backend.get(&key("b")).await.is_none());
    }

    #[tokio::test]
    async fn test_clear_and_delete() {
        let backend = MemoryCacheBackend::new(4);
        backend.set(entry("a", None)).await;
        assert!(backend.delete(&key("a")).await);
        assert!(!backend.delete(&key("a")).await);
        backend.set(entry("b", None)).await;
        backend.clear().await;
        assert_eq!(backend.stats().entries, 0);
    }
}
