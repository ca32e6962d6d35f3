// /////////////////////////////////////////////////////////////////////////////
// Layered Configuration Resolver
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Cache Manager
//!
//! Wraps a backend with the concerns shared by all of them: a secondary
//! tag index for bulk invalidation, manager-level hit/miss counters, and an
//! enable/disable switch. Disabled means null-backend semantics - every
//! read misses, every write is dropped - while the counters keep running so
//! operators can see traffic against a disabled cache.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use layered_config_domain::{CacheBackend, CacheEntry, CacheKey, CacheStats, ConfigValue};
use parking_lot::Mutex;
use tracing::debug;

/// Thread-safe cache front-end used by the composer.
pub struct CacheManager {
    backend: Arc<dyn CacheBackend>,
    tags: Mutex<HashMap<String, HashSet<CacheKey>>>,
    enabled: AtomicBool,
    hits: AtomicU64,
    misses: AtomicU64,
    default_ttl: Option<Duration>,
}

impl CacheManager {
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self {
            backend,
            tags: Mutex::new(HashMap::new()),
            enabled: AtomicBool::new(true),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            default_ttl: None,
        }
    }

    /// Applies a default TTL to entries stored without an explicit one.
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = (!ttl.is_zero()).then_some(ttl);
        self
    }

    /// Switches caching on or off. Disabling does not drop stored entries
    /// or counters; reads simply miss until re-enabled.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// The wrapped backend's name.
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Looks up a cached value.
    pub async fn get(&self, key: &CacheKey) -> Option<ConfigValue> {
        if !self.is_enabled() {
            self.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        }
        match self.backend.get(key).await {
            Some(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry.value)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Stores a value under `key`, optionally tagged for bulk
    /// invalidation.
    pub async fn set(&self, key: CacheKey, value: ConfigValue, ttl: Option<Duration>, tags: Vec<String>) {
        if !self.is_enabled() {
            return;
        }
        let ttl = ttl.or(self.default_ttl);
        let entry = CacheEntry::new(key.clone(), value, ttl).with_tags(tags.iter().cloned());
        self.backend.set(entry).await;
        if !tags.is_empty() {
            let mut index = self.tags.lock();
            for tag in tags {
                index.entry(tag).or_default().insert(key.clone());
            }
        }
    }

    /// Deletes one entry.
    pub async fn delete(&self, key: &CacheKey) -> bool {
        self.backend.delete(key).await
    }

    /// Deletes every entry carrying `tag`. Returns how many entries were
    /// removed.
    pub async fn invalidate_tag(&self, tag: &str) -> usize {
        let keys: Vec<CacheKey> = {
            let mut index = self.tags.lock();
            index.remove(tag).map(|set| set.into_iter().collect()).unwrap_or_default()
        };
        let mut removed = 0usize;
        for key in &keys {
            if self.backend.delete(key).await {
                removed += 1;
            }
        }
        if removed > 0 {
            debug!(tag, removed, "invalidated tagged cache entries");
        }
        removed
    }

    /// Drops every entry and the whole tag index.
    pub async fn clear(&self) {
        self.backend.clear().await;
        self.tags.lock().clear();
    }

    /// Manager-level counters over backend storage numbers. Hits and
    /// misses are the manager's own (they keep counting while disabled);
    /// evictions, expirations, and sizes come from the backend.
    pub fn stats(&self) -> CacheStats {
        let backend = self.backend.stats();
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: backend.evictions,
            expirations: backend.expirations,
            entries: backend.entries,
            approximate_bytes: backend.approximate_bytes,
        }
    }
}
