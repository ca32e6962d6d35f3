// /////////////////////////////////////////////////////////////////////////////
// Layered Configuration Resolver
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Cache Entries and Statistics
//!
//! The entry record every cache backend stores, plus the counters the cache
//! manager aggregates. TTL is evaluated lazily on read: an expired entry
//! behaves as absent and is deleted by the backend that finds it. A zero or
//! negative TTL means "never expires", so `Option<Duration>` with `None`
//! covers the non-expiring case and constructors normalize zero to `None`.

use std::collections::BTreeSet;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::config_value::ConfigValue;
use crate::value_objects::fingerprint::CacheKey;

/// A single cached load result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Derived cache key (see [`CacheKey`]).
    pub key: CacheKey,
    /// The cached mapping.
    pub value: ConfigValue,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Time-to-live; `None` never expires.
    pub ttl: Option<Duration>,
    /// Number of cache hits served from this entry.
    pub access_count: u64,
    /// Timestamp of the last hit.
    pub last_access: DateTime<Utc>,
    /// Rough byte size of the stored value.
    pub size_bytes: usize,
    /// Tags for bulk invalidation.
    pub tags: BTreeSet<String>,
}

impl CacheEntry {
    /// Creates an entry for a value, normalizing zero TTL to "never".
    pub fn new(key: CacheKey, value: ConfigValue, ttl: Option<Duration>) -> Self {
        let now = Utc::now();
        let size_bytes = value.size_estimate();
        Self {
            key,
            value,
            created_at: now,
            ttl: ttl.filter(|ttl| !ttl.is_zero()),
            access_count: 0,
            last_access: now,
            size_bytes,
            tags: BTreeSet::new(),
        }
    }

    /// Adds invalidation tags.
    pub fn with_tags(mut self, tags: impl IntoIterator<Item = String>) -> Self {
        self.tags.extend(tags);
        self
    }

    /// True when the entry has outlived its TTL at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.ttl {
            Some(ttl) => match chrono::Duration::from_std(ttl) {
                Ok(ttl) => now - self.created_at >= ttl,
                Err(_) => false,
            },
            None => false,
        }
    }

    /// True when the entry has outlived its TTL.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Records a hit.
    pub fn touch(&mut self) {
        self.access_count += 1;
        self.last_access = Utc::now();
    }
}

/// Counters exposed by a cache backend or the cache manager.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
    pub entries: u64,
    pub approximate_bytes: u64,
}

impl CacheStats {
    /// Hit ratio in `[0, 1]`; zero when the cache was never consulted.
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_objects::fingerprint::Fingerprint;
    use crate::value_objects::source_kind::SourceKind;

    fn key() -> CacheKey {
        CacheKey::derive(SourceKind::Json, "/tmp/a.json", &Fingerprint::Mtime("1.0".into()))
    }

    #[test]
    fn test_zero_ttl_never_expires() {
        let entry = CacheEntry::new(key(), ConfigValue::empty_mapping(), Some(Duration::ZERO));
        assert!(entry.ttl.is_none());
        assert!(!entry.is_expired_at(Utc::now() + chrono::Duration::days(365)));
    }

    #[test]
    fn test_ttl_expiry_is_lazy_time_comparison() {
        let entry = CacheEntry::new(key(), ConfigValue::empty_mapping(), Some(Duration::from_secs(60)));
        assert!(!entry.is_expired());
        assert!(entry.is_expired_at(Utc::now() + chrono::Duration::seconds(61)));
    }

    #[test]
    fn test_touch_counts_hits() {
        let mut entry = CacheEntry::new(key(), ConfigValue::empty_mapping(), None);
        entry.touch();
        entry.touch();
        assert_eq!(entry.access_count, 2);
    }

    #[test]
    fn test_hit_ratio() {
        let stats = CacheStats {
            hits: 3,
            misses: 1,
            ..CacheStats::default()
        };
        assert!((stats.hit_ratio() - 0.75).abs() < f64::EPSILON);
        assert_eq!(CacheStats::default().hit_ratio(), 0.0);
    }
}
