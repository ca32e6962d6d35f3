// /////////////////////////////////////////////////////////////////////////////
// Layered Configuration Resolver
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Cache Backend Port
//!
//! Pluggable storage behind the cache manager. Backends own TTL semantics on
//! the read path: an expired entry is treated as absent and lazily deleted
//! by the backend that encounters it, so no background sweeper exists
//! anywhere in the system. Mutating operations are serialized per backend;
//! concurrent reads are a backend-local decision.
//!
//! Backend failures are data-plane failures: a backend that cannot read or
//! write reports a miss or drops the write, logs, and moves on. The port is
//! async because the persistent backend does disk I/O.

use async_trait::async_trait;

use crate::entities::cache_entry::{CacheEntry, CacheStats};
use crate::value_objects::fingerprint::CacheKey;

/// Key-value storage for cached source loads.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Short stable backend name for logs and stats.
    fn name(&self) -> &'static str;

    /// Fetches a live entry. Expired entries behave as absent and are
    /// lazily deleted.
    async fn get(&self, key: &CacheKey) -> Option<CacheEntry>;

    /// Stores an entry, evicting per backend policy.
    async fn set(&self, entry: CacheEntry);

    /// Deletes an entry. Returns whether one existed.
    async fn delete(&self, key: &CacheKey) -> bool;

    /// Drops every entry.
    async fn clear(&self);

    /// True when a live entry exists for `key`.
    async fn contains(&self, key: &CacheKey) -> bool {
        self.get(key).await.is_some()
    }

    /// Backend counters.
    fn stats(&self) -> CacheStats;
}
