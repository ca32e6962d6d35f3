// /////////////////////////////////////////////////////////////////////////////
// Layered Configuration Resolver
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Source Protocol
//!
//! The uniform contract every configuration origin implements. The protocol
//! is deliberately *total*: the composition engine must survive any single
//! faulty source and keep applying lower-precedence data, so no method on
//! this trait returns an error to the caller.
//!
//! - `is_available` is a cheap predicate: "would a load have a realistic
//!   chance of producing data". Unexpected conditions report as
//!   not-available, never as a panic or error.
//! - `load` produces a mapping, possibly empty. Parse, I/O, and decode
//!   failures are logged, recorded on the source's metadata, and collapse
//!   to an empty mapping.
//! - `fingerprint` yields the stable identifier cache keys are derived
//!   from: `(path, mtime)` for file sources, a content hash of the loaded
//!   mapping for dynamic ones. Best-effort; a source that cannot be
//!   fingerprinted returns [`Fingerprint::Unavailable`] and simply never
//!   hits the cache.
//!
//! ## Architecture Note - Infrastructure Port
//!
//! This trait is **async** and represents an infrastructure port, not a
//! pure domain service: loading is inherently I/O-bound (disk reads,
//! network round-trips) and integrates with the runtime the composer runs
//! on. Metadata snapshots stay synchronous; they read an in-memory record.

use async_trait::async_trait;

use crate::entities::source_metadata::SourceMetadata;
use crate::value_objects::config_value::ConfigValue;
use crate::value_objects::fingerprint::{CacheKey, Fingerprint};
use crate::value_objects::source_kind::SourceKind;

/// A configuration origin: file, environment, remote endpoint, or secret
/// store.
///
/// Implementations update their metadata on every load: the attempt counter
/// first, then either the success record (timestamp, size, fingerprint) or
/// the failure record (error string, timestamp).
#[async_trait]
pub trait ConfigSource: Send + Sync {
    /// Stable kind tag of this source.
    fn kind(&self) -> SourceKind;

    /// Origin identifier: path, URL, or `env:<prefix>`.
    fn origin(&self) -> String;

    /// Cheap availability probe. Never panics; never errors.
    async fn is_available(&self) -> bool;

    /// Loads the source's mapping.
    ///
    /// Always returns a mapping; failures of any kind yield an empty one
    /// and are recorded on the source's metadata.
    async fn load(&self) -> ConfigValue;

    /// The source's current fingerprint, best-effort.
    async fn fingerprint(&self) -> Fingerprint;

    /// Snapshot of the source's load metadata.
    fn metadata(&self) -> SourceMetadata;

    /// Derives the cache key for the source's current content.
    async fn cache_key(&self) -> CacheKey {
        let fingerprint = self.fingerprint().await;
        CacheKey::derive(self.kind(), &self.origin(), &fingerprint)
    }

    /// Human-readable description used in logs.
    fn describe(&self) -> String {
        format!("{}:{}", self.kind(), self.origin())
    }
}
