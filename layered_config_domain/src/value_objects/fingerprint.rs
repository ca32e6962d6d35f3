// /////////////////////////////////////////////////////////////////////////////
// Layered Configuration Resolver
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Fingerprints and Cache Keys
//!
//! A fingerprint is the stable identifier a source exposes for cache-key
//! derivation: the modification time for file-backed sources, a content hash
//! of the canonically-encoded loaded mapping for dynamic sources. Rotating a
//! source's fingerprint rotates every cache key derived from it, which is
//! exactly how prior cache entries for that source are invalidated.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::value_objects::config_value::ConfigValue;
use crate::value_objects::source_kind::SourceKind;

/// A stable identifier for the current content of a source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "scheme", content = "value")]
pub enum Fingerprint {
    /// File modification time, rendered as whole and fractional seconds.
    Mtime(String),
    /// SHA-256 over the canonical encoding of the loaded mapping.
    ContentHash(String),
    /// The source could not produce a fingerprint; derived cache keys are
    /// unique per derivation and never hit.
    Unavailable,
}

impl Fingerprint {
    /// Fingerprints a loaded tree by hashing its canonical encoding.
    pub fn of_tree(value: &ConfigValue) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(value.canonical_string().as_bytes());
        Fingerprint::ContentHash(hex_digest(hasher))
    }

    /// Fingerprints a file modification time.
    pub fn of_mtime(mtime: std::time::SystemTime) -> Self {
        match mtime.duration_since(std::time::UNIX_EPOCH) {
            Ok(elapsed) => Fingerprint::Mtime(format!("{}.{:09}", elapsed.as_secs(), elapsed.subsec_nanos())),
            Err(_) => Fingerprint::Unavailable,
        }
    }

    /// Stable rendering used inside cache keys.
    pub fn as_key_part(&self) -> String {
        match self {
            Fingerprint::Mtime(mtime) => format!("mtime={mtime}"),
            Fingerprint::ContentHash(hash) => format!("sha256={hash}"),
            Fingerprint::Unavailable => "unavailable".to_string(),
        }
    }

    /// True when the source could not be fingerprinted.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Fingerprint::Unavailable)
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.as_key_part())
    }
}

/// A cache key derived from `(source kind, origin, fingerprint)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derives the key for a source's current content.
    pub fn derive(kind: SourceKind, origin: &str, fingerprint: &Fingerprint) -> Self {
        CacheKey(format!("{}:{}:{}", kind.as_str(), origin, fingerprint.as_key_part()))
    }

    /// Builds a key from its raw string form (cache persistence).
    pub fn from_raw(raw: impl Into<String>) -> Self {
        CacheKey(raw.into())
    }

    /// The raw key string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// A filesystem-safe digest of the key, used by persistent backends to
    /// name entry files.
    pub fn file_digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.0.as_bytes());
        hex_digest(hasher)
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

fn hex_digest(hasher: Sha256) -> String {
    let digest = hasher.finalize();
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        use std::fmt::Write;
        let _ = write!(out, "{byte:02x}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_content_hash_is_structural() {
        let mut a = BTreeMap::new();
        a.insert("x".to_string(), ConfigValue::Integer(1));
        a.insert("y".to_string(), ConfigValue::Integer(2));
        let mut b = BTreeMap::new();
        b.insert("y".to_string(), ConfigValue::Integer(2));
        b.insert("x".to_string(), ConfigValue::Integer(1));
        assert_eq!(
            Fingerprint::of_tree(&ConfigValue::Mapping(a)),
            Fingerprint::of_tree(&ConfigValue::Mapping(b))
        );
    }

    #[test]
    fn test_content_hash_changes_with_content() {
        let a = Fingerprint::of_tree(&ConfigValue::Integer(1));
        let b = Fingerprint::of_tree(&ConfigValue::Integer(2));
        assert_ne!(a, b);
    }

    #[test]
    fn test_cache_key_rotates_with_fingerprint() {
        let first = CacheKey::derive(SourceKind::Json, "/etc/app.json", &Fingerprint::Mtime("1.0".into()));
        let second = CacheKey::derive(SourceKind::Json, "/etc/app.json", &Fingerprint::Mtime("2.0".into()));
        assert_ne!(first, second);
        assert!(first.as_str().starts_with("json:/etc/app.json:"));
    }

    #[test]
    fn test_file_digest_is_hex() {
        let key = CacheKey::derive(SourceKind::Toml, "a.toml", &Fingerprint::Unavailable);
        let digest = key.file_digest();
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
