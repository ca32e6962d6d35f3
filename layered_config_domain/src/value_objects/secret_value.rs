// /////////////////////////////////////////////////////////////////////////////
// Layered Configuration Resolver
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Secret Value Object
//!
//! A wrapped sensitive scalar retrieved from an external secrets back-end.
//! Secrets are never serialized into the configuration tree; the composer
//! hands them out on demand through the accessor port and counts every
//! access. The wrapped bytes are zeroized on drop and the `Debug`
//! representation is redacted.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use zeroize::Zeroizing;

/// Optional descriptive metadata attached to a secret by its back-end.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecretMetadata {
    /// Storage or sensitivity tier, back-end defined.
    pub tier: Option<String>,
    /// Hint about the rotation schedule, back-end defined.
    pub rotation_hint: Option<String>,
    /// Free-form tags.
    pub tags: Vec<String>,
}

/// A named sensitive value.
///
/// Clones share the access counter, so retrieval counting survives the
/// copies accessors naturally hand out.
#[derive(Clone)]
pub struct Secret {
    name: String,
    value: Arc<Zeroizing<Vec<u8>>>,
    created_at: DateTime<Utc>,
    metadata: SecretMetadata,
    access_count: Arc<AtomicU64>,
}

impl Secret {
    /// Wraps raw secret bytes under a name.
    pub fn new(name: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            value: Arc::new(Zeroizing::new(value.into())),
            created_at: Utc::now(),
            metadata: SecretMetadata::default(),
            access_count: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Attaches back-end metadata.
    pub fn with_metadata(mut self, metadata: SecretMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// The secret's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Creation timestamp.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Back-end metadata.
    pub fn metadata(&self) -> &SecretMetadata {
        &self.metadata
    }

    /// Number of times the secret bytes were revealed.
    pub fn access_count(&self) -> u64 {
        self.access_count.load(Ordering::Relaxed)
    }

    /// Reveals the secret bytes, counting the access.
    pub fn reveal(&self) -> &[u8] {
        self.access_count.fetch_add(1, Ordering::Relaxed);
        &self.value
    }

    /// Reveals the secret as UTF-8, counting the access. Returns `None` for
    /// non-text secrets.
    pub fn reveal_string(&self) -> Option<String> {
        let bytes = self.reveal();
        std::str::from_utf8(bytes).ok().map(str::to_string)
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secret")
            .field("name", &self.name)
            .field("value", &"<redacted>")
            .field("created_at", &self.created_at)
            .field("access_count", &self.access_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reveal_counts_accesses() {
        let secret = Secret::new("db_password", "hunter2");
        assert_eq!(secret.access_count(), 0);
        assert_eq!(secret.reveal_string().as_deref(), Some("hunter2"));
        assert_eq!(secret.reveal(), b"hunter2");
        assert_eq!(secret.access_count(), 2);
    }

    #[test]
    fn test_clones_share_counter() {
        let secret = Secret::new("token", "abc");
        let clone = secret.clone();
        clone.reveal();
        assert_eq!(secret.access_count(), 1);
    }

    #[test]
    fn test_debug_is_redacted() {
        let secret = Secret::new("api_key", "very-sensitive");
        let rendered = format!("{secret:?}");
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("very-sensitive"));
    }
}
