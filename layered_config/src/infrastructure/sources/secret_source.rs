// /////////////////////////////////////////////////////////////////////////////
// Layered Configuration Resolver
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Secret-Backed Source
//!
//! Projects declared secrets into the configuration tree through the
//! read-only accessor port. Each declared mapping pairs a dot path in the
//! tree with a secret name in the back-end; a missing secret is omitted
//! with a warning rather than failing the load. Non-UTF-8 secrets are
//! skipped the same way, since the tree carries text scalars.
//!
//! The values this source injects are ordinary scalars and merge like any
//! other source; name the target paths so the masking pass recognizes
//! them (`database.password`, `api.token`, ...).

use std::sync::Arc;

use async_trait::async_trait;
use layered_config_domain::{
    ConfigSource, ConfigValue, Fingerprint, SecretsAccessor, SourceKind, SourceMetadata,
};
use parking_lot::Mutex;
use tracing::{debug, warn};

/// Configuration source resolving declared paths from a secrets accessor.
pub struct SecretBackedSource {
    accessor: Arc<dyn SecretsAccessor>,
    mappings: Vec<(String, String)>,
    metadata: Mutex<SourceMetadata>,
}

impl SecretBackedSource {
    pub fn new(accessor: Arc<dyn SecretsAccessor>) -> Self {
        let metadata = SourceMetadata::new(SourceKind::Secret, "secrets:".to_string());
        Self {
            accessor,
            mappings: Vec::new(),
            metadata: Mutex::new(metadata),
        }
    }

    /// Declares that `config_path` is filled from the secret `secret_name`.
    pub fn map(mut self, config_path: impl Into<String>, secret_name: impl Into<String>) -> Self {
        self.mappings.push((config_path.into(), secret_name.into()));
        let origin = self.compute_origin();
        self.metadata.lock().origin = origin;
        self
    }

    fn compute_origin(&self) -> String {
        let mut names: Vec<&str> = self.mappings.iter().map(|(_, name)| name.as_str()).collect();
        names.sort_unstable();
        format!("secrets:{}", names.join(","))
    }

    fn collect(&self) -> ConfigValue {
        let mut tree = ConfigValue::empty_mapping();
        for (path, name) in &self.mappings {
            match self.accessor.get_secret(name).and_then(|s| s.reveal_string()) {
                Some(value) => tree.set_path(path, ConfigValue::String(value)),
                None => {
                    warn!(secret = %name, path = %path, "secret not found; omitting");
                }
            }
        }
        tree
    }
}

#[async_trait]
impl ConfigSource for SecretBackedSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Secret
    }

    fn origin(&self) -> String {
        self.metadata.lock().origin.clone()
    }

    async fn is_available(&self) -> bool {
        !self.mappings.is_empty()
    }

    async fn load(&self) -> ConfigValue {
        self.metadata.lock().record_attempt();
        let tree = self.collect();
        let fingerprint = Fingerprint::of_tree(&tree);
        self.metadata.lock().record_success(None, Some(fingerprint));
        debug!(source = %self.describe(), declared = self.mappings.len(), "loaded secrets");
        tree
    }

    async fn fingerprint(&self) -> Fingerprint {
        Fingerprint::of_tree(&self.collect())
    }

    fn metadata(&self) -> SourceMetadata {
        self.metadata.lock().clone()
    }
}
