// /////////////////////////////////////////////////////////////////////////////
// Layered Configuration Resolver
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # In-Memory Secrets Accessor
//!
//! A process-local implementation of the secrets accessor port. Real
//! deployments plug in an adapter over their secret store; this one backs
//! tests, examples, and single-process setups where secrets arrive through
//! the environment at startup.

use std::collections::{BTreeSet, HashMap};

use layered_config_domain::{Secret, SecretsAccessor};
use parking_lot::RwLock;

/// Accessor over a process-local map of secrets.
#[derive(Default)]
pub struct MemorySecretsAccessor {
    secrets: RwLock<HashMap<String, Secret>>,
}

impl MemorySecretsAccessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a secret under its own name, replacing any previous one.
    pub fn insert(&self, secret: Secret) {
        self.secrets.write().insert(secret.name().to_string(), secret);
    }

    /// Removes a secret. Returns whether one existed.
    pub fn remove(&self, name: &str) -> bool {
        self.secrets.write().remove(name).is_some()
    }
}

impl SecretsAccessor for MemorySecretsAccessor {
    fn get_secret(&self, name: &str) -> Option<Secret> {
        self.secrets.read().get(name).cloned()
    }

    fn list_secret_names(&self) -> BTreeSet<String> {
        self.secrets.read().keys().cloned().collect()
    }

    fn exists(&self, name: &str) -> bool {
        self.secrets.read().contains_key(name)
    }
}
