// /////////////////////////////////////////////////////////////////////////////
// Layered Configuration Resolver
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Secrets Accessor Port
//!
//! The read-only contract the composer requires from an external secrets
//! back-end. Storage, rotation, and authentication against the store are
//! external collaborators; the core only ever reads. A back-end that fails
//! internally absorbs the failure and answers "not found" - the composer
//! never observes secret-store errors.

use std::collections::BTreeSet;

use crate::value_objects::secret_value::Secret;

/// Read-only retrieval of named secrets.
pub trait SecretsAccessor: Send + Sync {
    /// Fetches a secret by name. `None` covers both absence and any
    /// internal back-end failure.
    fn get_secret(&self, name: &str) -> Option<Secret>;

    /// The set of known secret names.
    fn list_secret_names(&self) -> BTreeSet<String>;

    /// True when a secret with this name exists.
    fn exists(&self, name: &str) -> bool {
        self.get_secret(name).is_some()
    }
}
