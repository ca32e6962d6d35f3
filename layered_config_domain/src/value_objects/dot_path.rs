// /////////////////////////////////////////////////////////////////////////////
// Layered Configuration Resolver
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Dot Path Value Object
//!
//! A dot-separated path into the configuration tree
//! (`database.credentials.password`). Paths are immutable; descending into a
//! child derives a new path rather than mutating the parent, which keeps
//! validation contexts cheap to fork as they descend.

use serde::{Deserialize, Serialize};

/// An immutable dot-separated path from the tree root.
///
/// The root path is the empty string and renders as `$` in diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DotPath(String);

impl DotPath {
    /// The root of the tree.
    pub fn root() -> Self {
        DotPath(String::new())
    }

    /// Builds a path from an already-joined string.
    pub fn new(path: impl Into<String>) -> Self {
        DotPath(path.into())
    }

    /// True when this is the root path.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Derives the path of a child key.
    pub fn child(&self, segment: &str) -> Self {
        if self.0.is_empty() {
            DotPath(segment.to_string())
        } else {
            DotPath(format!("{}.{}", self.0, segment))
        }
    }

    /// The raw dotted string; empty for the root.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Iterates the path segments; empty for the root.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.').filter(|segment| !segment.is_empty())
    }
}

impl std::fmt::Display for DotPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0.is_empty() {
            f.write_str("$")
        } else {
            f.write_str(&self.0)
        }
    }
}

impl From<&str> for DotPath {
    fn from(path: &str) -> Self {
        DotPath::new(path)
    }
}
