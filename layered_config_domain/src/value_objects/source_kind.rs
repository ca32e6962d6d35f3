// /////////////////////////////////////////////////////////////////////////////
// Layered Configuration Resolver
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Source Kind Tags
//!
//! Stable tags identifying the kind of a configuration source. The tag is
//! part of every cache key and metadata snapshot, so its string form must
//! never change between releases.

use serde::{Deserialize, Serialize};

/// The kind of a configuration source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Json,
    Yaml,
    Toml,
    Ini,
    Environment,
    Remote,
    Secret,
}

impl SourceKind {
    /// Stable lowercase tag used in cache keys and diagnostics.
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Json => "json",
            SourceKind::Yaml => "yaml",
            SourceKind::Toml => "toml",
            SourceKind::Ini => "ini",
            SourceKind::Environment => "environment",
            SourceKind::Remote => "remote",
            SourceKind::Secret => "secret",
        }
    }

    /// True for sources backed by a local file path.
    pub fn is_file_backed(&self) -> bool {
        matches!(
            self,
            SourceKind::Json | SourceKind::Yaml | SourceKind::Toml | SourceKind::Ini
        )
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
