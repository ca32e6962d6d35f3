// /////////////////////////////////////////////////////////////////////////////
// Layered Configuration Resolver
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Validation Context
//!
//! Immutable per-invocation state threaded through the validator pipeline:
//! the dot path being validated, the validation level, an optional hint
//! about which source kind produced the value, and the start timestamp.
//! Descending into a sub-value derives a new context; nothing is ever
//! mutated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::dot_path::DotPath;
use crate::value_objects::source_kind::SourceKind;

/// Controls whether validators may coerce.
///
/// In `Lenient` mode, type validators attempt safe conversions
/// (`"42"` to `42`, `"true"` to `true`); in `Strict` mode any kind mismatch
/// is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationLevel {
    Strict,
    Lenient,
}

/// Immutable state for one validation descent.
#[derive(Debug, Clone)]
pub struct ValidationContext {
    path: DotPath,
    level: ValidationLevel,
    source_hint: Option<SourceKind>,
    started_at: DateTime<Utc>,
}

impl ValidationContext {
    /// Context rooted at the top of the tree.
    pub fn root(level: ValidationLevel) -> Self {
        Self {
            path: DotPath::root(),
            level,
            source_hint: None,
            started_at: Utc::now(),
        }
    }

    /// Attaches a hint about the source kind that produced the value.
    pub fn with_source_hint(mut self, hint: SourceKind) -> Self {
        self.source_hint = Some(hint);
        self
    }

    /// Derives the context for a child key; level, hint, and start
    /// timestamp carry over.
    pub fn child(&self, segment: &str) -> Self {
        Self {
            path: self.path.child(segment),
            level: self.level,
            source_hint: self.source_hint,
            started_at: self.started_at,
        }
    }

    pub fn path(&self) -> &DotPath {
        &self.path
    }

    pub fn level(&self) -> ValidationLevel {
        self.level
    }

    pub fn is_lenient(&self) -> bool {
        self.level == ValidationLevel::Lenient
    }

    pub fn source_hint(&self) -> Option<SourceKind> {
        self.source_hint
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }
}
