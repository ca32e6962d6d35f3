// /////////////////////////////////////////////////////////////////////////////
// Layered Configuration Resolver
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Source Metadata
//!
//! Per-source observability record: load counters, timestamps, the last
//! error, and the last detected fingerprint. The record is mutated only by
//! its owning source at load completion and is handed out as a snapshot
//! through `stats()`, which is how silent degradation (a remote source with
//! rising error counts, say) becomes visible without any error ever
//! surfacing on the data plane.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::fingerprint::Fingerprint;
use crate::value_objects::source_kind::SourceKind;

/// Observable load history of a single source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceMetadata {
    /// Stable source kind tag.
    pub kind: SourceKind,
    /// Origin identifier: a path, a URL, or `env:<prefix>`.
    pub origin: String,
    /// Total load attempts.
    pub load_attempts: u64,
    /// Loads that produced a mapping.
    pub load_successes: u64,
    /// Loads that failed and contributed an empty mapping.
    pub load_failures: u64,
    /// Timestamp of the last successful load.
    pub last_loaded_at: Option<DateTime<Utc>>,
    /// Message of the most recent failure.
    pub last_error: Option<String>,
    /// Timestamp of the most recent failure.
    pub last_error_at: Option<DateTime<Utc>>,
    /// Byte size of the last successfully loaded content, if applicable.
    pub size_bytes: Option<u64>,
    /// Fingerprint detected by the last successful load.
    pub last_fingerprint: Option<Fingerprint>,
}

impl SourceMetadata {
    /// Creates a fresh record for a source.
    pub fn new(kind: SourceKind, origin: impl Into<String>) -> Self {
        Self {
            kind,
            origin: origin.into(),
            load_attempts: 0,
            load_successes: 0,
            load_failures: 0,
            last_loaded_at: None,
            last_error: None,
            last_error_at: None,
            size_bytes: None,
            last_fingerprint: None,
        }
    }

    /// Counts a load attempt. Called once at the start of every load.
    pub fn record_attempt(&mut self) {
        self.load_attempts += 1;
    }

    /// Records a successful load.
    pub fn record_success(&mut self, size_bytes: Option<u64>, fingerprint: Option<Fingerprint>) {
        self.load_successes += 1;
        self.last_loaded_at = Some(Utc::now());
        self.size_bytes = size_bytes;
        if fingerprint.is_some() {
            self.last_fingerprint = fingerprint;
        }
    }

    /// Records a failed load. The error stays as a string; data-plane
    /// failures never propagate as values.
    pub fn record_failure(&mut self, error: impl Into<String>) {
        self.load_failures += 1;
        self.last_error = Some(error.into());
        self.last_error_at = Some(Utc::now());
    }

    /// True when the source has never loaded successfully.
    pub fn never_loaded(&self) -> bool {
        self.load_successes == 0
    }
}
