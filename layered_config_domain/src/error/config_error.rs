// /////////////////////////////////////////////////////////////////////////////
// Layered Configuration Resolver
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Domain Error System
//!
//! This module provides the error system for the layered configuration
//! domain. It distinguishes the two error planes the resolver deals with:
//!
//! - **Data-plane failures** (an unreadable file, a malformed document, a
//!   remote endpoint timing out) are *recovered locally*: loaders return an
//!   empty mapping, record the failure on their source metadata, and the
//!   composer keeps serving the last good tree. These failures travel as
//!   strings on metadata and as validation diagnostics, never as `Err`
//!   values on the hot path.
//! - **Control-plane misuse** (a cyclic profile graph, an invalid schema
//!   pattern, operating on a disposed composer) is a programmer error and is
//!   surfaced synchronously as a [`ConfigError`] from the offending API.
//!
//! ## Error Categories
//!
//! #### Source Errors
//! - **ParseError**: Malformed configuration content
//! - **DecodeError**: Encoding mismatch or binary content
//! - **IoError**: File system read failures
//! - **RemoteError**: Network failures, timeouts, unexpected responses
//!
//! #### Engine Errors
//! - **SchemaError**: Invalid schema construction (unknown validator,
//!   malformed pattern)
//! - **ValidationError**: Aggregate validation failure summaries
//! - **ProfileError**: Cyclic parents, unknown profile names
//! - **CacheError**: Cache backend failures
//! - **SecretError**: Secrets accessor failures
//!
//! #### Lifecycle Errors
//! - **Disposed**: Operation on a disposed composer
//! - **InternalError**: Unexpected system failures
//!
//! ## Error Recovery
//!
//! `is_recoverable` marks errors that indicate temporary conditions
//! (I/O, network, cache) worth retrying on the next reload cycle; the rest
//! require the caller to change something.

use thiserror::Error;

/// Domain-specific errors for the layered configuration system.
///
/// Each variant carries a descriptive message. Variants map one-to-one onto
/// the error taxonomy the public API documents: data-plane kinds exist here
/// so sources and backends can *record* them; only control-plane kinds are
/// returned from public operations.
#[derive(Error, Debug, Clone)]
pub enum ConfigError {
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Decode error: {0}")]
    DecodeError(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Remote error: {0}")]
    RemoteError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Schema error: {0}")]
    SchemaError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Profile error: {0}")]
    ProfileError(String),

    #[error("Cache error: {0}")]
    CacheError(String),

    #[error("Secret error: {0}")]
    SecretError(String),

    #[error("Composer disposed: {0}")]
    Disposed(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ConfigError {
    /// Creates a new parse error
    pub fn parse_error(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    /// Creates a new decode error
    pub fn decode_error(msg: impl Into<String>) -> Self {
        Self::DecodeError(msg.into())
    }

    /// Creates a new IO error
    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::IoError(msg.into())
    }

    /// Creates a new remote error
    pub fn remote_error(msg: impl Into<String>) -> Self {
        Self::RemoteError(msg.into())
    }

    /// Creates a new schema error
    pub fn schema_error(msg: impl Into<String>) -> Self {
        Self::SchemaError(msg.into())
    }

    /// Creates a new validation error
    pub fn validation_error(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    /// Creates a new profile error
    pub fn profile_error(msg: impl Into<String>) -> Self {
        Self::ProfileError(msg.into())
    }

    /// Creates a new cache error
    pub fn cache_error(msg: impl Into<String>) -> Self {
        Self::CacheError(msg.into())
    }

    /// Creates a new secret error
    pub fn secret_error(msg: impl Into<String>) -> Self {
        Self::SecretError(msg.into())
    }

    /// Creates a new disposed error
    pub fn disposed(msg: impl Into<String>) -> Self {
        Self::Disposed(msg.into())
    }

    /// Creates a new internal error
    pub fn internal_error(msg: impl Into<String>) -> Self {
        Self::InternalError(msg.into())
    }

    /// Checks if the error is recoverable
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ConfigError::IoError(_) | ConfigError::RemoteError(_) | ConfigError::CacheError(_)
        )
    }

    /// Checks if the error belongs to the data plane (recovered locally by
    /// the composition engine) rather than the control plane.
    pub fn is_data_plane(&self) -> bool {
        matches!(
            self,
            ConfigError::ParseError(_)
                | ConfigError::DecodeError(_)
                | ConfigError::IoError(_)
                | ConfigError::RemoteError(_)
                | ConfigError::SerializationError(_)
        )
    }

    /// Gets the error category
    pub fn category(&self) -> &'static str {
        match self {
            ConfigError::ParseError(_) => "parse",
            ConfigError::DecodeError(_) => "decode",
            ConfigError::IoError(_) => "io",
            ConfigError::RemoteError(_) => "remote",
            ConfigError::SerializationError(_) => "serialization",
            ConfigError::SchemaError(_) => "schema",
            ConfigError::ValidationError(_) => "validation",
            ConfigError::ProfileError(_) => "profile",
            ConfigError::CacheError(_) => "cache",
            ConfigError::SecretError(_) => "secret",
            ConfigError::Disposed(_) => "lifecycle",
            ConfigError::InternalError(_) => "internal",
        }
    }
}

// Implement conversion from standard library errors
impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::SerializationError(err.to_string())
    }
}
