// /////////////////////////////////////////////////////////////////////////////
// Layered Configuration Resolver
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Value Objects
//!
//! Immutable, attribute-defined domain values: the configuration tree
//! itself, dot paths, source kind tags, fingerprints/cache keys, and wrapped
//! secrets.

pub mod config_value;
pub mod dot_path;
pub mod fingerprint;
pub mod secret_value;
pub mod source_kind;

pub use config_value::{ConfigValue, ValueKind};
pub use dot_path::DotPath;
pub use fingerprint::{CacheKey, Fingerprint};
pub use secret_value::{Secret, SecretMetadata};
pub use source_kind::SourceKind;
