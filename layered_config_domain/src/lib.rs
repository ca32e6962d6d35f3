// /////////////////////////////////////////////////////////////////////////////
// Layered Configuration Resolver
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Layered Config Domain
//!
//! The domain layer of the layered configuration resolver: the business
//! rules of composing, merging, validating, and observing configuration,
//! independent of any file format parser, network client, or runtime. It
//! follows Domain-Driven Design conventions.
//!
//! ## Module Structure
//!
//! ### Value Objects
//! Immutable objects defined by their attributes:
//! - [`ConfigValue`]: the recursive configuration tree (mapping / sequence
//!   / scalar) with deep merge, dot-path access, and total coercions
//! - [`DotPath`]: a dot-separated path from the tree root
//! - [`SourceKind`]: stable source kind tags
//! - [`Fingerprint`] / [`CacheKey`]: stable content identifiers and the
//!   cache keys derived from them
//! - [`Secret`]: a wrapped sensitive scalar with zeroized bytes and a
//!   redacted `Debug`
//!
//! ### Entities
//! Objects with identity and mutable state:
//! - [`SourceMetadata`]: per-source load counters, timestamps, and the
//!   last detected fingerprint
//! - [`CacheEntry`] / [`CacheStats`]: cached load results and cache
//!   counters
//! - [`ProfileManager`]: the profile registry with inheritance chains,
//!   alias canonicalization, and environment auto-detection
//!
//! ### Service Ports
//! Async and sync traits the infrastructure layer implements:
//! - [`ConfigSource`]: the uniform load / availability / fingerprint
//!   contract every origin satisfies
//! - [`CacheBackend`]: pluggable cache storage with lazy TTL
//! - [`SecretsAccessor`]: read-only retrieval of named secrets
//!
//! ### Validation
//! The pure validation engine: [`ValidationContext`],
//! [`ValidationResult`] with path-tagged [`Diagnostic`]s, the built-in
//! validator set, and the declarative [`Schema`] that lowers into a
//! composite validator.
//!
//! ## Design Notes
//!
//! - Loaders are total: data-plane failures collapse to empty mappings and
//!   live on source metadata, never in return channels.
//! - Composed trees are immutable after publish; the composer swaps whole
//!   trees atomically and readers traverse without locks.
//! - Errors returned from domain APIs ([`ConfigError`]) are control-plane
//!   programmer mistakes: cyclic profiles, malformed schema patterns, and
//!   the like.

pub mod entities;
pub mod error;
pub mod services;
pub mod validation;
pub mod value_objects;

// Re-export core types for convenient access
pub use entities::{CacheEntry, CacheStats, Profile, ProfileManager, SourceMetadata};
pub use error::ConfigError;
pub use services::{CacheBackend, ConfigSource, SecretsAccessor};
pub use validation::{
    Diagnostic, Schema, SchemaField, Severity, ValidationContext, ValidationLevel, ValidationResult, Validator,
    ValidatorRef,
};
pub use value_objects::{CacheKey, ConfigValue, DotPath, Fingerprint, Secret, SecretMetadata, SourceKind, ValueKind};
