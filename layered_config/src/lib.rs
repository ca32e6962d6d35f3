// /////////////////////////////////////////////////////////////////////////////
// Layered Configuration Resolver
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

// Production code safety enforced via CI and `make lint-strict`
// (lib checked separately from tests - tests may use unwrap/expect)

//! # Layered Config
//!
//! A layered configuration resolver for long-running services. It composes
//! configuration from an ordered stack of heterogeneous sources - local
//! files in several formats, environment variables, HTTP endpoints, secret
//! stores - merges them by a precise precedence rule, validates the result
//! against a declarative schema, caches loads to avoid redundant I/O, and
//! reacts to source changes at runtime without blocking readers.
//!
//! ## Architecture Overview
//!
//! The crate follows Clean Architecture and Domain-Driven Design
//! principles, split across two workspace members:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Application Layer                          │
//! │  (ConfigManager: source stack, reload, swap, public API)    │
//! └─────────────────────────────────────────────────────────────┘
//!                                │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Domain Layer (layered-config-domain)     │
//! │  (ConfigValue tree, merge, validation, schema, profiles)    │
//! └─────────────────────────────────────────────────────────────┘
//!                                │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                Infrastructure Layer                         │
//! │  (Sources, Cache Backends, File Watching, Masking)          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Core Concepts
//!
//! ### Sources
//! Any origin that can produce a mapping: JSON, YAML, TOML, and INI files,
//! environment variables, remote HTTP endpoints, and secret stores. All
//! sources share one total contract: a load never errors outward - it
//! contributes an empty mapping and records the failure on its metadata.
//!
//! ### Precedence
//! Sources are applied in insertion order; each deep-merges over the
//! accumulated result, so the last-added source wins at every conflicting
//! leaf. Mappings merge key-wise; sequences and scalars replace.
//!
//! ### Reload
//! Explicit (`reload()`) or automatic (file watching with a polling
//! fallback). Either way, a fresh tree is prepared off to the side and
//! swapped atomically: readers never observe a partial merge, and reload
//! callbacks fire after the swap is visible, in registration order.
//!
//! ### Validation
//! A declarative schema lowers into composable validators with `strict`
//! and `lenient` coercion levels. Validation reports every failing field
//! with its full dotted path; results are cached per tree version.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use layered_config::{ConfigManager, EnvSource, JsonFileSource};
//!
//! # async fn example() -> Result<(), layered_config::ConfigError> {
//! let config = ConfigManager::new();
//! config.add_source(Arc::new(JsonFileSource::new("config/base.json"))).await?;
//! config.add_source(Arc::new(EnvSource::with_prefix("APP_"))).await?;
//!
//! let host = config.get_or("db.host", "localhost".into());
//! let port = config.get_int("db.port", 5432);
//! let debug = config.get_bool("debug", false);
//! # Ok(())
//! # }
//! ```
//!
//! ## Concurrency Model
//!
//! Readers take a shared lock only to clone the handle of the current
//! immutable tree; traversal happens lock-free. Writers prepare new trees
//! off to the side and take the exclusive lock only for the pointer swap.
//! Once a reader has observed tree version *v*, it never observes an
//! earlier version.
//!
//! ## Error Handling
//!
//! Data-plane failures (unreadable files, malformed documents, network
//! trouble) are recovered locally: the composer keeps serving the last
//! good tree and the failure is visible in `stats()`. Control-plane
//! mistakes (cyclic profiles, invalid schema patterns, operations on a
//! disposed composer) surface synchronously as [`ConfigError`].

pub mod application;
pub mod infrastructure;

// Tests are organized as:
// - Unit tests: #[cfg(test)] modules within each source file
// - Integration tests: separate files in tests/ directory

// Re-export the public surface for convenient access
pub use application::services::{
    CallbackId, ComposerState, ComposerStats, ConfigManager, ConfigManagerBuilder, ReloadMode, ValidationStats,
};
pub use infrastructure::cache::{CacheManager, FileCacheBackend, MemoryCacheBackend, NullCacheBackend};
pub use infrastructure::services::{MaskingConfig, MaskingService, MemorySecretsAccessor};
pub use infrastructure::sources::{
    file_source_for, profile_config_path, EnvSource, FileFormat, IniFileSource, JsonFileSource, RemoteAuth,
    RemoteSource, SecretBackedSource, TomlFileSource, YamlFileSource,
};
pub use infrastructure::watch::FileWatcher;

// Re-export domain types for convenient access
pub use layered_config_domain::{
    CacheBackend, CacheEntry, CacheKey, CacheStats, ConfigError, ConfigSource, ConfigValue, Diagnostic, DotPath,
    Fingerprint, Profile, ProfileManager, Schema, SchemaField, Secret, SecretMetadata, SecretsAccessor, Severity,
    SourceKind, SourceMetadata, ValidationContext, ValidationLevel, ValidationResult, Validator, ValueKind,
};
