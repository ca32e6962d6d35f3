// /////////////////////////////////////////////////////////////////////////////
// Layered Configuration Resolver
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Source Kinds
//!
//! Concrete implementations of the source protocol: the four structured
//! file formats (JSON, YAML, TOML, INI), the environment projection, the
//! remote HTTP endpoint, and the secret-backed overlay. All of them obey
//! the same failure policy: a load never errors outward; it contributes an
//! empty mapping and records the failure on its metadata.

pub mod env_source;
pub mod file_format;
pub(crate) mod file_support;
pub mod ini_source;
pub mod json_source;
pub mod remote_source;
pub mod secret_source;
pub mod toml_source;
pub mod yaml_source;

pub use env_source::EnvSource;
pub use file_format::{profile_config_path, FileFormat};
pub use ini_source::IniFileSource;
pub use json_source::JsonFileSource;
pub use remote_source::{RemoteAuth, RemoteSource};
pub use secret_source::SecretBackedSource;
pub use toml_source::TomlFileSource;
pub use yaml_source::YamlFileSource;

use std::path::Path;
use std::sync::Arc;

use layered_config_domain::ConfigSource;

/// Builds the right file source for a path based on its extension,
/// defaulting to JSON when the extension is unknown (the advisory rule:
/// recognition guides, it never gates).
pub fn file_source_for(path: &Path) -> Arc<dyn ConfigSource> {
    match FileFormat::from_path(path) {
        Some(FileFormat::Yaml) => Arc::new(YamlFileSource::new(path)),
        Some(FileFormat::Toml) => Arc::new(TomlFileSource::new(path)),
        Some(FileFormat::Ini) => Arc::new(IniFileSource::new(path)),
        _ => Arc::new(JsonFileSource::new(path)),
    }
}
