// /////////////////////////////////////////////////////////////////////////////
// Layered Configuration Resolver
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # TOML File Source
//!
//! Loads a configuration mapping from a TOML document. TOML's root is
//! always a table, so the mapping-at-root rule holds by construction.
//! Arrays of tables come through as sequences of mappings; datetime values
//! are carried as their string rendering since the tree has no datetime
//! scalar.

use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use layered_config_domain::{ConfigSource, ConfigValue, Fingerprint, SourceKind, SourceMetadata};
use parking_lot::Mutex;
use tracing::{debug, warn};

use super::file_format::FileFormat;
use super::file_support::{check_extension, mtime_fingerprint, probe_readable, read_utf8};

/// Configuration source backed by a TOML file.
pub struct TomlFileSource {
    path: PathBuf,
    metadata: Mutex<SourceMetadata>,
}

impl TomlFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        check_extension(&path, FileFormat::Toml);
        let metadata = SourceMetadata::new(SourceKind::Toml, path.display().to_string());
        Self {
            path,
            metadata: Mutex::new(metadata),
        }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

#[async_trait]
impl ConfigSource for TomlFileSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Toml
    }

    fn origin(&self) -> String {
        self.path.display().to_string()
    }

    async fn is_available(&self) -> bool {
        probe_readable(&self.path).await
    }

    async fn load(&self) -> ConfigValue {
        self.metadata.lock().record_attempt();
        let text = match read_utf8(&self.path).await {
            Ok(text) => text,
            Err(error) => {
                warn!(source = %self.describe(), %error, "load failed");
                self.metadata.lock().record_failure(error);
                return ConfigValue::empty_mapping();
            }
        };
        let table: toml::Table = match toml::from_str(&text) {
            Ok(table) => table,
            Err(error) => {
                let error = format!("invalid TOML in {}: {error}", self.path.display());
                warn!(source = %self.describe(), %error, "parse failed");
                self.metadata.lock().record_failure(error);
                return ConfigValue::empty_mapping();
            }
        };
        let value = toml_table_to_config(table);
        let fingerprint = mtime_fingerprint(&self.path).await;
        self.metadata
            .lock()
            .record_success(Some(text.len() as u64), Some(fingerprint));
        debug!(source = %self.describe(), bytes = text.len(), "loaded");
        value
    }

    async fn fingerprint(&self) -> Fingerprint {
        mtime_fingerprint(&self.path).await
    }

    fn metadata(&self) -> SourceMetadata {
        self.metadata.lock().clone()
    }
}

fn toml_table_to_config(table: toml::Table) -> ConfigValue {
    let entries: BTreeMap<String, ConfigValue> = table
        .into_iter()
        .map(|(key, value)| (key, toml_to_config(value)))
        .collect();
    ConfigValue::Mapping(entries)
}

fn toml_to_config(value: toml::Value) -> ConfigValue {
    match value {
        toml::Value::String(s) => ConfigValue::String(s),
        toml::Value::Integer(i) => ConfigValue::Integer(i),
        toml::Value::Float(f) => ConfigValue::Float(f),
        toml::Value::Boolean(b) => ConfigValue::Boolean(b),
        toml::Value::Datetime(dt) => ConfigValue::String(dt.to_string()),
        toml::Value::Array(items) => ConfigValue::Sequence(items.into_iter().map(toml_to_config).collect()),
        toml::Value::Table(table) => toml_table_to_config(table),
    }
}
