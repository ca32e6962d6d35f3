// /////////////////////////////////////////////////////////////////////////////
// Layered Configuration Resolver
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Environment Variable Source
//!
//! Projects process environment variables into a configuration mapping.
//! Variables matching any configured prefix are stripped of the prefix and,
//! when nesting is enabled, split on the separator into a nested path:
//! `APP_DB_HOST=h2` with prefix `APP_` and separator `_` lands at
//! `db.host`. An empty prefix list (or an explicitly empty prefix) matches
//! every variable.
//!
//! Value parsing is optional and layered: JSON first (so `[1,2]` and
//! `{"a":1}` come through structured), then numeric, then boolean, else the
//! raw string. Case folding of path segments is on by default.
//!
//! The environment is a dynamic source: its fingerprint is a content hash
//! of the projected mapping, so an environment change rotates the cache
//! key on the next reload.

use std::collections::BTreeMap;

use async_trait::async_trait;
use layered_config_domain::{ConfigSource, ConfigValue, Fingerprint, SourceKind, SourceMetadata};
use parking_lot::Mutex;
use tracing::debug;

/// Configuration source projecting process environment variables.
pub struct EnvSource {
    prefixes: Vec<String>,
    separator: String,
    nested: bool,
    fold_case: bool,
    parse_values: bool,
    metadata: Mutex<SourceMetadata>,
}

impl EnvSource {
    /// A source matching a single prefix (`APP_` style; an empty string
    /// matches everything).
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self::with_prefixes(vec![prefix.into()])
    }

    /// A source matching any of several prefixes. An empty list matches
    /// every variable.
    pub fn with_prefixes(prefixes: Vec<String>) -> Self {
        let origin = if prefixes.is_empty() || prefixes.iter().any(String::is_empty) {
            "env:*".to_string()
        } else {
            format!("env:{}", prefixes.join(","))
        };
        Self {
            prefixes,
            separator: "_".to_string(),
            nested: true,
            fold_case: true,
            parse_values: true,
            metadata: Mutex::new(SourceMetadata::new(SourceKind::Environment, origin)),
        }
    }

    /// A source matching every environment variable.
    pub fn all() -> Self {
        Self::with_prefixes(Vec::new())
    }

    /// Changes the separator translating variable names into nested path
    /// segments (default `_`).
    pub fn separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Disables nesting; stripped variable names become single flat keys.
    pub fn flat(mut self) -> Self {
        self.nested = false;
        self
    }

    /// Keeps the original variable-name case instead of folding to lower.
    pub fn preserve_case(mut self) -> Self {
        self.fold_case = false;
        self
    }

    /// Disables value parsing; every value stays a raw string.
    pub fn raw_values(mut self) -> Self {
        self.parse_values = false;
        self
    }

    /// Strips the first matching prefix, or `None` when nothing matches.
    fn strip_prefix<'a>(&self, key: &'a str) -> Option<&'a str> {
        if self.prefixes.is_empty() {
            return Some(key);
        }
        for prefix in &self.prefixes {
            if let Some(stripped) = key.strip_prefix(prefix.as_str()) {
                return Some(stripped);
            }
        }
        None
    }

    /// Projects the current environment into a tree. Shared by `load` and
    /// `fingerprint` so both observe the same shape.
    fn collect(&self) -> ConfigValue {
        let mut root: BTreeMap<String, ConfigValue> = BTreeMap::new();
        for (key, value) in std::env::vars() {
            let Some(stripped) = self.strip_prefix(&key) else {
                continue;
            };
            let stripped = stripped.trim_start_matches(self.separator.as_str());
            if stripped.is_empty() {
                continue;
            }
            let segments: Vec<String> = if self.nested && !self.separator.is_empty() {
                stripped
                    .split(self.separator.as_str())
                    .filter(|segment| !segment.is_empty())
                    .map(|segment| self.fold(segment))
                    .collect()
            } else {
                vec![self.fold(stripped)]
            };
            if segments.is_empty() {
                continue;
            }
            let parsed = if self.parse_values {
                parse_env_value(&value)
            } else {
                ConfigValue::String(value)
            };
            insert_segments(&mut root, &segments, parsed);
        }
        ConfigValue::Mapping(root)
    }

    fn fold(&self, segment: &str) -> String {
        if self.fold_case {
            segment.to_ascii_lowercase()
        } else {
            segment.to_string()
        }
    }
}

#[async_trait]
impl ConfigSource for EnvSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Environment
    }

    fn origin(&self) -> String {
        self.metadata.lock().origin.clone()
    }

    async fn is_available(&self) -> bool {
        true
    }

    async fn load(&self) -> ConfigValue {
        self.metadata.lock().record_attempt();
        let tree = self.collect();
        let fingerprint = Fingerprint::of_tree(&tree);
        let entries = tree.as_mapping().map(BTreeMap::len).unwrap_or(0);
        self.metadata.lock().record_success(None, Some(fingerprint));
        debug!(source = %self.describe(), entries, "loaded environment");
        tree
    }

    async fn fingerprint(&self) -> Fingerprint {
        Fingerprint::of_tree(&self.collect())
    }

    fn metadata(&self) -> SourceMetadata {
        self.metadata.lock().clone()
    }
}

/// Parses an environment value: JSON, then numeric, then boolean, else the
/// raw string.
fn parse_env_value(raw: &str) -> ConfigValue {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return ConfigValue::String(raw.to_string());
    }
    if let Ok(json) = serde_json::from_str::<serde_json::Value>(trimmed) {
        return ConfigValue::from(json);
    }
    if let Ok(int) = trimmed.parse::<i64>() {
        return ConfigValue::Integer(int);
    }
    if let Ok(float) = trimmed.parse::<f64>() {
        return ConfigValue::Float(float);
    }
    match trimmed.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" => ConfigValue::Boolean(true),
        "false" | "no" | "off" => ConfigValue::Boolean(false),
        _ => ConfigValue::String(raw.to_string()),
    }
}

/// Inserts a value under a segment path, building intermediate mappings.
/// A scalar in the way is replaced; the environment has no defined order,
/// so deeper writes win over shallower conflicting ones.
fn insert_segments(root: &mut BTreeMap<String, ConfigValue>, segments: &[String], value: ConfigValue) {
    let Some((first, rest)) = segments.split_first() else {
        return;
    };
    if rest.is_empty() {
        root.insert(first.clone(), value);
        return;
    }
    let slot = root
        .entry(first.clone())
        .or_insert_with(ConfigValue::empty_mapping);
    if !slot.is_mapping() {
        *slot = ConfigValue::empty_mapping();
    }
    if let Some(map) = slot.as_mapping_mut() {
        insert_segments(map, rest, value);
    }
}
