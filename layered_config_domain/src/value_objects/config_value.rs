// /////////////////////////////////////////////////////////////////////////////
// Layered Configuration Resolver
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Configuration Value Tree
//!
//! This module provides the in-memory representation of composed
//! configuration: a recursive sum type over mappings, sequences, and
//! scalars, together with the three algorithms every other component leans
//! on:
//!
//! - **Deep merge**: mapping-aware combination of a lower-precedence tree
//!   with a higher-precedence one. Mappings are merged key-wise; sequences
//!   and scalars from the higher tree replace the lower value outright, and
//!   an explicit null from the higher tree wins over any lower value.
//! - **Dot-path access**: `get_path("database.pool.size")` walks nested
//!   mappings segment by segment. A missing segment or an intermediate
//!   non-mapping yields `None`; callers supply their own defaults.
//! - **Total coercion**: `coerce_bool` / `coerce_int` / `coerce_float` /
//!   `coerce_list` convert a value to the requested shape where a safe
//!   conversion exists and return `None` otherwise. They never panic and
//!   never error.
//!
//! ## Invariants
//!
//! - All mapping keys are strings; `BTreeMap` keeps iteration stable for
//!   diagnostics and canonical encoding.
//! - Trees are acyclic by construction (values are owned, never shared).
//! - A composed tree is never mutated in place; the composer replaces the
//!   whole tree atomically.
//!
//! ## Canonical encoding
//!
//! `canonical_string` renders a tree with sorted keys and stable scalar
//! encoding. Content-hash fingerprints for dynamic sources are derived from
//! this encoding, so two structurally equal trees always produce the same
//! fingerprint.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The kind of a configuration value, used by type validators and
/// diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Null,
    Boolean,
    Integer,
    Float,
    String,
    Sequence,
    Mapping,
}

impl ValueKind {
    /// Stable lowercase name used in diagnostic messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Null => "null",
            ValueKind::Boolean => "boolean",
            ValueKind::Integer => "integer",
            ValueKind::Float => "float",
            ValueKind::String => "string",
            ValueKind::Sequence => "sequence",
            ValueKind::Mapping => "mapping",
        }
    }
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A configuration value: nested mapping, sequence, or scalar.
///
/// This is the single data type flowing through sources, the merge engine,
/// the validators, and the public accessors. It is cheap to clone for
/// scalars and pays-as-it-goes for containers; composed trees are shared
/// behind `Arc` by the composer rather than cloned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Sequence(Vec<ConfigValue>),
    Mapping(BTreeMap<String, ConfigValue>),
}

impl ConfigValue {
    /// Creates an empty mapping, the identity element of deep merge.
    pub fn empty_mapping() -> Self {
        ConfigValue::Mapping(BTreeMap::new())
    }

    /// Returns the kind tag of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            ConfigValue::Null => ValueKind::Null,
            ConfigValue::Boolean(_) => ValueKind::Boolean,
            ConfigValue::Integer(_) => ValueKind::Integer,
            ConfigValue::Float(_) => ValueKind::Float,
            ConfigValue::String(_) => ValueKind::String,
            ConfigValue::Sequence(_) => ValueKind::Sequence,
            ConfigValue::Mapping(_) => ValueKind::Mapping,
        }
    }

    /// True when the value is a mapping.
    pub fn is_mapping(&self) -> bool {
        matches!(self, ConfigValue::Mapping(_))
    }

    /// True when the value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, ConfigValue::Null)
    }

    /// Borrows the underlying mapping, if this value is one.
    pub fn as_mapping(&self) -> Option<&BTreeMap<String, ConfigValue>> {
        match self {
            ConfigValue::Mapping(map) => Some(map),
            _ => None,
        }
    }

    /// Mutably borrows the underlying mapping, if this value is one.
    pub fn as_mapping_mut(&mut self) -> Option<&mut BTreeMap<String, ConfigValue>> {
        match self {
            ConfigValue::Mapping(map) => Some(map),
            _ => None,
        }
    }

    /// Borrows the underlying string, if this value is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Borrows the underlying sequence, if this value is one.
    pub fn as_sequence(&self) -> Option<&[ConfigValue]> {
        match self {
            ConfigValue::Sequence(items) => Some(items),
            _ => None,
        }
    }

    // ---------------------------------------------------------------------
    // Dot-path access
    // ---------------------------------------------------------------------

    /// Resolves a dot path against this value.
    ///
    /// Splits `path` on `.` and walks nested mappings. Returns `None` when a
    /// segment is missing or an intermediate value is not a mapping. Numeric
    /// indices into sequences are not supported.
    pub fn get_path(&self, path: &str) -> Option<&ConfigValue> {
        if path.is_empty() {
            return Some(self);
        }
        let mut current = self;
        for segment in path.split('.') {
            match current {
                ConfigValue::Mapping(map) => {
                    current = map.get(segment)?;
                }
                _ => return None,
            }
        }
        Some(current)
    }

    /// Inserts `value` at `path`, creating intermediate mappings as needed.
    ///
    /// Used by sources that assemble nested trees from flat key material
    /// (environment variables, secret mappings). An intermediate non-mapping
    /// value is replaced by a mapping; the last writer wins, matching merge
    /// semantics.
    pub fn set_path(&mut self, path: &str, value: ConfigValue) {
        let mut segments = path.split('.').peekable();
        let mut current = self;
        while let Some(segment) = segments.next() {
            if !current.is_mapping() {
                *current = ConfigValue::empty_mapping();
            }
            let ConfigValue::Mapping(map) = current else {
                return;
            };
            if segments.peek().is_none() {
                map.insert(segment.to_string(), value);
                return;
            }
            current = map
                .entry(segment.to_string())
                .or_insert_with(ConfigValue::empty_mapping);
        }
    }

    // ---------------------------------------------------------------------
    // Deep merge
    // ---------------------------------------------------------------------

    /// Deep-merges `higher` over `self` and returns the combined tree.
    ///
    /// `self` is the lower-precedence value. Keys present in only one
    /// mapping carry through; keys present in both recurse when both values
    /// are mappings and otherwise take the higher value. Sequences are
    /// replaced, never concatenated. An explicit null in `higher` replaces
    /// any lower value.
    pub fn deep_merge(&self, higher: &ConfigValue) -> ConfigValue {
        match (self, higher) {
            (ConfigValue::Mapping(lower_map), ConfigValue::Mapping(higher_map)) => {
                let mut merged = lower_map.clone();
                for (key, high_value) in higher_map {
                    match merged.get(key) {
                        Some(low_value) => {
                            let combined = low_value.deep_merge(high_value);
                            merged.insert(key.clone(), combined);
                        }
                        None => {
                            merged.insert(key.clone(), high_value.clone());
                        }
                    }
                }
                ConfigValue::Mapping(merged)
            }
            (_, other) => other.clone(),
        }
    }

    // ---------------------------------------------------------------------
    // Total coercions
    // ---------------------------------------------------------------------

    /// Coerces to a boolean where a safe conversion exists.
    ///
    /// Accepts native booleans, the case-insensitive strings
    /// `true|false|yes|no|on|off|1|0`, and the integers `1`/`0`.
    pub fn coerce_bool(&self) -> Option<bool> {
        match self {
            ConfigValue::Boolean(b) => Some(*b),
            ConfigValue::Integer(1) => Some(true),
            ConfigValue::Integer(0) => Some(false),
            ConfigValue::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "on" | "1" => Some(true),
                "false" | "no" | "off" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// Coerces to an integer where a safe conversion exists.
    ///
    /// Accepts integers, floats (truncated toward zero), and strings
    /// parseable as `i64`.
    pub fn coerce_int(&self) -> Option<i64> {
        match self {
            ConfigValue::Integer(i) => Some(*i),
            ConfigValue::Float(f) if f.is_finite() => Some(*f as i64),
            ConfigValue::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        }
    }

    /// Coerces to a float where a safe conversion exists.
    ///
    /// Accepts floats, integers, and strings parseable as `f64` (including
    /// scientific notation).
    pub fn coerce_float(&self) -> Option<f64> {
        match self {
            ConfigValue::Float(f) => Some(*f),
            ConfigValue::Integer(i) => Some(*i as f64),
            ConfigValue::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    /// Coerces to a list where a safe conversion exists.
    ///
    /// Accepts sequences directly and comma-separated strings; string items
    /// are trimmed and empty items dropped.
    pub fn coerce_list(&self) -> Option<Vec<ConfigValue>> {
        match self {
            ConfigValue::Sequence(items) => Some(items.clone()),
            ConfigValue::String(s) => Some(
                s.split(',')
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(|item| ConfigValue::String(item.to_string()))
                    .collect(),
            ),
            _ => None,
        }
    }

    // ---------------------------------------------------------------------
    // Canonical encoding & size
    // ---------------------------------------------------------------------

    /// Renders the value with sorted keys and stable scalar encoding.
    ///
    /// Two structurally equal trees always render identically, which is what
    /// makes content-hash fingerprints and cache keys stable across loads.
    pub fn canonical_string(&self) -> String {
        // BTreeMap keeps keys sorted, so plain JSON serialization is
        // already canonical.
        serde_json::to_string(self).unwrap_or_else(|_| String::from("null"))
    }

    /// Rough in-memory byte estimate, used for cache accounting.
    pub fn size_estimate(&self) -> usize {
        match self {
            ConfigValue::Null => 8,
            ConfigValue::Boolean(_) => 8,
            ConfigValue::Integer(_) => 8,
            ConfigValue::Float(_) => 8,
            ConfigValue::String(s) => 24 + s.len(),
            ConfigValue::Sequence(items) => 24 + items.iter().map(ConfigValue::size_estimate).sum::<usize>(),
            ConfigValue::Mapping(map) => {
                24 + map
                    .iter()
                    .map(|(key, value)| 24 + key.len() + value.size_estimate())
                    .sum::<usize>()
            }
        }
    }
}

impl Default for ConfigValue {
    fn default() -> Self {
        ConfigValue::Null
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        ConfigValue::Boolean(value)
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        ConfigValue::Integer(value)
    }
}

impl From<f64> for ConfigValue {
    fn from(value: f64) -> Self {
        ConfigValue::Float(value)
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        ConfigValue::String(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        ConfigValue::String(value)
    }
}

impl<T: Into<ConfigValue>> From<Vec<T>> for ConfigValue {
    fn from(values: Vec<T>) -> Self {
        ConfigValue::Sequence(values.into_iter().map(Into::into).collect())
    }
}

impl From<serde_json::Value> for ConfigValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => ConfigValue::Null,
            serde_json::Value::Bool(b) => ConfigValue::Boolean(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    ConfigValue::Integer(i)
                } else {
                    ConfigValue::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => ConfigValue::String(s),
            serde_json::Value::Array(items) => {
                ConfigValue::Sequence(items.into_iter().map(ConfigValue::from).collect())
            }
            serde_json::Value::Object(map) => ConfigValue::Mapping(
                map.into_iter().map(|(key, item)| (key, ConfigValue::from(item))).collect(),
            ),
        }
    }
}
