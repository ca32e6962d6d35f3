// /////////////////////////////////////////////////////////////////////////////
// Layered Configuration Resolver
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # JSON File Source
//!
//! Loads a configuration mapping from a JSON document. Duplicate keys are
//! resolved last-wins, matching every mainstream JSON parser, but each
//! duplicate is reported as a diagnostic because a duplicated key in a
//! config file is almost always a merge gone wrong. Detection happens in a
//! single pass with a `DeserializeSeed` that builds the tree directly.

use std::path::PathBuf;

use async_trait::async_trait;
use layered_config_domain::{ConfigSource, ConfigValue, Fingerprint, SourceKind, SourceMetadata};
use parking_lot::Mutex;
use serde::de::{DeserializeSeed, MapAccess, SeqAccess, Visitor};
use tracing::{debug, warn};

use super::file_format::FileFormat;
use super::file_support::{check_extension, mtime_fingerprint, probe_readable, read_utf8};

/// Configuration source backed by a JSON file.
pub struct JsonFileSource {
    path: PathBuf,
    metadata: Mutex<SourceMetadata>,
}

impl JsonFileSource {
    /// Creates the source. The file does not need to exist yet; an absent
    /// file simply reports as unavailable.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        check_extension(&path, FileFormat::Json);
        let metadata = SourceMetadata::new(SourceKind::Json, path.display().to_string());
        Self {
            path,
            metadata: Mutex::new(metadata),
        }
    }

    /// The backing file path.
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

#[async_trait]
impl ConfigSource for JsonFileSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Json
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
        if text.trim().is_empty() {
            // Empty file: empty mapping, no error diagnostic.
            let fingerprint = mtime_fingerprint(&self.path).await;
            self.metadata.lock().record_success(Some(0), Some(fingerprint));
            return ConfigValue::empty_mapping();
        }
        let (value, duplicates) = match parse_tracking_duplicates(&text) {
            Ok(parsed) => parsed,
            Err(error) => {
                let error = format!("invalid JSON in {}: {error}", self.path.display());
                warn!(source = %self.describe(), %error, "parse failed");
                self.metadata.lock().record_failure(error);
                return ConfigValue::empty_mapping();
            }
        };
        for path in duplicates {
            warn!(source = %self.describe(), key = %path, "duplicate key resolved last-wins");
        }
        if !value.is_mapping() {
            let error = format!("root of {} is {}, expected a mapping", self.path.display(), value.kind());
            warn!(source = %self.describe(), %error, "rejecting non-mapping root");
            self.metadata.lock().record_failure(error);
            return ConfigValue::empty_mapping();
        }
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

/// Parses JSON into a [`ConfigValue`] in one pass, recording the dotted
/// path of every duplicated mapping key.
fn parse_tracking_duplicates(text: &str) -> Result<(ConfigValue, Vec<String>), serde_json::Error> {
    let mut duplicates = Vec::new();
    let mut deserializer = serde_json::Deserializer::from_str(text);
    let seed = ValueSeed {
        path: String::new(),
        duplicates: &mut duplicates,
    };
    let value = seed.deserialize(&mut deserializer)?;
    deserializer.end()?;
    Ok((value, duplicates))
}

struct ValueSeed<'a> {
    path: String,
    duplicates: &'a mut Vec<String>,
}

impl<'de> DeserializeSeed<'de> for ValueSeed<'_> {
    type Value = ConfigValue;

    fn deserialize<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_any(ValueVisitor {
            path: self.path,
            duplicates: self.duplicates,
        })
    }
}

struct ValueVisitor<'a> {
    path: String,
    duplicates: &'a mut Vec<String>,
}

impl<'a> ValueVisitor<'a> {
    fn child_path(&self, key: &str) -> String {
        if self.path.is_empty() {
            key.to_string()
        } else {
            format!("{}.{key}", self.path)
        }
    }
}

impl<'de> Visitor<'de> for ValueVisitor<'_> {
    type Value = ConfigValue;

    fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str("any JSON value")
    }

    fn visit_bool<E>(self, value: bool) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        Ok(ConfigValue::Boolean(value))
    }

    fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        Ok(ConfigValue::Integer(value))
    }

    fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        Ok(i64::try_from(value)
            .map(ConfigValue::Integer)
            .unwrap_or(ConfigValue::Float(value as f64)))
    }

    fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        Ok(ConfigValue::Float(value))
    }

    fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        Ok(ConfigValue::String(value.to_string()))
    }

    fn visit_string<E>(self, value: String) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        Ok(ConfigValue::String(value))
    }

    fn visit_unit<E>(self) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        Ok(ConfigValue::Null)
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut items = Vec::new();
        let mut index = 0usize;
        loop {
            let seed = ValueSeed {
                path: format!("{}[{index}]", self.path),
                duplicates: &mut *self.duplicates,
            };
            match seq.next_element_seed(seed)? {
                Some(item) => items.push(item),
                None => break,
            }
            index += 1;
        }
        Ok(ConfigValue::Sequence(items))
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut entries = std::collections::BTreeMap::new();
        while let Some(key) = map.next_key::<String>()? {
            let child = self.child_path(&key);
            let seed = ValueSeed {
                path: child.clone(),
                duplicates: &mut *self.duplicates,
            };
            let value = map.next_value_seed(seed)?;
            if entries.insert(key, value).is_some() {
                self.duplicates.push(child);
            }
        }
        Ok(ConfigValue::Mapping(entries))
    }
}
