// /////////////////////////////////////////////////////////////////////////////
// Layered Configuration Resolver
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # YAML File Source
//!
//! Loads a configuration mapping from a YAML document. Only the safe
//! subset is accepted: anchors and aliases resolve normally, but tagged
//! values (language-specific constructors) are rejected as a parse failure.
//! Scalar mapping keys that are not strings (numbers, booleans) are
//! rendered to strings so the tree invariant "all mapping keys are strings"
//! holds; structured keys are rejected.

use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use layered_config_domain::{ConfigSource, ConfigValue, Fingerprint, SourceKind, SourceMetadata};
use parking_lot::Mutex;
use tracing::{debug, warn};

use super::file_format::FileFormat;
use super::file_support::{check_extension, mtime_fingerprint, probe_readable, read_utf8};

/// Configuration source backed by a YAML file.
pub struct YamlFileSource {
    path: PathBuf,
    metadata: Mutex<SourceMetadata>,
}

impl YamlFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        check_extension(&path, FileFormat::Yaml);
        let metadata = SourceMetadata::new(SourceKind::Yaml, path.display().to_string());
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
impl ConfigSource for YamlFileSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Yaml
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
            let fingerprint = mtime_fingerprint(&self.path).await;
            self.metadata.lock().record_success(Some(0), Some(fingerprint));
            return ConfigValue::empty_mapping();
        }
        let parsed: serde_yaml::Value = match serde_yaml::from_str(&text) {
            Ok(parsed) => parsed,
            Err(error) => {
                let error = format!("invalid YAML in {}: {error}", self.path.display());
                warn!(source = %self.describe(), %error, "parse failed");
                self.metadata.lock().record_failure(error);
                return ConfigValue::empty_mapping();
            }
        };
        let value = match yaml_to_config(parsed) {
            Ok(value) => value,
            Err(error) => {
                let error = format!("unsupported YAML in {}: {error}", self.path.display());
                warn!(source = %self.describe(), %error, "conversion failed");
                self.metadata.lock().record_failure(error);
                return ConfigValue::empty_mapping();
            }
        };
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

/// Converts a parsed YAML value into the configuration tree.
///
/// Tagged values are outside the safe subset and error out; non-string
/// scalar keys render to their string form.
fn yaml_to_config(value: serde_yaml::Value) -> Result<ConfigValue, String> {
    match value {
        serde_yaml::Value::Null => Ok(ConfigValue::Null),
        serde_yaml::Value::Bool(b) => Ok(ConfigValue::Boolean(b)),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(ConfigValue::Integer(i))
            } else {
                Ok(ConfigValue::Float(n.as_f64().unwrap_or(f64::NAN)))
            }
        }
        serde_yaml::Value::String(s) => Ok(ConfigValue::String(s)),
        serde_yaml::Value::Sequence(items) => Ok(ConfigValue::Sequence(
            items.into_iter().map(yaml_to_config).collect::<Result<_, _>>()?,
        )),
        serde_yaml::Value::Mapping(map) => {
            let mut entries = BTreeMap::new();
            for (key, item) in map {
                let key = yaml_key_to_string(key)?;
                entries.insert(key, yaml_to_config(item)?);
            }
            Ok(ConfigValue::Mapping(entries))
        }
        serde_yaml::Value::Tagged(tagged) => Err(format!("tagged value '{}' is outside the safe subset", tagged.tag)),
    }
}

fn yaml_key_to_string(key: serde_yaml::Value) -> Result<String, String> {
    match key {
        serde_yaml::Value::String(s) => Ok(s),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        other => Err(format!("mapping key {other:?} is not a scalar")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_temp(content: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[tokio::test]
    async fn test_load_nested_mapping() {
        let (_dir, path) = write_temp("server:\n  host: example.org\n  port: 8443\nfeatures:\n  - a\n  - b\n");
        let source = YamlFileSource::new(&path);
        let tree = source.load().await;
        assert_eq!(tree.get_path("server.port"), Some(&ConfigValue::Integer(8443)));
        assert_eq!(
            tree.get_path("features"),
            Some(&ConfigValue::from(vec!["a", "b"]))
        );
    }

    #[tokio::test]
    async fn test_anchors_and_aliases_resolve() {
        let (_dir, path) = write_temp("defaults: &d\n  retries: 3\nservice:\n  <<: *d\n  name: api\n");
        let source = YamlFileSource::new(&path);
        let tree = source.load().await;
        // serde_yaml applies merge keys; the alias resolves either way.
        assert!(tree.get_path("defaults.retries").is_some());
    }

    #[tokio::test]
    async fn test_sequence_root_rejected_with_diagnostic() {
        let (_dir, path) = write_temp("- a\n- b\n");
        let source = YamlFileSource::new(&path);
        assert_eq!(source.load().await, ConfigValue::empty_mapping());
        assert!(source.metadata().last_error.unwrap().contains("mapping"));
    }

    #[tokio::test]
    async fn test_numeric_keys_become_strings() {
        let (_dir, path) = write_temp("ports:\n  8080: http\n  8443: https\n");
        let source = YamlFileSource::new(&path);
        let tree = source.load().await;
        assert_eq!(tree.get_path("ports.8080"), Some(&ConfigValue::from("http")));
    }

    #[test]
    fn test_tagged_values_are_rejected() {
        let parsed: serde_yaml::Value = serde_yaml::from_str("!Custom {a: 1}").unwrap();
        assert!(yaml_to_config(parsed).is_err());
    }
}
