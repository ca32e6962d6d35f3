// /////////////////////////////////////////////////////////////////////////////
// Layered Configuration Resolver
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # INI File Source
//!
//! Loads a configuration mapping from an INI file with the de facto
//! semantics: `[section]` headers, `key = value` pairs, semicolon or hash
//! comments, and a `DEFAULT` section whose keys are inherited by every
//! other section. Keys outside any section land at the tree root; each
//! section becomes a nested mapping, so `[server] port = 1` reads as
//! `server.port`.
//!
//! Scalar values are coerced: the word booleans
//! (`true|false|yes|no|on|off`, case-insensitive) become booleans, integer
//! and float literals become numbers, everything else stays a string. Bare
//! `1`/`0` stay integers so numeric keys survive; boolean reads of such
//! keys still succeed because the tree's boolean coercion accepts them.
//!
//! An optional section restriction flattens a single section into the
//! root mapping.

use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use ini::Ini;
use layered_config_domain::{ConfigSource, ConfigValue, Fingerprint, SourceKind, SourceMetadata};
use parking_lot::Mutex;
use tracing::{debug, warn};

use super::file_format::FileFormat;
use super::file_support::{check_extension, mtime_fingerprint, probe_readable, read_utf8};

const DEFAULT_SECTION: &str = "DEFAULT";

/// Configuration source backed by an INI file.
pub struct IniFileSource {
    path: PathBuf,
    section: Option<String>,
    metadata: Mutex<SourceMetadata>,
}

impl IniFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        check_extension(&path, FileFormat::Ini);
        let metadata = SourceMetadata::new(SourceKind::Ini, path.display().to_string());
        Self {
            path,
            section: None,
            metadata: Mutex::new(metadata),
        }
    }

    /// Restricts loading to a single section, producing a flat mapping of
    /// that section's keys.
    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

#[async_trait]
impl ConfigSource for IniFileSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Ini
    }

    fn origin(&self) -> String {
        match &self.section {
            Some(section) => format!("{}#{section}", self.path.display()),
            None => self.path.display().to_string(),
        }
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
        let ini = match Ini::load_from_str(&text) {
            Ok(ini) => ini,
            Err(error) => {
                let error = format!("invalid INI in {}: {error}", self.path.display());
                warn!(source = %self.describe(), %error, "parse failed");
                self.metadata.lock().record_failure(error);
                return ConfigValue::empty_mapping();
            }
        };

        let value = match &self.section {
            Some(wanted) => match flatten_section(&ini, wanted) {
                Some(value) => value,
                None => {
                    let error = format!("section '{wanted}' not found in {}", self.path.display());
                    warn!(source = %self.describe(), %error, "section missing");
                    self.metadata.lock().record_failure(error);
                    return ConfigValue::empty_mapping();
                }
            },
            None => nest_sections(&ini),
        };

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

/// Coerces an INI scalar: word booleans, then integers, then floats, else
/// the raw string.
fn coerce_ini_scalar(raw: &str) -> ConfigValue {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" => return ConfigValue::Boolean(true),
        "false" | "no" | "off" => return ConfigValue::Boolean(false),
        _ => {}
    }
    if let Ok(int) = raw.parse::<i64>() {
        return ConfigValue::Integer(int);
    }
    if let Ok(float) = raw.parse::<f64>() {
        return ConfigValue::Float(float);
    }
    ConfigValue::String(raw.to_string())
}

/// Keys of the `DEFAULT` section, inherited by every named section.
fn default_pairs(ini: &Ini) -> BTreeMap<String, ConfigValue> {
    ini.section(Some(DEFAULT_SECTION))
        .map(|props| {
            props
                .iter()
                .map(|(key, value)| (key.to_string(), coerce_ini_scalar(value)))
                .collect()
        })
        .unwrap_or_default()
}

/// Full-file layout: sectionless keys at the root, one nested mapping per
/// named section with DEFAULT inherited.
fn nest_sections(ini: &Ini) -> ConfigValue {
    let defaults = default_pairs(ini);
    let mut root: BTreeMap<String, ConfigValue> = BTreeMap::new();

    if let Some(general) = ini.section(None::<String>) {
        for (key, value) in general.iter() {
            root.insert(key.to_string(), coerce_ini_scalar(value));
        }
    }

    for section in ini.sections().flatten() {
        if section == DEFAULT_SECTION {
            continue;
        }
        let mut entries = defaults.clone();
        if let Some(props) = ini.section(Some(section)) {
            for (key, value) in props.iter() {
                entries.insert(key.to_string(), coerce_ini_scalar(value));
            }
        }
        root.insert(section.to_string(), ConfigValue::Mapping(entries));
    }

    ConfigValue::Mapping(root)
}

/// Restricted layout: a single section flattened to the root, DEFAULT
/// inherited.
fn flatten_section(ini: &Ini, wanted: &str) -> Option<ConfigValue> {
    let props = ini.section(Some(wanted))?;
    let mut entries = default_pairs(ini);
    for (key, value) in props.iter() {
        entries.insert(key.to_string(), coerce_ini_scalar(value));
    }
    Some(ConfigValue::Mapping(entries))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_temp(content: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.ini");
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn test_scalar_coercion() {
        assert_eq!(coerce_ini_scalar("YES"), ConfigValue::Boolean(true));
        assert_eq!(coerce_ini_scalar("off"), ConfigValue::Boolean(false));
        assert_eq!(coerce_ini_scalar("42"), ConfigValue::Integer(42));
        assert_eq!(coerce_ini_scalar("-7"), ConfigValue::Integer(-7));
        assert_eq!(coerce_ini_scalar("2.5e3"), ConfigValue::Float(2500.0));
        assert_eq!(coerce_ini_scalar("plain"), ConfigValue::from("plain"));
        // Bare digits stay integers; boolean reads still coerce them.
        assert_eq!(coerce_ini_scalar("1"), ConfigValue::Integer(1));
        assert_eq!(ConfigValue::Integer(1).coerce_bool(), Some(true));
    }

    #[tokio::test]
    async fn test_sections_nest_under_their_names() {
        let (_dir, path) = write_temp("top = level\n\n[server]\nhost = example.org\nport = 8080\ndebug = YES\n");
        let source = IniFileSource::new(&path);
        let tree = source.load().await;
        assert_eq!(tree.get_path("top"), Some(&ConfigValue::from("level")));
        assert_eq!(tree.get_path("server.port"), Some(&ConfigValue::Integer(8080)));
        assert_eq!(tree.get_path("server.debug"), Some(&ConfigValue::Boolean(true)));
    }

    #[tokio::test]
    async fn test_default_section_inherited() {
        let (_dir, path) = write_temp("[DEFAULT]\nretries = 3\n\n[api]\nhost = a\n\n[worker]\nretries = 5\n");
        let source = IniFileSource::new(&path);
        let tree = source.load().await;
        assert_eq!(tree.get_path("api.retries"), Some(&ConfigValue::Integer(3)));
        assert_eq!(tree.get_path("worker.retries"), Some(&ConfigValue::Integer(5)));
        // DEFAULT itself is not emitted as a section.
        assert_eq!(tree.get_path("DEFAULT"), None);
    }

    #[tokio::test]
    async fn test_section_restriction_flattens() {
        let (_dir, path) = write_temp("[DEFAULT]\nregion = us\n\n[db]\nhost = h1\n");
        let source = IniFileSource::new(&path).with_section("db");
        let tree = source.load().await;
        assert_eq!(tree.get_path("host"), Some(&ConfigValue::from("h1")));
        assert_eq!(tree.get_path("region"), Some(&ConfigValue::from("us")));

        let missing = IniFileSource::new(&path).with_section("nope");
        assert_eq!(missing.load().await, ConfigValue::empty_mapping());
        assert_eq!(missing.metadata().load_failures, 1);
    }

    #[tokio::test]
    async fn test_comments_are_ignored() {
        let (_dir, path) = write_temp("; leading comment\n[s]\nkey = v  \n# another\n");
        let source = IniFileSource::new(&path);
        let tree = source.load().await;
        assert_eq!(tree.get_path("s.key"), Some(&ConfigValue::from("v")));
    }
}
