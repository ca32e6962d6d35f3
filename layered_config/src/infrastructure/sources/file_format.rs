// /////////////////////////////////////////////////////////////////////////////
// Layered Configuration Resolver
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # File Format Recognition
//!
//! Advisory mapping between file extensions and the structured formats the
//! file sources parse. Extension recognition never gates parsing: a source
//! handed a file with a foreign extension logs a warning and parses anyway.
//! The same table drives profile-specific config file discovery
//! (`config/<profile>.<ext>`).

use std::path::{Path, PathBuf};

use layered_config_domain::SourceKind;

/// A structured text format a file source can parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Json,
    Yaml,
    Toml,
    Ini,
}

impl FileFormat {
    /// Recognizes a format from the path's extension, if any.
    pub fn from_path(path: &Path) -> Option<FileFormat> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "json" => Some(FileFormat::Json),
            "yaml" | "yml" => Some(FileFormat::Yaml),
            "toml" => Some(FileFormat::Toml),
            "ini" | "cfg" | "conf" => Some(FileFormat::Ini),
            _ => None,
        }
    }

    /// Extensions conventionally carrying this format, preferred first.
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            FileFormat::Json => &["json"],
            FileFormat::Yaml => &["yaml", "yml"],
            FileFormat::Toml => &["toml"],
            FileFormat::Ini => &["ini", "cfg", "conf"],
        }
    }

    /// The source kind tag for this format.
    pub fn source_kind(&self) -> SourceKind {
        match self {
            FileFormat::Json => SourceKind::Json,
            FileFormat::Yaml => SourceKind::Yaml,
            FileFormat::Toml => SourceKind::Toml,
            FileFormat::Ini => SourceKind::Ini,
        }
    }
}

/// Discovery order for profile configuration files.
const DISCOVERY_ORDER: [FileFormat; 4] = [FileFormat::Toml, FileFormat::Yaml, FileFormat::Json, FileFormat::Ini];

/// Resolves `dir/<profile>.<ext>` across the known formats, preferred
/// format first. Returns the first path that exists.
pub fn profile_config_path(dir: &Path, profile: &str) -> Option<PathBuf> {
    for format in DISCOVERY_ORDER {
        for extension in format.extensions() {
            let candidate = dir.join(format!("{profile}.{extension}"));
            if candidate.is_file() {
                return Some(candidate);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_recognition() {
        assert_eq!(FileFormat::from_path(Path::new("app.json")), Some(FileFormat::Json));
        assert_eq!(FileFormat::from_path(Path::new("app.YML")), Some(FileFormat::Yaml));
        assert_eq!(FileFormat::from_path(Path::new("app.conf")), Some(FileFormat::Ini));
        assert_eq!(FileFormat::from_path(Path::new("app.txt")), None);
        assert_eq!(FileFormat::from_path(Path::new("noext")), None);
    }

    #[test]
    fn test_profile_discovery_prefers_toml() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("production.yaml"), "a: 1").unwrap();
        std::fs::write(dir.path().join("production.toml"), "a = 1").unwrap();
        let found = profile_config_path(dir.path(), "production").unwrap();
        assert_eq!(found.extension().and_then(|e| e.to_str()), Some("toml"));
        assert!(profile_config_path(dir.path(), "staging").is_none());
    }
}
