// /////////////////////////////////////////////////////////////////////////////
// Layered Configuration Resolver
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Configuration Profiles
//!
//! Named configuration contexts with optional single-parent inheritance.
//! Profiles never alter merge semantics; they parameterize which
//! profile-specific files the composer looks for and carry auxiliary
//! variables resolved shallow-to-deep along the parent chain (the child
//! overrides its ancestors).
//!
//! The registry ships the five reserved base profiles and accepts
//! case-insensitive aliases (`dev`, `develop`, `local` map to
//! `development`; `test` to `testing`; `stage` to `staging`; `prod` to
//! `production`). Parent links must form a tree: a registration that would
//! introduce a cycle is rejected synchronously, as is a parent that is not
//! registered yet.
//!
//! Auto-detection is pure: it scans an ordered list of well-known
//! environment variable names through a caller-supplied lookup, so the
//! registry itself never touches the process environment.

use std::collections::BTreeMap;

use crate::error::config_error::ConfigError;
use crate::value_objects::config_value::ConfigValue;

/// Reserved base profile names, always registered.
pub const RESERVED_PROFILES: [&str; 5] = ["base", "development", "testing", "staging", "production"];

/// Ordered environment variable names scanned by auto-detection; the first
/// non-empty value wins.
pub const DETECTION_ENV_VARS: [&str; 3] = ["ENVIRONMENT", "ENV", "APP_ENV"];

/// A named configuration profile.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    name: String,
    parent: Option<String>,
    variables: BTreeMap<String, ConfigValue>,
    active: bool,
}

impl Profile {
    /// Creates a root profile with no parent.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            variables: BTreeMap::new(),
            active: false,
        }
    }

    /// Sets the parent profile name.
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Adds a profile-scoped variable.
    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<ConfigValue>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    pub fn variables(&self) -> &BTreeMap<String, ConfigValue> {
        &self.variables
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

/// Registry of profiles with inheritance and active-profile selection.
#[derive(Debug, Clone)]
pub struct ProfileManager {
    profiles: BTreeMap<String, Profile>,
    active: String,
}

impl ProfileManager {
    /// Creates a registry holding the reserved profiles, with
    /// `development` active.
    pub fn new() -> Self {
        let mut profiles = BTreeMap::new();
        profiles.insert("base".to_string(), Profile::new("base"));
        for name in RESERVED_PROFILES.iter().skip(1) {
            profiles.insert(name.to_string(), Profile::new(*name).with_parent("base"));
        }
        let mut manager = Self {
            profiles,
            active: "development".to_string(),
        };
        manager.mark_active();
        manager
    }

    /// Maps aliases and case onto the canonical profile name.
    pub fn canonical_name(name: &str) -> String {
        match name.trim().to_ascii_lowercase().as_str() {
            "dev" | "develop" | "local" => "development".to_string(),
            "test" => "testing".to_string(),
            "stage" => "staging".to_string(),
            "prod" => "production".to_string(),
            other => other.to_string(),
        }
    }

    /// Registers a user-defined profile.
    ///
    /// Rejects duplicate names, parents that are not registered, and parent
    /// links that would close a cycle.
    pub fn register(&mut self, profile: Profile) -> Result<(), ConfigError> {
        let name = Self::canonical_name(profile.name());
        if self.profiles.contains_key(&name) {
            return Err(ConfigError::profile_error(format!("profile '{name}' already registered")));
        }
        if let Some(parent) = profile.parent() {
            let parent = Self::canonical_name(parent);
            if !self.profiles.contains_key(&parent) {
                return Err(ConfigError::profile_error(format!(
                    "parent profile '{parent}' is not registered"
                )));
            }
            // The parent chain is walked from the declared parent; reaching
            // the new name again would close a cycle once it is inserted.
            let mut cursor = Some(parent.clone());
            while let Some(current) = cursor {
                if current == name {
                    return Err(ConfigError::profile_error(format!(
                        "registering '{name}' with parent '{parent}' would create a cycle"
                    )));
                }
                cursor = self
                    .profiles
                    .get(&current)
                    .and_then(|p| p.parent())
                    .map(Self::canonical_name);
            }
        }
        let mut profile = profile;
        profile.name = name.clone();
        profile.parent = profile.parent.map(|p| Self::canonical_name(&p));
        self.profiles.insert(name, profile);
        Ok(())
    }

    /// Selects the active profile by name or alias.
    pub fn set_active(&mut self, name: &str) -> Result<(), ConfigError> {
        let name = Self::canonical_name(name);
        if !self.profiles.contains_key(&name) {
            return Err(ConfigError::profile_error(format!("unknown profile '{name}'")));
        }
        self.active = name;
        self.mark_active();
        Ok(())
    }

    /// The active profile's canonical name.
    pub fn active_name(&self) -> &str {
        &self.active
    }

    /// The active profile.
    pub fn active(&self) -> Option<&Profile> {
        self.profiles.get(&self.active)
    }

    /// Looks up a registered profile by name or alias.
    pub fn get(&self, name: &str) -> Option<&Profile> {
        self.profiles.get(&Self::canonical_name(name))
    }

    /// All registered profile names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.profiles.keys().map(String::as_str).collect()
    }

    /// Resolves a profile variable along the active inheritance chain.
    ///
    /// The child is consulted first, then each ancestor, so the deepest
    /// profile overrides the shallower ones.
    pub fn resolve_variable(&self, name: &str) -> Option<&ConfigValue> {
        let mut cursor = Some(self.active.clone());
        while let Some(current) = cursor {
            let profile = self.profiles.get(&current)?;
            if let Some(value) = profile.variables().get(name) {
                return Some(value);
            }
            cursor = profile.parent().map(Self::canonical_name);
        }
        None
    }

    /// Auto-detects the profile from environment-style lookups.
    ///
    /// Scans [`DETECTION_ENV_VARS`] in order through `lookup`; the first
    /// non-empty value wins and is canonicalized. Returns the detected name
    /// without changing the active selection.
    pub fn detect<F>(&self, lookup: F) -> Option<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        for var in DETECTION_ENV_VARS {
            if let Some(value) = lookup(var) {
                let trimmed = value.trim();
                if !trimmed.is_empty() {
                    return Some(Self::canonical_name(trimmed));
                }
            }
        }
        None
    }

    /// Auto-detects and activates the profile when the detected name is
    /// registered. Returns the activated name.
    pub fn detect_and_activate<F>(&mut self, lookup: F) -> Option<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let detected = self.detect(lookup)?;
        self.set_active(&detected).ok()?;
        Some(detected)
    }

    fn mark_active(&mut self) {
        let active = self.active.clone();
        for (name, profile) in self.profiles.iter_mut() {
            profile.active = *name == active;
        }
    }
}

impl Default for ProfileManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_profiles_present() {
        let manager = ProfileManager::new();
        for name in RESERVED_PROFILES {
            assert!(manager.get(name).is_some(), "{name}");
        }
        assert_eq!(manager.active_name(), "development");
        assert!(manager.active().unwrap().is_active());
    }

    #[test]
    fn test_alias_canonicalization() {
        assert_eq!(ProfileManager::canonical_name("DEV"), "development");
        assert_eq!(ProfileManager::canonical_name("local"), "development");
        assert_eq!(ProfileManager::canonical_name("Prod"), "production");
        assert_eq!(ProfileManager::canonical_name("stage"), "staging");
        assert_eq!(ProfileManager::canonical_name("test"), "testing");
        assert_eq!(ProfileManager::canonical_name("custom"), "custom");
    }

    #[test]
    fn test_set_active_accepts_alias() {
        let mut manager = ProfileManager::new();
        manager.set_active("prod").unwrap();
        assert_eq!(manager.active_name(), "production");
        assert!(manager.set_active("nope").is_err());
    }

    #[test]
    fn test_register_rejects_unknown_parent_and_cycles() {
        let mut manager = ProfileManager::new();
        let orphan = Profile::new("orphan").with_parent("missing");
        assert!(manager.register(orphan).is_err());

        manager.register(Profile::new("a").with_parent("base")).unwrap();
        manager.register(Profile::new("b").with_parent("a")).unwrap();
        // `a` is already an ancestor of `b`; a second `a` cannot exist, and a
        // profile whose chain reaches itself is rejected.
        let cyclic = Profile::new("c").with_parent("c");
        assert!(manager.register(cyclic).is_err());
    }

    #[test]
    fn test_variable_resolution_child_overrides_ancestor() {
        let mut manager = ProfileManager::new();
        manager
            .register(
                Profile::new("team")
                    .with_parent("base")
                    .with_variable("region", "us-east-1")
                    .with_variable("debug", false),
            )
            .unwrap();
        manager
            .register(
                Profile::new("team-eu")
                    .with_parent("team")
                    .with_variable("region", "eu-west-1"),
            )
            .unwrap();
        manager.set_active("team-eu").unwrap();
        assert_eq!(
            manager.resolve_variable("region"),
            Some(&ConfigValue::from("eu-west-1"))
        );
        assert_eq!(manager.resolve_variable("debug"), Some(&ConfigValue::Boolean(false)));
        assert_eq!(manager.resolve_variable("missing"), None);
    }

    #[test]
    fn test_detection_first_non_empty_wins() {
        let manager = ProfileManager::new();
        let detected = manager.detect(|var| match var {
            "ENVIRONMENT" => Some("   ".to_string()),
            "ENV" => Some("prod".to_string()),
            _ => Some("dev".to_string()),
        });
        assert_eq!(detected.as_deref(), Some("production"));

        let none = manager.detect(|_| None);
        assert_eq!(none, None);
    }

    #[test]
    fn test_detect_and_activate() {
        let mut manager = ProfileManager::new();
        let activated = manager.detect_and_activate(|var| (var == "APP_ENV").then(|| "stage".to_string()));
        assert_eq!(activated.as_deref(), Some("staging"));
        assert_eq!(manager.active_name(), "staging");
    }
}
