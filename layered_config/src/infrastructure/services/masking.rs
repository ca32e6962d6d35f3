// /////////////////////////////////////////////////////////////////////////////
// Layered Configuration Resolver
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Sensitive-Key Masking Service
//!
//! Heuristic redaction of configuration trees before they are displayed or
//! logged. A scalar is masked when its *key* matches the sensitive-name
//! pattern; structure, non-matching scalars, and key names themselves are
//! left intact. Masking always operates on a copy - the live tree is never
//! touched.
//!
//! The default pattern covers the usual suspects (`password`, `secret`,
//! `token`, `api_key`, `credential`, ...). Callers with unusual naming
//! conventions supply their own pattern.

use layered_config_domain::{ConfigError, ConfigValue};
use once_cell::sync::Lazy;
use regex::Regex;

/// Replacement string for masked scalars.
const MASK: &str = "******";

// Known-good at compile time; compiled once and reused for every pass.
static SENSITIVE_KEY_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(password|passwd|secret|token|api_?key|private_?key|credential|auth)")
        .expect("sensitive-key pattern is well-formed")
});

/// Configuration for the masking pass.
#[derive(Debug, Clone)]
pub struct MaskingConfig {
    pattern: Regex,
}

impl MaskingConfig {
    /// Uses a caller-supplied sensitive-name pattern. An invalid pattern
    /// is a control-plane error surfaced here.
    pub fn with_pattern(pattern: &str) -> Result<Self, ConfigError> {
        let pattern = Regex::new(pattern)
            .map_err(|e| ConfigError::validation_error(format!("invalid masking pattern '{pattern}': {e}")))?;
        Ok(Self { pattern })
    }

    /// True when `key` names a sensitive value.
    pub fn is_sensitive(&self, key: &str) -> bool {
        self.pattern.is_match(key)
    }
}

impl Default for MaskingConfig {
    fn default() -> Self {
        Self {
            pattern: SENSITIVE_KEY_REGEX.clone(),
        }
    }
}

/// Produces redacted copies of configuration trees.
#[derive(Debug, Clone, Default)]
pub struct MaskingService {
    config: MaskingConfig,
}

impl MaskingService {
    pub fn new(config: MaskingConfig) -> Self {
        Self { config }
    }

    /// Returns a copy of `tree` with every scalar under a sensitive key
    /// replaced by the mask. Sequences under a sensitive key are masked
    /// element-wise; nested mappings keep their structure and are walked
    /// normally (their own keys decide).
    pub fn mask_tree(&self, tree: &ConfigValue) -> ConfigValue {
        self.mask_value(tree, false)
    }

    /// Renders the masked copy as indented JSON for display.
    pub fn to_masked_string(&self, tree: &ConfigValue) -> String {
        let masked = self.mask_tree(tree);
        serde_json::to_string_pretty(&masked).unwrap_or_else(|_| MASK.to_string())
    }

    fn mask_value(&self, value: &ConfigValue, under_sensitive_key: bool) -> ConfigValue {
        match value {
            ConfigValue::Mapping(map) => ConfigValue::Mapping(
                map.iter()
                    .map(|(key, item)| {
                        let sensitive = self.config.is_sensitive(key);
                        (key.clone(), self.mask_value(item, sensitive))
                    })
                    .collect(),
            ),
            ConfigValue::Sequence(items) => ConfigValue::Sequence(
                items
                    .iter()
                    .map(|item| self.mask_value(item, under_sensitive_key))
                    .collect(),
            ),
            ConfigValue::Null => ConfigValue::Null,
            _ if under_sensitive_key => ConfigValue::String(MASK.to_string()),
            scalar => scalar.clone(),
        }
    }
}
