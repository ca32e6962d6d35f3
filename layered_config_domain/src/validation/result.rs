// /////////////////////////////////////////////////////////////////////////////
// Layered Configuration Resolver
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Validation Results and Diagnostics
//!
//! A validation run produces a triple: an outcome (ok or error), the
//! possibly-coerced value, and a list of diagnostics. `ok` means zero
//! error-severity diagnostics; warnings and infos ride along either way.
//! Every diagnostic carries a stable code and the full dotted path of the
//! offending value, so aggregated mapping-level results stay attributable.

use serde::{Deserialize, Serialize};

use crate::value_objects::config_value::ConfigValue;
use crate::value_objects::dot_path::DotPath;

/// Severity of a single diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// One finding produced by a validator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Stable machine-readable code (`missing`, `type`, `range`, ...).
    pub code: String,
    pub message: String,
    pub path: DotPath,
    /// The offending value, when attaching it aids debugging.
    pub value: Option<ConfigValue>,
}

impl Diagnostic {
    pub fn error(code: impl Into<String>, message: impl Into<String>, path: DotPath) -> Self {
        Self {
            severity: Severity::Error,
            code: code.into(),
            message: message.into(),
            path,
            value: None,
        }
    }

    pub fn warning(code: impl Into<String>, message: impl Into<String>, path: DotPath) -> Self {
        Self {
            severity: Severity::Warning,
            code: code.into(),
            message: message.into(),
            path,
            value: None,
        }
    }

    pub fn info(code: impl Into<String>, message: impl Into<String>, path: DotPath) -> Self {
        Self {
            severity: Severity::Info,
            code: code.into(),
            message: message.into(),
            path,
            value: None,
        }
    }

    /// Attaches the offending value.
    pub fn with_value(mut self, value: ConfigValue) -> Self {
        self.value = Some(value);
        self
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {} at {}: {}", self.severity, self.code, self.path, self.message)
    }
}

/// The outcome of running a validator (or a whole schema).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// The possibly-coerced value.
    pub value: ConfigValue,
    /// All findings, in the order they were produced.
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationResult {
    /// A clean pass-through of `value`.
    pub fn ok(value: ConfigValue) -> Self {
        Self {
            value,
            diagnostics: Vec::new(),
        }
    }

    /// A failed result carrying one error diagnostic.
    pub fn fail(value: ConfigValue, diagnostic: Diagnostic) -> Self {
        Self {
            value,
            diagnostics: vec![diagnostic],
        }
    }

    /// Appends a diagnostic.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Appends a warning to an otherwise unchanged result.
    pub fn with_warning(mut self, diagnostic: Diagnostic) -> Self {
        self.diagnostics.push(diagnostic);
        self
    }

    /// `true` iff no error-severity diagnostic is present. Warnings do not
    /// fail a validation.
    pub fn is_ok(&self) -> bool {
        !self.diagnostics.iter().any(|d| d.severity == Severity::Error)
    }

    /// Error-severity diagnostics.
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.severity == Severity::Error)
    }

    /// Warning-severity diagnostics.
    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.severity == Severity::Warning)
    }

    /// Folds another result's diagnostics into this one, keeping this
    /// result's value.
    pub fn absorb_diagnostics(&mut self, other: ValidationResult) {
        self.diagnostics.extend(other.diagnostics);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_with_warnings_is_still_ok() {
        let result = ValidationResult::ok(ConfigValue::Integer(1))
            .with_warning(Diagnostic::warning("deprecated", "use 'port'", DotPath::new("p")));
        assert!(result.is_ok());
        assert_eq!(result.warnings().count(), 1);
        assert_eq!(result.errors().count(), 0);
    }

    #[test]
    fn test_fail_reports_errors() {
        let result = ValidationResult::fail(
            ConfigValue::Null,
            Diagnostic::error("missing", "required value absent", DotPath::new("name")),
        );
        assert!(!result.is_ok());
        assert_eq!(result.errors().next().map(|d| d.code.as_str()), Some("missing"));
    }

    #[test]
    fn test_display_carries_path_and_code() {
        let diag = Diagnostic::error("range", "80 is below 1024", DotPath::new("server.port"));
        let text = diag.to_string();
        assert!(text.contains("server.port"));
        assert!(text.contains("range"));
    }
}
