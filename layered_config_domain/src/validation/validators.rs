// /////////////////////////////////////////////////////////////////////////////
// Layered Configuration Resolver
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Built-in Validators
//!
//! A validator is a pure function from `(value, context)` to a validation
//! result; configuration arguments are the only state it carries, and the
//! result is its only output channel. The built-in set covers the common
//! declarative needs:
//!
//! - [`TypeValidator`] - confirms (or, leniently, coerces to) a kind
//! - [`RequiredValidator`] - fails with code `missing` on null
//! - [`RangeValidator`] - inclusive numeric bounds
//! - [`LengthValidator`] - string / sequence length bounds
//! - [`ChoicesValidator`] - membership in a fixed set
//! - [`PatternValidator`] - anchored regular-expression match
//! - [`EmailValidator`] - convenience address pattern
//! - [`CompositeValidator`] - ordered chain; short-circuits on the first
//!   *error* while collecting warnings from every validator it ran, feeding
//!   each validator the (possibly coerced) output of the previous one
//!
//! Malformed validator configuration (an invalid pattern, an empty choice
//! set) is a control-plane error surfaced from the constructor, not from
//! `validate`.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::config_error::ConfigError;
use crate::validation::context::ValidationContext;
use crate::validation::result::{Diagnostic, ValidationResult};
use crate::value_objects::config_value::{ConfigValue, ValueKind};

/// A pure validation step.
pub trait Validator: Send + Sync {
    /// Stable validator name for diagnostics and logs.
    fn name(&self) -> &'static str;

    /// Validates `value` under `ctx`, returning the possibly-coerced value
    /// and any findings.
    fn validate(&self, value: &ConfigValue, ctx: &ValidationContext) -> ValidationResult;
}

/// Shared handle to a validator; chains clone these freely.
pub type ValidatorRef = Arc<dyn Validator>;

// ---------------------------------------------------------------------------
// type(T)
// ---------------------------------------------------------------------------

/// Confirms the value's kind, coercing safely in lenient mode.
///
/// Lenient coercions: strings parse into booleans, integers, and floats;
/// integers widen to floats; whole floats narrow to integers; scalars
/// render to strings. Strict mode rejects any mismatch.
#[derive(Debug, Clone)]
pub struct TypeValidator {
    expected: ValueKind,
}

impl TypeValidator {
    pub fn new(expected: ValueKind) -> Self {
        Self { expected }
    }

    fn coerce(&self, value: &ConfigValue) -> Option<ConfigValue> {
        match self.expected {
            ValueKind::Boolean => value.coerce_bool().map(ConfigValue::Boolean),
            ValueKind::Integer => match value {
                ConfigValue::Float(f) if f.fract() == 0.0 => Some(ConfigValue::Integer(*f as i64)),
                ConfigValue::String(_) => value.coerce_int().map(ConfigValue::Integer),
                _ => None,
            },
            ValueKind::Float => value.coerce_float().map(ConfigValue::Float),
            ValueKind::String => match value {
                ConfigValue::Boolean(b) => Some(ConfigValue::String(b.to_string())),
                ConfigValue::Integer(i) => Some(ConfigValue::String(i.to_string())),
                ConfigValue::Float(f) => Some(ConfigValue::String(f.to_string())),
                _ => None,
            },
            _ => None,
        }
    }
}

impl Validator for TypeValidator {
    fn name(&self) -> &'static str {
        "type"
    }

    fn validate(&self, value: &ConfigValue, ctx: &ValidationContext) -> ValidationResult {
        if value.kind() == self.expected {
            return ValidationResult::ok(value.clone());
        }
        if ctx.is_lenient() {
            if let Some(coerced) = self.coerce(value) {
                return ValidationResult::ok(coerced);
            }
        }
        ValidationResult::fail(
            value.clone(),
            Diagnostic::error(
                "type",
                format!("expected {}, found {}", self.expected, value.kind()),
                ctx.path().clone(),
            )
            .with_value(value.clone()),
        )
    }
}

// ---------------------------------------------------------------------------
// required
// ---------------------------------------------------------------------------

/// Fails with code `missing` when the value is null (the schema models an
/// absent key as null before validators run).
#[derive(Debug, Clone, Default)]
pub struct RequiredValidator;

impl Validator for RequiredValidator {
    fn name(&self) -> &'static str {
        "required"
    }

    fn validate(&self, value: &ConfigValue, ctx: &ValidationContext) -> ValidationResult {
        if value.is_null() {
            ValidationResult::fail(
                value.clone(),
                Diagnostic::error("missing", "required value is missing", ctx.path().clone()),
            )
        } else {
            ValidationResult::ok(value.clone())
        }
    }
}

// ---------------------------------------------------------------------------
// range(min?, max?)
// ---------------------------------------------------------------------------

/// Inclusive numeric bounds.
#[derive(Debug, Clone)]
pub struct RangeValidator {
    min: Option<f64>,
    max: Option<f64>,
}

impl RangeValidator {
    pub fn new(min: Option<f64>, max: Option<f64>) -> Self {
        Self { min, max }
    }

    pub fn at_least(min: f64) -> Self {
        Self::new(Some(min), None)
    }

    pub fn at_most(max: f64) -> Self {
        Self::new(None, Some(max))
    }

    pub fn between(min: f64, max: f64) -> Self {
        Self::new(Some(min), Some(max))
    }
}

impl Validator for RangeValidator {
    fn name(&self) -> &'static str {
        "range"
    }

    fn validate(&self, value: &ConfigValue, ctx: &ValidationContext) -> ValidationResult {
        let Some(number) = value.coerce_float() else {
            return ValidationResult::fail(
                value.clone(),
                Diagnostic::error(
                    "range",
                    format!("expected a numeric value, found {}", value.kind()),
                    ctx.path().clone(),
                )
                .with_value(value.clone()),
            );
        };
        if let Some(min) = self.min {
            if number < min {
                return ValidationResult::fail(
                    value.clone(),
                    Diagnostic::error("range", format!("{number} is below the minimum {min}"), ctx.path().clone())
                        .with_value(value.clone()),
                );
            }
        }
        if let Some(max) = self.max {
            if number > max {
                return ValidationResult::fail(
                    value.clone(),
                    Diagnostic::error("range", format!("{number} is above the maximum {max}"), ctx.path().clone())
                        .with_value(value.clone()),
                );
            }
        }
        ValidationResult::ok(value.clone())
    }
}

// ---------------------------------------------------------------------------
// length(min?, max?)
// ---------------------------------------------------------------------------

/// Length bounds for strings (characters) and sequences (items).
#[derive(Debug, Clone)]
pub struct LengthValidator {
    min: Option<usize>,
    max: Option<usize>,
}

impl LengthValidator {
    pub fn new(min: Option<usize>, max: Option<usize>) -> Self {
        Self { min, max }
    }
}

impl Validator for LengthValidator {
    fn name(&self) -> &'static str {
        "length"
    }

    fn validate(&self, value: &ConfigValue, ctx: &ValidationContext) -> ValidationResult {
        let length = match value {
            ConfigValue::String(s) => s.chars().count(),
            ConfigValue::Sequence(items) => items.len(),
            other => {
                return ValidationResult::fail(
                    value.clone(),
                    Diagnostic::error(
                        "length",
                        format!("expected a string or sequence, found {}", other.kind()),
                        ctx.path().clone(),
                    ),
                );
            }
        };
        if let Some(min) = self.min {
            if length < min {
                return ValidationResult::fail(
                    value.clone(),
                    Diagnostic::error("length", format!("length {length} is below the minimum {min}"), ctx.path().clone()),
                );
            }
        }
        if let Some(max) = self.max {
            if length > max {
                return ValidationResult::fail(
                    value.clone(),
                    Diagnostic::error("length", format!("length {length} is above the maximum {max}"), ctx.path().clone()),
                );
            }
        }
        ValidationResult::ok(value.clone())
    }
}

// ---------------------------------------------------------------------------
// choices(set)
// ---------------------------------------------------------------------------

/// Membership in a fixed set of allowed values.
#[derive(Debug, Clone)]
pub struct ChoicesValidator {
    choices: Vec<ConfigValue>,
}

impl ChoicesValidator {
    /// Builds the validator; an empty set is a configuration mistake and is
    /// rejected synchronously.
    pub fn new(choices: Vec<ConfigValue>) -> Result<Self, ConfigError> {
        if choices.is_empty() {
            return Err(ConfigError::schema_error("choices validator needs at least one allowed value"));
        }
        Ok(Self { choices })
    }
}

impl Validator for ChoicesValidator {
    fn name(&self) -> &'static str {
        "choices"
    }

    fn validate(&self, value: &ConfigValue, ctx: &ValidationContext) -> ValidationResult {
        if self.choices.contains(value) {
            ValidationResult::ok(value.clone())
        } else {
            let rendered: Vec<String> = self.choices.iter().map(|c| c.canonical_string()).collect();
            ValidationResult::fail(
                value.clone(),
                Diagnostic::error(
                    "choices",
                    format!("value is not one of [{}]", rendered.join(", ")),
                    ctx.path().clone(),
                )
                .with_value(value.clone()),
            )
        }
    }
}

// ---------------------------------------------------------------------------
// pattern(regex)
// ---------------------------------------------------------------------------

/// Anchored regular-expression match over string values.
#[derive(Debug, Clone)]
pub struct PatternValidator {
    regex: Regex,
}

impl PatternValidator {
    /// Compiles and anchors the pattern. An invalid pattern is a
    /// control-plane error surfaced here, at construction.
    pub fn new(pattern: &str) -> Result<Self, ConfigError> {
        let anchored = format!("^(?:{pattern})$");
        let regex = Regex::new(&anchored)
            .map_err(|e| ConfigError::schema_error(format!("invalid pattern '{pattern}': {e}")))?;
        Ok(Self { regex })
    }
}

impl Validator for PatternValidator {
    fn name(&self) -> &'static str {
        "pattern"
    }

    fn validate(&self, value: &ConfigValue, ctx: &ValidationContext) -> ValidationResult {
        match value.as_str() {
            Some(text) if self.regex.is_match(text) => ValidationResult::ok(value.clone()),
            Some(_) => ValidationResult::fail(
                value.clone(),
                Diagnostic::error(
                    "pattern",
                    format!("value does not match {}", self.regex.as_str()),
                    ctx.path().clone(),
                )
                .with_value(value.clone()),
            ),
            None => ValidationResult::fail(
                value.clone(),
                Diagnostic::error(
                    "pattern",
                    format!("expected a string, found {}", value.kind()),
                    ctx.path().clone(),
                ),
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// email
// ---------------------------------------------------------------------------

// Known-good at compile time; compiled once and reused for all validations.
static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("email pattern is well-formed")
});

/// Convenience validator for email addresses.
#[derive(Debug, Clone, Default)]
pub struct EmailValidator;

impl Validator for EmailValidator {
    fn name(&self) -> &'static str {
        "email"
    }

    fn validate(&self, value: &ConfigValue, ctx: &ValidationContext) -> ValidationResult {
        match value.as_str() {
            Some(text) if EMAIL_REGEX.is_match(text) => ValidationResult::ok(value.clone()),
            Some(text) => ValidationResult::fail(
                value.clone(),
                Diagnostic::error("email", format!("'{text}' is not a valid email address"), ctx.path().clone()),
            ),
            None => ValidationResult::fail(
                value.clone(),
                Diagnostic::error(
                    "email",
                    format!("expected a string, found {}", value.kind()),
                    ctx.path().clone(),
                ),
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// composite(validators[])
// ---------------------------------------------------------------------------

/// Ordered validator chain.
///
/// Each validator receives the (possibly coerced) output of the previous
/// one. The chain stops at the first error but keeps every warning gathered
/// along the way.
#[derive(Clone)]
pub struct CompositeValidator {
    validators: Vec<ValidatorRef>,
}

impl CompositeValidator {
    pub fn new(validators: Vec<ValidatorRef>) -> Self {
        Self { validators }
    }
}

impl Validator for CompositeValidator {
    fn name(&self) -> &'static str {
        "composite"
    }

    fn validate(&self, value: &ConfigValue, ctx: &ValidationContext) -> ValidationResult {
        let mut current = value.clone();
        let mut diagnostics = Vec::new();
        for validator in &self.validators {
            let step = validator.validate(&current, ctx);
            let failed = !step.is_ok();
            diagnostics.extend(step.diagnostics);
            if failed {
                return ValidationResult {
                    value: current,
                    diagnostics,
                };
            }
            current = step.value;
        }
        ValidationResult {
            value: current,
            diagnostics,
        }
    }
}
