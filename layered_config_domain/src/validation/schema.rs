// /////////////////////////////////////////////////////////////////////////////
// Layered Configuration Resolver
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Declarative Schema
//!
//! A schema describes a mapping: per-key fields (expected kind, default,
//! required flag, extra validators) or nested sub-schemas. A schema lowers
//! to a composite validator per field: `required` first when the field is
//! marked required, then the declared kind as a `type` validator, then the
//! user-supplied validators in order. Missing keys with defaults are
//! populated before validation runs.
//!
//! Validation across a mapping collects diagnostics for *every* failing
//! field - there is no cross-field short-circuit - while each field's own
//! chain short-circuits on its first error. Unknown keys pass by default;
//! the `strict_keys` flag turns them into errors.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::validation::context::ValidationContext;
use crate::validation::result::{Diagnostic, ValidationResult};
use crate::validation::validators::{
    CompositeValidator, RequiredValidator, TypeValidator, Validator, ValidatorRef,
};
use crate::value_objects::config_value::{ConfigValue, ValueKind};

/// Declaration of a single mapping key.
#[derive(Clone, Default)]
pub struct SchemaField {
    kind: Option<ValueKind>,
    required: bool,
    default: Option<ConfigValue>,
    validators: Vec<ValidatorRef>,
}

impl SchemaField {
    /// A field with no constraints.
    pub fn new() -> Self {
        Self::default()
    }

    /// A field expected to hold the given kind.
    pub fn of_kind(kind: ValueKind) -> Self {
        Self {
            kind: Some(kind),
            ..Self::default()
        }
    }

    /// Marks the field required; validation fails with code `missing` when
    /// it is absent or null.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Populates the field with `default` before validation when absent.
    pub fn with_default(mut self, default: impl Into<ConfigValue>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Appends a user validator; user validators run after the implicit
    /// `required` and `type` steps, in the order added.
    pub fn with_validator(mut self, validator: ValidatorRef) -> Self {
        self.validators.push(validator);
        self
    }

    fn lower(&self) -> CompositeValidator {
        let mut chain: Vec<ValidatorRef> = Vec::with_capacity(self.validators.len() + 2);
        if self.required {
            chain.push(Arc::new(RequiredValidator));
        }
        if let Some(kind) = self.kind {
            chain.push(Arc::new(TypeValidator::new(kind)));
        }
        chain.extend(self.validators.iter().cloned());
        CompositeValidator::new(chain)
    }
}

#[derive(Clone)]
enum SchemaNode {
    Field(SchemaField),
    Nested(Schema),
}

/// Declarative description of a mapping.
#[derive(Clone, Default)]
pub struct Schema {
    fields: BTreeMap<String, SchemaNode>,
    strict_keys: bool,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a field.
    pub fn field(mut self, name: impl Into<String>, field: SchemaField) -> Self {
        self.fields.insert(name.into(), SchemaNode::Field(field));
        self
    }

    /// Declares a nested sub-schema.
    pub fn nested(mut self, name: impl Into<String>, schema: Schema) -> Self {
        self.fields.insert(name.into(), SchemaNode::Nested(schema));
        self
    }

    /// Rejects keys the schema does not declare.
    pub fn with_strict_keys(mut self) -> Self {
        self.strict_keys = true;
        self
    }

    /// Validates a mapping against this schema.
    ///
    /// Returns the coerced mapping (defaults filled in, lenient coercions
    /// applied) and every field-level diagnostic.
    pub fn validate(&self, value: &ConfigValue, ctx: &ValidationContext) -> ValidationResult {
        let Some(map) = value.as_mapping() else {
            return ValidationResult::fail(
                value.clone(),
                Diagnostic::error(
                    "type",
                    format!("expected mapping, found {}", value.kind()),
                    ctx.path().clone(),
                ),
            );
        };

        let mut out = map.clone();
        let mut diagnostics = Vec::new();

        for (name, node) in &self.fields {
            let child_ctx = ctx.child(name);
            match node {
                SchemaNode::Nested(schema) => {
                    // An absent nested group validates as an empty mapping,
                    // so required fields inside still report individually.
                    let nested_value = out.get(name).cloned().unwrap_or_else(ConfigValue::empty_mapping);
                    let result = schema.validate(&nested_value, &child_ctx);
                    diagnostics.extend(result.diagnostics);
                    out.insert(name.clone(), result.value);
                }
                SchemaNode::Field(field) => {
                    let present = out.contains_key(name);
                    let mut current = out.get(name).cloned().unwrap_or(ConfigValue::Null);
                    let mut defaulted = false;
                    if current.is_null() {
                        if let Some(default) = &field.default {
                            current = default.clone();
                            defaulted = true;
                        }
                    }
                    if current.is_null() && !field.required {
                        // Optional, absent, no default: nothing to validate.
                        continue;
                    }
                    let result = field.lower().validate(&current, &child_ctx);
                    diagnostics.extend(result.diagnostics);
                    if present || defaulted {
                        out.insert(name.clone(), result.value);
                    }
                }
            }
        }

        if self.strict_keys {
            for key in map.keys() {
                if !self.fields.contains_key(key) {
                    diagnostics.push(Diagnostic::error(
                        "unknown_key",
                        format!("key '{key}' is not declared by the schema"),
                        ctx.child(key).path().clone(),
                    ));
                }
            }
        }

        ValidationResult {
            value: ConfigValue::Mapping(out),
            diagnostics,
        }
    }

    /// Lowers the whole schema into a single validator over a mapping.
    pub fn compile(self) -> ValidatorRef {
        Arc::new(SchemaValidator { schema: self })
    }
}

impl std::fmt::Debug for Schema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Schema")
            .field("fields", &self.fields.keys().collect::<Vec<_>>())
            .field("strict_keys", &self.strict_keys)
            .finish()
    }
}

/// A schema packaged as a plain validator, so schemas compose with the
/// validator chain like any other step.
struct SchemaValidator {
    schema: Schema,
}

impl Validator for SchemaValidator {
    fn name(&self) -> &'static str {
        "schema"
    }

    fn validate(&self, value: &ConfigValue, ctx: &ValidationContext) -> ValidationResult {
        self.schema.validate(value, ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::context::ValidationLevel;
    use crate::validation::validators::RangeValidator;

    fn mapping(entries: Vec<(&str, ConfigValue)>) -> ConfigValue {
        ConfigValue::Mapping(
            entries
                .into_iter()
                .map(|(key, value)| (key.to_string(), value))
                .collect(),
        )
    }

    fn strict() -> ValidationContext {
        ValidationContext::root(ValidationLevel::Strict)
    }

    #[test]
    fn test_reports_every_failing_field() {
        let schema = Schema::new()
            .field("name", SchemaField::of_kind(ValueKind::String).required())
            .field(
                "port",
                SchemaField::of_kind(ValueKind::Integer)
                    .required()
                    .with_validator(Arc::new(RangeValidator::between(1024.0, 65535.0))),
            );
        let input = mapping(vec![("port", ConfigValue::Integer(80))]);
        let result = schema.validate(&input, &strict());
        assert!(!result.is_ok());
        let codes: Vec<&str> = result.errors().map(|d| d.code.as_str()).collect();
        assert!(codes.contains(&"missing"), "{codes:?}");
        assert!(codes.contains(&"range"), "{codes:?}");
    }

    #[test]
    fn test_defaults_populate_before_validation() {
        let schema = Schema::new().field(
            "retries",
            SchemaField::of_kind(ValueKind::Integer).with_default(3i64),
        );
        let result = schema.validate(&ConfigValue::empty_mapping(), &strict());
        assert!(result.is_ok());
        assert_eq!(result.value.get_path("retries"), Some(&ConfigValue::Integer(3)));
    }

    #[test]
    fn test_unknown_keys_allowed_unless_strict() {
        let schema = Schema::new().field("known", SchemaField::new());
        let input = mapping(vec![("extra", ConfigValue::Integer(1))]);
        assert!(schema.validate(&input, &strict()).is_ok());

        let strict_schema = Schema::new().field("known", SchemaField::new()).with_strict_keys();
        let result = strict_schema.validate(&input, &strict());
        assert_eq!(result.errors().next().map(|d| d.code.as_str()), Some("unknown_key"));
    }

    #[test]
    fn test_nested_schema_paths_in_diagnostics() {
        let schema = Schema::new().nested(
            "database",
            Schema::new().field("host", SchemaField::of_kind(ValueKind::String).required()),
        );
        let result = schema.validate(&ConfigValue::empty_mapping(), &strict());
        assert!(!result.is_ok());
        let diag = result.errors().next().unwrap();
        assert_eq!(diag.path.as_str(), "database.host");
    }

    #[test]
    fn test_nested_non_mapping_is_a_type_error() {
        let schema = Schema::new().nested("database", Schema::new());
        let input = mapping(vec![("database", ConfigValue::from("not a mapping"))]);
        let result = schema.validate(&input, &strict());
        assert_eq!(result.errors().next().map(|d| d.code.as_str()), Some("type"));
    }

    #[test]
    fn test_lenient_schema_coerces_field_values() {
        let schema = Schema::new().field("port", SchemaField::of_kind(ValueKind::Integer));
        let input = mapping(vec![("port", ConfigValue::from("8080"))]);
        let result = schema.validate(&input, &ValidationContext::root(ValidationLevel::Lenient));
        assert!(result.is_ok());
        assert_eq!(result.value.get_path("port"), Some(&ConfigValue::Integer(8080)));
    }

    #[test]
    fn test_non_mapping_root_rejected() {
        let schema = Schema::new();
        let result = schema.validate(&ConfigValue::Integer(1), &strict());
        assert!(!result.is_ok());
    }

    #[test]
    fn test_compiled_schema_is_a_validator() {
        let validator = Schema::new()
            .field("name", SchemaField::of_kind(ValueKind::String).required())
            .compile();
        let result = validator.validate(&ConfigValue::empty_mapping(), &strict());
        assert!(!result.is_ok());
        assert_eq!(validator.name(), "schema");
    }
}
