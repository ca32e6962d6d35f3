// /////////////////////////////////////////////////////////////////////////////
// Layered Configuration Resolver
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Validation Engine
//!
//! Composable, pure validators over configuration values, the immutable
//! context threaded through a validation descent, the diagnostic-carrying
//! result record, and the declarative schema that lowers into a composite
//! validator.

pub mod context;
pub mod result;
pub mod schema;
pub mod validators;

pub use context::{ValidationContext, ValidationLevel};
pub use result::{Diagnostic, Severity, ValidationResult};
pub use schema::{Schema, SchemaField};
pub use validators::{
    ChoicesValidator, CompositeValidator, EmailValidator, LengthValidator, PatternValidator,
    RangeValidator, RequiredValidator, TypeValidator, Validator, ValidatorRef,
};
