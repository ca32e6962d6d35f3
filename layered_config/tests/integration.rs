//! Integration Tests
//!
//! This module aggregates all integration tests for the layered
//! configuration resolver.

#[path = "integration/composition_test.rs"]
mod composition_test;

#[path = "integration/cache_integration_test.rs"]
mod cache_integration_test;

#[path = "integration/reload_test.rs"]
mod reload_test;

#[path = "integration/secrets_masking_test.rs"]
mod secrets_masking_test;

#[path = "integration/validation_integration_test.rs"]
mod validation_integration_test;
