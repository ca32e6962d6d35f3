//! # Validation Integration Tests
//!
//! Schema validation driven through the composer: error aggregation across
//! fields, lenient coercion of INI-style scalars, strict-level rejection,
//! and validation-cache invalidation on swap.

use std::sync::Arc;

use layered_config::{
    ConfigManager, ConfigSource, ConfigValue, IniFileSource, JsonFileSource, Schema, SchemaField, ValidationLevel,
    ValueKind,
};
use layered_config_domain::validation::validators::RangeValidator;

fn json_source(dir: &tempfile::TempDir, name: &str, content: &str) -> (Arc<dyn ConfigSource>, std::path::PathBuf) {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    (Arc::new(JsonFileSource::new(&path)), path)
}

fn service_schema() -> Schema {
    Schema::new()
        .field("name", SchemaField::of_kind(ValueKind::String).required())
        .field(
            "port",
            SchemaField::of_kind(ValueKind::Integer)
                .required()
                .with_validator(Arc::new(RangeValidator::between(1024.0, 65535.0))),
        )
}

#[tokio::test]
async fn test_validation_aggregates_all_field_errors() {
    let dir = tempfile::tempdir().unwrap();
    let (source, _path) = json_source(&dir, "app.json", r#"{"port":80}"#);

    let config = ConfigManager::builder().with_schema(service_schema()).build();
    config.add_source(source).await.unwrap();

    let result = config.validate();
    assert!(!result.is_ok());
    assert!(!config.is_valid());

    let errors = config.errors();
    assert_eq!(errors.len(), 2, "{errors:?}");
    assert!(errors.iter().any(|d| d.code == "missing" && d.path.as_str() == "name"));
    assert!(errors.iter().any(|d| d.code == "range" && d.path.as_str() == "port"));
}

#[tokio::test]
async fn test_lenient_ini_boolean_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.ini");
    std::fs::write(&path, "debug = YES\n").unwrap();

    let config = ConfigManager::new();
    config.add_source(Arc::new(IniFileSource::new(&path))).await.unwrap();

    assert_eq!(config.get_bool("debug", false), true);
}

#[tokio::test]
async fn test_lenient_schema_coerces_strict_rejects() {
    let dir = tempfile::tempdir().unwrap();
    let content = r#"{"name":"svc","port":"8080"}"#;

    let (lenient_source, _p1) = json_source(&dir, "lenient.json", content);
    let lenient = ConfigManager::builder()
        .with_schema(service_schema())
        .with_validation_level(ValidationLevel::Lenient)
        .build();
    lenient.add_source(lenient_source).await.unwrap();
    let result = lenient.validate();
    assert!(result.is_ok(), "{:?}", result.diagnostics);
    assert_eq!(result.value.get_path("port"), Some(&ConfigValue::Integer(8080)));

    let (strict_source, _p2) = json_source(&dir, "strict.json", content);
    let strict = ConfigManager::builder()
        .with_schema(service_schema())
        .with_validation_level(ValidationLevel::Strict)
        .build();
    strict.add_source(strict_source).await.unwrap();
    assert!(!strict.is_valid());
}

#[tokio::test]
async fn test_swap_invalidates_validation_cache() {
    let dir = tempfile::tempdir().unwrap();
    let (source, path) = json_source(&dir, "app.json", r#"{"name":"svc","port":80}"#);

    let config = ConfigManager::builder().with_schema(service_schema()).build();
    config.add_source(source).await.unwrap();
    assert!(!config.is_valid());

    // Fix the file and reload: the swap must invalidate the cached
    // verdict.
    std::fs::write(&path, r#"{"name":"svc","port":8080}"#).unwrap();
    let file = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
    let _ = file.set_modified(std::time::SystemTime::now() + std::time::Duration::from_secs(2));
    assert!(config.reload().await.unwrap());

    assert!(config.is_valid());
    assert!(config.errors().is_empty());
}

#[tokio::test]
async fn test_defaults_flow_into_validated_tree() {
    let dir = tempfile::tempdir().unwrap();
    let (source, _path) = json_source(&dir, "app.json", r#"{"name":"svc","port":9000}"#);

    let schema = service_schema().field("retries", SchemaField::of_kind(ValueKind::Integer).with_default(3i64));
    let config = ConfigManager::builder().with_schema(schema).build();
    config.add_source(source).await.unwrap();

    let result = config.validate();
    assert!(result.is_ok());
    assert_eq!(result.value.get_path("retries"), Some(&ConfigValue::Integer(3)));
    // The live tree is untouched by validation defaults.
    assert_eq!(config.get("retries"), None);
}
