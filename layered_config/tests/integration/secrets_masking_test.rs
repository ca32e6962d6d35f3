//! # Secrets & Masking Integration Tests
//!
//! The secrets accessor through the composer, secret-backed source
//! composition, and the mask-soundness property: every scalar under a
//! sensitive key is redacted in masked output, nothing else is.

use std::sync::Arc;

use layered_config::{
    ConfigManager, ConfigSource, ConfigValue, JsonFileSource, MemorySecretsAccessor, SecretBackedSource,
    SecretsAccessor,
};
use layered_config_domain::Secret;

fn accessor() -> Arc<MemorySecretsAccessor> {
    let accessor = MemorySecretsAccessor::new();
    accessor.insert(Secret::new("db_password", "hunter2"));
    accessor.insert(Secret::new("api_token", "tok-123"));
    Arc::new(accessor)
}

#[tokio::test]
async fn test_get_secret_through_composer() {
    let config = ConfigManager::builder().with_secrets(accessor()).build();

    let secret = config.get_secret("db_password").unwrap();
    assert_eq!(secret.reveal_string().as_deref(), Some("hunter2"));
    assert!(config.get_secret("missing").is_none());

    // Secrets never appear in the tree.
    assert_eq!(config.get("db_password"), None);
}

#[tokio::test]
async fn test_without_accessor_get_secret_is_none() {
    let config = ConfigManager::new();
    assert!(config.get_secret("db_password").is_none());
}

#[tokio::test]
async fn test_secret_backed_source_composes_and_masks() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("base.json");
    std::fs::write(&path, r#"{"database":{"host":"h1"}}"#).unwrap();

    let config = ConfigManager::builder().with_secrets(accessor()).build();
    config.add_source(Arc::new(JsonFileSource::new(&path))).await.unwrap();
    config
        .add_source(Arc::new(
            SecretBackedSource::new(accessor()).map("database.password", "db_password"),
        ))
        .await
        .unwrap();

    // The secret-backed layer merges like any other source.
    assert_eq!(config.get("database.password"), Some(ConfigValue::from("hunter2")));
    assert_eq!(config.get("database.host"), Some(ConfigValue::from("h1")));

    // Display output is redacted; the live tree is untouched.
    let masked = config.masked_tree();
    assert_eq!(masked.get_path("database.password"), Some(&ConfigValue::from("******")));
    assert_eq!(masked.get_path("database.host"), Some(&ConfigValue::from("h1")));
    assert_eq!(config.get("database.password"), Some(ConfigValue::from("hunter2")));

    let rendered = config.to_masked_string();
    assert!(!rendered.contains("hunter2"));
}

#[tokio::test]
async fn test_mask_soundness_over_mixed_tree() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mixed.json");
    std::fs::write(
        &path,
        r#"{
            "service": {"name": "api", "auth_token": "t-1"},
            "password": "p-1",
            "limits": {"max_connections": 10},
            "api_key": "k-1"
        }"#,
    )
    .unwrap();

    let config = ConfigManager::new();
    config.add_source(Arc::new(JsonFileSource::new(&path))).await.unwrap();
    let masked = config.masked_tree();

    // Every sensitive-keyed scalar is masked.
    for sensitive in ["service.auth_token", "password", "api_key"] {
        assert_eq!(
            masked.get_path(sensitive),
            Some(&ConfigValue::from("******")),
            "{sensitive} should be masked"
        );
    }
    // No non-matching scalar is.
    assert_eq!(masked.get_path("service.name"), Some(&ConfigValue::from("api")));
    assert_eq!(masked.get_path("limits.max_connections"), Some(&ConfigValue::Integer(10)));
}

#[tokio::test]
async fn test_secret_access_counting_via_composer() {
    let shared = accessor();
    let config = ConfigManager::builder().with_secrets(shared.clone()).build();

    config.get_secret("api_token").unwrap().reveal();
    config.get_secret("api_token").unwrap().reveal();
    assert_eq!(shared.get_secret("api_token").unwrap().access_count(), 2);
}
