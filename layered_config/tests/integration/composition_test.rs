//! # Composition Integration Tests
//!
//! End-to-end checks of the precedence and deep-merge rules across mixed
//! source kinds: file formats layered under environment variables,
//! sibling preservation, sequence replacement, and the add/remove
//! round-trip law.

use std::sync::Arc;

use layered_config::{ConfigManager, ConfigSource, ConfigValue, EnvSource, JsonFileSource, YamlFileSource};

fn write_json(dir: &tempfile::TempDir, name: &str, content: &str) -> Arc<dyn ConfigSource> {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    Arc::new(JsonFileSource::new(path))
}

fn write_yaml(dir: &tempfile::TempDir, name: &str, content: &str) -> Arc<dyn ConfigSource> {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    Arc::new(YamlFileSource::new(path))
}

#[tokio::test]
async fn test_env_overrides_file_at_leaf_siblings_survive() {
    let dir = tempfile::tempdir().unwrap();
    unsafe { std::env::set_var("CMPT_DB_HOST", "h2") };

    let config = ConfigManager::new();
    config
        .add_source(write_json(&dir, "base.json", r#"{"db":{"host":"h1","port":1}}"#))
        .await
        .unwrap();
    config.add_source(Arc::new(EnvSource::with_prefix("CMPT_"))).await.unwrap();

    assert_eq!(config.get("db.host"), Some(ConfigValue::from("h2")));
    assert_eq!(config.get_int("db.port", 0), 1);

    unsafe { std::env::remove_var("CMPT_DB_HOST") };
}

#[tokio::test]
async fn test_deep_merge_preserves_disjoint_siblings() {
    let dir = tempfile::tempdir().unwrap();
    let config = ConfigManager::new();
    config
        .add_source(write_json(&dir, "first.json", r#"{"a":{"x":1}}"#))
        .await
        .unwrap();
    config
        .add_source(write_json(&dir, "second.json", r#"{"a":{"y":2}}"#))
        .await
        .unwrap();

    assert_eq!(config.get_int("a.x", 0), 1);
    assert_eq!(config.get_int("a.y", 0), 2);
}

#[tokio::test]
async fn test_sequences_replace_never_concatenate() {
    let dir = tempfile::tempdir().unwrap();
    let config = ConfigManager::new();
    config
        .add_source(write_yaml(&dir, "low.yaml", "features:\n  - a\n  - b\n"))
        .await
        .unwrap();
    config
        .add_source(write_json(&dir, "high.json", r#"{"features":["c"]}"#))
        .await
        .unwrap();

    assert_eq!(config.get_list("features", vec![]), vec![ConfigValue::from("c")]);
}

#[tokio::test]
async fn test_add_then_remove_is_get_equivalent() {
    let dir = tempfile::tempdir().unwrap();
    let config = ConfigManager::new();
    config
        .add_source(write_json(&dir, "base.json", r#"{"k":"base","nested":{"a":1}}"#))
        .await
        .unwrap();

    let before_k = config.get("k");
    let before_nested = config.get("nested.a");

    let overlay = write_json(&dir, "overlay.json", r#"{"k":"overlay","nested":{"a":9,"b":2}}"#);
    config.add_source(overlay.clone()).await.unwrap();
    assert_eq!(config.get("k"), Some(ConfigValue::from("overlay")));

    assert!(config.remove_source(&overlay).await.unwrap());
    assert_eq!(config.get("k"), before_k);
    assert_eq!(config.get("nested.a"), before_nested);
    assert_eq!(config.get("nested.b"), None);
}

#[tokio::test]
async fn test_faulty_source_contributes_empty_but_lower_layers_apply() {
    let dir = tempfile::tempdir().unwrap();
    let config = ConfigManager::new();
    config
        .add_source(write_json(&dir, "good.json", r#"{"kept":"yes"}"#))
        .await
        .unwrap();
    // A sequence-root file is rejected with a diagnostic; the composition
    // keeps going.
    config
        .add_source(write_json(&dir, "seq.json", r#"["not","a","mapping"]"#))
        .await
        .unwrap();

    assert_eq!(config.get("kept"), Some(ConfigValue::from("yes")));
    let stats = config.stats();
    let faulty = stats.sources.iter().find(|m| m.origin.contains("seq")).unwrap();
    assert_eq!(faulty.load_failures, 1);
}

#[tokio::test]
async fn test_null_override_wins() {
    let dir = tempfile::tempdir().unwrap();
    let config = ConfigManager::new();
    config
        .add_source(write_json(&dir, "low.json", r#"{"feature":"enabled"}"#))
        .await
        .unwrap();
    config
        .add_source(write_json(&dir, "high.json", r#"{"feature":null}"#))
        .await
        .unwrap();

    assert_eq!(config.get("feature"), Some(ConfigValue::Null));
    // Accessors treat explicit null as non-coercible and fall back.
    assert_eq!(config.get_bool("feature", false), false);
}

#[tokio::test]
async fn test_typed_accessors_are_total() {
    let dir = tempfile::tempdir().unwrap();
    let config = ConfigManager::new();
    config
        .add_source(write_json(
            &dir,
            "mixed.json",
            r#"{"text":"hello","num":"42","flag":"on","items":"a, b , c","map":{"x":1}}"#,
        ))
        .await
        .unwrap();

    assert_eq!(config.get_int("num", 0), 42);
    assert_eq!(config.get_bool("flag", false), true);
    assert_eq!(
        config.get_list("items", vec![]),
        vec![ConfigValue::from("a"), ConfigValue::from("b"), ConfigValue::from("c")]
    );
    // Mismatches fall back to the default instead of failing.
    assert_eq!(config.get_int("text", -1), -1);
    assert_eq!(config.get_int("map", -1), -1);
    assert_eq!(config.get_bool("missing.entirely", true), true);
}
