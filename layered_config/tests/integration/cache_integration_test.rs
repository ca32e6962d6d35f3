//! # Cache Integration Tests
//!
//! The observable cache properties: an unchanged file is served from cache
//! without re-invoking the parser, a rotated fingerprint bypasses stale
//! entries, TTL expiry behaves as absence, and the file backend survives
//! composer restarts.

use std::sync::Arc;
use std::time::Duration;

use layered_config::{
    CacheManager, ConfigManager, ConfigSource, ConfigValue, FileCacheBackend, JsonFileSource, MemoryCacheBackend,
    NullCacheBackend,
};
use layered_config_domain::{CacheBackend, CacheKey, Fingerprint, SourceKind};

fn json_source(dir: &tempfile::TempDir, name: &str, content: &str) -> (Arc<dyn ConfigSource>, std::path::PathBuf) {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    (Arc::new(JsonFileSource::new(&path)), path)
}

#[tokio::test]
async fn test_unchanged_mtime_skips_the_parser() {
    let dir = tempfile::tempdir().unwrap();
    let (source, _path) = json_source(&dir, "app.json", r#"{"k":1}"#);

    let config = ConfigManager::new();
    config.add_source(source.clone()).await.unwrap();
    let attempts_after_first = source.metadata().load_attempts;
    assert_eq!(attempts_after_first, 1);
    let first_tree = config.current_tree();

    // Two further reloads with an untouched file: the fingerprint is
    // stable, so the cache answers and load() is never called again.
    config.reload().await.unwrap();
    config.reload().await.unwrap();
    assert_eq!(source.metadata().load_attempts, attempts_after_first);
    assert_eq!(*config.current_tree(), *first_tree);
    assert!(config.stats().cache.hits >= 2);
}

#[tokio::test]
async fn test_changed_file_rotates_key_and_reparses() {
    let dir = tempfile::tempdir().unwrap();
    let (source, path) = json_source(&dir, "app.json", r#"{"k":1}"#);

    let config = ConfigManager::new();
    config.add_source(source.clone()).await.unwrap();
    assert_eq!(config.get_int("k", 0), 1);

    // Rewrite with a guaranteed-later mtime.
    tokio::time::sleep(Duration::from_millis(20)).await;
    std::fs::write(&path, r#"{"k":2}"#).unwrap();
    filetime_touch(&path);

    config.reload().await.unwrap();
    assert_eq!(config.get_int("k", 0), 2);
    assert_eq!(source.metadata().load_attempts, 2);
}

/// Nudges the mtime forward for filesystems with coarse timestamps.
fn filetime_touch(path: &std::path::Path) {
    let file = std::fs::OpenOptions::new().append(true).open(path).unwrap();
    let _ = file.set_modified(std::time::SystemTime::now() + Duration::from_secs(2));
}

#[tokio::test]
async fn test_ttl_expired_entry_is_absent() {
    let backend = MemoryCacheBackend::new(8);
    let key = CacheKey::derive(SourceKind::Json, "ttl-probe", &Fingerprint::Mtime("1.0".into()));
    let mut entry = layered_config::CacheEntry::new(key.clone(), ConfigValue::from("v"), Some(Duration::from_secs(30)));
    entry.created_at = chrono::Utc::now() - chrono::Duration::seconds(60);
    backend.set(entry).await;

    assert!(backend.get(&key).await.is_none());
    assert_eq!(backend.stats().expirations, 1);
}

#[tokio::test]
async fn test_file_backend_survives_composer_restart() {
    let dir = tempfile::tempdir().unwrap();
    let cache_dir = dir.path().join("cache");
    let (source, _path) = json_source(&dir, "app.json", r#"{"persisted":true}"#);

    {
        let config = ConfigManager::builder()
            .with_cache_backend(Arc::new(FileCacheBackend::new(&cache_dir)))
            .build();
        config.add_source(source.clone()).await.unwrap();
        assert_eq!(config.get_bool("persisted", false), true);
    }
    assert_eq!(source.metadata().load_attempts, 1);

    // A second composer over the same cache directory and the same
    // unchanged file serves the load from disk cache.
    let config = ConfigManager::builder()
        .with_cache_backend(Arc::new(FileCacheBackend::new(&cache_dir)))
        .build();
    config.add_source(source.clone()).await.unwrap();
    assert_eq!(config.get_bool("persisted", false), true);
    assert_eq!(source.metadata().load_attempts, 1, "served from persistent cache");
}

#[tokio::test]
async fn test_null_backend_always_reloads() {
    let dir = tempfile::tempdir().unwrap();
    let (source, _path) = json_source(&dir, "app.json", r#"{"k":1}"#);

    let config = ConfigManager::builder()
        .with_cache_backend(Arc::new(NullCacheBackend::new()))
        .build();
    config.add_source(source.clone()).await.unwrap();
    config.reload().await.unwrap();
    config.reload().await.unwrap();
    assert_eq!(source.metadata().load_attempts, 3);
}

#[tokio::test]
async fn test_disabled_cache_behaves_like_null_but_counts() {
    let dir = tempfile::tempdir().unwrap();
    let (source, _path) = json_source(&dir, "app.json", r#"{"k":1}"#);

    let config = ConfigManager::new();
    config.add_source(source.clone()).await.unwrap();
    config.set_cache_enabled(false);
    config.reload().await.unwrap();
    assert_eq!(source.metadata().load_attempts, 2, "disabled cache misses");

    config.set_cache_enabled(true);
    let misses_so_far = config.stats().cache.misses;
    assert!(misses_so_far >= 2);
}

#[tokio::test]
async fn test_tag_invalidation_by_origin() {
    let dir = tempfile::tempdir().unwrap();
    let (source, _path) = json_source(&dir, "app.json", r#"{"k":1}"#);

    let config = ConfigManager::new();
    config.add_source(source.clone()).await.unwrap();
    let removed = config.invalidate_source_cache(&source.origin()).await;
    assert_eq!(removed, 1);

    // Next reload misses and loads again.
    config.reload().await.unwrap();
    assert_eq!(source.metadata().load_attempts, 2);
}

#[tokio::test]
async fn test_manager_capacity_one_boundary() {
    let cache = CacheManager::new(Arc::new(MemoryCacheBackend::new(1)));
    let first = CacheKey::derive(SourceKind::Json, "one", &Fingerprint::Mtime("1".into()));
    let second = CacheKey::derive(SourceKind::Json, "two", &Fingerprint::Mtime("1".into()));

    cache.set(first.clone(), ConfigValue::from("1"), None, vec![]).await;
    cache.set(second.clone(), ConfigValue::from("2"), None, vec![]).await;

    assert_eq!(cache.get(&first).await, None);
    assert_eq!(cache.get(&second).await, Some(ConfigValue::from("2")));
    assert_eq!(cache.stats().evictions, 1);
}
