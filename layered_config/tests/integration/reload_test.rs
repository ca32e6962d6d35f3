//! # Reload & Watching Integration Tests
//!
//! Explicit and automatic reload behavior: swap-on-difference, callback
//! ordering and new-tree visibility, watcher-driven reload on file change,
//! and reader monotonicity under concurrent reloads.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use layered_config::{ConfigManager, ConfigSource, ConfigValue, JsonFileSource};
use parking_lot::Mutex;

fn json_source(dir: &tempfile::TempDir, name: &str, content: &str) -> (Arc<dyn ConfigSource>, std::path::PathBuf) {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    (Arc::new(JsonFileSource::new(&path)), path)
}

fn rewrite(path: &std::path::Path, content: &str) {
    std::fs::write(path, content).unwrap();
    let file = std::fs::OpenOptions::new().append(true).open(path).unwrap();
    let _ = file.set_modified(std::time::SystemTime::now() + Duration::from_secs(2));
}

#[tokio::test]
async fn test_explicit_reload_picks_up_file_change() {
    let dir = tempfile::tempdir().unwrap();
    let (source, path) = json_source(&dir, "app.json", r#"{"mode":"before"}"#);

    let config = ConfigManager::new();
    config.add_source(source).await.unwrap();
    assert_eq!(config.get("mode"), Some(ConfigValue::from("before")));

    rewrite(&path, r#"{"mode":"after"}"#);
    assert!(config.reload().await.unwrap());
    assert_eq!(config.get("mode"), Some(ConfigValue::from("after")));
}

#[tokio::test]
async fn test_callbacks_fire_in_order_with_new_tree_visible() {
    let dir = tempfile::tempdir().unwrap();
    let (source, path) = json_source(&dir, "app.json", r#"{"gen":1}"#);

    let config = ConfigManager::new();
    config.add_source(source).await.unwrap();

    let observations: Arc<Mutex<Vec<(String, i64, i64)>>> = Arc::new(Mutex::new(Vec::new()));

    let reader = config.clone();
    let obs = observations.clone();
    config.on_reload(move |tree| {
        // Both the callback argument and a fresh read must show the new
        // tree: the swap precedes any callback.
        let via_arg = tree.get_path("gen").and_then(ConfigValue::coerce_int).unwrap_or(-1);
        let via_get = reader.get_int("gen", -1);
        obs.lock().push(("cb1".to_string(), via_arg, via_get));
    });
    let obs = observations.clone();
    config.on_reload(move |tree| {
        let via_arg = tree.get_path("gen").and_then(ConfigValue::coerce_int).unwrap_or(-1);
        obs.lock().push(("cb2".to_string(), via_arg, via_arg));
    });

    rewrite(&path, r#"{"gen":2}"#);
    assert!(config.reload().await.unwrap());

    let seen = observations.lock().clone();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0].0, "cb1");
    assert_eq!(seen[1].0, "cb2");
    assert!(seen.iter().all(|(_, via_arg, via_get)| *via_arg == 2 && *via_get == 2));
}

#[tokio::test]
async fn test_callbacks_fire_once_per_swap_not_per_reload() {
    let dir = tempfile::tempdir().unwrap();
    let (source, _path) = json_source(&dir, "app.json", r#"{"k":1}"#);

    let config = ConfigManager::new();
    let fired = Arc::new(AtomicU64::new(0));
    let counter = fired.clone();
    config.on_reload(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    config.add_source(source).await.unwrap();
    assert_eq!(fired.load(Ordering::SeqCst), 1);

    // No change on disk: no swap, no callback.
    config.reload().await.unwrap();
    config.reload().await.unwrap();
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_automatic_reload_on_file_change() {
    let dir = tempfile::tempdir().unwrap();
    let (source, path) = json_source(&dir, "watched.json", r#"{"gen":1}"#);

    let config = ConfigManager::builder()
        .with_poll_interval(Duration::from_millis(50))
        .build();
    config.add_source(source).await.unwrap();

    let (tx, rx) = tokio::sync::oneshot::channel::<i64>();
    let tx = Arc::new(Mutex::new(Some(tx)));
    let reader = config.clone();
    config.on_reload(move |_| {
        if let Some(tx) = tx.lock().take() {
            let _ = tx.send(reader.get_int("gen", -1));
        }
    });

    tokio::time::sleep(Duration::from_millis(150)).await;
    rewrite(&path, r#"{"gen":2}"#);

    let seen = tokio::time::timeout(Duration::from_secs(10), rx)
        .await
        .expect("watcher should trigger a reload")
        .unwrap();
    assert_eq!(seen, 2);
    assert_eq!(config.get_int("gen", -1), 2);

    config.dispose().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_readers_observe_monotonic_versions() {
    let dir = tempfile::tempdir().unwrap();
    let (source, path) = json_source(&dir, "app.json", r#"{"gen":0}"#);

    let config = ConfigManager::new();
    config.add_source(source).await.unwrap();

    let stop = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let mut readers = Vec::new();
    for _ in 0..3 {
        let config = config.clone();
        let stop = stop.clone();
        readers.push(tokio::spawn(async move {
            let mut last = config.version();
            let mut observations = 0u64;
            while !stop.load(Ordering::Relaxed) {
                let version = config.version();
                assert!(version >= last, "reader saw version go backwards");
                last = version;
                // The tree behind any observed version is complete: gen is
                // always present and an integer.
                assert!(config.get_int("gen", -1) >= 0);
                observations += 1;
                tokio::task::yield_now().await;
            }
            observations
        }));
    }

    for generation in 1..=5i64 {
        rewrite(&path, &format!(r#"{{"gen":{generation}}}"#));
        config.reload().await.unwrap();
    }
    stop.store(true, Ordering::Relaxed);
    for reader in readers {
        assert!(reader.await.unwrap() > 0);
    }
    assert_eq!(config.get_int("gen", -1), 5);
}

#[tokio::test]
async fn test_off_reload_stops_deliveries() {
    let dir = tempfile::tempdir().unwrap();
    let (source, path) = json_source(&dir, "app.json", r#"{"k":1}"#);

    let config = ConfigManager::new();
    let fired = Arc::new(AtomicU64::new(0));
    let counter = fired.clone();
    let id = config.on_reload(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    config.add_source(source).await.unwrap();
    assert_eq!(fired.load(Ordering::SeqCst), 1);

    assert!(config.off_reload(id));
    rewrite(&path, r#"{"k":2}"#);
    config.reload().await.unwrap();
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}
