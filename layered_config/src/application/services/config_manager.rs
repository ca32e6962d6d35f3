// /////////////////////////////////////////////////////////////////////////////
// Layered Configuration Resolver
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Configuration Composer
//!
//! The composer owns the ordered source stack and exposes the public
//! configuration API. Sources are applied in insertion order and each
//! subsequent source deep-merges over the accumulated result, so the
//! last-added source has the highest precedence; environment and remote
//! sources rank exactly where the caller inserts them.
//!
//! ## Read path
//!
//! Readers take a shared lock just long enough to clone the `Arc` of the
//! current tree, then traverse immutable structure lock-free. The typed
//! accessors are total: they produce the requested value or the supplied
//! default, never an error.
//!
//! ## Write path
//!
//! `reload` re-loads every source through the cache-keyed path, merges into
//! a fresh tree off to the side, and swaps only when the merged result
//! differs structurally from the current tree. The swap takes the write
//! lock for a pointer replacement. Reload callbacks fire after the swap is
//! visible, in registration order; a panicking callback is caught and
//! logged without affecting its successors or the swap.
//!
//! Write operations serialize behind one async gate, which also gives
//! per-swap callback serialization: a reload that starts while a previous
//! batch of callbacks is still running waits for them.
//!
//! ## Lifecycle
//!
//! `empty -> configured` on the first `add_source`, `-> loaded` on the
//! first successful build, `loaded <-> reloading` around every rebuild, and
//! a terminal `disposed` that stops the watcher, clears the cache, and
//! refuses further control-plane operations. Data-plane reads on a
//! disposed composer fall back to defaults.

use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use layered_config_domain::{
    CacheBackend, CacheStats, ConfigError, ConfigSource, ConfigValue, Diagnostic, ProfileManager, Schema, Secret,
    SecretsAccessor, SourceMetadata, ValidationContext, ValidationLevel, ValidationResult,
};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::infrastructure::cache::{CacheManager, MemoryCacheBackend};
use crate::infrastructure::services::masking::MaskingService;
use crate::infrastructure::sources::file_format;
use crate::infrastructure::watch::FileWatcher;

const DEFAULT_CACHE_CAPACITY: usize = 128;
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Reload behavior, selected at construction.
#[derive(Debug, Clone, Copy)]
pub enum ReloadMode {
    /// The caller drives `reload()`.
    Explicit,
    /// A background worker watches file-backed sources and reloads on
    /// change, polling at the given interval when notifications are quiet
    /// or unavailable.
    Automatic { poll_interval: Duration },
}

/// Composer lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComposerState {
    Empty,
    Configured,
    Loaded,
    Reloading,
    Disposed,
}

/// Handle for a registered reload callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallbackId(u64);

type ReloadCallback = Arc<dyn Fn(&ConfigValue) + Send + Sync>;

/// Validation counters exposed through [`ConfigManager::stats`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationStats {
    pub runs: u64,
    pub last_duration_micros: u64,
}

/// A point-in-time snapshot of composer counters and source health.
#[derive(Debug, Clone, Serialize)]
pub struct ComposerStats {
    pub state: ComposerState,
    pub tree_version: u64,
    pub reload_count: u64,
    pub swap_count: u64,
    pub last_reload_at: Option<DateTime<Utc>>,
    pub active_profile: String,
    pub sources: Vec<SourceMetadata>,
    pub cache: CacheStats,
    pub validation: ValidationStats,
}

struct ManagerInner {
    sources: Mutex<Vec<Arc<dyn ConfigSource>>>,
    tree: RwLock<Arc<ConfigValue>>,
    tree_version: AtomicU64,
    state: Mutex<ComposerState>,
    // Serializes write operations and callback batches between swaps.
    write_gate: tokio::sync::Mutex<()>,
    cache: CacheManager,
    cache_ttl: Option<Duration>,
    schema: Mutex<Option<Schema>>,
    validation_level: ValidationLevel,
    validation_cache: Mutex<Option<(u64, ValidationResult)>>,
    callbacks: Mutex<Vec<(CallbackId, ReloadCallback)>>,
    callback_seq: AtomicU64,
    profiles: Mutex<ProfileManager>,
    secrets: Option<Arc<dyn SecretsAccessor>>,
    masking: MaskingService,
    reload_mode: ReloadMode,
    reload_count: AtomicU64,
    swap_count: AtomicU64,
    last_reload_at: Mutex<Option<DateTime<Utc>>>,
    validation_runs: AtomicU64,
    last_validation_micros: AtomicU64,
    shutdown: Arc<tokio::sync::Notify>,
}

impl ManagerInner {
    fn is_disposed(&self) -> bool {
        *self.state.lock() == ComposerState::Disposed
    }

    fn guard_disposed(&self, operation: &str) -> Result<(), ConfigError> {
        if self.is_disposed() {
            Err(ConfigError::disposed(format!("{operation} on a disposed composer")))
        } else {
            Ok(())
        }
    }

    fn snapshot_sources(&self) -> Vec<Arc<dyn ConfigSource>> {
        self.sources.lock().clone()
    }

    /// Paths of file-backed sources, for the watcher. INI origins carry a
    /// `#section` suffix that is not part of the path.
    fn watched_paths(&self) -> Vec<PathBuf> {
        self.sources
            .lock()
            .iter()
            .filter(|source| source.kind().is_file_backed())
            .map(|source| {
                let origin = source.origin();
                let path = origin.split_once('#').map(|(path, _)| path.to_string()).unwrap_or(origin);
                PathBuf::from(path)
            })
            .collect()
    }

    /// Loads one source through the cache-keyed path.
    async fn load_through_cache(&self, source: &Arc<dyn ConfigSource>) -> ConfigValue {
        let key = source.cache_key().await;
        if let Some(cached) = self.cache.get(&key).await {
            debug!(source = %source.describe(), "serving load from cache");
            return cached;
        }
        let value = source.load().await;
        self.cache
            .set(
                key,
                value.clone(),
                self.cache_ttl,
                vec![format!("source:{}", source.origin())],
            )
            .await;
        value
    }

    /// Merges the full source stack. Loads run concurrently; the merge
    /// applies them strictly in insertion order, lowest precedence first.
    async fn compose(&self, sources: &[Arc<dyn ConfigSource>]) -> ConfigValue {
        let layers = futures::future::join_all(sources.iter().map(|source| self.load_through_cache(source))).await;
        let mut merged = ConfigValue::empty_mapping();
        for layer in &layers {
            merged = merged.deep_merge(layer);
        }
        merged
    }

    /// Publishes `candidate` when it differs structurally from the current
    /// tree. Returns true on swap. Callbacks run here, after the swap is
    /// visible; the caller must hold the write gate.
    fn swap_if_changed(&self, candidate: ConfigValue) -> bool {
        {
            let current = self.tree.read();
            if **current == candidate {
                return false;
            }
        }
        let published = Arc::new(candidate);
        {
            let mut slot = self.tree.write();
            *slot = published.clone();
        }
        self.tree_version.fetch_add(1, Ordering::SeqCst);
        self.swap_count.fetch_add(1, Ordering::Relaxed);
        *self.validation_cache.lock() = None;
        info!(version = self.tree_version.load(Ordering::SeqCst), "configuration tree swapped");

        let callbacks: Vec<(CallbackId, ReloadCallback)> = self.callbacks.lock().clone();
        for (id, callback) in callbacks {
            let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| callback(&published)));
            if outcome.is_err() {
                error!(callback = id.0, "reload callback panicked; continuing with the rest");
            }
        }
        true
    }
}

/// The public face of the layered configuration resolver.
///
/// Cloning is cheap and shares all state; clones are the intended way to
/// hand the composer to worker threads.
#[derive(Clone)]
pub struct ConfigManager {
    inner: Arc<ManagerInner>,
}

impl ConfigManager {
    /// A composer with default policies: in-memory cache, lenient
    /// validation, explicit reload.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> ConfigManagerBuilder {
        ConfigManagerBuilder::default()
    }

    // -----------------------------------------------------------------
    // Source stack
    // -----------------------------------------------------------------

    /// Appends a source at the highest-precedence position and rebuilds
    /// the tree by merging the new source's data over the current result.
    /// Other sources are not re-loaded.
    pub async fn add_source(&self, source: Arc<dyn ConfigSource>) -> Result<(), ConfigError> {
        self.inner.guard_disposed("add_source")?;
        let _gate = self.inner.write_gate.lock().await;
        {
            let mut state = self.inner.state.lock();
            if *state == ComposerState::Empty {
                *state = ComposerState::Configured;
            }
        }
        self.inner.sources.lock().push(source.clone());
        *self.inner.validation_cache.lock() = None;

        let layer = self.inner.load_through_cache(&source).await;
        let candidate = {
            let current = self.inner.tree.read().clone();
            current.deep_merge(&layer)
        };
        self.inner.swap_if_changed(candidate);
        *self.inner.state.lock() = ComposerState::Loaded;
        debug!(source = %source.describe(), "source added");
        Ok(())
    }

    /// Removes a specific source and rebuilds from the remaining stack.
    /// Returns whether the source was present.
    pub async fn remove_source(&self, source: &Arc<dyn ConfigSource>) -> Result<bool, ConfigError> {
        self.inner.guard_disposed("remove_source")?;
        let removed = {
            let mut sources = self.inner.sources.lock();
            let before = sources.len();
            sources.retain(|existing| !Arc::ptr_eq(existing, source));
            before != sources.len()
        };
        if removed {
            self.rebuild().await?;
        }
        Ok(removed)
    }

    /// Removes every source with the given origin identifier and rebuilds.
    pub async fn remove_source_by_origin(&self, origin: &str) -> Result<bool, ConfigError> {
        self.inner.guard_disposed("remove_source")?;
        let removed = {
            let mut sources = self.inner.sources.lock();
            let before = sources.len();
            sources.retain(|existing| existing.origin() != origin);
            before != sources.len()
        };
        if removed {
            self.rebuild().await?;
        }
        Ok(removed)
    }

    async fn rebuild(&self) -> Result<(), ConfigError> {
        let _gate = self.inner.write_gate.lock().await;
        *self.inner.validation_cache.lock() = None;
        let sources = self.inner.snapshot_sources();
        let candidate = self.inner.compose(&sources).await;
        self.inner.swap_if_changed(candidate);
        Ok(())
    }

    /// The number of sources currently in the stack.
    pub fn source_count(&self) -> usize {
        self.inner.sources.lock().len()
    }

    // -----------------------------------------------------------------
    // Reload
    // -----------------------------------------------------------------

    /// Re-loads every source through the cache, merges in precedence
    /// order, and atomically swaps the tree when the result differs.
    /// Returns whether a swap happened.
    ///
    /// A failed source contributes an empty mapping and never fails the
    /// reload; its trouble is visible in `stats()`.
    pub async fn reload(&self) -> Result<bool, ConfigError> {
        self.inner.guard_disposed("reload")?;
        let _gate = self.inner.write_gate.lock().await;
        {
            let mut state = self.inner.state.lock();
            if *state == ComposerState::Loaded || *state == ComposerState::Configured {
                *state = ComposerState::Reloading;
            }
        }
        // The source list is captured once; an add racing this reload is
        // picked up by its own rebuild or by the next reload.
        let sources = self.inner.snapshot_sources();
        let candidate = self.inner.compose(&sources).await;
        let swapped = self.inner.swap_if_changed(candidate);

        self.inner.reload_count.fetch_add(1, Ordering::Relaxed);
        *self.inner.last_reload_at.lock() = Some(Utc::now());
        if !self.inner.is_disposed() {
            *self.inner.state.lock() = ComposerState::Loaded;
        }
        debug!(swapped, sources = sources.len(), "reload finished");
        Ok(swapped)
    }

    // -----------------------------------------------------------------
    // Read path
    // -----------------------------------------------------------------

    /// Snapshot of the current composed tree.
    pub fn current_tree(&self) -> Arc<ConfigValue> {
        self.inner.tree.read().clone()
    }

    /// Monotonically increasing tree version; bumps on every swap.
    pub fn version(&self) -> u64 {
        self.inner.tree_version.load(Ordering::SeqCst)
    }

    /// Resolves a dot path. `None` when any segment is missing or an
    /// intermediate value is not a mapping.
    pub fn get(&self, path: &str) -> Option<ConfigValue> {
        self.current_tree().get_path(path).cloned()
    }

    /// Resolves a dot path, falling back to `default`.
    pub fn get_or(&self, path: &str, default: ConfigValue) -> ConfigValue {
        self.get(path).unwrap_or(default)
    }

    /// Integer accessor; accepts integers, floats, and parseable strings.
    pub fn get_int(&self, path: &str, default: i64) -> i64 {
        self.current_tree()
            .get_path(path)
            .and_then(ConfigValue::coerce_int)
            .unwrap_or(default)
    }

    /// Float accessor; accepts floats, integers, and parseable strings.
    pub fn get_float(&self, path: &str, default: f64) -> f64 {
        self.current_tree()
            .get_path(path)
            .and_then(ConfigValue::coerce_float)
            .unwrap_or(default)
    }

    /// Boolean accessor; accepts native booleans, the usual string forms,
    /// and integer 0/1.
    pub fn get_bool(&self, path: &str, default: bool) -> bool {
        self.current_tree()
            .get_path(path)
            .and_then(ConfigValue::coerce_bool)
            .unwrap_or(default)
    }

    /// List accessor; accepts sequences and comma-separated strings.
    pub fn get_list(&self, path: &str, default: Vec<ConfigValue>) -> Vec<ConfigValue> {
        self.current_tree()
            .get_path(path)
            .and_then(ConfigValue::coerce_list)
            .unwrap_or(default)
    }

    // -----------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------

    /// Binds (or replaces) the schema and invalidates any cached
    /// validation.
    pub fn bind_schema(&self, schema: Schema) -> Result<(), ConfigError> {
        self.inner.guard_disposed("bind_schema")?;
        *self.inner.schema.lock() = Some(schema);
        *self.inner.validation_cache.lock() = None;
        Ok(())
    }

    /// Runs the bound schema against the current tree.
    ///
    /// The result is cached per tree version; a swap invalidates it. A
    /// validation overlapping a swap completes against its own pre-swap
    /// snapshot and is discarded rather than cached.
    pub fn validate(&self) -> ValidationResult {
        let version = self.version();
        if let Some((cached_version, cached)) = self.inner.validation_cache.lock().as_ref() {
            if *cached_version == version {
                return cached.clone();
            }
        }
        let snapshot = self.current_tree();
        let Some(schema) = self.inner.schema.lock().clone() else {
            return ValidationResult::ok((*snapshot).clone());
        };
        let started = Instant::now();
        let ctx = ValidationContext::root(self.inner.validation_level);
        let result = schema.validate(&snapshot, &ctx);
        self.inner.validation_runs.fetch_add(1, Ordering::Relaxed);
        self.inner
            .last_validation_micros
            .store(started.elapsed().as_micros() as u64, Ordering::Relaxed);
        if self.version() == version {
            *self.inner.validation_cache.lock() = Some((version, result.clone()));
        }
        result
    }

    /// True when the bound schema passes (or none is bound). Never raises.
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Error diagnostics from the last validation. Never raises.
    pub fn errors(&self) -> Vec<Diagnostic> {
        self.validate().errors().cloned().collect()
    }

    // -----------------------------------------------------------------
    // Reload callbacks
    // -----------------------------------------------------------------

    /// Registers a callback invoked once per successful swap, after the
    /// swap is visible, in registration order. Keep callbacks small; they
    /// run on the worker that performed the swap.
    pub fn on_reload(&self, callback: impl Fn(&ConfigValue) + Send + Sync + 'static) -> CallbackId {
        let id = CallbackId(self.inner.callback_seq.fetch_add(1, Ordering::Relaxed));
        self.inner.callbacks.lock().push((id, Arc::new(callback)));
        id
    }

    /// De-registers a callback. Returns whether it was registered.
    pub fn off_reload(&self, id: CallbackId) -> bool {
        let mut callbacks = self.inner.callbacks.lock();
        let before = callbacks.len();
        callbacks.retain(|(existing, _)| *existing != id);
        before != callbacks.len()
    }

    // -----------------------------------------------------------------
    // Profiles
    // -----------------------------------------------------------------

    /// Registers a user-defined profile. Cyclic parent chains are rejected
    /// here, synchronously.
    pub fn register_profile(&self, profile: layered_config_domain::Profile) -> Result<(), ConfigError> {
        self.inner.guard_disposed("register_profile")?;
        self.inner.profiles.lock().register(profile)
    }

    /// Selects the active profile by name or alias.
    pub fn set_active_profile(&self, name: &str) -> Result<(), ConfigError> {
        self.inner.guard_disposed("set_active_profile")?;
        self.inner.profiles.lock().set_active(name)
    }

    /// The active profile's canonical name.
    pub fn active_profile(&self) -> String {
        self.inner.profiles.lock().active_name().to_string()
    }

    /// Resolves a profile variable along the active inheritance chain.
    pub fn profile_variable(&self, name: &str) -> Option<ConfigValue> {
        self.inner.profiles.lock().resolve_variable(name).cloned()
    }

    /// Auto-detects the active profile from the process environment
    /// (`ENVIRONMENT`, `ENV`, `APP_ENV`; first non-empty wins) and
    /// activates it when registered. Returns the activated name.
    pub fn detect_profile(&self) -> Option<String> {
        self.inner
            .profiles
            .lock()
            .detect_and_activate(|var| std::env::var(var).ok())
    }

    /// Resolves `dir/<active profile>.<ext>` across the known formats.
    pub fn profile_config_path(&self, dir: &Path) -> Option<PathBuf> {
        let profile = self.active_profile();
        file_format::profile_config_path(dir, &profile)
    }

    // -----------------------------------------------------------------
    // Secrets & masking
    // -----------------------------------------------------------------

    /// Fetches a secret through the accessor, when one is configured. A
    /// panicking back-end is treated as "not found".
    pub fn get_secret(&self, name: &str) -> Option<Secret> {
        let accessor = self.inner.secrets.as_ref()?;
        match std::panic::catch_unwind(AssertUnwindSafe(|| accessor.get_secret(name))) {
            Ok(secret) => secret,
            Err(_) => {
                warn!(secret = name, "secrets accessor panicked; treating as not found");
                None
            }
        }
    }

    /// A redacted copy of the current tree; the live tree is untouched.
    pub fn masked_tree(&self) -> ConfigValue {
        self.inner.masking.mask_tree(&self.current_tree())
    }

    /// The redacted tree rendered for display or logging.
    pub fn to_masked_string(&self) -> String {
        self.inner.masking.to_masked_string(&self.current_tree())
    }

    // -----------------------------------------------------------------
    // Cache controls
    // -----------------------------------------------------------------

    /// Switches the load cache on or off; entries and counters survive.
    pub fn set_cache_enabled(&self, enabled: bool) {
        self.inner.cache.set_enabled(enabled);
    }

    /// Drops every cached load for one source origin.
    pub async fn invalidate_source_cache(&self, origin: &str) -> usize {
        self.inner.cache.invalidate_tag(&format!("source:{origin}")).await
    }

    // -----------------------------------------------------------------
    // Observability & lifecycle
    // -----------------------------------------------------------------

    pub fn state(&self) -> ComposerState {
        *self.inner.state.lock()
    }

    /// Counters for diagnosing silent degradation: per-source metadata,
    /// cache metrics, validation timings, reload counts.
    pub fn stats(&self) -> ComposerStats {
        ComposerStats {
            state: self.state(),
            tree_version: self.version(),
            reload_count: self.inner.reload_count.load(Ordering::Relaxed),
            swap_count: self.inner.swap_count.load(Ordering::Relaxed),
            last_reload_at: *self.inner.last_reload_at.lock(),
            active_profile: self.active_profile(),
            sources: self.inner.sources.lock().iter().map(|source| source.metadata()).collect(),
            cache: self.inner.cache.stats(),
            validation: ValidationStats {
                runs: self.inner.validation_runs.load(Ordering::Relaxed),
                last_duration_micros: self.inner.last_validation_micros.load(Ordering::Relaxed),
            },
        }
    }

    /// Stops the watcher, clears the cache and callbacks, and empties the
    /// tree. Further control-plane operations fail; reads fall back to
    /// defaults. Disposing twice is an error.
    pub async fn dispose(&self) -> Result<(), ConfigError> {
        {
            let mut state = self.inner.state.lock();
            if *state == ComposerState::Disposed {
                return Err(ConfigError::disposed("composer already disposed"));
            }
            *state = ComposerState::Disposed;
        }
        self.inner.shutdown.notify_waiters();
        self.inner.cache.clear().await;
        self.inner.callbacks.lock().clear();
        self.inner.sources.lock().clear();
        {
            let mut slot = self.inner.tree.write();
            *slot = Arc::new(ConfigValue::empty_mapping());
        }
        info!("composer disposed");
        Ok(())
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Fluent construction of a [`ConfigManager`].
pub struct ConfigManagerBuilder {
    cache_backend: Option<Arc<dyn CacheBackend>>,
    cache_ttl: Option<Duration>,
    schema: Option<Schema>,
    validation_level: ValidationLevel,
    profiles: Option<ProfileManager>,
    secrets: Option<Arc<dyn SecretsAccessor>>,
    masking: Option<MaskingService>,
    reload_mode: ReloadMode,
}

impl Default for ConfigManagerBuilder {
    fn default() -> Self {
        Self {
            cache_backend: None,
            cache_ttl: None,
            schema: None,
            validation_level: ValidationLevel::Lenient,
            profiles: None,
            secrets: None,
            masking: None,
            reload_mode: ReloadMode::Explicit,
        }
    }
}

impl ConfigManagerBuilder {
    /// Uses a specific cache backend (default: in-memory LRU).
    pub fn with_cache_backend(mut self, backend: Arc<dyn CacheBackend>) -> Self {
        self.cache_backend = Some(backend);
        self
    }

    /// Applies a TTL to cached source loads.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = Some(ttl);
        self
    }

    /// Binds a schema at construction.
    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Sets the validation level (default lenient).
    pub fn with_validation_level(mut self, level: ValidationLevel) -> Self {
        self.validation_level = level;
        self
    }

    /// Supplies a pre-populated profile registry.
    pub fn with_profiles(mut self, profiles: ProfileManager) -> Self {
        self.profiles = Some(profiles);
        self
    }

    /// Attaches a secrets accessor.
    pub fn with_secrets(mut self, secrets: Arc<dyn SecretsAccessor>) -> Self {
        self.secrets = Some(secrets);
        self
    }

    /// Overrides the masking service.
    pub fn with_masking(mut self, masking: MaskingService) -> Self {
        self.masking = Some(masking);
        self
    }

    /// Selects automatic reload with the default 1 s poll interval.
    pub fn with_automatic_reload(mut self) -> Self {
        self.reload_mode = ReloadMode::Automatic {
            poll_interval: DEFAULT_POLL_INTERVAL,
        };
        self
    }

    /// Selects automatic reload with a custom poll interval.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.reload_mode = ReloadMode::Automatic { poll_interval };
        self
    }

    /// Builds the composer. Automatic reload spawns its watcher task and
    /// therefore must be built inside a tokio runtime.
    pub fn build(self) -> ConfigManager {
        let backend = self
            .cache_backend
            .unwrap_or_else(|| Arc::new(MemoryCacheBackend::new(DEFAULT_CACHE_CAPACITY)));
        let mut cache = CacheManager::new(backend);
        if let Some(ttl) = self.cache_ttl {
            cache = cache.with_default_ttl(ttl);
        }
        let inner = Arc::new(ManagerInner {
            sources: Mutex::new(Vec::new()),
            tree: RwLock::new(Arc::new(ConfigValue::empty_mapping())),
            tree_version: AtomicU64::new(0),
            state: Mutex::new(ComposerState::Empty),
            write_gate: tokio::sync::Mutex::new(()),
            cache,
            cache_ttl: self.cache_ttl,
            schema: Mutex::new(self.schema),
            validation_level: self.validation_level,
            validation_cache: Mutex::new(None),
            callbacks: Mutex::new(Vec::new()),
            callback_seq: AtomicU64::new(1),
            profiles: Mutex::new(self.profiles.unwrap_or_default()),
            secrets: self.secrets,
            masking: self.masking.unwrap_or_default(),
            reload_mode: self.reload_mode,
            reload_count: AtomicU64::new(0),
            swap_count: AtomicU64::new(0),
            last_reload_at: Mutex::new(None),
            validation_runs: AtomicU64::new(0),
            last_validation_micros: AtomicU64::new(0),
            shutdown: Arc::new(tokio::sync::Notify::new()),
        });
        if let ReloadMode::Automatic { poll_interval } = inner.reload_mode {
            spawn_watch_loop(&inner, poll_interval);
        }
        ConfigManager { inner }
    }
}

/// The automatic-reload worker. It holds only a weak reference so the
/// composer can be dropped freely; dispose wakes it for prompt exit.
///
/// Each cycle rebuilds the watcher from the current source list, so
/// sources added later become watched. The refresh tick doubles as the
/// polling fallback: it bounds how long a change can go unnoticed when no
/// notification arrives (a change landing exactly while the watcher is
/// being rebuilt, or a platform without usable notifications), because a
/// reload through the cache-keyed path is itself fingerprint-driven and
/// swaps nothing when nothing changed.
fn spawn_watch_loop(inner: &Arc<ManagerInner>, poll_interval: Duration) {
    let weak: Weak<ManagerInner> = Arc::downgrade(inner);
    let shutdown = inner.shutdown.clone();
    let refresh = poll_interval.max(Duration::from_millis(200));
    tokio::spawn(async move {
        loop {
            let paths = match weak.upgrade() {
                Some(inner) if !inner.is_disposed() => inner.watched_paths(),
                _ => break,
            };
            let mut watcher = FileWatcher::new(paths, poll_interval);
            tokio::select! {
                _ = watcher.wait_for_change() => {}
                _ = tokio::time::sleep(refresh) => {}
                _ = shutdown.notified() => break,
            }
            let Some(inner) = weak.upgrade() else { break };
            if inner.is_disposed() {
                break;
            }
            let manager = ConfigManager { inner };
            if let Err(error) = manager.reload().await {
                warn!(%error, "automatic reload failed");
            }
        }
        debug!("watch loop stopped");
    });
}
