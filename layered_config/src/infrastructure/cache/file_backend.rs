// /////////////////////////////////////////////////////////////////////////////
// Layered Configuration Resolver
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Persistent File Cache Backend
//!
//! One regular file per entry under a root directory, named by the SHA-256
//! digest of the cache key. Each file is a fixed 24-byte header followed by
//! the serialized value:
//!
//! ```text
//! offset  size  field
//! 0       4     magic "LCFC"
//! 4       4     format version (little-endian u32)
//! 8       8     TTL in seconds, 0 = never expires (little-endian u64)
//! 16      8     creation time, unix seconds (little-endian u64)
//! 24      ...   value blob (opaque to readers of the header)
//! ```
//!
//! Writes go to a sibling temp file and land via rename, so readers only
//! ever observe complete entries. TTL is enforced on read; an expired file
//! is deleted on discovery. Mutations are serialized behind one async lock;
//! reads go straight to the filesystem since renames are atomic.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use layered_config_domain::{CacheBackend, CacheEntry, CacheKey, CacheStats, ConfigValue};
use tracing::{trace, warn};

const MAGIC: [u8; 4] = *b"LCFC";
const FORMAT_VERSION: u32 = 1;
const HEADER_LEN: usize = 24;
const ENTRY_SUFFIX: &str = ".cache";

/// Cache backend persisting entries under a root directory.
pub struct FileCacheBackend {
    root: PathBuf,
    write_gate: tokio::sync::Mutex<()>,
    hits: AtomicU64,
    misses: AtomicU64,
    expirations: AtomicU64,
}

impl FileCacheBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            write_gate: tokio::sync::Mutex::new(()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            expirations: AtomicU64::new(0),
        }
    }

    pub fn root(&self) -> &std::path::Path {
        &self.root
    }

    fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.root.join(format!("{}{ENTRY_SUFFIX}", key.file_digest()))
    }

    fn encode(entry: &CacheEntry) -> Option<Vec<u8>> {
        let blob = serde_json::to_vec(&entry.value).ok()?;
        let mut bytes = Vec::with_capacity(HEADER_LEN + blob.len());
        bytes.extend_from_slice(&MAGIC);
        bytes.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        let ttl_secs = entry.ttl.map(|ttl| ttl.as_secs()).unwrap_or(0);
        bytes.extend_from_slice(&ttl_secs.to_le_bytes());
        let created = entry.created_at.timestamp().max(0) as u64;
        bytes.extend_from_slice(&created.to_le_bytes());
        bytes.extend_from_slice(&blob);
        Some(bytes)
    }

    fn decode(key: &CacheKey, bytes: &[u8]) -> Option<CacheEntry> {
        if bytes.len() < HEADER_LEN || bytes[0..4] != MAGIC {
            return None;
        }
        let version = u32::from_le_bytes(bytes[4..8].try_into().ok()?);
        if version != FORMAT_VERSION {
            return None;
        }
        let ttl_secs = u64::from_le_bytes(bytes[8..16].try_into().ok()?);
        let created_secs = u64::from_le_bytes(bytes[16..24].try_into().ok()?);
        let value: ConfigValue = serde_json::from_slice(&bytes[HEADER_LEN..]).ok()?;
        let ttl = (ttl_secs > 0).then(|| Duration::from_secs(ttl_secs));
        let mut entry = CacheEntry::new(key.clone(), value, ttl);
        entry.created_at = Utc.timestamp_opt(created_secs as i64, 0).single()?;
        Some(entry)
    }
}

#[async_trait]
impl CacheBackend for FileCacheBackend {
    fn name(&self) -> &'static str {
        "file"
    }

    async fn get(&self, key: &CacheKey) -> Option<CacheEntry> {
        let path = self.entry_path(key);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(_) => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                return None;
            }
        };
        let Some(entry) = Self::decode(key, &bytes) else {
            warn!(path = %path.display(), "unreadable cache entry; deleting");
            let _gate = self.write_gate.lock().await;
            let _ = tokio::fs::remove_file(&path).await;
            self.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        };
        if entry.is_expired() {
            trace!(key = %key, "cache entry expired; deleting");
            let _gate = self.write_gate.lock().await;
            let _ = tokio::fs::remove_file(&path).await;
            self.expirations.fetch_add(1, Ordering::Relaxed);
            self.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        }
        self.hits.fetch_add(1, Ordering::Relaxed);
        Some(entry)
    }

    async fn set(&self, entry: CacheEntry) {
        let Some(bytes) = Self::encode(&entry) else {
            warn!(key = %entry.key, "failed to encode cache entry; dropping write");
            return;
        };
        let path = self.entry_path(&entry.key);
        let tmp = path.with_extension("tmp");
        let _gate = self.write_gate.lock().await;
        if let Err(error) = tokio::fs::create_dir_all(&self.root).await {
            warn!(root = %self.root.display(), %error, "cannot create cache directory; dropping write");
            return;
        }
        if let Err(error) = tokio::fs::write(&tmp, &bytes).await {
            warn!(path = %tmp.display(), %error, "cache write failed");
            return;
        }
        if let Err(error) = tokio::fs::rename(&tmp, &path).await {
            warn!(path = %path.display(), %error, "cache rename failed");
            let _ = tokio::fs::remove_file(&tmp).await;
        }
    }

    async fn delete(&self, key: &CacheKey) -> bool {
        let _gate = self.write_gate.lock().await;
        tokio::fs::remove_file(self.entry_path(key)).await.is_ok()
    }

    async fn clear(&self) {
        let _gate = self.write_gate.lock().await;
        let Ok(mut dir) = tokio::fs::read_dir(&self.root).await else {
            return;
        };
        while let Ok(Some(item)) = dir.next_entry().await {
            let path = item.path();
            if path.extension().and_then(|e| e.to_str()) == Some("cache") {
                let _ = tokio::fs::remove_file(&path).await;
            }
        }
    }

    fn stats(&self) -> CacheStats {
        let mut entries = 0u64;
        let mut approximate_bytes = 0u64;
        if let Ok(dir) = std::fs::read_dir(&self.root) {
            for item in dir.flatten() {
                let path = item.path();
                if path.extension().and_then(|e| e.to_str()) == Some("cache") {
                    entries += 1;
                    if let Ok(meta) = item.metadata() {
                        approximate_bytes += meta.len();
                    }
                }
            }
        }
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: 0,
            expirations: self.expirations.load(Ordering::Relaxed),
            entries,
            approximate_bytes,
        }
    }
}
