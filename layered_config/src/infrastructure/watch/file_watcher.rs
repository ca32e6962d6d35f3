// /////////////////////////////////////////////////////////////////////////////
// Layered Configuration Resolver
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # File Change Watching
//!
//! Detects changes to a set of watched configuration files. Two signals
//! feed the detector:
//!
//! - OS file-system notifications via `notify`, registered on the parent
//!   directories so atomic replace-by-rename is observed. Events wake the
//!   watcher early.
//! - An interval poll over file fingerprints (mtime, with content hashes
//!   unavailable files degrade gracefully). The poll runs regardless, so a
//!   failed or missing notification backend degrades to pure polling with
//!   no mode switch.
//!
//! Either way, a change is only reported when a fingerprint actually
//! differs from the last observation: notification storms collapse into
//! one report per real change, debounced over a short window.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::time::Duration;

use layered_config_domain::Fingerprint;
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use crate::infrastructure::sources::file_support::mtime_fingerprint_sync;

/// Debounce window applied after the first change signal.
const DEBOUNCE: Duration = Duration::from_millis(250);

/// Watches a fixed set of files for content changes.
pub struct FileWatcher {
    paths: Vec<PathBuf>,
    poll_interval: Duration,
    events: mpsc::UnboundedReceiver<notify::Result<notify::Event>>,
    // Kept alive for the OS-notification stream; `None` means polling only.
    _watcher: Option<RecommendedWatcher>,
    fingerprints: HashMap<PathBuf, Fingerprint>,
}

impl FileWatcher {
    /// Builds a watcher over `paths`. Notification registration failures
    /// are logged and leave the watcher in polling-only mode.
    pub fn new(paths: Vec<PathBuf>, poll_interval: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let watcher = Self::try_register(&paths, tx);
        let fingerprints = paths
            .iter()
            .map(|path| (path.clone(), mtime_fingerprint_sync(path)))
            .collect();
        Self {
            paths,
            poll_interval: poll_interval.max(Duration::from_millis(10)),
            events: rx,
            _watcher: watcher,
            fingerprints,
        }
    }

    fn try_register(
        paths: &[PathBuf],
        tx: mpsc::UnboundedSender<notify::Result<notify::Event>>,
    ) -> Option<RecommendedWatcher> {
        let mut watcher = match notify::recommended_watcher(move |event| {
            let _ = tx.send(event);
        }) {
            Ok(watcher) => watcher,
            Err(error) => {
                warn!(%error, "file notifications unavailable; falling back to polling");
                return None;
            }
        };
        let parents: BTreeSet<PathBuf> = paths
            .iter()
            .filter_map(|path| path.parent().map(Path::to_path_buf))
            .collect();
        for parent in parents {
            if let Err(error) = watcher.watch(&parent, RecursiveMode::NonRecursive) {
                warn!(dir = %parent.display(), %error, "cannot watch directory; polling covers it");
            }
        }
        Some(watcher)
    }

    /// Waits until one of the watched files actually changes content
    /// fingerprint. Notification events wake the check early; the interval
    /// poll guarantees progress without them.
    pub async fn wait_for_change(&mut self) {
        loop {
            tokio::select! {
                event = self.events.recv() => {
                    if self.is_relevant(event) {
                        tokio::time::sleep(DEBOUNCE).await;
                        self.drain_pending();
                        if self.refresh_fingerprints() {
                            return;
                        }
                    }
                }
                _ = tokio::time::sleep(self.poll_interval) => {
                    if self.refresh_fingerprints() {
                        return;
                    }
                }
            }
        }
    }

    fn is_relevant(&self, event: Option<notify::Result<notify::Event>>) -> bool {
        match event {
            Some(Ok(event)) => {
                if event.paths.is_empty() {
                    return true;
                }
                // Event paths are absolute while watched paths may be
                // relative; matching on file name is enough because the
                // fingerprint check is the real authority.
                event.paths.iter().any(|changed| {
                    changed
                        .file_name()
                        .map(|name| self.paths.iter().any(|watched| watched.file_name() == Some(name)))
                        .unwrap_or(true)
                })
            }
            Some(Err(error)) => {
                warn!(%error, "watch error; verifying by fingerprint");
                true
            }
            // Channel closed: the notify backend is gone, polling remains.
            None => false,
        }
    }

    fn drain_pending(&mut self) {
        while self.events.try_recv().is_ok() {}
    }

    /// Recomputes all fingerprints; true when any changed.
    fn refresh_fingerprints(&mut self) -> bool {
        let mut changed = false;
        for path in &self.paths {
            let current = mtime_fingerprint_sync(path);
            match self.fingerprints.get(path) {
                Some(previous) if *previous == current => {}
                _ => {
                    trace!(path = %path.display(), "fingerprint changed");
                    changed = true;
                    self.fingerprints.insert(path.clone(), current);
                }
            }
        }
        if changed {
            debug!("watched configuration changed");
        }
        changed
    }
}
