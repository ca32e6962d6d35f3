// /////////////////////////////////////////////////////////////////////////////
// Layered Configuration Resolver
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Shared File Source Plumbing
//!
//! The pieces every file-backed source shares: the readability probe, the
//! mtime fingerprint, UTF-8 reads that reject binary content, and the
//! advisory extension warning.

use std::path::Path;

use layered_config_domain::Fingerprint;
use tracing::warn;

use super::file_format::FileFormat;

/// Cheap availability probe: the path exists and is a regular file.
pub(crate) async fn probe_readable(path: &Path) -> bool {
    match tokio::fs::metadata(path).await {
        Ok(metadata) => metadata.is_file(),
        Err(_) => false,
    }
}

/// Fingerprints the file's modification time.
pub(crate) async fn mtime_fingerprint(path: &Path) -> Fingerprint {
    match tokio::fs::metadata(path).await {
        Ok(metadata) => match metadata.modified() {
            Ok(mtime) => Fingerprint::of_mtime(mtime),
            Err(_) => Fingerprint::Unavailable,
        },
        Err(_) => Fingerprint::Unavailable,
    }
}

/// Synchronous variant of the mtime fingerprint, for polling paths that
/// run outside the async read path.
pub(crate) fn mtime_fingerprint_sync(path: &Path) -> Fingerprint {
    match std::fs::metadata(path) {
        Ok(metadata) => match metadata.modified() {
            Ok(mtime) => Fingerprint::of_mtime(mtime),
            Err(_) => Fingerprint::Unavailable,
        },
        Err(_) => Fingerprint::Unavailable,
    }
}

/// Reads the file as UTF-8 text.
///
/// Binary content (embedded NUL or invalid UTF-8) is rejected with a
/// decode message; the error string is what lands on source metadata.
pub(crate) async fn read_utf8(path: &Path) -> Result<String, String> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
    if bytes.contains(&0) {
        return Err(format!("{} contains binary content", path.display()));
    }
    String::from_utf8(bytes).map_err(|e| format!("{} is not valid UTF-8: {e}", path.display()))
}

/// Warns when the path's extension does not advertise `expected`.
/// Advisory only; the caller parses regardless.
pub(crate) fn check_extension(path: &Path, expected: FileFormat) {
    match FileFormat::from_path(path) {
        Some(found) if found == expected => {}
        Some(found) => warn!(
            path = %path.display(),
            expected = ?expected,
            found = ?found,
            "file extension does not match the source format; parsing anyway"
        ),
        None => warn!(
            path = %path.display(),
            expected = ?expected,
            "file extension is not recognized; parsing anyway"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_probe_readable() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(probe_readable(file.path()).await);
        assert!(!probe_readable(Path::new("/definitely/not/here.json")).await);
        let dir = tempfile::tempdir().unwrap();
        assert!(!probe_readable(dir.path()).await);
    }

    #[tokio::test]
    async fn test_read_utf8_rejects_binary() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blob.json");
        std::fs::write(&path, [0x7fu8, 0x00, 0x01, 0x02]).unwrap();
        let err = read_utf8(&path).await.unwrap_err();
        assert!(err.contains("binary"));
    }

    #[tokio::test]
    async fn test_mtime_fingerprint_changes_with_touch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.toml");
        std::fs::write(&path, "x = 1").unwrap();
        let first = mtime_fingerprint(&path).await;
        assert!(!first.is_unavailable());
        assert!(mtime_fingerprint(Path::new("/missing")).await.is_unavailable());
    }
}
