// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Snapshot artifact: the classified records of the selected jobs.
//!
//! Written once per batch as pretty JSON. An existing snapshot at the same
//! path is rotated to `.bak` before the new one replaces it.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use qw_core::JobRecord;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Current snapshot schema version
pub const CURRENT_SNAPSHOT_VERSION: u32 = 1;

const MAX_BAK_FILES: u32 = 3;

/// Errors that can occur in snapshot operations
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported snapshot version {0}")]
    Version(u32),
}

/// The selected jobs at the moment the batch started.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotArtifact {
    /// Schema version
    #[serde(rename = "v")]
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub jobs: IndexMap<String, JobRecord>,
}

impl SnapshotArtifact {
    pub fn new(created_at: DateTime<Utc>, jobs: IndexMap<String, JobRecord>) -> Self {
        Self {
            version: CURRENT_SNAPSHOT_VERSION,
            created_at,
            jobs,
        }
    }
}

/// Write the artifact via a temp file and rename.
pub fn save_snapshot(path: &Path, artifact: &SnapshotArtifact) -> Result<(), SnapshotError> {
    let io = |source| SnapshotError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io)?;
    }
    let json = serde_json::to_vec_pretty(artifact)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).map_err(io)?;
    if path.exists() {
        fs::rename(path, rotate_bak_path(path)).map_err(io)?;
    }
    fs::rename(&tmp, path).map_err(io)?;
    Ok(())
}

pub fn load_snapshot(path: &Path) -> Result<SnapshotArtifact, SnapshotError> {
    let bytes = fs::read(path).map_err(|source| SnapshotError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let artifact: SnapshotArtifact = serde_json::from_slice(&bytes)?;
    if artifact.version != CURRENT_SNAPSHOT_VERSION {
        return Err(SnapshotError::Version(artifact.version));
    }
    Ok(artifact)
}

/// Pick the next `.bak` / `.bak.N` path, rotating older backups out.
///
/// Keeps up to [`MAX_BAK_FILES`] backups: `.bak`, `.bak.2`, `.bak.3`.
pub(crate) fn rotate_bak_path(path: &Path) -> PathBuf {
    let bak = |n: u32| {
        if n == 1 {
            path.with_extension("json.bak")
        } else {
            path.with_extension(format!("json.bak.{n}"))
        }
    };

    let oldest = bak(MAX_BAK_FILES);
    if oldest.exists() {
        let _ = fs::remove_file(&oldest);
    }
    for n in (1..MAX_BAK_FILES).rev() {
        let src = bak(n);
        if src.exists() {
            let _ = fs::rename(&src, bak(n + 1));
        }
    }

    bak(1)
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
