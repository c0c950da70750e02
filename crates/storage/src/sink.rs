// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only JSON-lines sinks for time-series rows.
//!
//! File format:
//!
//! ```text
//! {"columns":["sample_time","job_state","resources_used.mem"]}
//! {"sample_time":"2024-01-01T00:00:00+00:00","job_state":"R","resources_used.mem":"1024kb"}
//! ```
//!
//! The header is derived from the first row ever written. Later rows are
//! streamed onto the end of the file, so rows already on disk are never
//! rewritten. Writers to the same path are serialized through a per-path lock.

use indexmap::IndexMap;
use parking_lot::Mutex;
use qw_core::Taxonomy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// One output row, columns in insertion order.
pub type Row = IndexMap<String, serde_json::Value>;

/// Columns the recorder adds itself; never checked against the taxonomy.
pub const SYNTHETIC_COLUMNS: &[&str] = &["job_id", "sample_time"];

/// Errors writing or reading a sink
#[derive(Debug, Error)]
pub enum RecorderError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode row for {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{path} has no valid header line")]
    MissingHeader { path: PathBuf },
}

impl RecorderError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        RecorderError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    fn json(path: &Path, source: serde_json::Error) -> Self {
        RecorderError::Json {
            path: path.to_path_buf(),
            source,
        }
    }

    fn missing_header(path: &Path) -> Self {
        RecorderError::MissingHeader {
            path: path.to_path_buf(),
        }
    }
}

/// What kind of rows a sink holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkKind {
    /// One static row per job
    Info,
    /// One resource-usage row per running sample
    Data,
    /// One environment row per sample; column names are variable names
    Env,
}

qw_core::simple_display! {
    SinkKind {
        Info => "info",
        Data => "data",
        Env => "env",
    }
}

/// A named output artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sink {
    pub path: PathBuf,
    pub kind: SinkKind,
}

impl Sink {
    pub fn new(path: impl Into<PathBuf>, kind: SinkKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    columns: Vec<String>,
}

impl Header {
    /// Row keys the header does not list.
    fn missing(&self, row: &Row) -> Vec<String> {
        row.keys()
            .filter(|k| !self.columns.contains(k))
            .cloned()
            .collect()
    }
}

/// Result of one append.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppendOutcome {
    /// The sink did not exist and was created with this row's header
    pub created: bool,
    /// Row keys the taxonomy does not know
    pub drift: Vec<String>,
    /// Row keys missing from the sink's header
    pub new_columns: Vec<String>,
}

/// Serializes appends per sink path and checks rows for schema drift.
#[derive(Clone)]
pub struct Recorder {
    taxonomy: Arc<Taxonomy>,
    locks: Arc<Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>>,
}

impl Recorder {
    pub fn new(taxonomy: Arc<Taxonomy>) -> Self {
        Self {
            taxonomy,
            locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn lock_for(&self, path: &Path) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock();
        Arc::clone(locks.entry(path.to_path_buf()).or_default())
    }

    /// Append one row, creating the sink with a header if needed.
    ///
    /// Drift is reported in the outcome and logged; it never fails the append.
    pub fn append(&self, sink: &Sink, row: &Row) -> Result<AppendOutcome, RecorderError> {
        let lock = self.lock_for(&sink.path);
        let _guard = lock.lock();

        let mut outcome = AppendOutcome {
            drift: self.drift(sink.kind, row),
            ..Default::default()
        };
        if !outcome.drift.is_empty() {
            tracing::warn!(
                sink = %sink.path.display(),
                keys = ?outcome.drift,
                "row has keys outside the taxonomy"
            );
        }

        let path = &sink.path;
        if path.exists() {
            let header = read_header(path)?;
            outcome.new_columns = header.missing(row);
            if !outcome.new_columns.is_empty() {
                tracing::warn!(
                    sink = %path.display(),
                    columns = ?outcome.new_columns,
                    "row has columns missing from header"
                );
            }
            let mut file = OpenOptions::new()
                .append(true)
                .open(path)
                .map_err(|e| RecorderError::io(path, e))?;
            write_line(&mut file, path, row)?;
        } else {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(|e| RecorderError::io(parent, e))?;
            }
            let mut file = OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(path)
                .map_err(|e| RecorderError::io(path, e))?;
            let header = Header {
                columns: row.keys().cloned().collect(),
            };
            write_line(&mut file, path, &header)?;
            write_line(&mut file, path, row)?;
            outcome.created = true;
            tracing::debug!(sink = %path.display(), kind = %sink.kind, "created sink");
        }

        Ok(outcome)
    }

    fn drift(&self, kind: SinkKind, row: &Row) -> Vec<String> {
        if kind == SinkKind::Env {
            return Vec::new();
        }
        row.keys().filter(|k| self.is_drift(k)).cloned().collect()
    }

    fn is_drift(&self, key: &str) -> bool {
        !SYNTHETIC_COLUMNS.contains(&key) && !self.taxonomy.is_known(key)
    }
}

fn write_line<T: Serialize>(file: &mut File, path: &Path, value: &T) -> Result<(), RecorderError> {
    let mut line = serde_json::to_vec(value).map_err(|e| RecorderError::json(path, e))?;
    line.push(b'\n');
    file.write_all(&line).map_err(|e| RecorderError::io(path, e))?;
    file.flush().map_err(|e| RecorderError::io(path, e))
}

fn read_header(path: &Path) -> Result<Header, RecorderError> {
    let file = File::open(path).map_err(|e| RecorderError::io(path, e))?;
    let mut first = String::new();
    BufReader::new(file)
        .read_line(&mut first)
        .map_err(|e| RecorderError::io(path, e))?;
    serde_json::from_str(&first).map_err(|_| RecorderError::missing_header(path))
}

/// Read a sink back: its header columns and every row.
///
/// Blank lines are ignored.
pub fn read_sink(path: &Path) -> Result<(Vec<String>, Vec<Row>), RecorderError> {
    let header = read_header(path)?;
    let file = File::open(path).map_err(|e| RecorderError::io(path, e))?;
    let mut rows = Vec::new();
    for line in BufReader::new(file).lines().skip(1) {
        let line = line.map_err(|e| RecorderError::io(path, e))?;
        if line.trim().is_empty() {
            continue;
        }
        let row = serde_json::from_str(&line).map_err(|e| RecorderError::json(path, e))?;
        rows.push(row);
    }
    Ok((header.columns, rows))
}

#[cfg(test)]
#[path = "sink_tests.rs"]
mod tests;
