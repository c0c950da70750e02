// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Output directory layout and cleanup.
//!
//! ```text
//! <dir>/<pattern>.json                 snapshot of the selected jobs
//! <dir>/<pattern>_<job>_info.jsonl     one static row per job
//! <dir>/<pattern>_<job>_data.jsonl     one row per running sample
//! <dir>/<pattern>_<job>_env.jsonl      one environment row per sample
//! <dir>/qwatch.log                     run log
//! <dir>/archive/                       files moved aside by `clean`
//! ```

use crate::sink::{Sink, SinkKind};
use std::fs;
use std::io;
use std::path::PathBuf;

pub const DEFAULT_PATTERN: &str = "qwatch";
pub const LOG_FILE: &str = "qwatch.log";
pub const ARCHIVE_DIR: &str = "archive";

const KEPT_SUFFIXES: &[&str] = &[".json", "_info.jsonl", "_data.jsonl"];

/// The three sinks a watch session writes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSinks {
    pub info: Sink,
    pub data: Sink,
    pub env: Sink,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    pub dir: PathBuf,
    pub pattern: String,
}

impl OutputLayout {
    pub fn new(dir: impl Into<PathBuf>, pattern: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            pattern: pattern.into(),
        }
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.dir.join(format!("{}.json", self.pattern))
    }

    pub fn log_path(&self) -> PathBuf {
        self.dir.join(LOG_FILE)
    }

    pub fn job_sinks(&self, job_id: &str) -> JobSinks {
        let stem = format!("{}_{}", self.pattern, file_safe(job_id));
        let sink = |suffix: &str, kind| {
            let path = self.dir.join(format!("{stem}_{suffix}.jsonl"));
            Sink::new(path, kind)
        };
        JobSinks {
            info: sink("info", SinkKind::Info),
            data: sink("data", SinkKind::Data),
            env: sink("env", SinkKind::Env),
        }
    }

    /// Move everything except snapshots, info/data sinks, and the log into
    /// `archive/`. Returns the new paths of the moved files.
    pub fn clean(&self) -> io::Result<Vec<PathBuf>> {
        let archive = self.dir.join(ARCHIVE_DIR);
        let mut moved = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if is_kept(&name) {
                continue;
            }
            fs::create_dir_all(&archive)?;
            let dest = archive.join(name.as_ref());
            fs::rename(entry.path(), &dest)?;
            moved.push(dest);
        }
        if !moved.is_empty() {
            tracing::info!(
                count = moved.len(),
                archive = %archive.display(),
                "archived output files"
            );
        }
        Ok(moved)
    }
}

fn is_kept(name: &str) -> bool {
    name == LOG_FILE || KEPT_SUFFIXES.iter().any(|s| name.ends_with(s))
}

/// Replace characters that are unsafe in file names.
pub fn file_safe(job_id: &str) -> String {
    job_id
        .chars()
        .map(|c| if is_safe_char(c) { c } else { '_' })
        .collect()
}

fn is_safe_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_')
}

#[cfg(test)]
#[path = "layout_tests.rs"]
mod tests;
