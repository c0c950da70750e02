// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the qwatch binary.

use qw_engine::DEFAULT_FETCH_TIMEOUT;
use std::path::PathBuf;
use std::time::Duration;

/// Taxonomy file used when `--taxonomy` is not given
pub fn taxonomy_path() -> Option<PathBuf> {
    std::env::var("QW_TAXONOMY")
        .ok()
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
}

/// Per-query timeout (default 60s, configurable via `QW_FETCH_TIMEOUT_MS`).
pub fn fetch_timeout() -> Duration {
    std::env::var("QW_FETCH_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .filter(|&ms| ms > 0)
        .map(Duration::from_millis)
        .unwrap_or(DEFAULT_FETCH_TIMEOUT)
}

/// Bound on concurrent status queries when `--max-queries` is not given
pub fn max_queries() -> Option<usize> {
    std::env::var("QW_MAX_QUERIES")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .filter(|&n| n > 0)
}

/// Log filter directive: `QW_LOG` > `RUST_LOG` > `info`
pub fn log_filter() -> String {
    ["QW_LOG", "RUST_LOG"]
        .iter()
        .find_map(|key| std::env::var(key).ok().filter(|s| !s.is_empty()))
        .unwrap_or_else(|| "info".to_string())
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
