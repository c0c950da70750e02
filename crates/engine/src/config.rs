// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run configuration handed to the engine by the command line.

use crate::backoff::RetryPolicy;
use crate::source::{CommandSource, FileSource, ReportSource};
use qw_core::JobFilter;
use qw_storage::OutputLayout;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(120);
pub const DEFAULT_COMMAND: &str = "qstat -f";
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("sampling interval must be at least one second")]
    ZeroInterval,
    #[error("status command is empty")]
    EmptyCommand,
    #[error("fetch timeout must be positive")]
    ZeroTimeout,
    #[error("max concurrent queries must be positive")]
    ZeroQueries,
}

#[derive(Debug, Clone)]
pub struct WatchConfig {
    pub filter: JobFilter,
    pub interval: Duration,
    pub command: String,
    /// Saved report used instead of running `command`
    pub infile: Option<PathBuf>,
    pub layout: OutputLayout,
    pub fetch_timeout: Duration,
    pub retry: RetryPolicy,
    /// Bound on status queries in flight across all sessions
    pub max_concurrent_queries: Option<usize>,
    /// Keep polling the selected jobs after the snapshot is written
    pub watch: bool,
}

impl WatchConfig {
    pub fn new(layout: OutputLayout) -> Self {
        Self {
            filter: JobFilter::default(),
            interval: DEFAULT_INTERVAL,
            command: DEFAULT_COMMAND.to_string(),
            infile: None,
            layout,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            retry: RetryPolicy::default(),
            max_concurrent_queries: None,
            watch: true,
        }
    }

    qw_core::setters! {
        into {
            command: String,
        }
        set {
            filter: JobFilter,
            interval: Duration,
            fetch_timeout: Duration,
            retry: RetryPolicy,
            watch: bool,
        }
        option {
            infile: PathBuf,
            max_concurrent_queries: usize,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval < Duration::from_secs(1) {
            return Err(ConfigError::ZeroInterval);
        }
        if self.infile.is_none() && self.command.trim().is_empty() {
            return Err(ConfigError::EmptyCommand);
        }
        if self.fetch_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.max_concurrent_queries == Some(0) {
            return Err(ConfigError::ZeroQueries);
        }
        Ok(())
    }

    /// The static file when one is configured, otherwise the command.
    pub fn source(&self) -> ReportSource {
        match &self.infile {
            Some(path) => ReportSource::File(FileSource::new(path)),
            None => ReportSource::Command(CommandSource::new(&self.command, self.fetch_timeout)),
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
