// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command-line arguments.

use crate::output::OutputFormat;
use clap::Parser;
use qw_core::JobFilter;
use qw_engine::{RetryPolicy, WatchConfig, DEFAULT_COMMAND};
use qw_storage::{OutputLayout, DEFAULT_PATTERN};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(
    name = "qwatch",
    version,
    about = "Snapshot and watch batch-queue jobs, recording resource usage over time",
    styles = crate::color::styles()
)]
pub struct Cli {
    /// Job id or name to watch; repeatable or comma-separated (`-j 9001.sequoia -j 9002`)
    #[arg(short, long = "jobs", value_name = "JOB", value_delimiter = ',')]
    pub jobs: Vec<String>,

    /// Submitting user to watch; repeatable or comma-separated. Takes precedence over --jobs
    #[arg(short, long = "users", value_name = "USER", value_delimiter = ',')]
    pub users: Vec<String>,

    /// Parse a saved report instead of running the status command; each job is sampled once
    #[arg(long, visible_alias = "in", value_name = "FILE")]
    pub infile: Option<PathBuf>,

    /// Output directory [default: qwatch-<timestamp>]
    #[arg(short, long, value_name = "DIR")]
    pub directory: Option<PathBuf>,

    /// Prefix for every output file name
    #[arg(short, long, alias = "filename_pattern", default_value = DEFAULT_PATTERN)]
    pub filename_pattern: String,

    /// Status command; `{job}` is replaced by the polled job id
    #[arg(long, default_value = DEFAULT_COMMAND)]
    pub cmd: String,

    /// Seconds between samples of one job
    #[arg(short, long, visible_alias = "interval", value_name = "SECS", default_value_t = 120)]
    pub sleeper: u64,

    /// Retries for a failing status query before the session gives up
    #[arg(long, default_value_t = qw_engine::DEFAULT_MAX_RETRIES)]
    pub retries: u32,

    /// Bound on status queries in flight at once [env: QW_MAX_QUERIES]
    #[arg(long, value_name = "N")]
    pub max_queries: Option<usize>,

    /// Keyword taxonomy TOML file [env: QW_TAXONOMY]
    #[arg(long, value_name = "FILE")]
    pub taxonomy: Option<PathBuf>,

    /// Write the snapshot and exit without watching
    #[arg(long)]
    pub no_watch: bool,

    /// Move everything but snapshots, info and data files into `archive/`, then exit
    #[arg(long)]
    pub clean: bool,

    /// Archive the output directory after watching
    #[arg(long, alias = "clean_after")]
    pub clean_after: bool,

    /// Summary format
    #[arg(short, long, value_enum, default_value_t)]
    pub output: OutputFormat,
}

impl Cli {
    pub fn layout(&self) -> OutputLayout {
        let dir = self.directory.clone().unwrap_or_else(default_directory);
        OutputLayout::new(dir, self.filename_pattern.clone())
    }

    pub fn taxonomy_path(&self) -> Option<PathBuf> {
        self.taxonomy.clone().or_else(crate::env::taxonomy_path)
    }

    pub fn watch_config(&self, layout: OutputLayout) -> WatchConfig {
        let filter = JobFilter::new(self.jobs.iter().cloned(), self.users.iter().cloned());
        let retry = RetryPolicy {
            max_retries: self.retries,
            ..RetryPolicy::default()
        };
        let mut config = WatchConfig::new(layout)
            .filter(filter)
            .command(self.cmd.clone())
            .interval(Duration::from_secs(self.sleeper))
            .fetch_timeout(crate::env::fetch_timeout())
            .retry(retry)
            .watch(!self.no_watch);
        if let Some(path) = &self.infile {
            config = config.infile(path);
        }
        if let Some(max) = self.max_queries.or_else(crate::env::max_queries) {
            config = config.max_concurrent_queries(max);
        }
        config
    }
}

fn default_directory() -> PathBuf {
    let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
    PathBuf::from(format!("qwatch-{stamp}"))
}

#[cfg(test)]
#[path = "args_tests.rs"]
mod tests;
