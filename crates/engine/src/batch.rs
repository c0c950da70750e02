// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One batch: snapshot the queue, persist the selection, watch it.

use crate::config::{ConfigError, WatchConfig};
use crate::session::Poller;
use crate::source::{SourceError, StatusSource};
use crate::supervisor::{BatchReport, Supervisor};
use qw_core::{build_snapshot, select, Clock, Diagnostics, Taxonomy};
use qw_storage::{save_snapshot, SnapshotArtifact, SnapshotError};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("initial status query failed: {0}")]
    Source(#[from] SourceError),
    #[error("failed to write snapshot: {0}")]
    Snapshot(#[from] SnapshotError),
    #[error("cancelled before the initial snapshot")]
    Cancelled,
}

#[derive(Debug)]
pub struct BatchOutcome {
    /// Selected job ids in report order
    pub selected: Vec<String>,
    pub snapshot_path: PathBuf,
    pub diagnostics: Diagnostics,
    /// `None` when the config did not ask to watch
    pub watch: Option<BatchReport>,
}

/// Snapshot, select, save, then optionally watch every selected job until
/// each session ends or `cancel` fires.
pub async fn run_batch<S, C>(
    config: &WatchConfig,
    source: S,
    clock: C,
    taxonomy: Arc<Taxonomy>,
    cancel: CancellationToken,
) -> Result<BatchOutcome, BatchError>
where
    S: StatusSource,
    C: Clock,
{
    config.validate()?;

    let text = tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            tracing::info!("cancelled during the initial status query");
            return Err(BatchError::Cancelled);
        }
        fetched = fetch_queue(&source, config.fetch_timeout) => fetched?,
    };
    let (snapshot, diagnostics) = build_snapshot(&text, &taxonomy, clock.now());
    let selection = select(&snapshot.jobs, &config.filter, &taxonomy);
    let selected: Vec<String> = selection.keys().cloned().collect();
    tracing::info!(
        jobs = snapshot.len(),
        selected = selected.len(),
        parse_errors = diagnostics.parse_errors.len(),
        "took snapshot"
    );

    let snapshot_path = config.layout.snapshot_path();
    let artifact = SnapshotArtifact::new(snapshot.taken_at, selection);
    save_snapshot(&snapshot_path, &artifact)?;
    tracing::info!(path = %snapshot_path.display(), "wrote snapshot");

    let watch = if config.watch && !selected.is_empty() {
        let mut poller = Poller::new(source, clock, taxonomy, cancel)
            .fetch_timeout(config.fetch_timeout)
            .retry(config.retry);
        if let Some(max) = config.max_concurrent_queries {
            poller = poller.limit_queries(max);
        }
        let supervisor = Supervisor::new(poller, config.layout.clone(), config.interval);
        Some(supervisor.run(selected.clone()).await)
    } else {
        None
    };

    Ok(BatchOutcome {
        selected,
        snapshot_path,
        diagnostics,
        watch,
    })
}

/// Query the whole queue once.
async fn fetch_queue<S: StatusSource>(
    source: &S,
    timeout: Duration,
) -> Result<String, SourceError> {
    match tokio::time::timeout(timeout, source.fetch(None)).await {
        Ok(result) => result,
        Err(_) => Err(SourceError::Timeout {
            command: source.describe(),
            timeout,
        }),
    }
}

#[cfg(test)]
#[path = "batch_tests.rs"]
mod tests;
