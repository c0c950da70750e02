// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runs one watch session per job and gathers their results.

use crate::session::{Poller, SessionError, SessionReport, WatchSession};
use crate::source::StatusSource;
use qw_core::Clock;
use qw_storage::OutputLayout;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Outcome of every session in a batch. One failure never stops the rest.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub finished: Vec<SessionReport>,
    pub failed: Vec<SessionError>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn was_cancelled(&self) -> bool {
        self.finished.iter().any(|r| r.cancelled)
    }
}

pub struct Supervisor<S, C> {
    poller: Poller<S, C>,
    layout: OutputLayout,
    interval: Duration,
}

impl<S: StatusSource, C: Clock> Supervisor<S, C> {
    pub fn new(poller: Poller<S, C>, layout: OutputLayout, interval: Duration) -> Self {
        Self {
            poller,
            layout,
            interval,
        }
    }

    /// Cancelling this token stops every session at its next suspension point.
    pub fn cancel_token(&self) -> CancellationToken {
        self.poller.cancel_token().clone()
    }

    pub async fn run<I>(&self, job_ids: I) -> BatchReport
    where
        I: IntoIterator<Item = String>,
    {
        let mut tasks = JoinSet::new();
        for job_id in job_ids {
            let sinks = self.layout.job_sinks(&job_id);
            let session = WatchSession::new(job_id, self.interval, sinks);
            let poller = self.poller.clone();
            tasks.spawn(async move { poller.run(session).await });
        }
        tracing::info!(sessions = tasks.len(), "started watch sessions");

        let mut report = BatchReport::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(done)) => {
                    tracing::debug!(
                        job_id = %done.job_id,
                        state = ?done.final_state,
                        "session ended"
                    );
                    report.finished.push(done);
                }
                Ok(Err(e)) => {
                    tracing::error!(error = %e, "session failed");
                    report.failed.push(e);
                }
                Err(e) => {
                    tracing::error!(error = %e, "session task aborted");
                    report.failed.push(SessionError::Task(e.to_string()));
                }
            }
        }
        tracing::info!(
            finished = report.finished.len(),
            failed = report.failed.len(),
            "all watch sessions ended"
        );
        report
    }
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
