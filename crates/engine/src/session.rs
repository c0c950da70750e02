// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-job watch session.
//!
//! A session is an explicit state machine driven one snapshot at a time:
//!
//! ```text
//!            ┌────────┐  running code   ┌─────────┐
//!   start ──▶│ Queued │────────────────▶│ Running │──┐ one data row
//!            └────────┘                 └─────────┘◀─┘ per sample
//!                 │ completed code / absent  │
//!                 ▼                          ▼
//!            ┌───────────┐   ┌─────────┐
//!            │ Completed │   │ Unknown │   (terminal)
//!            └───────────┘   └─────────┘
//! ```
//!
//! Rows are written synchronously inside [`WatchSession::observe`], so a
//! cancelled run never leaves half a sample behind. The async loop that
//! fetches, observes, and sleeps lives in [`Poller`].

use crate::backoff::RetryPolicy;
use crate::rows::{data_row, env_row, info_row};
use crate::source::{SourceError, StatusSource};
use qw_core::{build_snapshot, Clock, JobRecord, JobState, ReportSnapshot, Taxonomy};
use qw_storage::{JobSinks, Recorder, RecorderError};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

/// A session that could not finish.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("job {job_id}: status query failed after {attempts} attempts: {source}")]
    Source {
        job_id: String,
        attempts: u32,
        #[source]
        source: SourceError,
    },
    #[error("job {job_id}: {source}")]
    Sink {
        job_id: String,
        #[source]
        source: RecorderError,
    },
    #[error("session task failed: {0}")]
    Task(String),
}

impl SessionError {
    pub fn job_id(&self) -> Option<&str> {
        match self {
            SessionError::Source { job_id, .. } | SessionError::Sink { job_id, .. } => Some(job_id),
            SessionError::Task(_) => None,
        }
    }
}

/// What the caller should do after an observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Sleep for the interval, then sample again
    Continue,
    /// The session is terminal
    Done(JobState),
}

#[derive(Debug)]
pub struct WatchSession {
    job_id: String,
    interval: Duration,
    sinks: JobSinks,
    last_state: Option<JobState>,
    info_emitted: bool,
    terminal: bool,
    samples: u64,
    data_rows: u64,
}

impl WatchSession {
    pub fn new(job_id: impl Into<String>, interval: Duration, sinks: JobSinks) -> Self {
        Self {
            job_id: job_id.into(),
            interval,
            sinks,
            last_state: None,
            info_emitted: false,
            terminal: false,
            samples: 0,
            data_rows: 0,
        }
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn sinks(&self) -> &JobSinks {
        &self.sinks
    }

    /// `None` until the first sample that finds the job.
    pub fn last_state(&self) -> Option<JobState> {
        self.last_state
    }

    pub fn info_emitted(&self) -> bool {
        self.info_emitted
    }

    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    pub fn samples(&self) -> u64 {
        self.samples
    }

    pub fn data_rows(&self) -> u64 {
        self.data_rows
    }

    /// Apply one snapshot, writing whatever rows it calls for.
    ///
    /// A terminal session ignores further snapshots.
    pub fn observe(
        &mut self,
        snapshot: &ReportSnapshot,
        recorder: &Recorder,
        taxonomy: &Taxonomy,
    ) -> Result<Step, RecorderError> {
        if self.terminal {
            return Ok(Step::Done(self.final_state()));
        }
        self.samples += 1;

        let Some(record) = snapshot.get(&self.job_id) else {
            return Ok(self.finish(JobState::Unknown, "job left the queue"));
        };

        match record.state {
            state if self.moves_backward(state) => {
                tracing::warn!(
                    job_id = %self.job_id,
                    from = ?self.last_state,
                    to = %state,
                    "job state moved backward; ignoring"
                );
            }
            JobState::Completed => return Ok(self.finish(JobState::Completed, "job completed")),
            JobState::Queued => self.transition(JobState::Queued),
            JobState::Running => {
                self.transition(JobState::Running);
                if !self.info_emitted {
                    recorder.append(&self.sinks.info, &info_row(record))?;
                    self.info_emitted = true;
                }
                recorder.append(&self.sinks.data, &data_row(record, snapshot.taken_at))?;
                self.data_rows += 1;
            }
            JobState::Unknown => {
                tracing::warn!(
                    job_id = %self.job_id,
                    code = raw_state(record, taxonomy).unwrap_or_default(),
                    "unrecognized job state; polling on"
                );
            }
        }

        if !record.env.is_empty() {
            recorder.append(&self.sinks.env, &env_row(record, snapshot.taken_at))?;
        }
        Ok(Step::Continue)
    }

    /// Treat the job as gone without looking at a report.
    pub fn observe_missing(&mut self) -> Step {
        if self.terminal {
            return Step::Done(self.final_state());
        }
        self.samples += 1;
        self.finish(JobState::Unknown, "scheduler no longer knows the job")
    }

    /// Stop after the current sample, keeping the last observed state.
    pub fn close(&mut self) -> Step {
        self.terminal = true;
        Step::Done(self.final_state())
    }

    /// States only move forward through the lifecycle.
    fn moves_backward(&self, to: JobState) -> bool {
        self.last_state.is_some_and(|from| to.rank() < from.rank())
    }

    fn transition(&mut self, to: JobState) {
        if self.last_state != Some(to) {
            tracing::info!(
                job_id = %self.job_id,
                from = ?self.last_state,
                %to,
                "job state changed"
            );
            self.last_state = Some(to);
        }
    }

    fn finish(&mut self, state: JobState, reason: &str) -> Step {
        tracing::info!(
            job_id = %self.job_id,
            from = ?self.last_state,
            to = %state,
            reason,
            "session finished"
        );
        self.last_state = Some(state);
        self.terminal = true;
        Step::Done(state)
    }

    fn final_state(&self) -> JobState {
        self.last_state.unwrap_or(JobState::Unknown)
    }
}

fn raw_state<'a>(record: &'a JobRecord, taxonomy: &Taxonomy) -> Option<&'a str> {
    record
        .metrics
        .get(&taxonomy.fields.state)
        .and_then(|v| v.as_text())
}

/// How a session run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReport {
    pub job_id: String,
    /// `None` when cancelled before the job was ever seen
    pub final_state: Option<JobState>,
    pub samples: u64,
    pub data_rows: u64,
    pub cancelled: bool,
}

impl SessionReport {
    fn from_session(session: &WatchSession, cancelled: bool) -> Self {
        Self {
            job_id: session.job_id.clone(),
            final_state: session.last_state,
            samples: session.samples,
            data_rows: session.data_rows,
            cancelled,
        }
    }
}

enum Fetched {
    Report(String),
    Gone,
    Cancelled,
}

/// Everything a session needs besides its own state. Cheap to clone; one
/// copy per task.
#[derive(Clone)]
pub struct Poller<S, C> {
    source: S,
    clock: C,
    taxonomy: Arc<Taxonomy>,
    recorder: Recorder,
    fetch_timeout: Duration,
    retry: RetryPolicy,
    limiter: Option<Arc<Semaphore>>,
    cancel: CancellationToken,
}

impl<S: StatusSource, C: Clock> Poller<S, C> {
    pub fn new(source: S, clock: C, taxonomy: Arc<Taxonomy>, cancel: CancellationToken) -> Self {
        let recorder = Recorder::new(Arc::clone(&taxonomy));
        Self {
            source,
            clock,
            taxonomy,
            recorder,
            fetch_timeout: crate::config::DEFAULT_FETCH_TIMEOUT,
            retry: RetryPolicy::default(),
            limiter: None,
            cancel,
        }
    }

    qw_core::setters! {
        set {
            fetch_timeout: Duration,
            retry: RetryPolicy,
        }
    }

    /// Share a bound on concurrent status queries.
    pub fn limit_queries(mut self, max: usize) -> Self {
        self.limiter = Some(Arc::new(Semaphore::new(max)));
        self
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Sample, sleep, repeat until the session is terminal or cancelled.
    pub async fn run(&self, mut session: WatchSession) -> Result<SessionReport, SessionError> {
        tracing::info!(job_id = %session.job_id, interval = ?session.interval, "watching job");
        loop {
            let text = match self.fetch_with_retry(&session.job_id).await? {
                Fetched::Report(text) => text,
                Fetched::Gone => {
                    session.observe_missing();
                    break;
                }
                Fetched::Cancelled => return Ok(self.cancelled(&session)),
            };

            let (snapshot, _) = build_snapshot(&text, &self.taxonomy, self.clock.now());
            let step = session
                .observe(&snapshot, &self.recorder, &self.taxonomy)
                .map_err(|source| SessionError::Sink {
                    job_id: session.job_id.clone(),
                    source,
                })?;
            if let Step::Done(_) = step {
                break;
            }
            if self.source.is_static() {
                session.close();
                break;
            }

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Ok(self.cancelled(&session)),
                _ = tokio::time::sleep(session.interval) => {}
            }
        }
        Ok(SessionReport::from_session(&session, false))
    }

    fn cancelled(&self, session: &WatchSession) -> SessionReport {
        tracing::info!(job_id = %session.job_id, samples = session.samples, "session cancelled");
        SessionReport::from_session(session, true)
    }

    async fn fetch_with_retry(&self, job_id: &str) -> Result<Fetched, SessionError> {
        let mut attempt = 0;
        loop {
            let result = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Ok(Fetched::Cancelled),
                result = self.fetch_once(job_id) => result,
            };
            match result {
                Ok(text) => return Ok(Fetched::Report(text)),
                Err(e) if e.is_lookup_miss() => return Ok(Fetched::Gone),
                Err(e) if attempt < self.retry.max_retries => {
                    let delay = self.retry.delay(attempt);
                    attempt += 1;
                    tracing::warn!(
                        job_id,
                        attempt,
                        ?delay,
                        error = %e,
                        "status query failed; retrying"
                    );
                    tokio::select! {
                        biased;
                        _ = self.cancel.cancelled() => return Ok(Fetched::Cancelled),
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
                Err(source) => {
                    tracing::error!(job_id, error = %source, "status query failed; giving up");
                    return Err(SessionError::Source {
                        job_id: job_id.to_string(),
                        attempts: attempt + 1,
                        source,
                    });
                }
            }
        }
    }

    async fn fetch_once(&self, job_id: &str) -> Result<String, SourceError> {
        // A closed semaphore means no limit.
        let _permit = match &self.limiter {
            Some(limiter) => Arc::clone(limiter).acquire_owned().await.ok(),
            None => None,
        };
        match tokio::time::timeout(self.fetch_timeout, self.source.fetch(Some(job_id))).await {
            Ok(result) => result,
            Err(_) => Err(SourceError::Timeout {
                command: self.source.describe(),
                timeout: self.fetch_timeout,
            }),
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
