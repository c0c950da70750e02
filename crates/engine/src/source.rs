// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Where report text comes from: a status-query command or a static file.

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Output;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

/// Placeholder in a command template replaced by the job being polled.
pub const JOB_PLACEHOLDER: &str = "{job}";

/// Stderr text the scheduler prints for a job it no longer knows.
const UNKNOWN_JOB_MARKER: &str = "Unknown Job Id";

/// Errors obtaining report text
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("status command is empty")]
    EmptyCommand,
    #[error("status command not found: {program}")]
    NotFound { program: String },
    #[error("{command} exited with {status}: {stderr}")]
    Failed {
        command: String,
        status: String,
        stderr: String,
    },
    #[error("{command} timed out after {timeout:?}")]
    Timeout { command: String, timeout: Duration },
    #[error("failed to run {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("job {job_id} is unknown to the scheduler")]
    UnknownJob { job_id: String },
}

impl SourceError {
    /// The job is gone rather than the query broken.
    pub fn is_lookup_miss(&self) -> bool {
        matches!(self, SourceError::UnknownJob { .. })
    }
}

/// Produces raw report text.
#[async_trait]
pub trait StatusSource: Clone + Send + Sync + 'static {
    /// Fetch a report. `job_id` narrows the query when the source supports it.
    async fn fetch(&self, job_id: Option<&str>) -> Result<String, SourceError>;

    /// A static source yields the same text forever, so each session
    /// samples it once.
    fn is_static(&self) -> bool {
        false
    }

    /// Short description for logs and timeout errors.
    fn describe(&self) -> String;
}

/// Run a command, killing it if it outlives `timeout`.
pub async fn run_with_timeout(
    mut cmd: Command,
    timeout: Duration,
    description: &str,
) -> Result<Output, SourceError> {
    cmd.kill_on_drop(true);
    let command = description.to_string();
    match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(source)) if source.kind() == std::io::ErrorKind::NotFound => {
            Err(SourceError::NotFound { program: command })
        }
        Ok(Err(source)) => Err(SourceError::Spawn { command, source }),
        Err(_) => Err(SourceError::Timeout { command, timeout }),
    }
}

/// Invokes an external status-query command such as `qstat -f`.
///
/// The template is split on whitespace and executed directly. An argument
/// equal to `{job}` is replaced by the polled job id, or dropped when the
/// whole queue is queried.
#[derive(Debug, Clone)]
pub struct CommandSource {
    template: String,
    timeout: Duration,
}

impl CommandSource {
    pub fn new(template: impl Into<String>, timeout: Duration) -> Self {
        Self {
            template: template.into(),
            timeout,
        }
    }

    /// Program and arguments for one invocation.
    pub fn argv(&self, job_id: Option<&str>) -> Vec<String> {
        self.template
            .split_whitespace()
            .filter_map(|arg| match (arg.contains(JOB_PLACEHOLDER), job_id) {
                (false, _) => Some(arg.to_string()),
                (true, Some(job)) => Some(arg.replace(JOB_PLACEHOLDER, job)),
                (true, None) if arg == JOB_PLACEHOLDER => None,
                (true, None) => Some(arg.replace(JOB_PLACEHOLDER, "")),
            })
            .collect()
    }
}

#[async_trait]
impl StatusSource for CommandSource {
    async fn fetch(&self, job_id: Option<&str>) -> Result<String, SourceError> {
        let argv = self.argv(job_id);
        let (program, args) = argv.split_first().ok_or(SourceError::EmptyCommand)?;
        let mut cmd = Command::new(program);
        cmd.args(args);

        tracing::debug!(command = %argv.join(" "), "querying status");
        let output = run_with_timeout(cmd, self.timeout, program).await?;
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

        if !output.status.success() {
            if let (Some(job_id), true) = (job_id, stderr.contains(UNKNOWN_JOB_MARKER)) {
                return Err(SourceError::UnknownJob {
                    job_id: job_id.to_string(),
                });
            }
            return Err(SourceError::Failed {
                command: argv.join(" "),
                status: output.status.to_string(),
                stderr,
            });
        }
        if !stderr.is_empty() {
            tracing::warn!(command = %argv.join(" "), %stderr, "status command wrote to stderr");
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn describe(&self) -> String {
        self.template.clone()
    }
}

/// A saved report read from disk.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl StatusSource for FileSource {
    async fn fetch(&self, _job_id: Option<&str>) -> Result<String, SourceError> {
        tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| SourceError::Read {
                path: self.path.clone(),
                source,
            })
    }

    fn is_static(&self) -> bool {
        true
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Routes to whichever source the run was configured with.
#[derive(Debug, Clone)]
pub enum ReportSource {
    Command(CommandSource),
    File(FileSource),
}

#[async_trait]
impl StatusSource for ReportSource {
    async fn fetch(&self, job_id: Option<&str>) -> Result<String, SourceError> {
        match self {
            ReportSource::Command(source) => source.fetch(job_id).await,
            ReportSource::File(source) => source.fetch(job_id).await,
        }
    }

    fn is_static(&self) -> bool {
        match self {
            ReportSource::Command(source) => source.is_static(),
            ReportSource::File(source) => source.is_static(),
        }
    }

    fn describe(&self) -> String {
        match self {
            ReportSource::Command(source) => source.describe(),
            ReportSource::File(source) => source.describe(),
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::{SourceError, StatusSource};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::sync::Arc;
    use std::time::Duration;

    /// One scripted reply.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum FakeResponse {
        Report(String),
        /// Non-zero exit with this stderr
        Fail(String),
        UnknownJob,
        /// Never returns
        Hang,
        /// Report served after sleeping
        Slow(Duration, String),
    }

    struct FakeSourceState {
        script: VecDeque<FakeResponse>,
        /// Served once the script runs out
        fallback: FakeResponse,
        calls: Vec<Option<String>>,
        in_flight: usize,
        peak_in_flight: usize,
    }

    /// Counts a fetch as in flight until dropped.
    struct InFlight<'a>(&'a Mutex<FakeSourceState>);

    impl<'a> InFlight<'a> {
        fn enter(state: &'a Mutex<FakeSourceState>) -> Self {
            let mut guard = state.lock();
            guard.in_flight += 1;
            guard.peak_in_flight = guard.peak_in_flight.max(guard.in_flight);
            drop(guard);
            Self(state)
        }
    }

    impl Drop for InFlight<'_> {
        fn drop(&mut self) {
            self.0.lock().in_flight -= 1;
        }
    }

    /// Scripted status source for testing
    #[derive(Clone)]
    pub struct FakeStatusSource {
        inner: Arc<Mutex<FakeSourceState>>,
        is_static: bool,
    }

    impl Default for FakeStatusSource {
        fn default() -> Self {
            Self {
                inner: Arc::new(Mutex::new(FakeSourceState {
                    script: VecDeque::new(),
                    fallback: FakeResponse::Report(String::new()),
                    calls: Vec::new(),
                    in_flight: 0,
                    peak_in_flight: 0,
                })),
                is_static: false,
            }
        }
    }

    impl FakeStatusSource {
        pub fn new() -> Self {
            Self::default()
        }

        /// Serve these reports in order, then an empty report.
        pub fn reports<I, S>(reports: I) -> Self
        where
            I: IntoIterator<Item = S>,
            S: Into<String>,
        {
            let source = Self::new();
            for report in reports {
                source.push(FakeResponse::Report(report.into()));
            }
            source
        }

        pub fn static_report(report: impl Into<String>) -> Self {
            let mut source = Self::new();
            source.inner.lock().fallback = FakeResponse::Report(report.into());
            source.is_static = true;
            source
        }

        pub fn push(&self, response: FakeResponse) {
            self.inner.lock().script.push_back(response);
        }

        pub fn set_fallback(&self, response: FakeResponse) {
            self.inner.lock().fallback = response;
        }

        /// Job ids passed to each fetch, in order
        pub fn calls(&self) -> Vec<Option<String>> {
            self.inner.lock().calls.clone()
        }

        /// Most fetches that were ever running at once
        pub fn peak_in_flight(&self) -> usize {
            self.inner.lock().peak_in_flight
        }
    }

    #[async_trait]
    impl StatusSource for FakeStatusSource {
        async fn fetch(&self, job_id: Option<&str>) -> Result<String, SourceError> {
            let response = {
                let mut state = self.inner.lock();
                state.calls.push(job_id.map(str::to_string));
                let fallback = state.fallback.clone();
                state.script.pop_front().unwrap_or(fallback)
            };
            let _in_flight = InFlight::enter(&self.inner);
            match response {
                FakeResponse::Report(text) => Ok(text),
                FakeResponse::Fail(stderr) => Err(SourceError::Failed {
                    command: "fake".to_string(),
                    status: "exit status: 1".to_string(),
                    stderr,
                }),
                FakeResponse::UnknownJob => Err(SourceError::UnknownJob {
                    job_id: job_id.unwrap_or_default().to_string(),
                }),
                FakeResponse::Hang => std::future::pending().await,
                FakeResponse::Slow(delay, text) => {
                    tokio::time::sleep(delay).await;
                    Ok(text)
                }
            }
        }

        fn is_static(&self) -> bool {
            self.is_static
        }

        fn describe(&self) -> String {
            "fake".to_string()
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeResponse, FakeStatusSource};

#[cfg(test)]
#[path = "source_tests.rs"]
mod tests;
