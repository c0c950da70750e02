// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! qw-engine: status sources, watch sessions, and the batch supervisor

mod backoff;
mod batch;
mod config;
mod rows;
mod session;
mod source;
mod supervisor;

pub use backoff::{RetryPolicy, DEFAULT_BASE_DELAY, DEFAULT_MAX_DELAY, DEFAULT_MAX_RETRIES};
pub use batch::{run_batch, BatchError, BatchOutcome};
pub use config::{
    ConfigError, WatchConfig, DEFAULT_COMMAND, DEFAULT_FETCH_TIMEOUT, DEFAULT_INTERVAL,
};
pub use rows::{data_row, env_row, info_row, INFO_TIME_FORMAT};
pub use session::{Poller, SessionError, SessionReport, Step, WatchSession};
pub use source::{
    run_with_timeout, CommandSource, FileSource, ReportSource, SourceError, StatusSource,
    JOB_PLACEHOLDER,
};
pub use supervisor::{BatchReport, Supervisor};

#[cfg(any(test, feature = "test-support"))]
pub use source::{FakeResponse, FakeStatusSource};
