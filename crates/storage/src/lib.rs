// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Storage layer for qwatch: time-series sinks, snapshot artifact, and
//! output layout.

mod layout;
mod sink;
mod snapshot;

pub use layout::{file_safe, JobSinks, OutputLayout, ARCHIVE_DIR, DEFAULT_PATTERN, LOG_FILE};
pub use sink::{
    read_sink, AppendOutcome, Recorder, RecorderError, Row, Sink, SinkKind, SYNTHETIC_COLUMNS,
};
pub use snapshot::{
    load_snapshot, save_snapshot, SnapshotArtifact, SnapshotError, CURRENT_SNAPSHOT_VERSION,
};
