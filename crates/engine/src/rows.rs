// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sink rows built from a classified record.

use chrono::{DateTime, Utc};
use qw_core::JobRecord;
use qw_storage::{Row, SYNTHETIC_COLUMNS};
use serde_json::Value;

/// Format for time fields in info rows.
pub const INFO_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Static metadata and times, written once per job.
pub fn info_row(record: &JobRecord) -> Row {
    let mut row = Row::new();
    row.insert("job_id".to_string(), Value::from(record.id.as_str()));
    for (key, value) in &record.static_meta {
        row.insert(key.clone(), Value::from(value.as_str()));
    }
    for (key, at) in &record.times {
        let formatted = at.format(INFO_TIME_FORMAT).to_string();
        row.insert(key.clone(), Value::from(formatted));
    }
    row
}

/// Dynamic metrics for one running sample.
pub fn data_row(record: &JobRecord, sampled_at: DateTime<Utc>) -> Row {
    let mut row = sample_row(sampled_at);
    for (key, value) in &record.metrics {
        row.insert(key.clone(), value.to_json());
    }
    row
}

/// The decomposed environment for one sample.
///
/// A variable named like a synthetic column is dropped so it cannot
/// overwrite the sample time.
pub fn env_row(record: &JobRecord, sampled_at: DateTime<Utc>) -> Row {
    let mut row = sample_row(sampled_at);
    for (key, value) in &record.env {
        if SYNTHETIC_COLUMNS.contains(&key.as_str()) {
            tracing::warn!(job_id = %record.id, variable = %key, "skipping reserved env column");
            continue;
        }
        row.insert(key.clone(), Value::from(value.to_text()));
    }
    row
}

fn sample_row(sampled_at: DateTime<Utc>) -> Row {
    let mut row = Row::new();
    let stamp = sampled_at.to_rfc3339();
    row.insert("sample_time".to_string(), Value::from(stamp));
    row
}

#[cfg(test)]
#[path = "rows_tests.rs"]
mod tests;
