// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Field classification: raw field maps into typed [`JobRecord`]s.

use crate::record::{JobRecord, JobState, MetricValue, ReportSnapshot};
use crate::report::{parse_report, split_variable_list, FieldMap, ParseError};
use crate::taxonomy::{Category, Taxonomy};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Why a field was flagged as schema drift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriftReason {
    /// Key is not in any keyword set
    UnknownKey,
    /// Time field whose value does not match the configured format
    UnparsedTime,
}

crate::simple_display! {
    DriftReason {
        UnknownKey => "unknown key",
        UnparsedTime => "unparsed time",
    }
}

/// Non-fatal warning: a field the taxonomy could not place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDrift {
    pub job_id: String,
    pub key: String,
    pub reason: DriftReason,
}

/// One classified job plus any drift found while classifying it.
#[derive(Debug, Clone, PartialEq)]
pub struct Classified {
    pub record: JobRecord,
    pub drift: Vec<SchemaDrift>,
}

/// Partition one job's fields into static, time, dynamic, and env buckets.
///
/// Nothing is dropped: unknown keys land in static metadata and are flagged.
pub fn classify(job_id: &str, fields: &FieldMap, taxonomy: &Taxonomy) -> Classified {
    let mut record = JobRecord::new(job_id, JobState::Unknown);
    let mut drift = Vec::new();
    let flag = |key: &str, reason| SchemaDrift {
        job_id: job_id.to_string(),
        key: key.to_string(),
        reason,
    };

    for (key, value) in fields {
        match taxonomy.category(key) {
            Some(Category::Info) => {
                record.static_meta.insert(key.clone(), value.clone());
            }
            Some(Category::Time) => {
                match NaiveDateTime::parse_from_str(value.trim(), &taxonomy.fields.time_format) {
                    Ok(ts) => {
                        record.times.insert(key.clone(), ts);
                    }
                    Err(_) => {
                        record.static_meta.insert(key.clone(), value.clone());
                        drift.push(flag(key, DriftReason::UnparsedTime));
                    }
                }
            }
            Some(Category::Data) => {
                let metric = MetricValue::parse(value);
                record.metrics.insert(key.clone(), metric);
            }
            Some(Category::VariableList) => {
                record.env = split_variable_list(value);
            }
            None => {
                record.static_meta.insert(key.clone(), value.clone());
                drift.push(flag(key, DriftReason::UnknownKey));
            }
        }
    }

    if let Some(code) = fields.get(&taxonomy.fields.state) {
        record.state = taxonomy.state_for(code);
    }

    Classified { record, drift }
}

/// Everything learned from one report besides the snapshot itself.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostics {
    pub parse_errors: Vec<ParseError>,
    pub drift: Vec<SchemaDrift>,
}

/// Parse and classify a whole report into a snapshot.
///
/// Parse errors and drift are logged here and returned for callers that
/// want to surface them.
pub fn build_snapshot(
    text: &str,
    taxonomy: &Taxonomy,
    taken_at: DateTime<Utc>,
) -> (ReportSnapshot, Diagnostics) {
    let parsed = parse_report(text, taxonomy);
    let mut snapshot = ReportSnapshot::empty(taken_at);
    let mut diagnostics = Diagnostics {
        parse_errors: parsed.errors,
        drift: Vec::new(),
    };

    for error in &diagnostics.parse_errors {
        tracing::warn!(%error, "skipped malformed job block");
    }

    for (job_id, fields) in &parsed.jobs {
        let Classified { record, drift } = classify(job_id, fields, taxonomy);
        for d in &drift {
            tracing::warn!(job_id = %d.job_id, key = %d.key, reason = %d.reason, "schema drift");
        }
        diagnostics.drift.extend(drift);
        snapshot.jobs.insert(job_id.clone(), record);
    }

    (snapshot, diagnostics)
}

#[cfg(test)]
#[path = "classify_tests.rs"]
mod tests;
