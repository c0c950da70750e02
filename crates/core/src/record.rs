// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed job records produced from one status report.

use chrono::{DateTime, NaiveDateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Lifecycle state of a job as observed in the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Queued,
    Running,
    Completed,
    /// Unrecognized state code, or the job has left the queue
    Unknown,
}

impl JobState {
    /// Completed and Unknown end a watch session.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed | JobState::Unknown)
    }

    /// Position in the forward-only lifecycle. Terminal states share the top
    /// rank.
    pub fn rank(&self) -> u8 {
        match self {
            JobState::Queued => 0,
            JobState::Running => 1,
            JobState::Completed | JobState::Unknown => 2,
        }
    }
}

crate::simple_display! {
    JobState {
        Queued => "queued",
        Running => "running",
        Completed => "completed",
        Unknown => "unknown",
    }
}

/// One decomposed environment variable value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvValue {
    /// Value starting with `/` or `\`
    Path(PathBuf),
    Text(String),
}

impl EnvValue {
    pub fn parse(raw: &str) -> Self {
        if raw.starts_with('/') || raw.starts_with('\\') {
            EnvValue::Path(PathBuf::from(raw))
        } else {
            EnvValue::Text(raw.to_string())
        }
    }

    pub fn is_path(&self) -> bool {
        matches!(self, EnvValue::Path(_))
    }

    pub fn to_text(&self) -> String {
        match self {
            EnvValue::Path(p) => p.to_string_lossy().into_owned(),
            EnvValue::Text(s) => s.clone(),
        }
    }
}

/// A dynamic resource-usage value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl MetricValue {
    /// Numbers become numeric; `1024kb`, `00:01:02` and codes stay text.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if let Ok(n) = trimmed.parse::<i64>() {
            return MetricValue::Integer(n);
        }
        match trimmed.parse::<f64>() {
            Ok(f) if f.is_finite() => MetricValue::Float(f),
            _ => MetricValue::Text(raw.to_string()),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            MetricValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            MetricValue::Integer(n) => serde_json::Value::from(*n),
            MetricValue::Float(f) => serde_json::Value::from(*f),
            MetricValue::Text(s) => serde_json::Value::from(s.as_str()),
        }
    }
}

/// Classified view of one job at one instant.
///
/// Records are never mutated after classification; each poll produces a
/// fresh record that is compared against the previous state, not merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: String,
    pub state: JobState,
    /// Static info fields plus any key the taxonomy does not know
    #[serde(default)]
    pub static_meta: IndexMap<String, String>,
    #[serde(default)]
    pub times: IndexMap<String, NaiveDateTime>,
    #[serde(default)]
    pub metrics: IndexMap<String, MetricValue>,
    #[serde(default)]
    pub env: IndexMap<String, EnvValue>,
}

impl JobRecord {
    pub fn new(id: impl Into<String>, state: JobState) -> Self {
        Self {
            id: id.into(),
            state,
            static_meta: IndexMap::new(),
            times: IndexMap::new(),
            metrics: IndexMap::new(),
            env: IndexMap::new(),
        }
    }

    pub fn meta(&self, key: &str) -> Option<&str> {
        self.static_meta.get(key).map(String::as_str)
    }

    pub fn env_text(&self, key: &str) -> Option<String> {
        self.env.get(key).map(EnvValue::to_text)
    }
}

/// All jobs from one parsed report, in report order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSnapshot {
    pub taken_at: DateTime<Utc>,
    pub jobs: IndexMap<String, JobRecord>,
}

impl ReportSnapshot {
    pub fn empty(taken_at: DateTime<Utc>) -> Self {
        Self {
            taken_at,
            jobs: IndexMap::new(),
        }
    }

    pub fn get(&self, job_id: &str) -> Option<&JobRecord> {
        self.jobs.get(job_id)
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
