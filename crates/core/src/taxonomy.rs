// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Keyword taxonomy: which report fields are static info, timestamps, or
//! dynamic resource usage.
//!
//! The taxonomy is loaded once at startup (built-in PBS defaults or a TOML
//! file) and shared immutably for the rest of the run.

use crate::record::JobState;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from loading or validating a taxonomy
#[derive(Debug, Error)]
pub enum TaxonomyError {
    #[error("failed to read taxonomy {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid taxonomy: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("keyword {keyword:?} appears in both [{first}] and [{second}]")]
    Overlap {
        keyword: String,
        first: Category,
        second: Category,
    },
}

/// Bucket a report field is classified into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Info,
    Time,
    Data,
    VariableList,
}

crate::simple_display! {
    Category {
        Info => "info",
        Time => "time",
        Data => "data",
        VariableList => "variable_list",
    }
}

/// Ordered list of keywords. An entry ending in `*` matches by prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeywordSet(Vec<String>);

impl KeywordSet {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(keywords.into_iter().map(Into::into).collect())
    }

    pub fn matches(&self, key: &str) -> bool {
        self.0.iter().any(|kw| match kw.strip_suffix('*') {
            Some(prefix) => key.starts_with(prefix),
            None => kw == key,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

/// Names of the fields and codes the engine interprets directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldNames {
    /// Dynamic field holding the scheduler's state code
    pub state: String,
    /// Field holding the comma-separated environment variable list
    pub variable_list: String,
    pub job_name: String,
    /// Owner field, `user@host`
    pub owner: String,
    /// Variable naming the submitting login
    pub login_var: String,
    pub queued_codes: Vec<String>,
    pub running_codes: Vec<String>,
    pub completed_codes: Vec<String>,
    /// chrono format string for time fields
    pub time_format: String,
}

impl Default for FieldNames {
    fn default() -> Self {
        Self {
            state: "job_state".to_string(),
            variable_list: "Variable_List".to_string(),
            job_name: "Job_Name".to_string(),
            owner: "Job_Owner".to_string(),
            login_var: "PBS_O_LOGNAME".to_string(),
            queued_codes: codes(&["Q", "H", "W", "T"]),
            running_codes: codes(&["R", "B"]),
            completed_codes: codes(&["C", "F", "X"]),
            time_format: "%a %b %e %H:%M:%S %Y".to_string(),
        }
    }
}

fn codes(list: &[&str]) -> Vec<String> {
    list.iter().map(|c| (*c).to_string()).collect()
}

/// Three disjoint keyword sets plus the interpreted field names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Taxonomy {
    #[serde(default)]
    pub info: KeywordSet,
    #[serde(default)]
    pub time: KeywordSet,
    #[serde(default)]
    pub data: KeywordSet,
    #[serde(default)]
    pub fields: FieldNames,
}

impl Taxonomy {
    /// Built-in keyword sets for PBS/Torque `qstat -f` reports.
    pub fn pbs() -> Self {
        Self {
            info: KeywordSet::new([
                "Job_Name",
                "Job_Owner",
                "queue",
                "server",
                "Account_Name",
                "Checkpoint",
                "Error_Path",
                "Output_Path",
                "exec_host",
                "exec_vnode",
                "exec_port",
                "Hold_Types",
                "Join_Path",
                "Keep_Files",
                "Mail_Points",
                "Mail_Users",
                "Priority",
                "Rerunable",
                "Resource_List.*",
                "session_id",
                "Shell_Path_List",
                "jobdir",
                "substate",
                "comment",
                "euser",
                "egroup",
                "group_list",
                "queue_type",
                "queue_rank",
                "run_count",
                "project",
                "Submit_arguments",
                "submit_host",
                "Submit_Host",
                "init_work_dir",
                "umask",
                "fault_tolerant",
                "job_radix",
                "start_count",
                "interactive",
                "exit_status",
                "Exit_status",
                "eligible_time",
                "Walltime.*",
            ]),
            time: KeywordSet::new([
                "ctime",
                "etime",
                "mtime",
                "qtime",
                "stime",
                "obittime",
                "Execution_Time",
                "start_time",
                "comp_time",
            ]),
            data: KeywordSet::new(["job_state", "resources_used.*"]),
            fields: FieldNames::default(),
        }
    }

    /// Load a taxonomy from a TOML file and validate it.
    pub fn load(path: &Path) -> Result<Self, TaxonomyError> {
        let text = std::fs::read_to_string(path).map_err(|source| TaxonomyError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, TaxonomyError> {
        let taxonomy: Taxonomy = toml::from_str(text)?;
        taxonomy.validate()?;
        Ok(taxonomy)
    }

    /// Reject keywords listed under more than one category.
    pub fn validate(&self) -> Result<(), TaxonomyError> {
        let sets = [
            (Category::Info, &self.info),
            (Category::Time, &self.time),
            (Category::Data, &self.data),
        ];
        for (i, (first, set)) in sets.iter().enumerate() {
            for keyword in set.iter() {
                for (second, other) in &sets[i + 1..] {
                    if other.iter().any(|k| k == keyword) {
                        return Err(TaxonomyError::Overlap {
                            keyword: keyword.to_string(),
                            first: *first,
                            second: *second,
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// Category for a field key, or `None` when the key is schema drift.
    pub fn category(&self, key: &str) -> Option<Category> {
        if key == self.fields.variable_list {
            Some(Category::VariableList)
        } else if self.time.matches(key) {
            Some(Category::Time)
        } else if self.data.matches(key) {
            Some(Category::Data)
        } else if self.info.matches(key) {
            Some(Category::Info)
        } else {
            None
        }
    }

    pub fn is_known(&self, key: &str) -> bool {
        self.category(key).is_some()
    }

    /// Map a scheduler state code onto a job state.
    pub fn state_for(&self, code: &str) -> JobState {
        let code = code.trim();
        let has = |list: &[String]| list.iter().any(|c| c == code);
        if has(&self.fields.running_codes) {
            JobState::Running
        } else if has(&self.fields.queued_codes) {
            JobState::Queued
        } else if has(&self.fields.completed_codes) {
            JobState::Completed
        } else {
            JobState::Unknown
        }
    }
}

impl Default for Taxonomy {
    fn default() -> Self {
        Self::pbs()
    }
}

#[cfg(test)]
#[path = "taxonomy_tests.rs"]
mod tests;
