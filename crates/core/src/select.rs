// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job selection by identifier or owner.

use crate::record::JobRecord;
use crate::taxonomy::Taxonomy;
use indexmap::{IndexMap, IndexSet};

/// Identifier and owner filters. Both empty selects everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobFilter {
    pub job_ids: IndexSet<String>,
    pub users: IndexSet<String>,
}

impl JobFilter {
    pub fn new<J, U>(job_ids: J, users: U) -> Self
    where
        J: IntoIterator,
        J::Item: Into<String>,
        U: IntoIterator,
        U::Item: Into<String>,
    {
        Self {
            job_ids: job_ids.into_iter().map(Into::into).collect(),
            users: users.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.job_ids.is_empty() && self.users.is_empty()
    }

    fn matches(&self, record: &JobRecord, taxonomy: &Taxonomy) -> bool {
        if self.is_empty() {
            return true;
        }
        if !self.users.is_empty() {
            let user = submitter(record, taxonomy);
            return user.is_some_and(|user| self.users.contains(user.as_str()));
        }
        let short_id = record.id.split('.').next().unwrap_or(&record.id);
        let name = record.meta(&taxonomy.fields.job_name);
        self.job_ids.contains(record.id.as_str())
            || self.job_ids.contains(short_id)
            || name.is_some_and(|name| self.job_ids.contains(name))
    }
}

/// Login that submitted the job: the login variable, else the owner field
/// with any `@host` suffix removed.
pub fn submitter(record: &JobRecord, taxonomy: &Taxonomy) -> Option<String> {
    if let Some(login) = record.env_text(&taxonomy.fields.login_var) {
        return Some(login);
    }
    let owner = record.meta(&taxonomy.fields.owner)?;
    Some(owner.split('@').next().unwrap_or(owner).to_string())
}

/// Keep the jobs matching `filter`, preserving snapshot order.
///
/// The user filter takes precedence over the job filter when both are set.
pub fn select(
    jobs: &IndexMap<String, JobRecord>,
    filter: &JobFilter,
    taxonomy: &Taxonomy,
) -> IndexMap<String, JobRecord> {
    jobs.iter()
        .filter(|(_, record)| filter.matches(record, taxonomy))
        .map(|(id, record)| (id.clone(), record.clone()))
        .collect()
}

#[cfg(test)]
#[path = "select_tests.rs"]
mod tests;
