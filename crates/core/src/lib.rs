// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! qw-core: report parsing, classification, and selection for qwatch

pub mod macros;

pub mod classify;
pub mod clock;
pub mod record;
pub mod report;
pub mod select;
pub mod taxonomy;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use classify::{build_snapshot, classify, Classified, Diagnostics, DriftReason, SchemaDrift};
pub use clock::{Clock, FakeClock, SystemClock};
pub use record::{EnvValue, JobRecord, JobState, MetricValue, ReportSnapshot};
pub use report::{
    parse_lines, parse_report, split_variable_list, FieldMap, ParseError, ParsedReport,
};
pub use select::{select, submitter, JobFilter};
pub use taxonomy::{Category, FieldNames, KeywordSet, Taxonomy, TaxonomyError};
