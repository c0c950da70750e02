// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-of-run summary.

use crate::color;
use clap::ValueEnum;
use qw_engine::{BatchOutcome, SessionReport};
use serde_json::json;
use std::fmt::Write;

#[derive(Clone, Copy, Debug, Default, PartialEq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

pub fn render_summary(outcome: &BatchOutcome, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => render_text(outcome),
        OutputFormat::Json => render_json(outcome),
    }
}

fn render_text(outcome: &BatchOutcome) -> String {
    let mut out = String::new();
    let path = outcome.snapshot_path.display();
    let _ = writeln!(out, "{} {path}", color::header("snapshot:"));
    let selected = outcome.selected.join(" ");
    let _ = writeln!(out, "{} {selected}", color::header("selected:"));
    let skipped = outcome.diagnostics.parse_errors.len();
    if skipped > 0 {
        let label = color::header("skipped:");
        let _ = writeln!(out, "{label} {skipped} malformed job block(s)");
    }

    let Some(watch) = &outcome.watch else {
        return out;
    };
    for report in sorted(&watch.finished) {
        let state = report
            .final_state
            .map(color::state)
            .unwrap_or_else(|| "-".to_string());
        let _ = write!(
            out,
            "{}  {}  samples={} data_rows={}",
            report.job_id, state, report.samples, report.data_rows
        );
        if report.cancelled {
            out.push_str("  (cancelled)");
        }
        out.push('\n');
    }
    for error in &watch.failed {
        let _ = writeln!(out, "{}", color::failed(&error.to_string()));
    }
    out
}

fn render_json(outcome: &BatchOutcome) -> String {
    let sessions = outcome.watch.as_ref().map(|watch| {
        sorted(&watch.finished)
            .into_iter()
            .map(|r| {
                json!({
                    "job_id": r.job_id,
                    "final_state": r.final_state.map(|s| s.to_string()),
                    "samples": r.samples,
                    "data_rows": r.data_rows,
                    "cancelled": r.cancelled,
                })
            })
            .collect::<Vec<_>>()
    });
    let failures = outcome.watch.as_ref().map(|watch| {
        watch
            .failed
            .iter()
            .map(|e| json!({ "job_id": e.job_id(), "error": e.to_string() }))
            .collect::<Vec<_>>()
    });
    let value = json!({
        "snapshot": outcome.snapshot_path.display().to_string(),
        "selected": outcome.selected,
        "parse_errors": outcome.diagnostics.parse_errors.len(),
        "sessions": sessions,
        "failed": failures,
    });
    format!("{value:#}\n")
}

fn sorted(reports: &[SessionReport]) -> Vec<&SessionReport> {
    let mut sorted: Vec<_> = reports.iter().collect();
    sorted.sort_by(|a, b| a.job_id.cmp(&b.job_id));
    sorted
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
