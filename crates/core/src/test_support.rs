// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use std::fmt::Write;

/// Column at which `qstat -f` wraps long values.
pub const WRAP_COLUMN: usize = 80;

// ── Proptest strategies ─────────────────────────────────────────────────

/// Proptest strategies for report text.
pub mod strategies {
    use proptest::prelude::*;

    /// Variable name as the scheduler emits them.
    pub fn arb_var_name() -> impl Strategy<Value = String> {
        "[A-Z][A-Z_]{0,11}"
    }

    /// Variable value: plain text or an absolute path.
    pub fn arb_var_value() -> impl Strategy<Value = String> {
        prop_oneof!["[a-z0-9._-]{0,12}", "/[a-z0-9/._-]{0,20}"]
    }

    pub fn arb_variable_list() -> impl Strategy<Value = Vec<(String, String)>> {
        prop::collection::vec((arb_var_name(), arb_var_value()), 0..12)
    }
}

// ── Report fixtures ─────────────────────────────────────────────────────

/// Builder for one `qstat -f` job block.
#[derive(Debug, Clone)]
pub struct JobBlock {
    id: String,
    fields: Vec<(String, String)>,
}

impl JobBlock {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: Vec::new(),
        }
    }

    /// Typical block with a name, owner, state, and usage.
    pub fn typical(id: &str, owner: &str, state: &str) -> Self {
        let short = id.split('.').next().unwrap_or(id);
        let mut block = Self::new(id)
            .field("Job_Name", format!("job{short}"))
            .field("Job_Owner", format!("{owner}@login01.cluster"))
            .field("job_state", state)
            .field("queue", "batch")
            .field("ctime", "Mon Oct  1 10:00:00 2018")
            .field("Resource_List.mem", "4gb");
        if state == "R" {
            block = block
                .field("resources_used.cput", "00:10:00")
                .field("resources_used.mem", "1024kb")
                .field("resources_used.ncpus", "4")
                .field("resources_used.walltime", "00:05:00");
        }
        let home = format!("/home/{owner}");
        block.variables(&[
            ("PBS_O_HOME", home.as_str()),
            ("PBS_O_LOGNAME", owner),
            ("PBS_O_PATH", "/usr/local/bin:/usr/bin:/bin"),
            ("PBS_O_QUEUE", "batch"),
        ])
    }

    pub fn field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((key.into(), value.into()));
        self
    }

    pub fn variables(self, vars: &[(&str, &str)]) -> Self {
        let joined = vars
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(",");
        self.field("Variable_List", joined)
    }

    /// Render with long values wrapped at [`WRAP_COLUMN`], blank line last.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Job Id: {}", self.id);
        for (key, value) in &self.fields {
            let line = format!("    {key} = {value}");
            out.push_str(&wrap(&line, WRAP_COLUMN));
            out.push('\n');
        }
        out.push('\n');
        out
    }
}

/// Wrap a line the way `qstat` does: tab-indented continuation lines.
pub fn wrap(line: &str, width: usize) -> String {
    let chars: Vec<char> = line.chars().collect();
    if chars.len() <= width {
        return line.to_string();
    }
    let mut out: String = chars[..width].iter().collect();
    for chunk in chars[width..].chunks(width - 1) {
        out.push_str("\n\t");
        out.extend(chunk.iter());
    }
    out
}

/// Concatenate rendered blocks into one report.
pub fn report(blocks: &[JobBlock]) -> String {
    blocks.iter().map(JobBlock::render).collect()
}
