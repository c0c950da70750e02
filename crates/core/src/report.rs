// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Parser for full status reports (`qstat -f` style).
//!
//! A report is a sequence of job blocks:
//!
//! ```text
//! Job Id: 9001.sequoia
//!     Job_Name = align
//!     job_state = R
//!     Variable_List = PBS_O_HOME=/home/alice,PBS_O_LOGNAME=alice,PBS_O_PATH=/usr
//! 	/bin:/bin,PBS_O_SHELL=/bin/bash
//!
//! ```
//!
//! Long values wrap onto tab-indented continuation lines. A field is only
//! finalized when the next field, a blank line, or the end of input is seen.

use crate::record::EnvValue;
use crate::taxonomy::Taxonomy;
use indexmap::IndexMap;
use thiserror::Error;

/// Marker that starts a new job block.
pub const HEADER_MARKER: &str = "Job Id:";

/// Separator between a field key and its value.
const KEY_VALUE_SEP: &str = " = ";

/// Line ending of a field whose empty value lost its trailing space.
const EMPTY_VALUE_SUFFIX: &str = " =";

/// Raw field map for one job, in report order.
pub type FieldMap = IndexMap<String, String>;

/// A malformed line. Aborts only the job block it appears in.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("line {line}: job header has no identifier")]
    EmptyHeader { line: usize },
    #[error("line {line}: duplicate job id {job}")]
    DuplicateJob { line: usize, job: String },
    #[error("line {line}: unrecognized line in job {job}: {text:?}")]
    Unrecognized {
        line: usize,
        job: String,
        text: String,
    },
    #[error("line {line}: continuation with no preceding field in job {job}")]
    DanglingContinuation { line: usize, job: String },
    #[error("line {line}: line outside of any job block: {text:?}")]
    Orphan { line: usize, text: String },
}

impl ParseError {
    /// 1-based line number of the offending line.
    pub fn line(&self) -> usize {
        match self {
            ParseError::EmptyHeader { line }
            | ParseError::DuplicateJob { line, .. }
            | ParseError::Unrecognized { line, .. }
            | ParseError::DanglingContinuation { line, .. }
            | ParseError::Orphan { line, .. } => *line,
        }
    }
}

/// Result of parsing one report: the jobs that parsed cleanly plus the
/// errors for blocks that were skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedReport {
    pub jobs: IndexMap<String, FieldMap>,
    pub errors: Vec<ParseError>,
}

/// Parse a report held in memory.
pub fn parse_report(text: &str, taxonomy: &Taxonomy) -> ParsedReport {
    parse_lines(text.lines(), taxonomy)
}

/// Parse an ordered sequence of report lines.
pub fn parse_lines<'a, I>(lines: I, taxonomy: &Taxonomy) -> ParsedReport
where
    I: IntoIterator<Item = &'a str>,
{
    let mut parser = Parser::new(taxonomy);
    for (idx, line) in lines.into_iter().enumerate() {
        parser.feed(idx + 1, line);
    }
    parser.finish()
}

/// Split a variable list (`A=1,B=/x,C=y`) into name/value pairs.
///
/// Empty entries and entries without a name are dropped; a repeated name
/// keeps its last value.
pub fn split_variable_list(raw: &str) -> IndexMap<String, EnvValue> {
    let mut vars = IndexMap::new();
    for entry in raw.split(',') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        let (name, value) = entry.split_once('=').unwrap_or((entry, ""));
        let name = name.trim();
        if name.is_empty() {
            tracing::debug!(entry, "dropping variable without a name");
            continue;
        }
        vars.insert(name.to_string(), EnvValue::parse(value));
    }
    vars
}

/// Shape of one physical line.
#[derive(Debug, PartialEq, Eq)]
enum Line<'a> {
    Blank,
    Header(&'a str),
    Field { key: &'a str, value: &'a str },
    Continuation(&'a str),
    Other,
}

fn classify_line<'a>(line: &'a str, taxonomy: &Taxonomy) -> Line<'a> {
    if line.trim().is_empty() {
        return Line::Blank;
    }
    if let Some(idx) = line.find(HEADER_MARKER) {
        return Line::Header(line[idx + HEADER_MARKER.len()..].trim());
    }
    if let Some(rest) = line.strip_prefix('\t') {
        let rest = rest.trim_start_matches('\t');
        // Wrapped values can contain " = "; only a known keyword starts a field here.
        return match split_key_value(rest) {
            Some((key, value)) if taxonomy.is_known(key) => Line::Field { key, value },
            _ => Line::Continuation(rest),
        };
    }
    if line.starts_with(' ') {
        if let Some((key, value)) = split_key_value(line.trim_start()) {
            return Line::Field { key, value };
        }
    }
    Line::Other
}

fn split_key_value(s: &str) -> Option<(&str, &str)> {
    let (key, value) = match s.split_once(KEY_VALUE_SEP) {
        Some(pair) => pair,
        None => (s.trim_end().strip_suffix(EMPTY_VALUE_SUFFIX)?, ""),
    };
    let key = key.trim();
    let valid = !key.is_empty() && key.chars().all(is_key_char);
    valid.then_some((key, value))
}

fn is_key_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-')
}

struct Block {
    id: String,
    fields: FieldMap,
    /// Field still accepting continuation lines
    pending: Option<(String, String)>,
}

impl Block {
    fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            fields: FieldMap::new(),
            pending: None,
        }
    }

    fn flush_pending(&mut self) {
        if let Some((key, value)) = self.pending.take() {
            self.fields.insert(key, value);
        }
    }
}

struct Parser<'t> {
    taxonomy: &'t Taxonomy,
    jobs: IndexMap<String, FieldMap>,
    errors: Vec<ParseError>,
    current: Option<Block>,
    /// Set after an error; cleared by the next header
    skipping: bool,
}

impl<'t> Parser<'t> {
    fn new(taxonomy: &'t Taxonomy) -> Self {
        Self {
            taxonomy,
            jobs: IndexMap::new(),
            errors: Vec::new(),
            current: None,
            skipping: false,
        }
    }

    fn feed(&mut self, line_no: usize, raw: &str) {
        let line = raw.trim_end_matches(['\r', '\n']);
        match classify_line(line, self.taxonomy) {
            Line::Header(id) => self.start_block(line_no, id),
            Line::Blank => self.close_block(),
            _ if self.skipping => {}
            Line::Field { key, value } => match self.current.as_mut() {
                Some(block) => {
                    block.flush_pending();
                    block.pending = Some((key.to_string(), value.to_string()));
                }
                None => self.orphan(line_no, line),
            },
            Line::Continuation(fragment) => match self.current.as_mut() {
                Some(block) => match block.pending.as_mut() {
                    Some((_, value)) => value.push_str(fragment),
                    None => {
                        let error = ParseError::DanglingContinuation {
                            line: line_no,
                            job: block.id.clone(),
                        };
                        self.fail(error);
                    }
                },
                None => self.orphan(line_no, line),
            },
            Line::Other => match self.current.as_ref() {
                Some(block) => {
                    let error = ParseError::Unrecognized {
                        line: line_no,
                        job: block.id.clone(),
                        text: line.to_string(),
                    };
                    self.fail(error);
                }
                None => self.orphan(line_no, line),
            },
        }
    }

    fn start_block(&mut self, line_no: usize, id: &str) {
        self.close_block();
        self.skipping = false;
        if id.is_empty() {
            self.fail(ParseError::EmptyHeader { line: line_no });
        } else if self.jobs.contains_key(id) {
            self.fail(ParseError::DuplicateJob {
                line: line_no,
                job: id.to_string(),
            });
        } else {
            self.current = Some(Block::new(id));
        }
    }

    fn close_block(&mut self) {
        if let Some(mut block) = self.current.take() {
            block.flush_pending();
            self.jobs.insert(block.id, block.fields);
        }
    }

    fn orphan(&mut self, line_no: usize, line: &str) {
        self.fail(ParseError::Orphan {
            line: line_no,
            text: line.to_string(),
        });
    }

    /// Drop the current block and skip to the next header.
    fn fail(&mut self, error: ParseError) {
        tracing::debug!(%error, "skipping job block");
        self.current = None;
        self.skipping = true;
        self.errors.push(error);
    }

    fn finish(mut self) -> ParsedReport {
        self.close_block();
        ParsedReport {
            jobs: self.jobs,
            errors: self.errors,
        }
    }
}

#[cfg(test)]
#[path = "report_tests.rs"]
mod tests;
