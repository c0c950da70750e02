// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::builder::styling::{Ansi256Color, Color, Style, Styles};
use qw_core::JobState;
use std::io::IsTerminal;

pub mod codes {
    /// Section headers: steel blue
    pub const HEADER: u8 = 74;
    /// Literals: light grey
    pub const LITERAL: u8 = 250;
    /// Descriptions and queued jobs: medium grey
    pub const CONTEXT: u8 = 245;
    /// Finished or vanished jobs: darker grey
    pub const MUTED: u8 = 240;
    /// Running jobs: soft green
    pub const RUNNING: u8 = 114;
    /// Failed sessions: soft red
    pub const FAILED: u8 = 167;
}

/// Determine if color output should be enabled.
///
/// Priority: `NO_COLOR=1` disables → `COLOR=1` forces → TTY check.
pub fn should_colorize() -> bool {
    if std::env::var("NO_COLOR").is_ok_and(|v| v == "1") {
        return false;
    }
    if std::env::var("COLOR").is_ok_and(|v| v == "1") {
        return true;
    }
    std::io::stdout().is_terminal()
}

/// Build clap `Styles` using the project palette.
pub fn styles() -> Styles {
    if !should_colorize() {
        return Styles::plain();
    }
    let fg = |code| Style::new().fg_color(Some(Color::Ansi256(Ansi256Color(code))));
    Styles::styled()
        .header(fg(codes::HEADER))
        .literal(fg(codes::LITERAL))
        .placeholder(fg(codes::CONTEXT))
}

fn paint(code: u8, text: &str) -> String {
    if should_colorize() {
        format!("\x1b[38;5;{code}m{text}\x1b[0m")
    } else {
        text.to_string()
    }
}

pub fn header(text: &str) -> String {
    paint(codes::HEADER, text)
}

pub fn failed(text: &str) -> String {
    paint(codes::FAILED, text)
}

/// A job state, colored by how alive the job is.
pub fn state(state: JobState) -> String {
    let code = match state {
        JobState::Running => codes::RUNNING,
        JobState::Queued => codes::CONTEXT,
        JobState::Completed | JobState::Unknown => codes::MUTED,
    };
    paint(code, &state.to_string())
}

#[cfg(test)]
#[path = "color_tests.rs"]
mod tests;
