//! CLI help output specs

use crate::prelude::*;

#[test]
fn help_shows_usage_and_filters() {
    cli()
        .args(&["--help"])
        .passes()
        .stdout_has("Usage:")
        .stdout_has("--jobs")
        .stdout_has("--users")
        .stdout_has("--infile");
}

#[test]
fn version_shows_version() {
    cli().args(&["--version"]).passes().stdout_has("0.2");
}

#[test]
fn unknown_flag_fails() {
    cli().args(&["--frobnicate"]).fails().stderr_has("--frobnicate");
}
