// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;

fn parse(args: &[&str]) -> Cli {
    let argv = std::iter::once("qwatch").chain(args.iter().copied());
    Cli::try_parse_from(argv).unwrap()
}

#[test]
fn clap_definition_is_valid() {
    use clap::CommandFactory;
    Cli::command().debug_assert();
}

#[test]
#[serial]
fn defaults() {
    std::env::remove_var("QW_MAX_QUERIES");
    std::env::remove_var("QW_FETCH_TIMEOUT_MS");
    let cli = parse(&["-d", "/tmp/out"]);
    let config = cli.watch_config(cli.layout());

    assert!(config.filter.is_empty());
    assert_eq!(config.command, "qstat -f");
    assert_eq!(config.interval, Duration::from_secs(120));
    assert_eq!(config.retry, RetryPolicy::default());
    assert_eq!(config.max_concurrent_queries, None);
    assert!(config.watch);
    assert_eq!(config.layout, OutputLayout::new("/tmp/out", "qwatch"));
}

#[test]
fn repeated_and_comma_separated_filters() {
    let cli = parse(&[
        "-j",
        "9001.sequoia,9002",
        "--jobs",
        "align",
        "-u",
        "alice",
        "-u",
        "bob",
    ]);
    assert_eq!(cli.jobs, vec!["9001.sequoia", "9002", "align"]);
    assert_eq!(cli.users, vec!["alice", "bob"]);

    let config = cli.watch_config(cli.layout());
    assert!(config.filter.job_ids.contains("9002"));
    assert!(config.filter.users.contains("bob"));
}

#[test]
fn underscore_flag_aliases_are_accepted() {
    let cli = parse(&[
        "--filename_pattern",
        "run1",
        "--clean_after",
        "--interval",
        "30",
    ]);
    assert_eq!(cli.filename_pattern, "run1");
    assert!(cli.clean_after);
    assert_eq!(cli.sleeper, 30);
}

#[test]
#[serial]
fn flags_map_onto_config() {
    std::env::remove_var("QW_MAX_QUERIES");
    let cli = parse(&[
        "--infile",
        "report.txt",
        "--cmd",
        "qstat -f {job}",
        "--retries",
        "0",
        "--max-queries",
        "2",
        "--no-watch",
    ]);
    let config = cli.watch_config(cli.layout());

    assert_eq!(config.infile, Some(PathBuf::from("report.txt")));
    assert_eq!(config.command, "qstat -f {job}");
    assert_eq!(config.retry.max_retries, 0);
    assert_eq!(config.max_concurrent_queries, Some(2));
    assert!(!config.watch);
}

#[test]
#[serial]
fn max_queries_falls_back_to_env() {
    std::env::set_var("QW_MAX_QUERIES", "3");
    let cli = parse(&[]);
    let config = cli.watch_config(cli.layout());
    assert_eq!(config.max_concurrent_queries, Some(3));
    std::env::remove_var("QW_MAX_QUERIES");
}

#[test]
fn default_directory_is_timestamped() {
    let cli = parse(&[]);
    let dir = cli.layout().dir.display().to_string();
    assert!(dir.starts_with("qwatch-"), "{dir}");
    assert_eq!(dir.len(), "qwatch-20240101-000000".len());
}
