// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::tempdir;

#[test]
fn paths_follow_pattern() {
    let layout = OutputLayout::new("/out", "run1");
    assert_eq!(layout.snapshot_path(), PathBuf::from("/out/run1.json"));
    assert_eq!(layout.log_path(), PathBuf::from("/out/qwatch.log"));

    let sinks = layout.job_sinks("9001.sequoia");
    let expected = |suffix: &str| PathBuf::from(format!("/out/run1_9001.sequoia_{suffix}.jsonl"));
    assert_eq!(sinks.info.path, expected("info"));
    assert_eq!(sinks.data.path, expected("data"));
    assert_eq!(sinks.env.path, expected("env"));
    assert_eq!(sinks.data.kind, SinkKind::Data);
}

#[yare::parameterized(
    plain   = { "9001.sequoia", "9001.sequoia" },
    slash   = { "1/2",          "1_2" },
    array   = { "12[3].srv",    "12_3_.srv" },
    space   = { "a b",          "a_b" },
)]
fn file_safe_names(id: &str, expected: &str) {
    assert_eq!(file_safe(id), expected);
}

#[test]
fn clean_archives_everything_but_artifacts() {
    let dir = tempdir().unwrap();
    let layout = OutputLayout::new(dir.path(), "qwatch");
    for name in [
        "qwatch.json",
        "qwatch_1.srv_info.jsonl",
        "qwatch_1.srv_data.jsonl",
        "qwatch_1.srv_env.jsonl",
        "qwatch.log",
        "scratch.txt",
    ] {
        std::fs::write(dir.path().join(name), "x").unwrap();
    }

    let mut moved = layout.clean().unwrap();
    moved.sort();

    let archive = dir.path().join(ARCHIVE_DIR);
    assert_eq!(
        moved,
        vec![
            archive.join("qwatch_1.srv_env.jsonl"),
            archive.join("scratch.txt"),
        ]
    );
    assert!(dir.path().join("qwatch_1.srv_data.jsonl").exists());
    assert!(dir.path().join("qwatch.log").exists());
}

#[test]
fn clean_with_nothing_to_move_creates_no_archive() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("qwatch.json"), "{}").unwrap();

    let moved = OutputLayout::new(dir.path(), "qwatch").clean().unwrap();

    assert!(moved.is_empty());
    assert!(!dir.path().join(ARCHIVE_DIR).exists());
}
