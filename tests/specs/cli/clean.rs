//! Output cleanup specs

use crate::prelude::*;

#[test]
fn clean_archives_everything_but_snapshots_info_and_data() {
    let temp = Project::empty();
    temp.file("out/qwatch.json", "{}");
    temp.file("out/qwatch_1.srv_info.jsonl", "");
    temp.file("out/qwatch_1.srv_data.jsonl", "");
    temp.file("out/qwatch_1.srv_env.jsonl", "");
    temp.file("out/notes.txt", "scratch");

    temp.qwatch()
        .args(&["--clean", "-d", "out"])
        .passes()
        .stdout_eq("archived 2 file(s) in out\n");

    assert!(temp.exists("out/qwatch.json"));
    assert!(temp.exists("out/qwatch_1.srv_data.jsonl"));
    assert!(temp.exists("out/archive/qwatch_1.srv_env.jsonl"));
    assert!(temp.exists("out/archive/notes.txt"));
}

#[test]
fn clean_after_archives_env_sinks() {
    let temp = Project::empty();
    temp.file("report.txt", TWO_JOBS);

    temp.qwatch()
        .args(&["--infile", "report.txt", "-d", "out"])
        .args(&["-j", "9002", "--clean-after"])
        .passes();

    assert!(temp.exists("out/qwatch_9002.sequoia_data.jsonl"));
    assert!(temp.exists("out/archive/qwatch_9002.sequoia_env.jsonl"));
    assert!(temp.exists("out/qwatch.log"));
}
