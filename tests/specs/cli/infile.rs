//! Static input specs
//!
//! `--infile` parses a saved report: the selection is snapshotted and each
//! selected job is sampled exactly once.

use crate::prelude::*;

const INFILE: &[&str] = &["--infile", "report.txt", "-d", "out"];

fn setup() -> Project {
    let temp = Project::empty();
    temp.file("report.txt", TWO_JOBS);
    temp
}

#[test]
fn selecting_by_id_records_one_running_job() {
    let temp = setup();

    temp.qwatch()
        .args(INFILE)
        .args(&["-j", "9002.sequoia"])
        .passes()
        .stdout_eq(
            "snapshot: out/qwatch.json\n\
             selected: 9002.sequoia\n\
             9002.sequoia  running  samples=1 data_rows=1\n",
        );

    let snapshot = temp.json("out/qwatch.json");
    let jobs = snapshot["jobs"].as_object().expect("jobs map");
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs["9002.sequoia"]["state"], "running");

    let info = temp.rows("out/qwatch_9002.sequoia_info.jsonl");
    assert_eq!(info.len(), 1);
    assert_eq!(info[0]["job_id"], "9002.sequoia");
    assert_eq!(info[0]["ctime"], "2018-10-01T09:00:00");

    let data = temp.rows("out/qwatch_9002.sequoia_data.jsonl");
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["resources_used.mem"], "2048kb");
    assert_eq!(data[0]["resources_used.ncpus"], 4);

    let env = temp.rows("out/qwatch_9002.sequoia_env.jsonl");
    assert_eq!(env[0]["PBS_O_HOME"], "/home/bob");
}

#[test]
fn short_id_matches() {
    let temp = setup();
    temp.qwatch()
        .args(INFILE)
        .args(&["-j", "9002", "--no-watch"])
        .passes()
        .stdout_has("selected: 9002.sequoia\n");
}

#[test]
fn user_filter_selects_only_that_owner() {
    let temp = setup();

    temp.qwatch()
        .args(INFILE)
        .args(&["-u", "alice"])
        .passes()
        .stdout_has("selected: 9001.sequoia\n")
        .stdout_has("9001.sequoia  queued  samples=1 data_rows=0");

    assert!(!temp.exists("out/qwatch_9001.sequoia_data.jsonl"));
    assert!(!temp.exists("out/qwatch_9002.sequoia_env.jsonl"));
    let env = temp.rows("out/qwatch_9001.sequoia_env.jsonl");
    assert_eq!(env[0]["PBS_O_QUEUE"], "batch");
}

#[test]
fn no_watch_writes_only_the_snapshot_and_log() {
    let temp = setup();

    temp.qwatch()
        .args(INFILE)
        .args(&["-f", "run1", "--no-watch"])
        .passes()
        .stdout_eq(
            "snapshot: out/run1.json\n\
             selected: 9001.sequoia 9002.sequoia\n",
        );

    let names: Vec<String> = std::fs::read_dir(temp.path().join("out"))
        .expect("out dir")
        .map(|e| e.expect("entry").file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .collect();
    assert!(names.contains(&"run1.json".to_string()), "{names:?}");
    assert!(!names.iter().any(|n| n.ends_with(".jsonl")), "{names:?}");
}

#[test]
fn json_summary() {
    let temp = setup();

    let run = temp
        .qwatch()
        .args(INFILE)
        .args(&["-o", "json"])
        .passes();

    let summary: serde_json::Value = serde_json::from_str(&run.stdout()).expect("json summary");
    assert_eq!(summary["selected"].as_array().map(Vec::len), Some(2));
    assert_eq!(summary["sessions"][0]["final_state"], "queued");
    assert_eq!(summary["sessions"][1]["final_state"], "running");
}

#[test]
fn missing_infile_fails() {
    let temp = Project::empty();
    temp.qwatch()
        .args(&["--infile", "absent.txt", "-d", "out"])
        .fails()
        .stderr_has("absent.txt");
}

#[test]
fn unknown_fields_are_kept_as_static_metadata() {
    let temp = Project::empty();
    temp.file(
        "report.txt",
        "Job Id: 7.srv\n    job_state = R\n    gpu_vendor = acme\n\n",
    );

    temp.qwatch().args(INFILE).passes();

    let info = temp.rows("out/qwatch_7.srv_info.jsonl");
    assert_eq!(info[0]["gpu_vendor"], "acme");
}
