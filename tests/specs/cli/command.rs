//! Status command specs
//!
//! A shell script stands in for `qstat`: with no job argument it prints the
//! whole queue, with one it reports the job as unknown.

use crate::prelude::*;

const FAKE_QSTAT: &str = r#"
if [ -n "$2" ]; then
    echo "qstat: Unknown Job Id $2" >&2
    exit 153
fi
cat "$(dirname "$0")/report.txt"
"#;

#[test]
fn job_that_left_the_queue_ends_as_unknown() {
    let temp = Project::empty();
    temp.file("report.txt", TWO_JOBS);
    let qstat = temp.script("qstat", FAKE_QSTAT);
    let cmd = format!("{} -f {{job}}", qstat.display());

    temp.qwatch()
        .args(&["--cmd", &cmd, "-d", "out"])
        .args(&["-j", "9002.sequoia", "-s", "1"])
        .passes()
        .stdout_has("9002.sequoia  unknown  samples=1 data_rows=0");

    assert!(temp.exists("out/qwatch.json"));
    assert!(!temp.exists("out/qwatch_9002.sequoia_data.jsonl"));
}

#[test]
fn failing_initial_query_fails_the_run() {
    let temp = Project::empty();
    let qstat = temp.script("qstat", "echo 'cannot connect to server' >&2\nexit 1");

    temp.qwatch()
        .args(&["--cmd", &qstat.display().to_string(), "-d", "out"])
        .fails()
        .stderr_has("initial status query failed")
        .stderr_has("cannot connect to server");
}

#[test]
fn missing_status_command_fails_the_run() {
    let temp = Project::empty();
    temp.qwatch()
        .args(&["--cmd", "qw-no-such-qstat -f", "-d", "out"])
        .fails()
        .stderr_has("not found");
}

#[test]
fn session_failure_exits_with_code_two() {
    let temp = Project::empty();
    temp.file("report.txt", TWO_JOBS);
    let qstat = temp.script(
        "qstat",
        r#"if [ -n "$2" ]; then echo "server busy" >&2; exit 1; fi
cat "$(dirname "$0")/report.txt""#,
    );
    let cmd = format!("{} -f {{job}}", qstat.display());

    let run = temp
        .qwatch()
        .args(&["--cmd", &cmd, "-d", "out"])
        .args(&["-j", "9001", "--retries", "0"])
        .fails()
        .stderr_has("1 watch session(s) failed");
    assert_eq!(run.code(), Some(2));
}

#[test]
fn invalid_taxonomy_fails_the_run() {
    let temp = Project::empty();
    temp.file("report.txt", TWO_JOBS);
    temp.file("taxonomy.toml", "info = [\"queue\"]\ntime = [\"queue\"]\n");

    temp.qwatch()
        .args(&["--infile", "report.txt", "-d", "out"])
        .env("QW_TAXONOMY", "taxonomy.toml")
        .fails()
        .stderr_has("queue");
}
