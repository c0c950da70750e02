// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

const TIMEOUT: Duration = Duration::from_secs(10);

fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn script_source(script: &Path) -> CommandSource {
    CommandSource::new(script.display().to_string(), TIMEOUT)
}

#[yare::parameterized(
    plain            = { "qstat -f",           None,           &["qstat", "-f"] },
    substituted      = { "qstat -f {job}",     Some("7.srv"),  &["qstat", "-f", "7.srv"] },
    dropped          = { "qstat -f {job}",     None,           &["qstat", "-f"] },
    embedded         = { "show --id={job}",    Some("7"),      &["show", "--id=7"] },
    embedded_empty   = { "show --id={job}",    None,           &["show", "--id="] },
    extra_whitespace = { "  qstat   -f  ",     None,           &["qstat", "-f"] },
)]
fn argv_expansion(template: &str, job: Option<&str>, expected: &[&str]) {
    let source = CommandSource::new(template, TIMEOUT);
    assert_eq!(source.argv(job), expected);
}

#[tokio::test]
async fn command_stdout_is_the_report() {
    let source = CommandSource::new("echo Job Id: 1.srv", TIMEOUT);
    let text = source.fetch(None).await.unwrap();
    assert_eq!(text, "Job Id: 1.srv\n");
}

#[tokio::test]
async fn missing_executable_is_not_found() {
    let source = CommandSource::new("qw-no-such-status-command -f", TIMEOUT);
    let err = source.fetch(None).await.unwrap_err();

    match &err {
        SourceError::NotFound { program } => assert_eq!(program, "qw-no-such-status-command"),
        other => panic!("expected NotFound, got {other:?}"),
    }
    assert!(!err.is_lookup_miss());
}

#[tokio::test]
async fn empty_command_is_rejected() {
    let err = CommandSource::new("   ", TIMEOUT).fetch(None).await.unwrap_err();
    assert!(matches!(err, SourceError::EmptyCommand));
}

#[tokio::test]
async fn nonzero_exit_is_failed() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(dir.path(), "broken", "echo 'server down' >&2\nexit 2");
    let err = script_source(&script).fetch(None).await.unwrap_err();
    match err {
        SourceError::Failed { stderr, .. } => assert_eq!(stderr, "server down"),
        other => panic!("expected Failed, got {other:?}"),
    }
}

#[tokio::test]
async fn unknown_job_id_is_a_lookup_miss() {
    let dir = tempfile::tempdir().unwrap();
    let body = "echo \"qstat: Unknown Job Id $2\" >&2\nexit 153";
    let script = write_script(dir.path(), "qstat", body);
    let source = CommandSource::new(format!("{} -f {{job}}", script.display()), TIMEOUT);

    let err = source.fetch(Some("9001.srv")).await.unwrap_err();

    assert!(err.is_lookup_miss());
    match err {
        SourceError::UnknownJob { job_id } => assert_eq!(job_id, "9001.srv"),
        other => panic!("expected UnknownJob, got {other:?}"),
    }
}

#[tokio::test]
async fn unknown_job_text_without_a_job_is_a_failure() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(dir.path(), "qstat", "echo 'Unknown Job Id' >&2\nexit 153");
    let err = script_source(&script).fetch(None).await.unwrap_err();
    assert!(matches!(err, SourceError::Failed { .. }));
}

#[tokio::test]
async fn slow_command_times_out() {
    let source = CommandSource::new("sleep 5", Duration::from_millis(50));
    let err = source.fetch(None).await.unwrap_err();
    assert!(matches!(err, SourceError::Timeout { .. }));
}

#[tokio::test]
async fn file_source_reads_the_same_text_every_time() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.txt");
    std::fs::write(&path, "Job Id: 1.srv\n    job_state = R\n").unwrap();
    let source = FileSource::new(&path);

    assert!(source.is_static());
    let narrowed = source.fetch(Some("1.srv")).await.unwrap();
    assert_eq!(narrowed, source.fetch(None).await.unwrap());
}

#[tokio::test]
async fn file_source_missing_file_is_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let source = FileSource::new(dir.path().join("absent.txt"));
    let err = source.fetch(None).await.unwrap_err();
    assert!(matches!(err, SourceError::Read { .. }));
}

#[tokio::test]
async fn report_source_routes_to_inner_source() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.txt");
    std::fs::write(&path, "text").unwrap();

    let file = ReportSource::File(FileSource::new(&path));
    let command = ReportSource::Command(CommandSource::new("echo live", TIMEOUT));

    assert!(file.is_static());
    assert!(!command.is_static());
    assert_eq!(file.fetch(None).await.unwrap(), "text");
    assert_eq!(command.fetch(None).await.unwrap(), "live\n");
    assert_eq!(command.describe(), "echo live");
}

#[tokio::test]
async fn fake_serves_script_then_fallback_and_records_calls() {
    let source = FakeStatusSource::reports(["first"]);
    source.push(FakeResponse::UnknownJob);

    assert_eq!(source.fetch(None).await.unwrap(), "first");
    let err = source.fetch(Some("3.srv")).await.unwrap_err();
    assert!(err.is_lookup_miss());
    assert_eq!(source.fetch(Some("3.srv")).await.unwrap(), "");

    let job = Some("3.srv".to_string());
    assert_eq!(source.calls(), vec![None, job.clone(), job]);
}

#[tokio::test(start_paused = true)]
async fn fake_counts_overlapping_fetches() {
    let source = FakeStatusSource::new();
    source.set_fallback(FakeResponse::Slow(Duration::from_secs(1), "late".into()));

    let (a, b) = tokio::join!(source.fetch(None), source.fetch(None));
    assert_eq!(a.unwrap(), "late");
    assert_eq!(b.unwrap(), "late");
    assert_eq!(source.peak_in_flight(), 2);

    source.fetch(None).await.unwrap();
    assert_eq!(source.peak_in_flight(), 2);
}
