//! Shared helpers for driving the `qwatch` binary.

use assert_cmd::Command;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A `qwatch` invocation with plain, quiet output.
pub fn cli() -> CliBuilder {
    CliBuilder {
        args: Vec::new(),
        envs: Vec::new(),
        dir: None,
    }
}

pub struct CliBuilder {
    args: Vec<String>,
    envs: Vec<(String, String)>,
    dir: Option<PathBuf>,
}

impl CliBuilder {
    pub fn args(mut self, args: &[&str]) -> Self {
        self.args.extend(args.iter().map(|s| s.to_string()));
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.envs.push((key.to_string(), value.to_string()));
        self
    }

    fn run(self) -> std::process::Output {
        let mut cmd = Command::cargo_bin("qwatch").expect("qwatch binary should be built");
        cmd.env("NO_COLOR", "1")
            .env("QW_LOG", "warn")
            .env_remove("QW_TAXONOMY");
        if let Some(dir) = &self.dir {
            cmd.current_dir(dir);
        }
        for (key, value) in &self.envs {
            cmd.env(key, value);
        }
        cmd.args(&self.args).output().expect("qwatch should run")
    }

    pub fn passes(self) -> RunAssert {
        let output = self.run();
        assert!(
            output.status.success(),
            "expected success, got {:?}\nstdout: {}\nstderr: {}",
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        );
        RunAssert { output }
    }

    pub fn fails(self) -> RunAssert {
        let output = self.run();
        assert!(
            !output.status.success(),
            "expected failure\nstdout: {}",
            String::from_utf8_lossy(&output.stdout),
        );
        RunAssert { output }
    }
}

pub struct RunAssert {
    output: std::process::Output,
}

impl RunAssert {
    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.output.stdout).into_owned()
    }

    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.output.stderr).into_owned()
    }

    pub fn code(&self) -> Option<i32> {
        self.output.status.code()
    }

    pub fn stdout_has(self, needle: &str) -> Self {
        let stdout = self.stdout();
        assert!(
            stdout.contains(needle),
            "stdout missing {needle:?}:\n{stdout}"
        );
        self
    }

    pub fn stderr_has(self, needle: &str) -> Self {
        let stderr = self.stderr();
        assert!(
            stderr.contains(needle),
            "stderr missing {needle:?}:\n{stderr}"
        );
        self
    }

    pub fn stdout_eq(self, expected: &str) -> Self {
        similar_asserts::assert_eq!(self.stdout(), expected);
        self
    }
}

/// A scratch directory holding reports and output.
pub struct Project {
    dir: TempDir,
}

impl Project {
    pub fn empty() -> Self {
        Self {
            dir: TempDir::new().expect("tempdir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn exists(&self, rel: &str) -> bool {
        self.path().join(rel).exists()
    }

    pub fn file(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent");
        }
        std::fs::write(&path, content).expect("write file");
        path
    }

    /// Executable shell script standing in for the status command.
    pub fn script(&self, rel: &str, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = self.file(rel, &format!("#!/bin/sh\n{body}\n"));
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).expect("chmod");
        path
    }

    /// `qwatch` run from inside the project directory.
    pub fn qwatch(&self) -> CliBuilder {
        CliBuilder {
            dir: Some(self.path().to_path_buf()),
            ..cli()
        }
    }

    /// Rows of a JSON-lines sink, header excluded.
    pub fn rows(&self, rel: &str) -> Vec<serde_json::Value> {
        let text = std::fs::read_to_string(self.path().join(rel))
            .unwrap_or_else(|e| panic!("read {rel}: {e}"));
        text.lines()
            .skip(1)
            .filter(|l| !l.trim().is_empty())
            .map(|l| serde_json::from_str(l).expect("row json"))
            .collect()
    }

    pub fn json(&self, rel: &str) -> serde_json::Value {
        let text = std::fs::read_to_string(self.path().join(rel))
            .unwrap_or_else(|e| panic!("read {rel}: {e}"));
        serde_json::from_str(&text).expect("json")
    }
}

/// Two jobs: alice's queued, bob's running.
pub const TWO_JOBS: &str = "\
Job Id: 9001.sequoia
    Job_Name = align
    Job_Owner = alice@login01.cluster
    job_state = Q
    queue = batch
    ctime = Mon Oct  1 10:00:00 2018
    Variable_List = PBS_O_HOME=/home/alice,PBS_O_LOGNAME=alice,
\tPBS_O_QUEUE=batch

Job Id: 9002.sequoia
    Job_Name = assemble
    Job_Owner = bob@login01.cluster
    job_state = R
    queue = batch
    ctime = Mon Oct  1 09:00:00 2018
    resources_used.cput = 00:10:00
    resources_used.mem = 2048kb
    resources_used.ncpus = 4
    resources_used.walltime = 00:05:00
    Variable_List = PBS_O_HOME=/home/bob,PBS_O_LOGNAME=bob,PBS_O_QUEUE=batch

";
