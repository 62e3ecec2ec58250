// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared harness: an isolated state directory and a builder around the
//! `cw` binary.

use std::path::{Path, PathBuf};
use std::process::{Child, Command as StdCommand, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

pub use serde_json::Value;

/// Upper bound for polling waits in specs.
pub const SPEC_WAIT_MAX_MS: u64 = 10_000;

/// Path to the `cw` binary, building it first if the test run did not.
///
/// The binary belongs to another workspace member, so Cargo does not hand
/// this package its location. It sits next to the `deps/` directory that
/// holds this test executable.
fn cw_bin() -> &'static Path {
    static BIN: OnceLock<PathBuf> = OnceLock::new();
    BIN.get_or_init(|| {
        let profile_dir = profile_dir();
        let path = profile_dir.join(format!("cw{}", std::env::consts::EXE_SUFFIX));
        if !path.exists() {
            let cargo = std::env::var("CARGO").unwrap_or_else(|_| "cargo".to_string());
            let mut build = StdCommand::new(cargo);
            build.args(["build", "-p", "cw", "--bin", "cw"]);
            if profile_dir.ends_with("release") {
                build.arg("--release");
            }
            let status = build.status().expect("cargo build -p cw");
            assert!(status.success(), "building cw failed");
        }
        assert!(path.exists(), "cw binary not found at {}", path.display());
        path
    })
}

/// `target/<profile>` for the running test executable.
fn profile_dir() -> PathBuf {
    let from_exe = std::env::current_exe().ok().and_then(|exe| {
        let dir = exe.parent()?;
        let dir = if dir.ends_with("deps") { dir.parent()? } else { dir };
        Some(dir.to_path_buf())
    });
    from_exe.unwrap_or_else(|| {
        let target = std::env::var_os("CARGO_TARGET_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| Path::new(env!("CARGO_MANIFEST_DIR")).join("target"));
        target.join("debug")
    })
}

/// Poll `condition` every 25ms until it holds or `max_ms` elapses.
pub fn wait_for(max_ms: u64, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_millis(max_ms);
    loop {
        if condition() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        std::thread::sleep(Duration::from_millis(25));
    }
}

/// A temporary home with its own config, state, logs and locks.
pub struct Sandbox {
    dir: tempfile::TempDir,
}

impl Sandbox {
    pub fn new() -> Self {
        Self { dir: tempfile::tempdir().expect("tempdir") }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn state_dir(&self) -> PathBuf {
        self.path().join("state")
    }

    pub fn config_path(&self) -> PathBuf {
        self.path().join("config.toml")
    }

    /// Write a file relative to the sandbox root.
    pub fn file(&self, rel: &str, contents: &str) {
        let path = self.path().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent");
        }
        std::fs::write(path, contents).expect("write file");
    }

    fn std_command(&self) -> StdCommand {
        let mut cmd = StdCommand::new(cw_bin());
        for var in ["CW_LOG", "CW_LOG_DIR", "CW_LOCK_DIR", "CW_SLACK_TOKEN", "CW_SLACK_CHANNEL", "XDG_CONFIG_HOME"] {
            cmd.env_remove(var);
        }
        cmd.env("HOME", self.path())
            .env("CW_CONFIG", self.config_path())
            .env("CW_STATE_DIR", self.state_dir())
            .env("CW_WATCH_POLL_MS", "50")
            .env("NO_COLOR", "1")
            .current_dir(self.path());
        cmd
    }

    /// A `cw` invocation in this sandbox.
    pub fn cw(&self) -> CliBuilder {
        CliBuilder { cmd: assert_cmd::Command::from_std(self.std_command()) }
    }

    /// Start `cw` in the background with piped output.
    pub fn spawn(&self, args: &[&str]) -> Child {
        self.std_command()
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .expect("spawn cw")
    }

    /// Runs as reported by `cw run list --no-limit -o json`, newest first.
    pub fn runs(&self) -> Vec<Value> {
        let json = self.cw().args(&["run", "list", "--no-limit", "-o", "json"]).passes().json();
        json.as_array().cloned().unwrap_or_default()
    }

    /// Wait until run `id` is Running with a recorded pid; returns the pid.
    pub fn wait_running(&self, id: u64) -> u32 {
        let mut pid = None;
        let found = wait_for(SPEC_WAIT_MAX_MS, || {
            pid = self
                .runs()
                .into_iter()
                .find(|run| run["id"] == id && run["status"] == "Running")
                .and_then(|run| run["pid"].as_u64());
            pid.is_some()
        });
        assert!(found, "run {id} never reached Running with a pid");
        pid.and_then(|p| u32::try_from(p).ok()).expect("pid fits u32")
    }
}

pub struct CliBuilder {
    cmd: assert_cmd::Command,
}

impl CliBuilder {
    pub fn args(mut self, args: &[&str]) -> Self {
        self.cmd.args(args);
        self
    }

    pub fn env(mut self, key: &str, value: impl AsRef<std::ffi::OsStr>) -> Self {
        self.cmd.env(key, value);
        self
    }

    pub fn stdin(mut self, input: &str) -> Self {
        self.cmd.write_stdin(input.to_string());
        self
    }

    fn output(mut self) -> CliOutput {
        let output = self.cmd.timeout(Duration::from_secs(30)).output().expect("run cw");
        CliOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }

    /// Run and assert exit code 0.
    pub fn passes(self) -> CliOutput {
        let out = self.output();
        assert_eq!(out.code, Some(0), "expected success\nstdout: {}\nstderr: {}", out.stdout, out.stderr);
        out
    }

    /// Run and assert the given exit code.
    pub fn exits_with(self, code: i32) -> CliOutput {
        let out = self.output();
        assert_eq!(out.code, Some(code), "unexpected exit\nstdout: {}\nstderr: {}", out.stdout, out.stderr);
        out
    }
}

pub struct CliOutput {
    pub code: Option<i32>,
    stdout: String,
    stderr: String,
}

impl CliOutput {
    pub fn stdout(&self) -> &str {
        &self.stdout
    }

    pub fn stdout_has(self, needle: &str) -> Self {
        assert!(self.stdout.contains(needle), "stdout missing {needle:?}:\n{}", self.stdout);
        self
    }

    pub fn stderr_has(self, needle: &str) -> Self {
        assert!(self.stderr.contains(needle), "stderr missing {needle:?}:\n{}", self.stderr);
        self
    }

    pub fn json(&self) -> Value {
        serde_json::from_str(&self.stdout).unwrap_or_else(|e| panic!("stdout is not JSON ({e}):\n{}", self.stdout))
    }
}

/// Collect a background `cw exec` and parse the run it printed.
pub fn finish_exec(child: Child) -> Value {
    let output = child.wait_with_output().expect("wait for cw");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        output.status.success(),
        "cw exec failed: {:?}\nstdout: {}\nstderr: {}",
        output.status,
        stdout,
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_str(&stdout).unwrap_or_else(|e| panic!("exec output is not JSON ({e}):\n{stdout}"))
}

/// Read a run's output log.
pub fn log_of(run: &Value) -> String {
    let path = run["log_file"].as_str().expect("log_file is a string");
    std::fs::read_to_string(path).unwrap_or_else(|e| panic!("cannot read {path}: {e}"))
}
