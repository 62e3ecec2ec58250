// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only JSON-lines log of one `cw exec` invocation.

use crate::log_paths;
use cw_core::{format_utc_compact, JobId, RunId, RunStatus};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Lifecycle events recorded for one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ExecEvent {
    JobCreated { job_id: JobId, job_name: String },
    LockAcquired { job_name: String, lock_file: PathBuf },
    RunCreated { run_id: RunId, log_file: PathBuf },
    RunStarted { run_id: RunId, pid: u32 },
    SpawnFailed { run_id: RunId, error: String },
    PidPersistFailed { run_id: RunId, pid: u32, error: String },
    SignalRelayed { run_id: RunId, signal: String, pid: u32 },
    RunCompleted { run_id: RunId, status: RunStatus },
    RunSkipped { run_id: RunId, job_name: String },
    NotifySent { run_id: RunId, delivered: bool },
    NotifyFailed { run_id: RunId, error: String },
}

/// One line of the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecLogLine {
    /// RFC 3339 UTC time of the write
    pub ts: String,
    #[serde(flatten)]
    pub event: ExecEvent,
}

/// Writer for `<log_dir>/cw-exec-<stamp>-<suffix>.jsonl`.
///
/// Each `record()` call opens, writes, and closes the file. Failures are
/// logged via tracing but do not propagate; the run record stays the source
/// of truth for outcomes.
#[derive(Debug, Clone)]
pub struct ExecEventLog {
    path: PathBuf,
}

impl ExecEventLog {
    /// Name a fresh log under `log_dir` stamped with `now_ms`.
    pub fn create(log_dir: &Path, now_ms: u64) -> Self {
        let suffix = nanoid::nanoid!(8);
        Self { path: log_paths::exec_log_path(log_dir, &format_utc_compact(now_ms), &suffix) }
    }

    pub fn at(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn record(&self, event: ExecEvent) {
        let line = ExecLogLine { ts: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true), event };
        if let Err(e) = self.write_line(&line) {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to write exec event log");
        }
    }

    fn write_line(&self, line: &ExecLogLine) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut buf = serde_json::to_vec(line)?;
        buf.push(b'\n');
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        file.write_all(&buf)
    }

    /// Read every parseable line back. Used by tests and `run show`.
    pub fn read(path: &Path) -> std::io::Result<Vec<ExecLogLine>> {
        let text = fs::read_to_string(path)?;
        Ok(text.lines().filter_map(|line| serde_json::from_str(line).ok()).collect())
    }
}

#[cfg(test)]
#[path = "exec_log_tests.rs"]
mod tests;
