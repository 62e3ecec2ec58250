// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized path builders for lock and log files.
//!
//! Directory structure:
//! ```text
//! <lock_dir>/
//!   <job_name>.lock
//! <log_dir>/
//!   <job_name>.<suffix>.log          # child stdout/stderr, one per run
//!   cw-exec-<stamp>-<suffix>.jsonl   # lifecycle events, one per invocation
//! ```

use std::path::{Path, PathBuf};

/// Lock file for a job. One path per job name, stable across restarts.
pub fn lock_path(lock_dir: &Path, job_name: &str) -> PathBuf {
    lock_dir.join(format!("{job_name}.lock"))
}

/// Output log for one run.
pub fn run_log_path(log_dir: &Path, job_name: &str, suffix: &str) -> PathBuf {
    log_dir.join(format!("{job_name}.{suffix}.log"))
}

/// Event log for one `cw exec` invocation. `stamp` is a compact UTC time.
pub fn exec_log_path(log_dir: &Path, stamp: &str, suffix: &str) -> PathBuf {
    log_dir.join(format!("cw-exec-{stamp}-{suffix}.jsonl"))
}

#[cfg(test)]
#[path = "log_paths_tests.rs"]
mod tests;
