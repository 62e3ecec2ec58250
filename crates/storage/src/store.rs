// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persistence contract used by the executor, the tailer and the CLI.

use crate::snapshot::SnapshotError;
use crate::wal::WalError;
use cw_core::{Job, JobId, JobNameError, Run, RunId, RunStatus};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Wal(#[from] WalError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error("job not found: {0}")]
    JobNotFound(String),
    #[error("job id not found: {0}")]
    JobIdNotFound(JobId),
    #[error("job already exists: {0}")]
    JobExists(String),
    #[error("run not found: {0}")]
    RunNotFound(RunId),
    #[error("run {id} is {status}, not Running")]
    RunNotRunning { id: RunId, status: RunStatus },
    #[error("{0} is not a final status for a started run")]
    InvalidStatus(RunStatus),
    #[error(transparent)]
    InvalidName(#[from] JobNameError),
}

/// Durable job and run records, shared across processes.
///
/// Every mutating method is atomic with respect to other processes using
/// the same store.
pub trait RunStore: Clone + Send + Sync + 'static {
    /// Find the job named `name`, creating it if absent.
    /// The flag is true when this call created it.
    fn get_or_create_job(&self, name: &str) -> Result<(Job, bool), StoreError>;

    /// Record a `Running` run that acquired its lock.
    fn create_run(&self, job_id: JobId, log_file: &Path, exec_log_file: &Path) -> Result<RunId, StoreError>;

    /// Attach the OS process id of a running run.
    fn record_pid(&self, run_id: RunId, pid: u32) -> Result<(), StoreError>;

    /// Move a `Running` run to Succeeded, Failed or Terminated.
    fn finalize_run(&self, run_id: RunId, status: RunStatus, end_time_ms: u64) -> Result<(), StoreError>;

    /// Record a run that found its lock busy. Skipped runs are terminal
    /// from creation.
    fn skip_run(&self, job_id: JobId, exec_log_file: &Path) -> Result<RunId, StoreError>;

    fn get_run(&self, run_id: RunId) -> Result<Option<Run>, StoreError>;

    /// Whether the run has reached a terminal status.
    fn is_run_finished(&self, run_id: RunId) -> Result<bool, StoreError>;

    fn get_job(&self, name: &str) -> Result<Option<Job>, StoreError>;

    fn get_job_by_id(&self, job_id: JobId) -> Result<Option<Job>, StoreError>;

    /// Create a job explicitly. Fails if the name is taken.
    fn add_job(&self, name: &str, notify_log_content: bool) -> Result<Job, StoreError>;

    /// Rename a job and/or change its notification setting.
    fn update_job(
        &self,
        name: &str,
        new_name: Option<&str>,
        notify_log_content: Option<bool>,
    ) -> Result<Job, StoreError>;

    /// All jobs, ordered by id.
    fn list_jobs(&self) -> Result<Vec<Job>, StoreError>;

    /// All runs, newest first.
    fn list_runs(&self) -> Result<Vec<Run>, StoreError>;
}
