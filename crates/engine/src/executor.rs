// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run executor
//!
//! ```text
//! NotStarted ──lock busy──► Skipped
//!     │
//!     └─lock held─► Running ──► Succeeded | Failed | Terminated
//! ```
//!
//! The run is persisted as Running before the child is spawned, and the job
//! lock is released on every path out of [`RunExecutor::execute`].

use crate::exec_log::{ExecEvent, ExecEventLog};
use crate::lock::{LockAttempt, ProcessLock};
use crate::log_paths;
use crate::relay::{forward_sigterm, SignalRelay};
use cw_adapters::{NotifyAdapter, RunNotice};
use cw_core::{Clock, Job, Run, RunId, RunStatus};
use cw_storage::{RunStore, StoreError};
use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::os::unix::process::ExitStatusExt;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use thiserror::Error;
use tokio::process::{Child, Command};
use tracing::{debug, error, info, warn};

/// Default shell for job commands.
pub const SHELL: &str = "/bin/sh";

const LOG_FILE_ATTEMPTS: usize = 3;

/// Failures before a run record exists. Once a run exists, every outcome is
/// reported through it instead.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("cannot create log file {path}: {source}")]
    LogFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Directories and identity used by the executor.
#[derive(Debug, Clone)]
pub struct ExecConfig {
    pub log_dir: PathBuf,
    pub lock_dir: PathBuf,
    /// Shown in notifications; may be empty
    pub hostname: String,
    /// Commands run as `<shell> -c <command>`
    pub shell: PathBuf,
}

impl ExecConfig {
    pub fn new(log_dir: PathBuf, lock_dir: PathBuf, hostname: String) -> Self {
        Self { log_dir, lock_dir, hostname, shell: PathBuf::from(SHELL) }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecRequest {
    pub job_name: String,
    pub command: String,
    pub notify: bool,
}

/// Runs one invocation of a job end to end.
pub struct RunExecutor<S, N, C> {
    store: S,
    notifier: N,
    clock: C,
    config: ExecConfig,
    events: ExecEventLog,
}

impl<S, N, C> RunExecutor<S, N, C>
where
    S: RunStore,
    N: NotifyAdapter,
    C: Clock,
{
    pub fn new(store: S, notifier: N, clock: C, config: ExecConfig, events: ExecEventLog) -> Self {
        Self { store, notifier, clock, config, events }
    }

    /// Execute `request` and return the finalized run.
    pub async fn execute(&self, request: &ExecRequest) -> Result<Run, ExecError> {
        let (mut job, created) = self.store.get_or_create_job(&request.job_name)?;
        if created {
            info!(job = %job.name, job_id = %job.id, "created job");
            self.events.record(ExecEvent::JobCreated { job_id: job.id, job_name: job.name.clone() });
        }

        // The lock is keyed by name, so the name must still be current once
        // the lock is held
        let mut lock = loop {
            let lock = match ProcessLock::try_acquire(&self.config.lock_dir, &job.name) {
                LockAttempt::Held(lock) => lock,
                LockAttempt::Busy => return self.skip(&job, request.notify).await,
            };
            match self.store.get_job_by_id(job.id)? {
                Some(current) if current.name != job.name => {
                    debug!(job_id = %job.id, from = %job.name, to = %current.name, "job renamed; relocking");
                    job = current;
                }
                Some(current) => {
                    job = current;
                    break lock;
                }
                None => break lock,
            }
        };
        self.events.record(ExecEvent::LockAcquired {
            job_name: job.name.clone(),
            lock_file: lock.path().to_path_buf(),
        });

        let result = self.run_locked(&job, &request.command).await;
        lock.release();
        let run = result?;

        if request.notify {
            self.notify(&job, &run).await;
        }
        Ok(run)
    }

    async fn skip(&self, job: &Job, notify: bool) -> Result<Run, ExecError> {
        let now = self.clock.epoch_ms();
        let run_id = self.store.skip_run(job.id, self.events.path())?;
        info!(job = %job.name, run_id = %run_id, "job already running; run skipped");
        self.events.record(ExecEvent::RunSkipped { run_id, job_name: job.name.clone() });

        let run = self.reload(Run {
            id: run_id,
            job_id: job.id,
            start_time_ms: now,
            end_time_ms: None,
            log_file: None,
            exec_log_file: self.events.path().to_path_buf(),
            pid: None,
            status: RunStatus::Skipped,
        });
        if notify {
            self.notify(job, &run).await;
        }
        Ok(run)
    }

    /// Everything between lock acquisition and lock release.
    async fn run_locked(&self, job: &Job, command: &str) -> Result<Run, ExecError> {
        let (log_path, log_file) = self.create_log_file(&job.name)?;
        let started_at = self.clock.epoch_ms();
        let run_id = self.store.create_run(job.id, &log_path, self.events.path())?;
        info!(job = %job.name, run_id = %run_id, log_file = %log_path.display(), "run started");
        self.events.record(ExecEvent::RunCreated { run_id, log_file: log_path.clone() });

        let mut run = Run {
            id: run_id,
            job_id: job.id,
            start_time_ms: started_at,
            end_time_ms: None,
            log_file: Some(log_path),
            exec_log_file: self.events.path().to_path_buf(),
            pid: None,
            status: RunStatus::Running,
        };

        let status = match spawn(&self.config.shell, command, log_file) {
            Ok(child) => self.supervise(run_id, child, &mut run).await,
            Err(e) => {
                error!(run_id = %run_id, error = %e, "failed to spawn command");
                self.events.record(ExecEvent::SpawnFailed { run_id, error: e.to_string() });
                RunStatus::Failed
            }
        };

        let end = self.clock.epoch_ms();
        run.status = status;
        run.end_time_ms = Some(end);
        match self.store.finalize_run(run_id, status, end) {
            Ok(()) => {}
            Err(StoreError::RunNotRunning { status: stored, .. }) => {
                warn!(run_id = %run_id, ours = %status, stored = %stored, "run was finalized elsewhere; keeping stored status");
            }
            Err(e) => {
                error!(run_id = %run_id, error = %e, "failed to persist final status");
            }
        }
        info!(job = %job.name, run_id = %run_id, status = %status, "run finished");
        self.events.record(ExecEvent::RunCompleted { run_id, status });

        Ok(self.reload(run))
    }

    /// Persist the pid, relay signals while waiting, and classify the exit.
    async fn supervise(&self, run_id: RunId, mut child: Child, run: &mut Run) -> RunStatus {
        // Listen before the pid is visible to others
        let mut relay = match SignalRelay::install() {
            Ok(relay) => Some(relay),
            Err(e) => {
                warn!(error = %e, "cannot listen for signals; they will not be relayed");
                None
            }
        };
        let mut pid_failed = false;
        if let Some(pid) = child.id() {
            run.pid = Some(pid);
            self.events.record(ExecEvent::RunStarted { run_id, pid });
            if let Err(e) = self.store.record_pid(run_id, pid) {
                error!(run_id = %run_id, pid, error = %e, "failed to persist pid; terminating child");
                self.events.record(ExecEvent::PidPersistFailed { run_id, pid, error: e.to_string() });
                if let Err(e) = forward_sigterm(pid) {
                    warn!(run_id = %run_id, pid, error = %e, "SIGTERM to child failed");
                }
                pid_failed = true;
            }
        }

        let mut forwarded = pid_failed;

        let exit = loop {
            tokio::select! {
                exit = child.wait() => break exit,
                received = next_signal(&mut relay), if !forwarded => {
                    let Some(name) = received else {
                        relay = None;
                        continue;
                    };
                    forwarded = true;
                    let Some(pid) = run.pid else { continue };
                    info!(run_id = %run_id, signal = name, pid, "relaying SIGTERM to child");
                    if let Err(e) = forward_sigterm(pid) {
                        warn!(run_id = %run_id, pid, error = %e, "SIGTERM to child failed");
                    }
                    self.events.record(ExecEvent::SignalRelayed { run_id, signal: name.to_string(), pid });
                }
            }
        };

        classify(pid_failed, exit)
    }

    /// Prefer the stored record, which reflects store-assigned times and
    /// any out-of-band finalization.
    fn reload(&self, local: Run) -> Run {
        match self.store.get_run(local.id) {
            Ok(Some(stored)) => stored,
            Ok(None) => {
                warn!(run_id = %local.id, "run missing from store after write");
                local
            }
            Err(e) => {
                warn!(run_id = %local.id, error = %e, "cannot re-read run");
                local
            }
        }
    }

    async fn notify(&self, job: &Job, run: &Run) {
        let notice = RunNotice::new(job, run, &self.config.hostname);
        match self.notifier.notify(&notice).await {
            Ok(delivered) => {
                if !delivered {
                    warn!(run_id = %run.id, "notification was not delivered");
                }
                self.events.record(ExecEvent::NotifySent { run_id: run.id, delivered });
            }
            Err(e) => {
                warn!(run_id = %run.id, error = %e, "notification failed");
                self.events.record(ExecEvent::NotifyFailed { run_id: run.id, error: e.to_string() });
            }
        }
    }

    /// Create a new, unique output log for one run.
    fn create_log_file(&self, job_name: &str) -> Result<(PathBuf, File), ExecError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let path = log_paths::run_log_path(&self.config.log_dir, job_name, &nanoid::nanoid!(10));
            match OpenOptions::new().append(true).create_new(true).open(&path) {
                Ok(file) => return Ok((path, file)),
                Err(e) if e.kind() == ErrorKind::AlreadyExists && attempt < LOG_FILE_ATTEMPTS => {
                    debug!(path = %path.display(), "log file name taken; retrying");
                }
                Err(source) => return Err(ExecError::LogFile { path, source }),
            }
        }
    }
}

/// `<shell> -c <command>` with stdin from /dev/null and both output streams
/// appended to `log_file`.
fn spawn(shell: &Path, command: &str, log_file: File) -> std::io::Result<Child> {
    let stderr = log_file.try_clone()?;
    Command::new(shell)
        .arg("-c")
        .arg(command)
        .stdin(Stdio::null())
        .stdout(Stdio::from(log_file))
        .stderr(Stdio::from(stderr))
        .spawn()
}

async fn next_signal(relay: &mut Option<SignalRelay>) -> Option<&'static str> {
    match relay {
        Some(relay) => relay.recv().await,
        None => std::future::pending().await,
    }
}

/// Map a wait result to a final status.
pub fn classify(pid_failed: bool, exit: std::io::Result<ExitStatus>) -> RunStatus {
    if pid_failed {
        return RunStatus::Failed;
    }
    match exit {
        Ok(status) if status.success() => RunStatus::Succeeded,
        Ok(status) if status.signal().is_some() => RunStatus::Terminated,
        Ok(_) => RunStatus::Failed,
        Err(e) => {
            warn!(error = %e, "waiting on child failed");
            RunStatus::Failed
        }
    }
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
