// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job changes that have to respect the per-job lock.

use crate::lock::{LockAttempt, ProcessLock};
use cw_core::Job;
use cw_storage::{RunStore, StoreError};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UpdateJobError {
    #[error("job {0} has a run in progress; rename it after the run finishes")]
    Running(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Rename a job and/or change its notification setting.
///
/// A rename holds the job's lock while the store changes. Runs lock by name,
/// so a rename can neither overlap a run of the job nor let a run under the
/// new name start beside one still holding the old name.
pub fn update_job<S: RunStore>(
    store: &S,
    lock_dir: &Path,
    name: &str,
    new_name: Option<&str>,
    notify_log_content: Option<bool>,
) -> Result<Job, UpdateJobError> {
    let _lock = match new_name.filter(|new_name| *new_name != name) {
        Some(_) => match ProcessLock::try_acquire(lock_dir, name) {
            LockAttempt::Held(lock) => Some(lock),
            LockAttempt::Busy => return Err(UpdateJobError::Running(name.to_string())),
        },
        None => None,
    };
    Ok(store.update_job(name, new_name, notify_log_content)?)
}

#[cfg(test)]
#[path = "jobs_tests.rs"]
mod tests;
