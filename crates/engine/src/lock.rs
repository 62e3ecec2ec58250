// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-job advisory lock.
//!
//! One `flock(2)` on `<lock_dir>/<job_name>.lock` per job. The kernel drops
//! the lock when the holder exits, so a crashed run never wedges its job.

use crate::log_paths;
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Outcome of a single non-blocking lock attempt.
#[derive(Debug)]
pub enum LockAttempt {
    Held(ProcessLock),
    /// Another run holds the lock, or the lock file could not be used.
    Busy,
}

/// A held job lock. Released on [`ProcessLock::release`] or drop.
#[derive(Debug)]
pub struct ProcessLock {
    file: Option<File>,
    path: PathBuf,
}

impl ProcessLock {
    /// Try once to take the job's lock without blocking.
    ///
    /// Contention and I/O errors both come back as [`LockAttempt::Busy`];
    /// I/O errors are logged at warn.
    pub fn try_acquire(lock_dir: &Path, job_name: &str) -> LockAttempt {
        let path = log_paths::lock_path(lock_dir, job_name);
        let file = match OpenOptions::new().write(true).create(true).truncate(false).open(&path) {
            Ok(file) => file,
            Err(e) => {
                warn!(job = job_name, path = %path.display(), error = %e, "cannot open lock file; treating job as busy");
                return LockAttempt::Busy;
            }
        };

        if let Err(e) = FileExt::try_lock_exclusive(&file) {
            if is_contended(&e) {
                debug!(job = job_name, path = %path.display(), "lock held by another run");
            } else {
                warn!(job = job_name, path = %path.display(), error = %e, "cannot lock; treating job as busy");
            }
            return LockAttempt::Busy;
        }

        // Holder pid, for operators inspecting the lock directory
        let mut file = file;
        if let Err(e) = file.set_len(0).and_then(|()| writeln!(file, "{}", std::process::id())) {
            debug!(path = %path.display(), error = %e, "could not write pid to lock file");
        }

        LockAttempt::Held(ProcessLock { file: Some(file), path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release the lock. Safe to call more than once.
    pub fn release(&mut self) {
        if let Some(file) = self.file.take() {
            if let Err(e) = FileExt::unlock(&file) {
                // Closing the file below still drops the flock
                debug!(path = %self.path.display(), error = %e, "unlock failed");
            }
        }
    }
}

impl Drop for ProcessLock {
    fn drop(&mut self) {
        self.release();
    }
}

fn is_contended(e: &std::io::Error) -> bool {
    e.kind() == ErrorKind::WouldBlock
        || e.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;
