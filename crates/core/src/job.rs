// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job identity.
//!
//! A job is a named, recurring unit of work. Jobs are created lazily the first
//! time `cw exec` sees a name, or up front with `cw job add`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

crate::define_id! {
    /// Unique identifier for a job. Immutable once assigned by the store.
    pub struct JobId;
}

/// Longest accepted job name, in bytes.
pub const MAX_JOB_NAME_LEN: usize = 128;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub name: String,
    /// Embed log output (rather than the log path) in notifications
    #[serde(default)]
    pub notify_log_content: bool,
    #[serde(default)]
    pub created_at_ms: u64,
}

/// Why a job name was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobNameError {
    #[error("job name must not be empty")]
    Empty,
    #[error("job name is {0} bytes; the limit is {MAX_JOB_NAME_LEN}")]
    TooLong(usize),
    #[error("job name must not contain {0:?}")]
    InvalidChar(char),
    #[error("job name '{0}' is reserved")]
    Reserved(String),
}

/// Check that a job name can be used as a lock-file stem.
///
/// The lock path is `<lock_dir>/<name>.lock`, so the name must stay inside
/// the lock directory.
pub fn validate_job_name(name: &str) -> Result<(), JobNameError> {
    if name.is_empty() {
        return Err(JobNameError::Empty);
    }
    if name.len() > MAX_JOB_NAME_LEN {
        return Err(JobNameError::TooLong(name.len()));
    }
    if name == "." || name == ".." {
        return Err(JobNameError::Reserved(name.to_string()));
    }
    if let Some(c) = name.chars().find(|c| *c == '/' || *c == '\0' || c.is_control()) {
        return Err(JobNameError::InvalidChar(c));
    }
    Ok(())
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
