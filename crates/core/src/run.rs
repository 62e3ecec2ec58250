// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run record and status state machine.
//!
//! ```text
//! NotStarted ──► Skipped
//!     │
//!     └──► Running ──► Succeeded | Failed | Terminated
//! ```
//!
//! `Running` is the only non-terminal status. A skipped run is created
//! directly in its terminal state and never passes through `Running`.

use crate::job::JobId;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

crate::define_id! {
    /// Unique identifier for one execution attempt of a job.
    pub struct RunId;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RunStatus {
    Running,
    Succeeded,
    Failed,
    Terminated,
    Skipped,
}

impl RunStatus {
    pub const ALL: [RunStatus; 5] = [
        RunStatus::Running,
        RunStatus::Succeeded,
        RunStatus::Failed,
        RunStatus::Terminated,
        RunStatus::Skipped,
    ];

    pub fn is_terminal(self) -> bool {
        !matches!(self, RunStatus::Running)
    }

    /// Marker shown next to the status in tables and notifications.
    pub fn emoji(self) -> &'static str {
        match self {
            RunStatus::Running => "⚙️",
            RunStatus::Succeeded => "✅",
            RunStatus::Failed => "❌",
            RunStatus::Terminated => "🛑",
            RunStatus::Skipped => "⚠️",
        }
    }
}

crate::simple_display! {
    RunStatus {
        Running => "Running",
        Succeeded => "Succeeded",
        Failed => "Failed",
        Terminated => "Terminated",
        Skipped => "Skipped",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown run status '{0}' (expected running, succeeded, failed, terminated or skipped)")]
pub struct UnknownStatus(pub String);

impl FromStr for RunStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        RunStatus::ALL
            .into_iter()
            .find(|status| status.to_string().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

/// One execution attempt of a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Run {
    pub id: RunId,
    pub job_id: JobId,
    pub start_time_ms: u64,
    /// Set iff the run finished after actually starting (never for skips)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time_ms: Option<u64>,
    /// Captured stdout/stderr of the command; `None` for skipped runs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
    /// Structured event log of the `cw exec` invocation that owns this run
    pub exec_log_file: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    pub status: RunStatus,
}

impl Run {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Wall time between start and end, once the run has ended.
    pub fn duration_ms(&self) -> Option<u64> {
        self.end_time_ms.map(|end| end.saturating_sub(self.start_time_ms))
    }
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
