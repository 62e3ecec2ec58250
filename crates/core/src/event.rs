// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Store events.
//!
//! Every mutation of persisted state is recorded as one of these facts in the
//! store's write-ahead log; job and run records are derived by replaying them.

use crate::job::JobId;
use crate::run::{RunId, RunStatus};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Serializes with `{"type": "entity:verb", ...fields}` format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    #[serde(rename = "job:created")]
    JobCreated {
        id: JobId,
        name: String,
        #[serde(default)]
        notify_log_content: bool,
        created_at_ms: u64,
    },

    #[serde(rename = "job:updated")]
    JobUpdated { id: JobId, name: String, notify_log_content: bool },

    /// A run acquired its job lock and is about to spawn.
    #[serde(rename = "run:started")]
    RunStarted {
        id: RunId,
        job_id: JobId,
        start_time_ms: u64,
        log_file: PathBuf,
        exec_log_file: PathBuf,
    },

    /// A run found its job lock busy and never spawned.
    #[serde(rename = "run:skipped")]
    RunSkipped { id: RunId, job_id: JobId, time_ms: u64, exec_log_file: PathBuf },

    #[serde(rename = "run:pid")]
    RunPidRecorded { id: RunId, pid: u32 },

    #[serde(rename = "run:finalized")]
    RunFinalized { id: RunId, status: RunStatus, end_time_ms: u64 },
}

impl Event {
    /// The serialized type tag, for log fields.
    pub fn name(&self) -> &'static str {
        match self {
            Event::JobCreated { .. } => "job:created",
            Event::JobUpdated { .. } => "job:updated",
            Event::RunStarted { .. } => "run:started",
            Event::RunSkipped { .. } => "run:skipped",
            Event::RunPidRecorded { .. } => "run:pid",
            Event::RunFinalized { .. } => "run:finalized",
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
