// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized state from WAL replay

use cw_core::{Event, Job, JobId, Run, RunId, RunStatus};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Jobs and runs as of some point in the log.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterializedState {
    pub jobs: BTreeMap<JobId, Job>,
    pub runs: BTreeMap<RunId, Run>,
}

impl MaterializedState {
    pub fn job_by_name(&self, name: &str) -> Option<&Job> {
        self.jobs.values().find(|job| job.name == name)
    }

    pub fn next_job_id(&self) -> JobId {
        self.jobs.keys().next_back().map_or(JobId::new(1), |id| id.next())
    }

    pub fn next_run_id(&self) -> RunId {
        self.runs.keys().next_back().map_or(RunId::new(1), |id| id.next())
    }

    /// Apply one event.
    ///
    /// Every arm is idempotent: applying the same event twice leaves the
    /// state as if it were applied once. Events that would move a run out of
    /// a terminal status are ignored.
    pub fn apply_event(&mut self, event: &Event) {
        match event {
            Event::JobCreated { id, name, notify_log_content, created_at_ms } => {
                self.jobs.entry(*id).or_insert_with(|| Job {
                    id: *id,
                    name: name.clone(),
                    notify_log_content: *notify_log_content,
                    created_at_ms: *created_at_ms,
                });
            }

            Event::JobUpdated { id, name, notify_log_content } => {
                if let Some(job) = self.jobs.get_mut(id) {
                    job.name = name.clone();
                    job.notify_log_content = *notify_log_content;
                }
            }

            Event::RunStarted { id, job_id, start_time_ms, log_file, exec_log_file } => {
                self.runs.entry(*id).or_insert_with(|| Run {
                    id: *id,
                    job_id: *job_id,
                    start_time_ms: *start_time_ms,
                    end_time_ms: None,
                    log_file: Some(log_file.clone()),
                    exec_log_file: exec_log_file.clone(),
                    pid: None,
                    status: RunStatus::Running,
                });
            }

            Event::RunSkipped { id, job_id, time_ms, exec_log_file } => {
                self.runs.entry(*id).or_insert_with(|| Run {
                    id: *id,
                    job_id: *job_id,
                    start_time_ms: *time_ms,
                    end_time_ms: None,
                    log_file: None,
                    exec_log_file: exec_log_file.clone(),
                    pid: None,
                    status: RunStatus::Skipped,
                });
            }

            Event::RunPidRecorded { id, pid } => {
                if let Some(run) = self.runs.get_mut(id).filter(|r| r.status == RunStatus::Running) {
                    run.pid = Some(*pid);
                }
            }

            Event::RunFinalized { id, status, end_time_ms } => {
                if !status.is_terminal() || *status == RunStatus::Skipped {
                    return;
                }
                if let Some(run) = self.runs.get_mut(id).filter(|r| r.status == RunStatus::Running) {
                    run.status = *status;
                    run.end_time_ms = Some(*end_time_ms);
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
