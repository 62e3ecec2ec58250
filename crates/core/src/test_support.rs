// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test builders and proptest strategies, shared with other crates through
//! the `test-support` feature.

use crate::event::Event;
use crate::job::{Job, JobId};
use crate::run::{Run, RunId, RunStatus};
use proptest::prelude::*;
use std::path::PathBuf;

/// Build a [`Job`] with sensible defaults.
pub fn job(id: u64, name: &str) -> Job {
    Job { id: JobId::new(id), name: name.to_string(), notify_log_content: false, created_at_ms: 0 }
}

/// Builder for [`Run`] records in either lifecycle branch.
pub struct RunBuilder {
    run: Run,
}

impl RunBuilder {
    /// A run that acquired its lock and is executing.
    pub fn running(id: u64) -> Self {
        Self {
            run: Run {
                id: RunId::new(id),
                job_id: JobId::new(1),
                start_time_ms: 1_000_000,
                end_time_ms: None,
                log_file: Some(PathBuf::from(format!("/tmp/cw-test/run-{id}.log"))),
                exec_log_file: PathBuf::from("/tmp/cw-test/exec.jsonl"),
                pid: Some(4242),
                status: RunStatus::Running,
            },
        }
    }

    /// A run that found the lock busy.
    pub fn skipped(id: u64) -> Self {
        let mut builder = Self::running(id);
        builder.run.log_file = None;
        builder.run.pid = None;
        builder.run.status = RunStatus::Skipped;
        builder
    }

    pub fn job_id(mut self, job_id: u64) -> Self {
        self.run.job_id = JobId::new(job_id);
        self
    }

    pub fn start_time_ms(mut self, ms: u64) -> Self {
        self.run.start_time_ms = ms;
        self
    }

    pub fn log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.run.log_file = Some(path.into());
        self
    }

    pub fn pid(mut self, pid: Option<u32>) -> Self {
        self.run.pid = pid;
        self
    }

    pub fn finished(mut self, status: RunStatus, end_time_ms: u64) -> Self {
        self.run.status = status;
        self.run.end_time_ms = Some(end_time_ms);
        self
    }

    pub fn build(self) -> Run {
        self.run
    }
}

pub fn arb_run_status() -> impl Strategy<Value = RunStatus> {
    prop::sample::select(RunStatus::ALL.to_vec())
}

pub fn arb_terminal_status() -> impl Strategy<Value = RunStatus> {
    prop::sample::select(vec![RunStatus::Succeeded, RunStatus::Failed, RunStatus::Terminated])
}

/// Arbitrary store event over a small id space, so generated sequences
/// reference each other.
pub fn arb_event() -> impl Strategy<Value = Event> {
    let id = 1u64..5;
    prop_oneof![
        (id.clone(), "[a-z]{1,8}", any::<bool>()).prop_map(|(id, name, flag)| Event::JobCreated {
            id: JobId::new(id),
            name,
            notify_log_content: flag,
            created_at_ms: 1_000,
        }),
        (id.clone(), "[a-z]{1,8}", any::<bool>()).prop_map(|(id, name, flag)| Event::JobUpdated {
            id: JobId::new(id),
            name,
            notify_log_content: flag,
        }),
        (id.clone(), id.clone(), 0u64..10_000).prop_map(|(id, job, t)| Event::RunStarted {
            id: RunId::new(id),
            job_id: JobId::new(job),
            start_time_ms: t,
            log_file: PathBuf::from(format!("/logs/{id}.log")),
            exec_log_file: PathBuf::from("/logs/exec.jsonl"),
        }),
        (id.clone(), id.clone(), 0u64..10_000).prop_map(|(id, job, t)| Event::RunSkipped {
            id: RunId::new(id),
            job_id: JobId::new(job),
            time_ms: t,
            exec_log_file: PathBuf::from("/logs/exec.jsonl"),
        }),
        (id.clone(), 1u32..65_000)
            .prop_map(|(id, pid)| Event::RunPidRecorded { id: RunId::new(id), pid }),
        (id, arb_terminal_status(), 10_000u64..20_000).prop_map(|(id, status, t)| {
            Event::RunFinalized { id: RunId::new(id), status, end_time_ms: t }
        }),
    ]
}
