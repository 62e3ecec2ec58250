// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Exec engine for Cron Warden
//!
//! Runs one invocation of a job under its per-job lock, relays termination
//! signals to the child, classifies and records the outcome, and follows a
//! run's output log.

pub mod exec_log;
pub mod executor;
pub mod jobs;
pub mod lock;
pub mod log_paths;
pub mod relay;
pub mod tailer;

pub use exec_log::{ExecEvent, ExecEventLog, ExecLogLine};
pub use executor::{ExecConfig, ExecError, ExecRequest, RunExecutor};
pub use jobs::{update_job, UpdateJobError};
pub use lock::{LockAttempt, ProcessLock};
pub use relay::{forward_sigterm, SignalRelay};
pub use tailer::{LogTailer, TailError, DEFAULT_POLL_INTERVAL};
