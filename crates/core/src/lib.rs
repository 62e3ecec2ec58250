// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! cw-core: Core types for the Cron Warden (cw) CLI tool

pub mod macros;

pub mod clock;
pub mod crontab;
pub mod event;
pub mod id;
pub mod job;
pub mod run;
pub mod time_fmt;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use clock::{Clock, FakeClock, SystemClock};
pub use crontab::{parse_crontab, CrontabEntry, CrontabError, CrontabScan};
pub use event::Event;
pub use id::ParseIdError;
pub use job::{validate_job_name, Job, JobId, JobNameError, MAX_JOB_NAME_LEN};
pub use run::{Run, RunId, RunStatus, UnknownStatus};
pub use time_fmt::{format_duration_ms, format_elapsed, format_epoch_ms, format_utc_compact};
