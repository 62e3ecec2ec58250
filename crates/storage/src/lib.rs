// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Storage layer for Cron Warden
//!
//! Jobs and runs are derived from an append-only event log shared by every
//! `cw` process on the host. Writers serialize through an exclusive lock on
//! the log file; readers take a shared lock and catch up on what was
//! appended since their last look. Past a threshold the log is folded into a
//! snapshot and truncated.

mod file_store;
mod snapshot;
mod state;
mod store;
mod wal;

pub use file_store::{FileStore, WAL_FILE_NAME};
pub use snapshot::SnapshotError;
pub use state::MaterializedState;
pub use store::{RunStore, StoreError};
pub use wal::WalError;
