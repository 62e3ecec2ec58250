// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI command implementations

pub mod cron;
pub mod exec;
pub mod job;
pub mod run;

use crate::config::Config;
use crate::exit_error::ExitError;
use cw_core::{validate_job_name, SystemClock};
use cw_storage::FileStore;

/// Create the configured directories and open the store.
pub(crate) fn open_store(config: &Config) -> anyhow::Result<FileStore> {
    config.ensure_dirs().map_err(|e| ExitError::usage(e.to_string()))?;
    let store = FileStore::open(&config.state_dir, SystemClock)
        .map_err(|e| ExitError::new(1, format!("cannot open store in {}: {e}", config.state_dir.display())))?;
    Ok(store)
}

/// Reject a malformed job name as a usage error.
pub(crate) fn require_job_name(name: &str) -> anyhow::Result<()> {
    validate_job_name(name).map_err(|e| ExitError::usage(e.to_string()))?;
    Ok(())
}
