// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `cw exec`: run a command once as an invocation of a named job.

use anyhow::Result;
use clap::Args;
use cw_core::{Clock, SystemClock};
use cw_engine::{ExecConfig, ExecEventLog, ExecRequest, RunExecutor};
use std::io::Write;

use crate::config::Config;
use crate::exit_error::ExitError;
use crate::output::RunView;

#[derive(Args, Debug)]
pub struct ExecArgs {
    /// Job name; the job is created on first use
    #[arg(long)]
    pub name: String,
    /// Send a notification when the run finishes or is skipped
    #[arg(long)]
    pub notify: bool,
    /// Command passed to `/bin/sh -c` (words are joined with spaces)
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}

impl ExecArgs {
    fn request(&self) -> Result<ExecRequest> {
        super::require_job_name(&self.name)?;
        let command = self.command.join(" ");
        if command.trim().is_empty() {
            return Err(ExitError::usage("no command given (usage: cw exec --name <job> -- <command...>)").into());
        }
        Ok(ExecRequest { job_name: self.name.clone(), command, notify: self.notify })
    }
}

/// Run the command and print the finished run as JSON.
///
/// The child's outcome never changes the exit code; only failures before a
/// run record exists do.
pub async fn handle(args: ExecArgs, config: &Config, out: &mut impl Write) -> Result<()> {
    let request = args.request()?;
    let store = super::open_store(config)?;
    let notifier = config.notifier(request.notify).map_err(|e| ExitError::usage(e.to_string()))?;

    let clock = SystemClock;
    let events = ExecEventLog::create(&config.log_dir, clock.epoch_ms());
    let exec_config = ExecConfig::new(config.log_dir.clone(), config.lock_dir.clone(), hostname(config));
    let executor = RunExecutor::new(store, notifier, clock, exec_config, events);

    let run = executor.execute(&request).await.map_err(|e| ExitError::new(1, e.to_string()))?;

    let view = RunView::new(&run, &request.job_name, config.local_time);
    writeln!(out, "{}", serde_json::to_string_pretty(&view)?)?;
    Ok(())
}

/// Configured hostname, else the system's.
fn hostname(config: &Config) -> String {
    if !config.notify.hostname.is_empty() {
        return config.notify.hostname.clone();
    }
    nix::unistd::gethostname().ok().and_then(|h| h.into_string().ok()).unwrap_or_default()
}

#[cfg(test)]
#[path = "exec_tests.rs"]
mod tests;
