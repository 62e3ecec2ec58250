// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cron command handlers

use std::io::Write;
use std::process::Command;

use anyhow::{anyhow, Context as _, Result};
use clap::{Args, Subcommand};
use cw_core::parse_crontab;
use cw_storage::RunStore;
use serde::Serialize;

use crate::output::{handle_list_with_limit, OutputFormat};
use crate::table::{Column, Table};

/// Program name matched in crontab lines.
const PROGRAM: &str = "cw";

#[derive(Args)]
pub struct CronArgs {
    #[command(subcommand)]
    pub command: CronCommand,
}

#[derive(Subcommand)]
pub enum CronCommand {
    /// List crontab entries that run jobs through `cw exec`
    List {},
}

#[derive(Debug, Serialize)]
struct CronView {
    name: String,
    schedule: String,
    /// Id of the job with this name, if it exists yet
    job_id: Option<u64>,
    line_no: usize,
    line: String,
}

pub fn handle<S: RunStore>(command: CronCommand, store: &S, format: OutputFormat, out: &mut impl Write) -> Result<()> {
    match command {
        CronCommand::List {} => list(&read_crontab()?, store, format, out),
    }
}

/// Current user's crontab. A user without one has an empty crontab.
fn read_crontab() -> Result<String> {
    let output = Command::new("crontab").arg("-l").output().context("cannot run `crontab -l`")?;
    if output.status.success() {
        return Ok(String::from_utf8_lossy(&output.stdout).into_owned());
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    if stderr.to_ascii_lowercase().contains("no crontab") {
        return Ok(String::new());
    }
    Err(anyhow!("`crontab -l` failed: {}", stderr.trim()))
}

pub(crate) fn list<S: RunStore>(crontab: &str, store: &S, format: OutputFormat, out: &mut impl Write) -> Result<()> {
    let scan = parse_crontab(crontab, PROGRAM)?;
    for problem in &scan.problems {
        tracing::warn!("{problem}");
    }

    let mut views = Vec::with_capacity(scan.entries.len());
    for entry in scan.entries {
        let job_id = store.get_job(&entry.name)?.map(|job| job.id.get());
        views.push(CronView {
            name: entry.name,
            schedule: entry.schedule,
            job_id,
            line_no: entry.line_no,
            line: entry.line,
        });
    }

    handle_list_with_limit(out, format, &views, "No cw exec entries in crontab", None, |views, w| {
        let mut table = Table::new(vec![
            Column::left("NAME").with_max(32),
            Column::left("SCHEDULE"),
            Column::muted("JOB"),
            Column::muted("LINE"),
        ]);
        for view in views {
            table.row(vec![
                view.name.clone(),
                view.schedule.clone(),
                view.job_id.map_or_else(|| "-".to_string(), |id| id.to_string()),
                view.line_no.to_string(),
            ]);
        }
        table.render(w);
    })
}

#[cfg(test)]
#[path = "cron_tests.rs"]
mod tests;
