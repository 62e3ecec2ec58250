// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `cw job` - Job management commands

use std::io::Write;

use anyhow::Result;
use clap::{Args, Subcommand};
use cw_engine::{update_job, UpdateJobError};
use cw_storage::{RunStore, StoreError};

use crate::config::Config;
use crate::exit_error::ExitError;
use crate::output::{format_or_json, handle_list_with_limit, JobView, OutputFormat};
use crate::table::{Column, Table};

#[derive(Args)]
pub struct JobArgs {
    #[command(subcommand)]
    pub command: JobCommand,
}

#[derive(Subcommand)]
pub enum JobCommand {
    /// Create a job ahead of its first exec
    Add {
        #[arg(long)]
        name: String,
        /// Embed the run's log output in notifications
        #[arg(long)]
        notify_log: bool,
    },
    /// Rename a job or change its notification setting
    Update {
        #[arg(long)]
        name: String,
        #[arg(long)]
        new_name: Option<String>,
        /// Embed the run's log output in notifications (true or false)
        #[arg(long, value_name = "BOOL", num_args = 0..=1, default_missing_value = "true")]
        notify_log: Option<bool>,
    },
    /// List jobs
    List {},
}

pub fn handle<S: RunStore>(
    command: JobCommand,
    store: &S,
    config: &Config,
    format: OutputFormat,
    out: &mut impl Write,
) -> Result<()> {
    match command {
        JobCommand::Add { name, notify_log } => {
            super::require_job_name(&name)?;
            let job = store.add_job(&name, notify_log).map_err(exists_is_usage)?;
            tracing::info!(job_id = %job.id, job = %job.name, "job added");
            let view = JobView::new(&job, config.local_time);
            format_or_json(out, format, &view, |w| writeln!(w, "Job '{}' added (id {})", view.name, view.id))
        }
        JobCommand::Update { name, new_name, notify_log } => {
            if new_name.is_none() && notify_log.is_none() {
                return Err(ExitError::usage("nothing to update (use --new-name and/or --notify-log)").into());
            }
            if let Some(new_name) = &new_name {
                super::require_job_name(new_name)?;
            }
            let job = update_job(store, &config.lock_dir, &name, new_name.as_deref(), notify_log).map_err(|e| match e {
                UpdateJobError::Store(err) => exists_is_usage(err),
                running @ UpdateJobError::Running(_) => ExitError::new(1, running.to_string()).into(),
            })?;
            tracing::info!(job_id = %job.id, job = %job.name, "job updated");
            let view = JobView::new(&job, config.local_time);
            format_or_json(out, format, &view, |w| {
                writeln!(w, "Job '{}' updated (notify log content: {})", view.name, view.notify_log_content)
            })
        }
        JobCommand::List {} => {
            let views: Vec<JobView> =
                store.list_jobs()?.iter().map(|job| JobView::new(job, config.local_time)).collect();
            handle_list_with_limit(out, format, &views, "No jobs found", None, |views, w| {
                let mut table = Table::new(vec![
                    Column::muted("ID"),
                    Column::left("NAME").with_max(40),
                    Column::left("NOTIFY LOG"),
                    Column::left("CREATED"),
                ]);
                for view in views {
                    table.row(vec![
                        view.id.to_string(),
                        view.name.clone(),
                        if view.notify_log_content { "yes" } else { "no" }.to_string(),
                        view.created_at.clone(),
                    ]);
                }
                table.render(w);
            })
        }
    }
}

/// Name conflicts and invalid names exit with the usage code.
fn exists_is_usage(err: StoreError) -> anyhow::Error {
    match err {
        StoreError::JobExists(_) | StoreError::InvalidName(_) => ExitError::usage(err.to_string()).into(),
        other => other.into(),
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
