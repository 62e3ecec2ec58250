// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run command handlers

use anyhow::{anyhow, bail, Result};
use clap::{Args, Subcommand};
use cw_core::{format_duration_ms, format_epoch_ms, Clock, JobId, Run, RunId, RunStatus, SystemClock};
use cw_engine::{forward_sigterm, ExecEventLog, ExecLogLine, LogTailer};
use cw_storage::RunStore;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::{BufRead, Write};

use crate::config::Config;
use crate::output::{apply_limit, format_or_json, handle_list_with_limit, OutputFormat, RunView};
use crate::table::{Column, Table};

#[derive(Args)]
pub struct RunArgs {
    #[command(subcommand)]
    pub command: RunCommand,
}

#[derive(Subcommand)]
pub enum RunCommand {
    /// List runs, newest first
    List {
        /// Only runs of this job
        #[arg(long)]
        job: Option<String>,
        /// Only runs with this status
        #[arg(long)]
        status: Option<RunStatus>,
        /// Maximum number of runs to show
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
        /// Show all runs
        #[arg(long, conflicts_with = "limit")]
        no_limit: bool,
    },
    /// Show a run and its exec events
    Show {
        #[arg(short = 'r', long = "run-id")]
        run_id: RunId,
    },
    /// Stream a run's output until it finishes
    Watch {
        #[arg(short = 'r', long = "run-id")]
        run_id: RunId,
    },
    /// Send SIGTERM to a running run's process
    Kill {
        #[arg(short = 'r', long = "run-id")]
        run_id: RunId,
        /// Skip the confirmation prompt
        #[arg(long)]
        force: bool,
    },
    /// Mark a running run Terminated without touching its process
    ///
    /// For runs left Running after their wrapper was SIGKILLed.
    Term {
        #[arg(short = 'r', long = "run-id")]
        run_id: RunId,
    },
}

pub async fn handle<S: RunStore>(
    command: RunCommand,
    store: S,
    config: &Config,
    format: OutputFormat,
    out: &mut impl Write,
) -> Result<()> {
    match command {
        RunCommand::List { job, status, limit, no_limit } => {
            list(&store, config, format, RunFilter { job, status, limit, no_limit }, out)
        }
        RunCommand::Show { run_id } => show(&store, config, format, run_id, out),
        RunCommand::Watch { run_id } => {
            LogTailer::new(store, config.watch_poll).watch(run_id, out).await?;
            Ok(())
        }
        RunCommand::Kill { run_id, force } => kill(&store, run_id, force, out, confirm_on_stdin),
        RunCommand::Term { run_id } => term(&store, config, format, run_id, out),
    }
}

pub(crate) struct RunFilter {
    pub job: Option<String>,
    pub status: Option<RunStatus>,
    pub limit: usize,
    pub no_limit: bool,
}

pub(crate) fn list<S: RunStore>(
    store: &S,
    config: &Config,
    format: OutputFormat,
    filter: RunFilter,
    out: &mut impl Write,
) -> Result<()> {
    let names: BTreeMap<JobId, String> = store.list_jobs()?.into_iter().map(|job| (job.id, job.name)).collect();
    let job_id = match &filter.job {
        Some(name) => Some(store.get_job(name)?.ok_or_else(|| anyhow!("job not found: {name}"))?.id),
        None => None,
    };

    let mut runs: Vec<Run> = store
        .list_runs()?
        .into_iter()
        .filter(|run| job_id.is_none_or(|id| run.job_id == id))
        .filter(|run| filter.status.is_none_or(|status| run.status == status))
        .collect();
    let truncation = apply_limit(&mut runs, filter.limit, filter.no_limit);

    let views: Vec<RunView> =
        runs.iter().map(|run| RunView::new(run, job_name(&names, run.job_id), config.local_time)).collect();
    handle_list_with_limit(out, format, &views, "No runs found", truncation, |views, w| {
        let mut table = Table::new(vec![
            Column::muted("ID"),
            Column::left("JOB").with_max(32),
            Column::status("STATUS"),
            Column::left("STARTED"),
            Column::left("DURATION"),
            Column::muted("PID"),
        ]);
        for view in views {
            table.row(vec![
                view.id.to_string(),
                view.job.clone(),
                view.status.clone(),
                view.start_time.clone(),
                view.duration.clone().unwrap_or_else(|| "-".to_string()),
                view.pid.map_or_else(|| "-".to_string(), |pid| pid.to_string()),
            ]);
        }
        table.render(w);
    })
}

fn job_name(names: &BTreeMap<JobId, String>, id: JobId) -> &str {
    names.get(&id).map_or("-", String::as_str)
}

/// `run show` payload: the run plus whatever its exec event log holds.
#[derive(Debug, Serialize)]
struct RunDetail {
    #[serde(flatten)]
    run: RunView,
    events: Vec<ExecLogLine>,
}

pub(crate) fn show<S: RunStore>(
    store: &S,
    config: &Config,
    format: OutputFormat,
    run_id: RunId,
    out: &mut impl Write,
) -> Result<()> {
    let (run, name) = find_run(store, run_id)?;
    let events = match ExecEventLog::read(&run.exec_log_file) {
        Ok(events) => events,
        Err(e) => {
            tracing::debug!(path = %run.exec_log_file.display(), error = %e, "cannot read exec log");
            Vec::new()
        }
    };
    let detail = RunDetail { run: RunView::new(&run, &name, config.local_time), events };

    format_or_json(out, format, &detail, |w| {
        let view = &detail.run;
        writeln!(w, "Run {} ({})", view.id, crate::color::header(&view.job))?;
        writeln!(w, "  Status:   {} {}", run.status.emoji(), crate::color::status(&view.status))?;
        writeln!(w, "  Started:  {}", view.start_time)?;
        if let Some(end) = &view.end_time {
            writeln!(w, "  Ended:    {}", end)?;
        }
        if let Some(duration) = &view.duration {
            writeln!(w, "  Duration: {}", duration)?;
        }
        if let Some(pid) = view.pid {
            writeln!(w, "  PID:      {}", pid)?;
        }
        let log = if view.log_file.is_empty() { "-" } else { view.log_file.as_str() };
        writeln!(w, "  Log:      {}", log)?;
        writeln!(w, "  Exec log: {}", view.exec_log_file)?;
        if !detail.events.is_empty() {
            writeln!(w, "\nEvents:")?;
            for line in &detail.events {
                let event = serde_json::to_value(&line.event).unwrap_or_default();
                let kind = event.get("event").and_then(|v| v.as_str()).unwrap_or("?");
                writeln!(w, "  {}  {}", crate::color::muted(&line.ts), kind)?;
            }
        }
        Ok(())
    })
}

pub(crate) fn kill<S: RunStore>(
    store: &S,
    run_id: RunId,
    force: bool,
    out: &mut impl Write,
    confirm: impl FnOnce(&str) -> std::io::Result<bool>,
) -> Result<()> {
    let (run, name) = find_run(store, run_id)?;
    if run.status != RunStatus::Running {
        bail!("run {} is {}; only running runs can be killed", run_id, run.status);
    }
    let Some(pid) = run.pid else {
        bail!("run {} has no recorded pid", run_id);
    };

    let question = format!("Send SIGTERM to run {} (job {}, pid {})? Ensure the pid is as expected.", run_id, name, pid);
    if !force && !confirm(&question)? {
        writeln!(out, "Cancelled")?;
        return Ok(());
    }
    forward_sigterm(pid).map_err(|errno| anyhow!("cannot signal pid {pid}: {errno}"))?;
    tracing::info!(run_id = %run_id, job = %name, pid, "sent SIGTERM");
    writeln!(out, "Sent SIGTERM to run {} (job {}, pid {})", run_id, name, pid)?;
    Ok(())
}

fn confirm_on_stdin(question: &str) -> std::io::Result<bool> {
    eprint!("{} (y/n) ", question);
    std::io::stderr().flush()?;
    read_yes(&mut std::io::stdin().lock())
}

/// Read one answer line; only `y` or `yes` confirm.
fn read_yes(input: &mut impl BufRead) -> std::io::Result<bool> {
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    let answer = answer.trim().to_ascii_lowercase();
    Ok(answer == "y" || answer == "yes")
}

pub(crate) fn term<S: RunStore>(
    store: &S,
    config: &Config,
    format: OutputFormat,
    run_id: RunId,
    out: &mut impl Write,
) -> Result<()> {
    let (run, name) = find_run(store, run_id)?;
    if run.status != RunStatus::Running {
        bail!("run {} is {}; only running runs can be terminated", run_id, run.status);
    }
    store.finalize_run(run_id, RunStatus::Terminated, SystemClock.epoch_ms())?;
    tracing::info!(run_id = %run_id, job = %name, "run manually terminated");

    let (run, name) = find_run(store, run_id)?;
    let view = RunView::new(&run, &name, config.local_time);
    format_or_json(out, format, &view, |w| {
        writeln!(
            w,
            "Run {} ({}) marked {} after {}",
            view.id,
            view.job,
            view.status,
            run.duration_ms().map_or_else(|| "-".to_string(), format_duration_ms)
        )?;
        writeln!(w, "  Ended: {}", format_epoch_ms(run.end_time_ms.unwrap_or_default(), config.local_time))
    })
}

fn find_run<S: RunStore>(store: &S, run_id: RunId) -> Result<(Run, String)> {
    let run = store.get_run(run_id)?.ok_or_else(|| anyhow!("run not found: {run_id}"))?;
    let name = store.get_job_by_id(run.job_id)?.map_or_else(|| "-".to_string(), |job| job.name);
    Ok((run, name))
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
