// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;

use clap::ValueEnum;
use cw_core::{format_duration_ms, format_epoch_ms, Job, Run};
use serde::Serialize;

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;

#[derive(Clone, Copy, Debug, Default, PartialEq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// A run as printed by `exec`, `run show` and `run list`.
///
/// `log_file` is an empty string for runs that never spawned a process.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunView {
    pub id: u64,
    pub job_id: u64,
    pub job: String,
    pub status: String,
    pub start_time_ms: u64,
    pub end_time_ms: Option<u64>,
    pub start_time: String,
    pub end_time: Option<String>,
    pub duration: Option<String>,
    pub log_file: String,
    pub exec_log_file: String,
    pub pid: Option<u32>,
}

impl RunView {
    pub fn new(run: &Run, job_name: &str, local_time: bool) -> Self {
        Self {
            id: run.id.get(),
            job_id: run.job_id.get(),
            job: job_name.to_string(),
            status: run.status.to_string(),
            start_time_ms: run.start_time_ms,
            end_time_ms: run.end_time_ms,
            start_time: format_epoch_ms(run.start_time_ms, local_time),
            end_time: run.end_time_ms.map(|ms| format_epoch_ms(ms, local_time)),
            duration: run.duration_ms().map(format_duration_ms),
            log_file: run.log_file.as_ref().map(|p| p.display().to_string()).unwrap_or_default(),
            exec_log_file: run.exec_log_file.display().to_string(),
            pid: run.pid,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobView {
    pub id: u64,
    pub name: String,
    pub notify_log_content: bool,
    pub created_at: String,
}

impl JobView {
    pub fn new(job: &Job, local_time: bool) -> Self {
        Self {
            id: job.id.get(),
            name: job.name.clone(),
            notify_log_content: job.notify_log_content,
            created_at: format_epoch_ms(job.created_at_ms, local_time),
        }
    }
}

/// Info about items that were truncated by [`apply_limit`].
pub struct Truncation {
    pub remaining: usize,
}

/// Apply limit/no_limit to a vec, return truncation info if items were removed.
pub fn apply_limit<T>(items: &mut Vec<T>, limit: usize, no_limit: bool) -> Option<Truncation> {
    let total = items.len();
    let effective = if no_limit { total } else { limit };
    if total > effective {
        items.truncate(effective);
        Some(Truncation { remaining: total - effective })
    } else {
        None
    }
}

/// Render a list as text table or JSON, printing a truncation note in text mode.
pub fn handle_list_with_limit<T: Serialize>(
    out: &mut impl Write,
    format: OutputFormat,
    items: &[T],
    empty_msg: &str,
    truncation: Option<Truncation>,
    render_text: impl FnOnce(&[T], &mut dyn Write),
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            writeln!(out, "{}", serde_json::to_string_pretty(items)?)?;
        }
        OutputFormat::Text => {
            if items.is_empty() {
                writeln!(out, "{}", empty_msg)?;
            } else {
                render_text(items, out);
            }
            if let Some(trunc) = truncation {
                if trunc.remaining > 0 {
                    writeln!(out, "\n... {} more not shown. Use --no-limit or -n N to see more.", trunc.remaining)?;
                }
            }
        }
    }
    Ok(())
}

/// Format-branch helper for non-list commands.
///
/// Renders as JSON when `format` is `Json`, otherwise calls `text_fn`.
pub fn format_or_json<T: Serialize>(
    out: &mut impl Write,
    format: OutputFormat,
    data: &T,
    text_fn: impl FnOnce(&mut dyn Write) -> std::io::Result<()>,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            writeln!(out, "{}", serde_json::to_string_pretty(data)?)?;
        }
        OutputFormat::Text => {
            text_fn(out)?;
        }
    }
    Ok(())
}
