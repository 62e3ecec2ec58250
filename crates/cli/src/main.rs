// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! cw - Cron Warden
//!
//! Wraps scheduled commands: one run record per invocation, at most one
//! running instance per job, and a log of everything the job printed.

mod color;
mod commands;
mod config;
mod exit_error;
mod logging;
mod output;
mod table;

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{cron, exec, job, run};
use config::Config;
use exit_error::ExitError;
use output::OutputFormat;

#[derive(Parser)]
#[command(name = "cw", version, about = "Run and track scheduled jobs", styles = color::styles())]
struct Cli {
    /// Output format for list and show commands
    #[arg(short = 'o', long = "output", global = true, value_enum, default_value_t)]
    output: OutputFormat,

    /// Debug logging on stderr
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a command as one invocation of a job
    Exec(exec::ExecArgs),
    /// Inspect and manage runs
    Run(run::RunArgs),
    /// Manage jobs
    Job(job::JobArgs),
    /// Inspect crontab entries
    Cron(cron::CronArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("error: cannot start runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(dispatch(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => report(err),
    }
}

async fn dispatch(cli: Cli) -> Result<()> {
    let config = Config::load().map_err(|e| ExitError::usage(e.to_string()))?;
    let mut stdout = std::io::stdout();

    match cli.command {
        Commands::Exec(args) => exec::handle(args, &config, &mut stdout).await,
        Commands::Run(args) => {
            let store = commands::open_store(&config)?;
            run::handle(args.command, store, &config, cli.output, &mut stdout).await
        }
        Commands::Job(args) => {
            let store = commands::open_store(&config)?;
            job::handle(args.command, &store, &config, cli.output, &mut stdout)
        }
        Commands::Cron(args) => {
            let store = commands::open_store(&config)?;
            cron::handle(args.command, &store, cli.output, &mut stdout)
        }
    }
}

fn report(err: anyhow::Error) -> ExitCode {
    if let Some(exit) = err.downcast_ref::<ExitError>() {
        if !exit.message.is_empty() {
            eprintln!("error: {}", exit.message);
        }
        return ExitCode::from(u8::try_from(exit.code).unwrap_or(1));
    }
    eprintln!("error: {err:#}");
    ExitCode::FAILURE
}
