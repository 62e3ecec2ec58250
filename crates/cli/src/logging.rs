// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Diagnostic logging to stderr.
//!
//! Level priority: `-v` flag, then the `CW_LOG` filter directive
//! (e.g. `debug` or `cw_engine=trace`), then `warn`. Stdout is reserved for
//! command output.

use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "CW_LOG";

/// Build the filter for the given verbosity.
pub fn filter(verbose: bool, env_directive: Option<&str>) -> EnvFilter {
    if verbose {
        return EnvFilter::new("debug");
    }
    env_directive
        .filter(|d| !d.trim().is_empty())
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new("warn"))
}

/// Install the global subscriber. A second call is a no-op.
pub fn init(verbose: bool) {
    let directive = std::env::var(LOG_ENV).ok();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter(verbose, directive.as_deref()))
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init();
}

#[cfg(test)]
#[path = "logging_tests.rs"]
mod tests;
