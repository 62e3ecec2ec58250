// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Follow a run's output log until the run finishes.

use cw_core::RunId;
use cw_storage::{RunStore, StoreError};
use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom, Write};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug, Error)]
pub enum TailError {
    #[error("run not found: {0}")]
    RunNotFound(RunId),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("cannot write output: {0}")]
    Output(#[source] std::io::Error),
}

pub struct LogTailer<S> {
    store: S,
    poll_interval: Duration,
}

impl<S: RunStore> LogTailer<S> {
    pub fn new(store: S, poll_interval: Duration) -> Self {
        Self { store, poll_interval }
    }

    /// Copy the run's log to `out` line by line, following appends, until
    /// the run is terminal.
    ///
    /// Returns immediately when the run has no log or the log cannot be
    /// opened. A trailing line without a newline is held back until its
    /// newline arrives. If the file shrinks below the read offset it was
    /// truncated, and reading restarts from the beginning.
    pub async fn watch<W: Write>(&self, run_id: RunId, out: &mut W) -> Result<(), TailError> {
        let run = self.store.get_run(run_id)?.ok_or(TailError::RunNotFound(run_id))?;
        let Some(path) = run.log_file.filter(|p| !p.as_os_str().is_empty()) else {
            debug!(run_id = %run_id, "run has no log file");
            return Ok(());
        };
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) => {
                debug!(run_id = %run_id, path = %path.display(), error = %e, "cannot open log");
                return Ok(());
            }
        };

        let mut reader = BufReader::new(file);
        let mut partial = Vec::new();
        loop {
            if !drain(&mut reader, &mut partial, out)? {
                return Ok(());
            }

            tokio::time::sleep(self.poll_interval).await;

            match truncated(&mut reader) {
                Ok(true) => {
                    debug!(run_id = %run_id, "log truncated; restarting from the beginning");
                    if reader.seek(SeekFrom::Start(0)).is_err() {
                        return Ok(());
                    }
                    partial.clear();
                }
                Ok(false) => {}
                Err(e) => {
                    debug!(run_id = %run_id, error = %e, "cannot stat log; stopping");
                    return Ok(());
                }
            }

            match self.store.is_run_finished(run_id) {
                Ok(true) => {
                    drain(&mut reader, &mut partial, out)?;
                    return Ok(());
                }
                Ok(false) => {}
                Err(e) => warn!(run_id = %run_id, error = %e, "cannot check run status; still watching"),
            }
        }
    }
}

/// Emit every complete line available. Returns false if reading failed.
fn drain<R: BufRead, W: Write>(reader: &mut R, partial: &mut Vec<u8>, out: &mut W) -> Result<bool, TailError> {
    loop {
        match reader.read_until(b'\n', partial) {
            Ok(0) => break,
            Ok(_) => {
                if partial.last() == Some(&b'\n') {
                    out.write_all(partial).map_err(TailError::Output)?;
                    partial.clear();
                }
            }
            Err(e) => {
                debug!(error = %e, "log read failed; stopping");
                return Ok(false);
            }
        }
    }
    out.flush().map_err(TailError::Output)?;
    Ok(true)
}

fn truncated(reader: &mut BufReader<File>) -> std::io::Result<bool> {
    let offset = reader.stream_position()?;
    let len = reader.get_ref().metadata()?.len();
    Ok(offset > len)
}

#[cfg(test)]
#[path = "tailer_tests.rs"]
mod tests;
