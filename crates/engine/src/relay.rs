// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Termination-signal relay for the wait on a child process.

use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use tokio::signal::unix::{signal, SignalKind};

/// Listens for SIGTERM, SIGINT and SIGHUP delivered to this process.
///
/// Installing the relay replaces the default "terminate" disposition for
/// those signals for the rest of the process, so the wrapper survives long
/// enough to record the child's outcome.
pub struct SignalRelay {
    term: tokio::signal::unix::Signal,
    int: tokio::signal::unix::Signal,
    hup: tokio::signal::unix::Signal,
}

impl SignalRelay {
    pub fn install() -> std::io::Result<Self> {
        Ok(Self {
            term: signal(SignalKind::terminate())?,
            int: signal(SignalKind::interrupt())?,
            hup: signal(SignalKind::hangup())?,
        })
    }

    /// Wait for the next signal. Returns its name, or `None` if the
    /// listeners were torn down.
    pub async fn recv(&mut self) -> Option<&'static str> {
        tokio::select! {
            received = self.term.recv() => received.map(|()| "SIGTERM"),
            received = self.int.recv() => received.map(|()| "SIGINT"),
            received = self.hup.recv() => received.map(|()| "SIGHUP"),
        }
    }
}

/// Send SIGTERM to `pid`.
pub fn forward_sigterm(pid: u32) -> Result<(), Errno> {
    let raw = i32::try_from(pid).map_err(|_| Errno::EINVAL)?;
    kill(Pid::from_raw(raw), Signal::SIGTERM)
}

#[cfg(test)]
#[path = "relay_tests.rs"]
mod tests;
