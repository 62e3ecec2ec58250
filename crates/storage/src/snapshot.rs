// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Snapshots of the materialized state, used to compact the WAL.
//!
//! A snapshot stores the complete state as of WAL sequence `seq` and is named
//! `store-<seq>.snapshot` in the state directory. Loading takes the newest
//! snapshot and replays WAL entries after its sequence. Sequences only grow,
//! so the newest name also tells readers whether the WAL was compacted since
//! they last looked.

use crate::state::MaterializedState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Current snapshot schema version
pub const CURRENT_SNAPSHOT_VERSION: u32 = 1;

const PREFIX: &str = "store-";
const SUFFIX: &str = ".snapshot";

/// Errors that can occur in snapshot operations
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported snapshot version {0}")]
    Version(u32),
}

/// A snapshot of the materialized state at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Schema version for migrations
    #[serde(rename = "v")]
    pub version: u32,
    /// WAL sequence number at the time of snapshot
    pub seq: u64,
    /// The complete materialized state
    pub state: MaterializedState,
    /// When this snapshot was created
    pub created_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn new(seq: u64, state: MaterializedState) -> Self {
        Self { version: CURRENT_SNAPSHOT_VERSION, seq, state, created_at: Utc::now() }
    }

    pub fn load(path: &Path) -> Result<Self, SnapshotError> {
        let snapshot: Self = serde_json::from_reader(BufReader::new(File::open(path)?))?;
        if snapshot.version != CURRENT_SNAPSHOT_VERSION {
            return Err(SnapshotError::Version(snapshot.version));
        }
        Ok(snapshot)
    }

    /// Write into `dir` through a temp file and rename, so readers never see
    /// a partial snapshot. Returns the final path.
    pub fn save(&self, dir: &Path) -> Result<PathBuf, SnapshotError> {
        let path = snapshot_path(dir, self.seq);
        let tmp = path.with_extension("tmp");
        let mut writer = BufWriter::new(File::create(&tmp)?);
        serde_json::to_writer(&mut writer, self)?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
        fs::rename(&tmp, &path)?;
        Ok(path)
    }
}

pub fn snapshot_path(dir: &Path, seq: u64) -> PathBuf {
    dir.join(format!("{PREFIX}{seq}{SUFFIX}"))
}

/// Sequence and path of the newest snapshot in `dir`, if any.
pub fn latest(dir: &Path) -> Result<Option<(u64, PathBuf)>, SnapshotError> {
    Ok(list(dir)?.into_iter().max_by_key(|(seq, _)| *seq))
}

/// Remove snapshots older than `keep_seq`. Failures are only logged.
pub fn prune(dir: &Path, keep_seq: u64) {
    let Ok(snapshots) = list(dir) else { return };
    for (seq, path) in snapshots.into_iter().filter(|(seq, _)| *seq < keep_seq) {
        if let Err(e) = fs::remove_file(&path) {
            debug!(seq, path = %path.display(), error = %e, "could not remove old snapshot");
        }
    }
}

fn list(dir: &Path) -> Result<Vec<(u64, PathBuf)>, SnapshotError> {
    let mut found = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let seq = name
            .to_str()
            .and_then(|n| n.strip_prefix(PREFIX))
            .and_then(|n| n.strip_suffix(SUFFIX))
            .and_then(|n| n.parse::<u64>().ok());
        if let Some(seq) = seq {
            found.push((seq, entry.path()));
        }
    }
    Ok(found)
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
