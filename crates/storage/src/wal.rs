// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Write-ahead log of store events.
//!
//! One JSON object per line: `{"seq":N,"event":{...}}`. The file is shared by
//! every `cw` process on the host. Readers hold a shared `flock` and writers
//! an exclusive one, each for the whole of one store operation.

use cw_core::Event;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// Errors that can occur in WAL operations
#[derive(Debug, Error)]
pub enum WalError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalEntry {
    pub seq: u64,
    pub event: Event,
}

const MAX_BAK_FILES: u32 = 3;

pub(crate) struct Wal {
    path: PathBuf,
}

/// Entries read from some offset to the end of the valid prefix.
#[derive(Debug)]
pub(crate) struct WalTail {
    pub entries: Vec<WalEntry>,
    /// Byte offset just past the last valid line
    pub end: u64,
    /// A torn or unparseable line stopped the read
    pub corrupt: bool,
}

impl Wal {
    /// Open (creating if needed) the log at `path`.
    pub fn open(path: &Path) -> Result<Self, WalError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self { path: path.to_path_buf() })
    }

    pub fn lock_shared(&self) -> Result<WalLock<'_>, WalError> {
        let file = File::open(&self.path)?;
        FileExt::lock_shared(&file)?;
        Ok(WalLock { wal: self, file })
    }

    pub fn lock_exclusive(&self) -> Result<WalLock<'_>, WalError> {
        let file = OpenOptions::new().read(true).append(true).open(&self.path)?;
        FileExt::lock_exclusive(&file)?;
        Ok(WalLock { wal: self, file })
    }
}

/// The WAL opened under a `flock`. Unlocks on drop.
///
/// Only handles from [`Wal::lock_exclusive`] may write.
pub(crate) struct WalLock<'a> {
    wal: &'a Wal,
    file: File,
}

impl WalLock<'_> {
    pub fn size(&self) -> Result<u64, WalError> {
        Ok(self.file.metadata()?.len())
    }

    /// Valid entries starting at byte `offset`, which must be a line start.
    pub fn read_from(&mut self, offset: u64) -> Result<WalTail, WalError> {
        self.file.seek(SeekFrom::Start(offset))?;
        let mut bytes = Vec::new();
        self.file.read_to_end(&mut bytes)?;

        let mut tail = WalTail { entries: Vec::new(), end: offset, corrupt: false };
        for line in bytes.split_inclusive(|b| *b == b'\n') {
            let Some(body) = line.strip_suffix(b"\n") else {
                // Torn write: the writer always ends an entry with a newline
                tail.corrupt = true;
                break;
            };
            if body.iter().all(u8::is_ascii_whitespace) {
                tail.end += line.len() as u64;
                continue;
            }
            match serde_json::from_slice::<WalEntry>(body) {
                Ok(entry) => {
                    tail.entries.push(entry);
                    tail.end += line.len() as u64;
                }
                Err(_) => {
                    tail.corrupt = true;
                    break;
                }
            }
        }
        if tail.corrupt {
            warn!(path = %self.wal.path.display(), valid_len = tail.end, "WAL has a corrupt tail; ignoring entries after it");
        }
        Ok(tail)
    }

    /// Append `entries` and sync. Returns the new file length.
    pub fn append(&mut self, entries: &[WalEntry]) -> Result<u64, WalError> {
        let mut buf = Vec::new();
        for entry in entries {
            serde_json::to_writer(&mut buf, entry)?;
            buf.push(b'\n');
        }
        self.file.write_all(&buf)?;
        self.file.sync_data()?;
        self.size()
    }

    /// Back up the damaged file and cut it back to its valid prefix.
    pub fn repair(&mut self, valid_len: u64) -> Result<(), WalError> {
        let bak = rotate_bak_path(&self.wal.path);
        fs::copy(&self.wal.path, &bak)?;
        self.file.set_len(valid_len)?;
        self.file.sync_data()?;
        warn!(
            path = %self.wal.path.display(),
            backup = %bak.display(),
            valid_len,
            "truncated corrupt WAL tail"
        );
        Ok(())
    }

    /// Drop every entry. Used once a snapshot covers them.
    pub fn truncate(&mut self) -> Result<(), WalError> {
        self.file.set_len(0)?;
        self.file.sync_data()?;
        Ok(())
    }
}

impl Drop for WalLock<'_> {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            warn!(path = %self.wal.path.display(), error = %e, "failed to unlock WAL");
        }
    }
}

/// Pick the next backup path (`.bak`, `.bak.2`, `.bak.3`), shifting older
/// backups up and dropping the oldest.
fn rotate_bak_path(path: &Path) -> PathBuf {
    let bak = |n: u32| match n {
        1 => path.with_extension("bak"),
        n => path.with_extension(format!("bak.{n}")),
    };

    let _ = fs::remove_file(bak(MAX_BAK_FILES));
    for n in (1..MAX_BAK_FILES).rev() {
        let src = bak(n);
        if src.exists() {
            let _ = fs::rename(&src, bak(n + 1));
        }
    }
    bak(1)
}

#[cfg(test)]
#[path = "wal_tests.rs"]
mod tests;
