// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! [`RunStore`] backed by the on-disk WAL.
//!
//! Each handle keeps the state it last replayed together with its byte
//! offset in the WAL, so an operation only reads what other processes
//! appended since. Once the WAL holds [`COMPACT_AFTER`] entries the writer
//! snapshots the state and truncates the WAL.

use crate::snapshot::{self, Snapshot};
use crate::state::MaterializedState;
use crate::store::{RunStore, StoreError};
use crate::wal::{Wal, WalEntry, WalLock};
use cw_core::{validate_job_name, Clock, Event, Job, JobId, Run, RunId, RunStatus, SystemClock};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// File name of the log inside the state directory.
pub const WAL_FILE_NAME: &str = "store.wal";

/// WAL entries that trigger a snapshot.
pub const COMPACT_AFTER: u64 = 1_000;

#[derive(Clone)]
pub struct FileStore<C: Clock = SystemClock> {
    wal: Arc<Wal>,
    state_dir: PathBuf,
    cache: Arc<Mutex<Cache>>,
    compact_after: u64,
    clock: C,
}

/// State replayed up to `offset` bytes into the WAL.
#[derive(Default)]
struct Cache {
    loaded: bool,
    state: MaterializedState,
    /// Last applied sequence number
    seq: u64,
    /// Sequence of the snapshot the state started from (0 for none)
    base_seq: u64,
    offset: u64,
    /// Entries currently in the WAL file
    wal_entries: u64,
}

impl<C: Clock> FileStore<C> {
    /// Open the store at `<state_dir>/store.wal`, creating it if needed.
    pub fn open(state_dir: &Path, clock: C) -> Result<Self, StoreError> {
        let wal = Wal::open(&state_dir.join(WAL_FILE_NAME))?;
        Ok(Self {
            wal: Arc::new(wal),
            state_dir: state_dir.to_path_buf(),
            cache: Arc::new(Mutex::new(Cache::default())),
            compact_after: COMPACT_AFTER,
            clock,
        })
    }

    #[cfg(test)]
    pub(crate) fn with_compact_after(mut self, entries: u64) -> Self {
        self.compact_after = entries;
        self
    }

    /// Read the current state under a shared lock.
    fn read<T>(&self, f: impl FnOnce(&MaterializedState) -> T) -> Result<T, StoreError> {
        let mut cache = self.cache.lock();
        let mut wal = self.wal.lock_shared()?;
        self.refresh(&mut wal, &mut cache)?;
        Ok(f(&cache.state))
    }

    /// Catch up, decide, append. `f` returns the result and the events that
    /// record it.
    fn transact<T>(
        &self,
        f: impl FnOnce(&MaterializedState) -> Result<(T, Vec<Event>), StoreError>,
    ) -> Result<T, StoreError> {
        let mut cache = self.cache.lock();
        let mut wal = self.wal.lock_exclusive()?;
        if self.refresh(&mut wal, &mut cache)? {
            wal.repair(cache.offset)?;
        }

        let (value, events) = f(&cache.state)?;
        if events.is_empty() {
            return Ok(value);
        }

        let entries: Vec<WalEntry> =
            events.into_iter().zip(cache.seq + 1..).map(|(event, seq)| WalEntry { seq, event }).collect();
        for entry in &entries {
            debug!(seq = entry.seq, event = entry.event.name(), "store event");
        }
        match wal.append(&entries) {
            Ok(end) => cache.offset = end,
            Err(e) => {
                // A partial append is repaired by the next writer
                cache.loaded = false;
                return Err(e.into());
            }
        }
        for entry in entries {
            cache.state.apply_event(&entry.event);
            cache.seq = entry.seq;
            cache.wal_entries += 1;
        }

        if cache.wal_entries >= self.compact_after {
            if let Err(e) = self.compact(&mut wal, &mut cache) {
                warn!(error = %e, "store compaction failed; will retry on a later write");
                cache.loaded = false;
            }
        }
        Ok(value)
    }

    /// Bring `cache` up to date with the WAL. Returns true when the WAL has
    /// a corrupt tail after `cache.offset`.
    fn refresh(&self, wal: &mut WalLock<'_>, cache: &mut Cache) -> Result<bool, StoreError> {
        let latest = snapshot::latest(&self.state_dir)?;
        let base_seq = latest.as_ref().map_or(0, |(seq, _)| *seq);
        if !cache.loaded || base_seq != cache.base_seq || wal.size()? < cache.offset {
            let mut fresh = Cache { base_seq, ..Cache::default() };
            if let Some((_, path)) = latest {
                let snapshot = Snapshot::load(&path)?;
                fresh.seq = snapshot.seq;
                fresh.state = snapshot.state;
                debug!(seq = snapshot.seq, path = %path.display(), "loaded store snapshot");
            }
            fresh.loaded = true;
            *cache = fresh;
        }

        let tail = wal.read_from(cache.offset)?;
        for entry in &tail.entries {
            // Entries at or below the snapshot survive a crash mid-compaction
            if entry.seq > cache.seq {
                cache.state.apply_event(&entry.event);
                cache.seq = entry.seq;
            }
        }
        cache.wal_entries += tail.entries.len() as u64;
        cache.offset = tail.end;
        Ok(tail.corrupt)
    }

    /// Snapshot the state, then empty the WAL. Runs under the exclusive lock.
    fn compact(&self, wal: &mut WalLock<'_>, cache: &mut Cache) -> Result<(), StoreError> {
        let path = Snapshot::new(cache.seq, cache.state.clone()).save(&self.state_dir)?;
        wal.truncate()?;
        cache.base_seq = cache.seq;
        cache.offset = 0;
        cache.wal_entries = 0;
        snapshot::prune(&self.state_dir, cache.seq);
        info!(seq = cache.seq, path = %path.display(), "compacted store");
        Ok(())
    }

    fn running_run(state: &MaterializedState, run_id: RunId) -> Result<&Run, StoreError> {
        let run = state.runs.get(&run_id).ok_or(StoreError::RunNotFound(run_id))?;
        if run.status != RunStatus::Running {
            return Err(StoreError::RunNotRunning { id: run_id, status: run.status });
        }
        Ok(run)
    }
}

impl<C: Clock> RunStore for FileStore<C> {
    fn get_or_create_job(&self, name: &str) -> Result<(Job, bool), StoreError> {
        validate_job_name(name)?;
        let now = self.clock.epoch_ms();
        self.transact(|state| {
            if let Some(job) = state.job_by_name(name) {
                return Ok(((job.clone(), false), vec![]));
            }
            let job = Job {
                id: state.next_job_id(),
                name: name.to_string(),
                notify_log_content: false,
                created_at_ms: now,
            };
            let event = Event::JobCreated {
                id: job.id,
                name: job.name.clone(),
                notify_log_content: job.notify_log_content,
                created_at_ms: now,
            };
            Ok(((job, true), vec![event]))
        })
    }

    fn create_run(&self, job_id: JobId, log_file: &Path, exec_log_file: &Path) -> Result<RunId, StoreError> {
        let now = self.clock.epoch_ms();
        self.transact(|state| {
            if !state.jobs.contains_key(&job_id) {
                return Err(StoreError::JobIdNotFound(job_id));
            }
            let id = state.next_run_id();
            let event = Event::RunStarted {
                id,
                job_id,
                start_time_ms: now,
                log_file: log_file.to_path_buf(),
                exec_log_file: exec_log_file.to_path_buf(),
            };
            Ok((id, vec![event]))
        })
    }

    fn record_pid(&self, run_id: RunId, pid: u32) -> Result<(), StoreError> {
        self.transact(|state| {
            Self::running_run(state, run_id)?;
            Ok(((), vec![Event::RunPidRecorded { id: run_id, pid }]))
        })
    }

    fn finalize_run(&self, run_id: RunId, status: RunStatus, end_time_ms: u64) -> Result<(), StoreError> {
        if !status.is_terminal() || status == RunStatus::Skipped {
            return Err(StoreError::InvalidStatus(status));
        }
        self.transact(|state| {
            Self::running_run(state, run_id)?;
            Ok(((), vec![Event::RunFinalized { id: run_id, status, end_time_ms }]))
        })
    }

    fn skip_run(&self, job_id: JobId, exec_log_file: &Path) -> Result<RunId, StoreError> {
        let now = self.clock.epoch_ms();
        self.transact(|state| {
            if !state.jobs.contains_key(&job_id) {
                return Err(StoreError::JobIdNotFound(job_id));
            }
            let id = state.next_run_id();
            let event = Event::RunSkipped {
                id,
                job_id,
                time_ms: now,
                exec_log_file: exec_log_file.to_path_buf(),
            };
            Ok((id, vec![event]))
        })
    }

    fn get_run(&self, run_id: RunId) -> Result<Option<Run>, StoreError> {
        self.read(|state| state.runs.get(&run_id).cloned())
    }

    fn is_run_finished(&self, run_id: RunId) -> Result<bool, StoreError> {
        let run = self.get_run(run_id)?.ok_or(StoreError::RunNotFound(run_id))?;
        Ok(run.is_terminal())
    }

    fn get_job(&self, name: &str) -> Result<Option<Job>, StoreError> {
        self.read(|state| state.job_by_name(name).cloned())
    }

    fn get_job_by_id(&self, job_id: JobId) -> Result<Option<Job>, StoreError> {
        self.read(|state| state.jobs.get(&job_id).cloned())
    }

    fn add_job(&self, name: &str, notify_log_content: bool) -> Result<Job, StoreError> {
        validate_job_name(name)?;
        let now = self.clock.epoch_ms();
        self.transact(|state| {
            if state.job_by_name(name).is_some() {
                return Err(StoreError::JobExists(name.to_string()));
            }
            let job = Job { id: state.next_job_id(), name: name.to_string(), notify_log_content, created_at_ms: now };
            let event = Event::JobCreated {
                id: job.id,
                name: job.name.clone(),
                notify_log_content,
                created_at_ms: now,
            };
            Ok((job, vec![event]))
        })
    }

    fn update_job(
        &self,
        name: &str,
        new_name: Option<&str>,
        notify_log_content: Option<bool>,
    ) -> Result<Job, StoreError> {
        if let Some(new_name) = new_name {
            validate_job_name(new_name)?;
        }
        self.transact(|state| {
            let mut job = state.job_by_name(name).cloned().ok_or_else(|| StoreError::JobNotFound(name.to_string()))?;
            if let Some(new_name) = new_name.filter(|n| *n != name) {
                if state.job_by_name(new_name).is_some() {
                    return Err(StoreError::JobExists(new_name.to_string()));
                }
                job.name = new_name.to_string();
            }
            if let Some(flag) = notify_log_content {
                job.notify_log_content = flag;
            }
            let event = Event::JobUpdated {
                id: job.id,
                name: job.name.clone(),
                notify_log_content: job.notify_log_content,
            };
            Ok((job, vec![event]))
        })
    }

    fn list_jobs(&self) -> Result<Vec<Job>, StoreError> {
        self.read(|state| state.jobs.values().cloned().collect())
    }

    fn list_runs(&self) -> Result<Vec<Run>, StoreError> {
        self.read(|state| state.runs.values().rev().cloned().collect())
    }
}

#[cfg(test)]
#[path = "file_store_tests.rs"]
mod tests;
