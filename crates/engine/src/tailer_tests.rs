// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use cw_core::{RunStatus, SystemClock};
use cw_storage::FileStore;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tempfile::TempDir;

const POLL: Duration = Duration::from_millis(20);

struct Fixture {
    dir: TempDir,
    store: FileStore,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path(), SystemClock).unwrap();
        Self { dir, store }
    }

    fn log_path(&self) -> PathBuf {
        self.dir.path().join("job.log")
    }

    fn running_run(&self, log: &Path) -> RunId {
        let (job, _) = self.store.get_or_create_job("job").unwrap();
        self.store.create_run(job.id, log, &self.dir.path().join("exec.jsonl")).unwrap()
    }

    fn finish(&self, run_id: RunId) {
        self.store.finalize_run(run_id, RunStatus::Succeeded, 1).unwrap();
    }

    fn tailer(&self) -> LogTailer<FileStore> {
        LogTailer::new(self.store.clone(), POLL)
    }
}

fn append(path: &Path, text: &str) {
    let mut file = std::fs::OpenOptions::new().create(true).append(true).open(path).unwrap();
    file.write_all(text.as_bytes()).unwrap();
}

#[tokio::test]
async fn unknown_run_is_an_error() {
    let fx = Fixture::new();
    let mut out = Vec::new();

    let err = fx.tailer().watch(RunId::new(99), &mut out).await.unwrap_err();

    assert!(matches!(err, TailError::RunNotFound(id) if id == RunId::new(99)));
}

#[tokio::test]
async fn skipped_run_returns_immediately() {
    let fx = Fixture::new();
    let (job, _) = fx.store.get_or_create_job("job").unwrap();
    let run_id = fx.store.skip_run(job.id, &fx.dir.path().join("exec.jsonl")).unwrap();
    let mut out = Vec::new();

    fx.tailer().watch(run_id, &mut out).await.unwrap();

    assert!(out.is_empty());
}

#[tokio::test]
async fn missing_log_returns_immediately() {
    let fx = Fixture::new();
    let run_id = fx.running_run(&fx.dir.path().join("deleted.log"));
    let mut out = Vec::new();

    fx.tailer().watch(run_id, &mut out).await.unwrap();

    assert!(out.is_empty());
}

#[tokio::test]
async fn finished_run_emits_complete_lines_only() {
    let fx = Fixture::new();
    let log = fx.log_path();
    append(&log, "one\ntwo\npartial");
    let run_id = fx.running_run(&log);
    fx.finish(run_id);
    let mut out = Vec::new();

    fx.tailer().watch(run_id, &mut out).await.unwrap();

    assert_eq!(String::from_utf8(out).unwrap(), "one\ntwo\n");
}

#[tokio::test]
async fn follows_appends_until_run_finishes() {
    let fx = Fixture::new();
    let log = fx.log_path();
    append(&log, "start\n");
    let run_id = fx.running_run(&log);
    let mut out = Vec::new();

    let writer = async {
        tokio::time::sleep(POLL * 3).await;
        append(&log, "half");
        tokio::time::sleep(POLL * 3).await;
        append(&log, " line\nend\n");
        tokio::time::sleep(POLL * 3).await;
        fx.finish(run_id);
    };
    let tailer = fx.tailer();
    let (result, ()) = tokio::join!(tailer.watch(run_id, &mut out), writer);
    result.unwrap();

    assert_eq!(String::from_utf8(out).unwrap(), "start\nhalf line\nend\n");
}

#[tokio::test]
async fn truncation_restarts_from_zero_without_duplicates() {
    let fx = Fixture::new();
    let log = fx.log_path();
    append(&log, "first run line one\nfirst run line two\n");
    let run_id = fx.running_run(&log);
    let mut out = Vec::new();

    let writer = async {
        tokio::time::sleep(POLL * 5).await;
        std::fs::write(&log, "new\n").unwrap();
        tokio::time::sleep(POLL * 5).await;
        fx.finish(run_id);
    };
    let tailer = fx.tailer();
    let (result, ()) = tokio::join!(tailer.watch(run_id, &mut out), writer);
    result.unwrap();

    assert_eq!(String::from_utf8(out).unwrap(), "first run line one\nfirst run line two\nnew\n");
}

#[tokio::test]
async fn stops_within_one_poll_of_termination() {
    let fx = Fixture::new();
    let log = fx.log_path();
    append(&log, "x\n");
    let run_id = fx.running_run(&log);
    let tailer = LogTailer::new(fx.store.clone(), Duration::from_millis(200));
    let mut out = Vec::new();

    let finished_at = async {
        tokio::time::sleep(Duration::from_millis(300)).await;
        fx.finish(run_id);
        Instant::now()
    };
    let (result, finished_at) = tokio::join!(tailer.watch(run_id, &mut out), finished_at);
    result.unwrap();

    assert!(finished_at.elapsed() <= Duration::from_millis(200) + Duration::from_millis(150));
    assert_eq!(out, b"x\n");
}

struct FailingWriter;

impl Write for FailingWriter {
    fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
        Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
    }
    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn output_failure_is_reported() {
    let fx = Fixture::new();
    let log = fx.log_path();
    append(&log, "line\n");
    let run_id = fx.running_run(&log);
    fx.finish(run_id);

    let err = fx.tailer().watch(run_id, &mut FailingWriter).await.unwrap_err();

    assert!(matches!(err, TailError::Output(_)));
}
