// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `cw exec` lifecycle specs.

use crate::prelude::*;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use std::time::Duration;

#[test]
fn first_exec_creates_job_and_one_run() {
    let sb = Sandbox::new();

    let run = sb.cw().args(&["exec", "--name", "hello", "--", "echo", "hi"]).passes().json();

    assert_eq!(run["id"], 1);
    assert_eq!(run["job"], "hello");
    assert_eq!(run["status"], "Succeeded");
    assert!(run["end_time_ms"].is_u64());
    assert!(run["pid"].is_u64());
    assert_eq!(log_of(&run), "hi\n");

    let jobs = sb.cw().args(&["job", "list", "-o", "json"]).passes().json();
    assert_eq!(jobs.as_array().map(Vec::len), Some(1));
    assert_eq!(sb.runs().len(), 1);
}

#[test]
fn second_exec_reuses_the_job() {
    let sb = Sandbox::new();
    sb.cw().args(&["exec", "--name", "again", "--", "true"]).passes();

    let run = sb.cw().args(&["exec", "--name", "again", "--", "true"]).passes().json();

    assert_eq!(run["id"], 2);
    assert_eq!(run["job_id"], 1);
}

#[test]
fn nonzero_exit_is_failed_but_cw_succeeds() {
    let sb = Sandbox::new();
    let run = sb.cw().args(&["exec", "--name", "flaky", "--", "echo oops >&2; exit 1"]).passes().json();

    assert_eq!(run["status"], "Failed");
    assert_eq!(log_of(&run), "oops\n");
}

#[test]
fn missing_executable_is_failed_with_end_time() {
    let sb = Sandbox::new();
    let run = sb.cw().args(&["exec", "--name", "ghost", "--", "/nonexistent/binary-xyz"]).passes().json();

    assert_eq!(run["status"], "Failed");
    assert!(run["end_time_ms"].is_u64());
}

#[test]
fn overlapping_execs_run_once_and_skip_once() {
    let sb = Sandbox::new();
    let args = ["exec", "--name", "nightly-backup", "--", "echo A; sleep 2; echo B"];

    let first = sb.spawn(&args);
    std::thread::sleep(Duration::from_millis(10));
    let second = sb.spawn(&args);
    let mut runs = [finish_exec(first), finish_exec(second)];
    runs.sort_by_key(|run| run["status"].as_str().map(str::to_string));

    let [skipped, succeeded] = runs;
    assert_eq!(succeeded["status"], "Succeeded");
    assert_eq!(log_of(&succeeded), "A\nB\n");
    assert_eq!(skipped["status"], "Skipped");
    assert_eq!(skipped["log_file"], "");
    assert!(skipped["pid"].is_null());
    assert!(skipped["end_time_ms"].is_null());
    assert_eq!(sb.runs().len(), 2);
}

#[test]
fn exec_while_running_is_skipped_immediately() {
    let sb = Sandbox::new();
    let long = sb.spawn(&["exec", "--name", "slow", "--", "sleep 2"]);
    sb.wait_running(1);

    let started = std::time::Instant::now();
    let run = sb.cw().args(&["exec", "--name", "slow", "--", "echo never"]).passes().json();

    assert_eq!(run["status"], "Skipped");
    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(finish_exec(long)["status"], "Succeeded");
}

#[test]
fn different_jobs_run_concurrently() {
    let sb = Sandbox::new();
    let a = sb.spawn(&["exec", "--name", "a", "--", "sleep 1"]);
    let b = sb.spawn(&["exec", "--name", "b", "--", "sleep 1"]);

    assert_eq!(finish_exec(a)["status"], "Succeeded");
    assert_eq!(finish_exec(b)["status"], "Succeeded");
}

#[test]
fn sigterm_to_wrapper_terminates_the_run() {
    let sb = Sandbox::new();
    let child = sb.spawn(&["exec", "--name", "sleeper", "--", "sleep 30"]);
    sb.wait_running(1);

    let wrapper = i32::try_from(child.id()).unwrap();
    kill(Pid::from_raw(wrapper), Signal::SIGTERM).unwrap();
    let run = finish_exec(child);

    assert_eq!(run["status"], "Terminated");
    assert!(run["end_time_ms"].is_u64());
}

#[test]
fn exec_event_log_records_the_lifecycle() {
    let sb = Sandbox::new();
    let run = sb.cw().args(&["exec", "--name", "tracked", "--", "true"]).passes().json();

    let shown = sb.cw().args(&["run", "show", "-r", "1", "-o", "json"]).passes().json();

    assert_eq!(shown["exec_log_file"], run["exec_log_file"]);
    let kinds: Vec<&str> =
        shown["events"].as_array().unwrap().iter().filter_map(|e| e["event"].as_str()).collect();
    assert_eq!(kinds, vec!["job_created", "lock_acquired", "run_created", "run_started", "run_completed"]);
}

#[test]
fn logs_and_locks_live_under_state_dir() {
    let sb = Sandbox::new();
    let run = sb.cw().args(&["exec", "--name", "placed", "--", "true"]).passes().json();

    let logs = sb.state_dir().join("logs");
    assert!(run["log_file"].as_str().unwrap().starts_with(logs.to_str().unwrap()));
    assert!(run["exec_log_file"].as_str().unwrap().starts_with(logs.to_str().unwrap()));
    assert!(sb.state_dir().join("locks/placed.lock").exists());
}

fn relayed_signals(sb: &Sandbox, run_id: u64) -> Vec<String> {
    let shown = sb.cw().args(&["run", "show", "-r", &run_id.to_string(), "-o", "json"]).passes().json();
    shown["events"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|e| e["event"] == "signal_relayed")
        .filter_map(|e| e["signal"].as_str().map(str::to_string))
        .collect()
}

#[test]
fn repeated_signals_are_relayed_once() {
    let sb = Sandbox::new();
    // The child survives SIGTERM and reports each one it gets
    let script = "trap 'echo term' TERM; i=0; while [ $i -lt 20 ]; do sleep 0.1; i=$((i+1)); done";
    let child = sb.spawn(&["exec", "--name", "stubborn", "--", script]);
    sb.wait_running(1);

    let wrapper = Pid::from_raw(i32::try_from(child.id()).unwrap());
    for signal in [Signal::SIGHUP, Signal::SIGTERM, Signal::SIGINT] {
        kill(wrapper, signal).unwrap();
        std::thread::sleep(Duration::from_millis(200));
    }
    let run = finish_exec(child);

    assert_eq!(run["status"], "Succeeded");
    assert_eq!(log_of(&run), "term\n");
    assert_eq!(relayed_signals(&sb, 1), vec!["SIGHUP"]);
}

#[test]
fn sigint_to_wrapper_terminates_the_run() {
    let sb = Sandbox::new();
    let child = sb.spawn(&["exec", "--name", "interrupted", "--", "sleep 30"]);
    sb.wait_running(1);

    kill(Pid::from_raw(i32::try_from(child.id()).unwrap()), Signal::SIGINT).unwrap();
    let run = finish_exec(child);

    assert_eq!(run["status"], "Terminated");
    assert_eq!(relayed_signals(&sb, 1), vec!["SIGINT"]);
}
