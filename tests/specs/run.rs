// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `cw run` specs: list, show, watch, kill and term.

use crate::prelude::*;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;

#[test]
fn list_filters_and_limits() {
    let sb = Sandbox::new();
    sb.cw().args(&["exec", "--name", "ok", "--", "true"]).passes();
    sb.cw().args(&["exec", "--name", "bad", "--", "false"]).passes();
    sb.cw().args(&["exec", "--name", "ok", "--", "true"]).passes();

    let ok = sb.cw().args(&["run", "list", "--job", "ok", "-o", "json"]).passes().json();
    let ids: Vec<u64> = ok.as_array().unwrap().iter().filter_map(|r| r["id"].as_u64()).collect();
    assert_eq!(ids, vec![3, 1]);

    let failed = sb.cw().args(&["run", "list", "--status", "failed", "-o", "json"]).passes().json();
    assert_eq!(failed.as_array().unwrap().len(), 1);
    assert_eq!(failed[0]["job"], "bad");

    sb.cw().args(&["run", "list", "-n", "1"]).passes().stdout_has("2 more not shown");
}

#[test]
fn list_text_shows_table() {
    let sb = Sandbox::new();
    sb.cw().args(&["exec", "--name", "tabled", "--", "true"]).passes();

    sb.cw().args(&["run", "list"]).passes().stdout_has("STATUS").stdout_has("tabled").stdout_has("Succeeded");
}

#[test]
fn list_rejects_unknown_status() {
    Sandbox::new().cw().args(&["run", "list", "--status", "weird"]).exits_with(2);
}

#[test]
fn show_unknown_run_fails() {
    Sandbox::new().cw().args(&["run", "show", "-r", "42"]).exits_with(1).stderr_has("run not found: 42");
}

#[test]
fn show_text_includes_status_and_log() {
    let sb = Sandbox::new();
    let run = sb.cw().args(&["exec", "--name", "shown", "--", "true"]).passes().json();

    sb.cw()
        .args(&["run", "show", "-r", "1"])
        .passes()
        .stdout_has("Run 1 (shown)")
        .stdout_has("Succeeded")
        .stdout_has(run["log_file"].as_str().unwrap());
}

#[test]
fn watch_streams_output_until_finished() {
    let sb = Sandbox::new();
    let exec = sb.spawn(&["exec", "--name", "chatty", "--", "echo one; sleep 1; echo two"]);
    sb.wait_running(1);

    let watched = sb.cw().args(&["run", "watch", "-r", "1"]).passes();

    assert_eq!(watched.stdout(), "one\ntwo\n");
    assert_eq!(finish_exec(exec)["status"], "Succeeded");
}

#[test]
fn watch_skipped_run_prints_nothing() {
    let sb = Sandbox::new();
    let long = sb.spawn(&["exec", "--name", "busy", "--", "sleep 1"]);
    sb.wait_running(1);
    let skipped = sb.cw().args(&["exec", "--name", "busy", "--", "true"]).passes().json();
    assert_eq!(skipped["status"], "Skipped");

    let watched = sb.cw().args(&["run", "watch", "-r", "2"]).passes();

    assert_eq!(watched.stdout(), "");
    finish_exec(long);
}

#[test]
fn watch_unknown_run_fails() {
    Sandbox::new().cw().args(&["run", "watch", "-r", "7"]).exits_with(1);
}

#[test]
fn kill_requires_a_running_run() {
    let sb = Sandbox::new();
    sb.cw().args(&["exec", "--name", "done", "--", "true"]).passes();

    sb.cw().args(&["run", "kill", "-r", "1", "--force"]).exits_with(1).stderr_has("only running runs");
}

#[test]
fn kill_declined_leaves_run_alone() {
    let sb = Sandbox::new();
    let exec = sb.spawn(&["exec", "--name", "kept", "--", "sleep 1"]);
    sb.wait_running(1);

    sb.cw().args(&["run", "kill", "-r", "1"]).stdin("n\n").passes().stdout_has("Cancelled");

    assert_eq!(finish_exec(exec)["status"], "Succeeded");
}

#[test]
fn kill_confirmed_terminates_the_run() {
    let sb = Sandbox::new();
    let exec = sb.spawn(&["exec", "--name", "victim", "--", "sleep 30"]);
    sb.wait_running(1);

    sb.cw().args(&["run", "kill", "-r", "1"]).stdin("y\n").passes().stdout_has("Sent SIGTERM to run 1");

    assert_eq!(finish_exec(exec)["status"], "Terminated");
}

#[test]
fn term_recovers_a_run_whose_wrapper_died() {
    let sb = Sandbox::new();
    let mut exec = sb.spawn(&["exec", "--name", "orphan", "--", "sleep 30"]);
    let child_pid = sb.wait_running(1);

    // SIGKILL leaves the record Running
    kill(Pid::from_raw(i32::try_from(exec.id()).unwrap()), Signal::SIGKILL).unwrap();
    exec.wait().unwrap();
    assert_eq!(sb.runs()[0]["status"], "Running");

    let run = sb.cw().args(&["run", "term", "-r", "1", "-o", "json"]).passes().json();
    assert_eq!(run["status"], "Terminated");
    assert!(run["end_time_ms"].is_u64());

    sb.cw().args(&["run", "term", "-r", "1"]).exits_with(1).stderr_has("only running runs");
    let _ = kill(Pid::from_raw(i32::try_from(child_pid).unwrap()), Signal::SIGKILL);
}
