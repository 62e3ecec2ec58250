// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `cw job` specs.

use crate::prelude::*;

#[test]
fn add_then_list() {
    let sb = Sandbox::new();
    sb.cw().args(&["job", "add", "--name", "backup", "--notify-log"]).passes().stdout_has("Job 'backup' added");

    let jobs = sb.cw().args(&["job", "list", "-o", "json"]).passes().json();

    assert_eq!(jobs[0]["name"], "backup");
    assert_eq!(jobs[0]["notify_log_content"], true);
}

#[test]
fn add_duplicate_is_usage_error() {
    let sb = Sandbox::new();
    sb.cw().args(&["job", "add", "--name", "dup"]).passes();

    sb.cw().args(&["job", "add", "--name", "dup"]).exits_with(2).stderr_has("already exists");
}

#[test]
fn update_renames_and_exec_uses_new_name() {
    let sb = Sandbox::new();
    sb.cw().args(&["exec", "--name", "old", "--", "true"]).passes();

    let job = sb
        .cw()
        .args(&["job", "update", "--name", "old", "--new-name", "new", "--notify-log", "true", "-o", "json"])
        .passes()
        .json();
    assert_eq!(job["name"], "new");
    assert_eq!(job["notify_log_content"], true);

    let run = sb.cw().args(&["exec", "--name", "new", "--", "true"]).passes().json();
    assert_eq!(run["job_id"], 1);
}

#[test]
fn update_can_clear_the_flag() {
    let sb = Sandbox::new();
    sb.cw().args(&["job", "add", "--name", "flag", "--notify-log"]).passes();

    let job = sb.cw().args(&["job", "update", "--name", "flag", "--notify-log", "false", "-o", "json"]).passes().json();

    assert_eq!(job["notify_log_content"], false);
}

#[test]
fn update_missing_job_fails() {
    Sandbox::new()
        .cw()
        .args(&["job", "update", "--name", "nobody", "--notify-log", "true"])
        .exits_with(1)
        .stderr_has("job not found");
}

#[test]
fn empty_list_text() {
    Sandbox::new().cw().args(&["job", "list"]).passes().stdout_has("No jobs found");
}

#[test]
fn rename_during_a_run_is_refused() {
    let sb = Sandbox::new();
    let exec = sb.spawn(&["exec", "--name", "backup", "--", "sleep 1"]);
    sb.wait_running(1);

    sb.cw()
        .args(&["job", "update", "--name", "backup", "--new-name", "backup-v2"])
        .exits_with(1)
        .stderr_has("run in progress");
    let second = sb.cw().args(&["exec", "--name", "backup", "--", "true"]).passes().json();

    assert_eq!(second["status"], "Skipped");
    assert_eq!(finish_exec(exec)["status"], "Succeeded");
    sb.cw().args(&["job", "update", "--name", "backup", "--new-name", "backup-v2"]).passes();
}
