// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Help, version and argument errors.

use crate::prelude::*;

#[test]
fn help_lists_commands() {
    Sandbox::new()
        .cw()
        .args(&["--help"])
        .passes()
        .stdout_has("Usage:")
        .stdout_has("exec")
        .stdout_has("run")
        .stdout_has("job")
        .stdout_has("cron");
}

#[test]
fn run_help_lists_subcommands() {
    Sandbox::new()
        .cw()
        .args(&["run", "--help"])
        .passes()
        .stdout_has("list")
        .stdout_has("show")
        .stdout_has("watch")
        .stdout_has("kill")
        .stdout_has("term");
}

#[test]
fn version_shows_version() {
    Sandbox::new().cw().args(&["--version"]).passes().stdout_has("0.1");
}

#[test]
fn exec_without_name_is_usage_error() {
    Sandbox::new().cw().args(&["exec", "--", "true"]).exits_with(2);
}

#[test]
fn exec_without_command_is_usage_error() {
    let sb = Sandbox::new();
    sb.cw().args(&["exec", "--name", "x"]).exits_with(2).stderr_has("no command");
    assert!(sb.runs().is_empty());
}

#[test]
fn exec_with_invalid_name_is_usage_error() {
    let sb = Sandbox::new();
    sb.cw().args(&["exec", "--name", "../escape", "--", "true"]).exits_with(2);
    assert!(sb.runs().is_empty());
}

#[test]
fn malformed_config_is_usage_error() {
    let sb = Sandbox::new();
    sb.file("config.toml", "state_dir = [\n");
    sb.cw().args(&["exec", "--name", "x", "--", "true"]).exits_with(2).stderr_has("invalid config");
}

#[test]
fn notify_without_notifier_is_usage_error() {
    let sb = Sandbox::new();
    sb.cw().args(&["exec", "--name", "x", "--notify", "--", "true"]).exits_with(2).stderr_has("notify");
    assert!(sb.runs().is_empty());
}

#[test]
fn unwritable_state_dir_is_usage_error() {
    let sb = Sandbox::new();
    sb.file("blocker", "not a directory");
    let state = sb.path().join("blocker/state");
    sb.cw().env("CW_STATE_DIR", &state).args(&["exec", "--name", "x", "--", "true"]).exits_with(2);
}
