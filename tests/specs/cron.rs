// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `cw cron list` against a stand-in `crontab` on PATH.

use crate::prelude::*;
use std::os::unix::fs::PermissionsExt;

fn with_crontab(sb: &Sandbox, script_body: &str) -> String {
    sb.file("bin/crontab", &format!("#!/bin/sh\n{script_body}\n"));
    let script = sb.path().join("bin/crontab");
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
    let path = std::env::var("PATH").unwrap_or_default();
    format!("{}:{}", sb.path().join("bin").display(), path)
}

#[test]
fn lists_cw_exec_entries() {
    let sb = Sandbox::new();
    let path = with_crontab(
        &sb,
        "cat <<'EOF'\n0 2 * * * cw exec --name nightly-backup -- /opt/backup.sh\n*/5 * * * * other-tool\nEOF",
    );
    sb.cw().args(&["job", "add", "--name", "nightly-backup"]).passes();

    let entries = sb.cw().env("PATH", &path).args(&["cron", "list", "-o", "json"]).passes().json();

    assert_eq!(entries.as_array().map(Vec::len), Some(1));
    assert_eq!(entries[0]["name"], "nightly-backup");
    assert_eq!(entries[0]["schedule"], "0 2 * * *");
    assert_eq!(entries[0]["job_id"], 1);
}

#[test]
fn missing_crontab_is_empty() {
    let sb = Sandbox::new();
    let path = with_crontab(&sb, "echo 'no crontab for tester' >&2\nexit 1");

    sb.cw().env("PATH", &path).args(&["cron", "list"]).passes().stdout_has("No cw exec entries");
}

#[test]
fn crontab_failure_is_reported() {
    let sb = Sandbox::new();
    let path = with_crontab(&sb, "echo 'permission denied' >&2\nexit 1");

    sb.cw().env("PATH", &path).args(&["cron", "list"]).exits_with(1).stderr_has("permission denied");
}
