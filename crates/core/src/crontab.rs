// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Discovery of `cw exec` entries in a crontab.
//!
//! Only lines that invoke `<program> exec` are reported. Each must carry a
//! `--name`, since that is the job the entry feeds.

use regex::Regex;
use serde::Serialize;
use thiserror::Error;

/// A crontab line that runs a job through `cw exec`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrontabEntry {
    pub name: String,
    /// `@daily` style macro, or the five time fields joined by spaces
    pub schedule: String,
    pub line: String,
    pub line_no: usize,
}

#[derive(Debug, Error)]
pub enum CrontabError {
    #[error("line {line_no}: `exec` entry has no --name: {line}")]
    MissingName { line_no: usize, line: String },
    #[error("invalid program name pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Entries found in a crontab plus the lines that looked like entries but
/// could not be read.
#[derive(Debug, Default)]
pub struct CrontabScan {
    pub entries: Vec<CrontabEntry>,
    pub problems: Vec<CrontabError>,
}

/// Scan crontab text for lines invoking `<program> exec`.
pub fn parse_crontab(text: &str, program: &str) -> Result<CrontabScan, CrontabError> {
    let invocation = Regex::new(&format!(r"(^|[\s/]){}\s+exec(\s|$)", regex::escape(program)))?;
    let name_flag = Regex::new(r#"--name(?:=|\s+)(?:"([^"]*)"|'([^']*)'|(\S+))"#)?;
    let env_assignment = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*\s*=")?;

    let mut scan = CrontabScan::default();
    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') || env_assignment.is_match(line) {
            continue;
        }
        if !invocation.is_match(line) {
            continue;
        }
        let line_no = idx + 1;
        let name = name_flag.captures(line).and_then(|caps| {
            caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3)).map(|m| m.as_str().to_string())
        });
        match name {
            Some(name) if !name.is_empty() => scan.entries.push(CrontabEntry {
                name,
                schedule: schedule_of(line),
                line: line.to_string(),
                line_no,
            }),
            _ => scan.problems.push(CrontabError::MissingName { line_no, line: line.to_string() }),
        }
    }
    Ok(scan)
}

fn schedule_of(line: &str) -> String {
    let fields: Vec<&str> = line.split_whitespace().collect();
    match fields.first() {
        Some(first) if first.starts_with('@') => first.to_string(),
        _ => fields.iter().take(5).copied().collect::<Vec<_>>().join(" "),
    }
}

#[cfg(test)]
#[path = "crontab_tests.rs"]
mod tests;
