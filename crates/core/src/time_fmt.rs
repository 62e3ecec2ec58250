// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Time and duration formatting for tables, JSON views and file names.

use chrono::{DateTime, Local, Utc};

/// Format a duration in seconds as a compact string ("5s", "2m", "1h", "3d").
pub fn format_elapsed(secs: u64) -> String {
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m", secs / 60)
    } else if secs < 86400 {
        format!("{}h", secs / 3600)
    } else {
        format!("{}d", secs / 86400)
    }
}

/// Format a run duration with second resolution ("850ms", "12s", "3m 04s", "2h 05m 10s").
pub fn format_duration_ms(ms: u64) -> String {
    if ms < 1000 {
        return format!("{}ms", ms);
    }
    let secs = ms / 1000;
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{}h {:02}m {:02}s", h, m, s)
    } else if m > 0 {
        format!("{}m {:02}s", m, s)
    } else {
        format!("{}s", s)
    }
}

/// Format an epoch-ms timestamp as `YYYY-MM-DD HH:MM:SS`, in UTC (suffixed
/// `UTC`) or in the host's local zone.
pub fn format_epoch_ms(ms: u64, local: bool) -> String {
    let Some(utc) = DateTime::<Utc>::from_timestamp_millis(ms as i64) else {
        return "-".to_string();
    };
    if local {
        utc.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S %z").to_string()
    } else {
        utc.format("%Y-%m-%d %H:%M:%S UTC").to_string()
    }
}

/// Compact UTC timestamp for file names, e.g. `20260130T081409Z`.
pub fn format_utc_compact(ms: u64) -> String {
    DateTime::<Utc>::from_timestamp_millis(ms as i64)
        .map(|t| t.format("%Y%m%dT%H%M%SZ").to_string())
        .unwrap_or_else(|| "19700101T000000Z".to_string())
}

#[cfg(test)]
#[path = "time_fmt_tests.rs"]
mod tests;
