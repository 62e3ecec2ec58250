// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Configuration: `config.toml` plus environment overrides.
//!
//! Lookup order for the file: `$CW_CONFIG`, then
//! `$XDG_CONFIG_HOME/cw/config.toml`, then `~/.config/cw/config.toml`.
//! A missing file means defaults.

use cw_adapters::{ConfiguredNotifier, DesktopNotifyAdapter, SlackNotifyAdapter};
use cw_engine::DEFAULT_POLL_INTERVAL;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("cannot determine home directory")]
    NoHome,
    #[error("invalid value for {name}: {value:?}")]
    InvalidEnv { name: &'static str, value: String },
    #[error("cannot create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("notifications requested but {0}")]
    Notifier(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifyKind {
    Desktop,
    Slack,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    state_dir: Option<String>,
    log_dir: Option<String>,
    lock_dir: Option<String>,
    local_time: bool,
    watch_poll_ms: Option<u64>,
    notify: NotifyFile,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct NotifyFile {
    kind: Option<NotifyKind>,
    hostname: Option<String>,
    slack: SlackFile,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct SlackFile {
    token: Option<String>,
    channel: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyConfig {
    pub kind: Option<NotifyKind>,
    pub hostname: String,
    pub slack_token: Option<String>,
    pub slack_channel: Option<String>,
}

/// Resolved configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub state_dir: PathBuf,
    pub log_dir: PathBuf,
    pub lock_dir: PathBuf,
    /// Show times in local time instead of UTC
    pub local_time: bool,
    pub watch_poll: Duration,
    pub notify: NotifyConfig,
}

impl Config {
    /// Load from the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(|name| std::env::var(name).ok())
    }

    /// Load using `env` to look up environment variables.
    pub fn load_with(env: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = |name: &str| env(name).filter(|v| !v.is_empty());
        let home = env("HOME").map(PathBuf::from).or_else(dirs::home_dir);

        let config_path = match env("CW_CONFIG") {
            Some(path) => Some(expand(&path, home.as_deref())?),
            None => env("XDG_CONFIG_HOME")
                .map(PathBuf::from)
                .or_else(|| home.as_ref().map(|h| h.join(".config")))
                .map(|dir| dir.join("cw").join("config.toml")),
        };
        let file = match config_path {
            Some(path) => read_file(&path)?,
            None => ConfigFile::default(),
        };

        let state_dir = match env("CW_STATE_DIR").or(file.state_dir) {
            Some(dir) => expand(&dir, home.as_deref())?,
            None => env("XDG_STATE_HOME")
                .map(PathBuf::from)
                .or_else(|| home.as_ref().map(|h| h.join(".local").join("state")))
                .ok_or(ConfigError::NoHome)?
                .join("cw"),
        };
        let log_dir = match env("CW_LOG_DIR").or(file.log_dir) {
            Some(dir) => expand(&dir, home.as_deref())?,
            None => state_dir.join("logs"),
        };
        let lock_dir = match env("CW_LOCK_DIR").or(file.lock_dir) {
            Some(dir) => expand(&dir, home.as_deref())?,
            None => state_dir.join("locks"),
        };

        let watch_poll = match env("CW_WATCH_POLL_MS") {
            Some(value) => match value.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => Duration::from_millis(ms),
                _ => return Err(ConfigError::InvalidEnv { name: "CW_WATCH_POLL_MS", value }),
            },
            None => file.watch_poll_ms.filter(|ms| *ms > 0).map_or(DEFAULT_POLL_INTERVAL, Duration::from_millis),
        };

        let notify = NotifyConfig {
            kind: file.notify.kind,
            hostname: file.notify.hostname.unwrap_or_default(),
            slack_token: env("CW_SLACK_TOKEN").or(file.notify.slack.token),
            slack_channel: env("CW_SLACK_CHANNEL").or(file.notify.slack.channel),
        };

        Ok(Self { state_dir, log_dir, lock_dir, local_time: file.local_time, watch_poll, notify })
    }

    /// Create the state, log and lock directories.
    pub fn ensure_dirs(&self) -> Result<(), ConfigError> {
        for dir in [&self.state_dir, &self.log_dir, &self.lock_dir] {
            std::fs::create_dir_all(dir).map_err(|source| ConfigError::CreateDir { path: dir.clone(), source })?;
        }
        Ok(())
    }

    /// Build the notifier. When `required` is false a missing or incomplete
    /// `[notify]` section is not an error.
    pub fn notifier(&self, required: bool) -> Result<ConfiguredNotifier, ConfigError> {
        if !required {
            return Ok(ConfiguredNotifier::Disabled);
        }
        match self.notify.kind {
            None => Err(ConfigError::Notifier("[notify] kind is not configured".to_string())),
            Some(NotifyKind::Desktop) => Ok(ConfiguredNotifier::Desktop(DesktopNotifyAdapter::new())),
            Some(NotifyKind::Slack) => {
                let token = self.notify.slack_token.as_deref().filter(|t| !t.is_empty()).ok_or_else(|| {
                    ConfigError::Notifier("slack token is not set ([notify.slack] token or CW_SLACK_TOKEN)".to_string())
                })?;
                let channel = self.notify.slack_channel.as_deref().filter(|c| !c.is_empty()).ok_or_else(|| {
                    ConfigError::Notifier(
                        "slack channel is not set ([notify.slack] channel or CW_SLACK_CHANNEL)".to_string(),
                    )
                })?;
                let adapter =
                    SlackNotifyAdapter::new(token, channel).map_err(|e| ConfigError::Notifier(e.to_string()))?;
                Ok(ConfiguredNotifier::Slack(adapter))
            }
        }
    }
}

fn read_file(path: &Path) -> Result<ConfigFile, ConfigError> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no config file; using defaults");
            return Ok(ConfigFile::default());
        }
        Err(source) => return Err(ConfigError::Read { path: path.to_path_buf(), source }),
    };
    toml::from_str(&text).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
}

/// Expand a leading `~` and any `$HOME`.
fn expand(raw: &str, home: Option<&Path>) -> Result<PathBuf, ConfigError> {
    let needs_home = raw == "~" || raw.starts_with("~/") || raw.contains("$HOME");
    if !needs_home {
        return Ok(PathBuf::from(raw));
    }
    let home = home.ok_or(ConfigError::NoHome)?;
    let home_str = home.to_string_lossy();
    let expanded = raw.replace("$HOME", &home_str);
    let expanded = match expanded.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => format!("{home_str}{rest}"),
        _ => expanded,
    };
    Ok(PathBuf::from(expanded))
}

#[cfg(test)]
impl Config {
    /// Everything under `dir`, fast polling, no notifier.
    pub(crate) fn for_dir(dir: &Path) -> Self {
        let state_dir = dir.join("state");
        Self {
            log_dir: state_dir.join("logs"),
            lock_dir: state_dir.join("locks"),
            state_dir,
            local_time: false,
            watch_poll: Duration::from_millis(20),
            notify: NotifyConfig { kind: None, hostname: "testhost".to_string(), slack_token: None, slack_channel: None },
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
