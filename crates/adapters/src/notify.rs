// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::slack::SlackNotifyAdapter;
use async_trait::async_trait;
use cw_core::{Job, Run, RunId, RunStatus};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Most log bytes embedded in a notification.
pub const LOG_CONTENT_LIMIT: u64 = 3000;

/// Errors from notify operations
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("send failed: {0}")]
    SendFailed(String),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

/// What a notification says about one finished (or skipped) run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunNotice {
    pub job_name: String,
    pub run_id: RunId,
    pub status: RunStatus,
    /// `None` for skipped runs
    pub log_file: Option<PathBuf>,
    pub embed_log_content: bool,
    /// Empty when unknown
    pub hostname: String,
}

impl RunNotice {
    pub fn new(job: &Job, run: &Run, hostname: &str) -> Self {
        Self {
            job_name: job.name.clone(),
            run_id: run.id,
            status: run.status,
            log_file: run.log_file.clone(),
            embed_log_content: job.notify_log_content && run.log_file.is_some(),
            hostname: hostname.to_string(),
        }
    }
}

/// Adapter for sending run notifications
#[async_trait]
pub trait NotifyAdapter: Clone + Send + Sync + 'static {
    /// Send a notification. `Ok(false)` means the backend declined it.
    async fn notify(&self, notice: &RunNotice) -> Result<bool, NotifyError>;
}

/// Render the notification text.
pub fn format_message(notice: &RunNotice) -> String {
    let who = if notice.hostname.is_empty() {
        notice.job_name.clone()
    } else {
        format!("{}@{}", notice.job_name, notice.hostname)
    };
    let mut text =
        format!("*{who}*: run {} - {} {}", notice.run_id, notice.status.emoji(), notice.status);
    if notice.status == RunStatus::Failed {
        text.push_str(" <!channel>");
    }

    let Some(log_file) = notice.log_file.as_deref().filter(|p| !p.as_os_str().is_empty()) else {
        return text;
    };
    text.push_str(&format!("\nLog: `{}`", log_file.display()));

    if notice.embed_log_content {
        match read_log_tail(log_file, LOG_CONTENT_LIMIT) {
            Ok(content) => {
                text.push_str("\nLog Content:\n```\n");
                text.push_str(&content);
                if !content.ends_with('\n') {
                    text.push('\n');
                }
                text.push_str("```");
            }
            Err(e) => {
                tracing::debug!(path = %log_file.display(), error = %e, "log content unavailable");
            }
        }
    }
    text
}

/// Last `limit` bytes of a file, lossily decoded.
fn read_log_tail(path: &Path, limit: u64) -> std::io::Result<String> {
    let mut file = File::open(path)?;
    let len = file.metadata()?.len();
    file.seek(SeekFrom::Start(len.saturating_sub(limit)))?;
    let mut bytes = Vec::new();
    file.take(limit).read_to_end(&mut bytes)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Desktop notification adapter using notify-rust.
///
/// On macOS, `notify-rust` uses `mac-notification-sys` (Cocoa bindings) to send
/// notifications via the Notification Center. The first notification triggers
/// an AppleScript bundle-identifier lookup, which blocks forever in processes
/// started by cron without Automation permissions. The bundle identifier is
/// pre-set at construction time to bypass the lookup.
#[derive(Clone, Copy, Debug, Default)]
pub struct DesktopNotifyAdapter;

impl DesktopNotifyAdapter {
    pub fn new() -> Self {
        #[cfg(target_os = "macos")]
        {
            let _ = mac_notification_sys::set_application("com.apple.Terminal");
        }
        Self
    }
}

#[async_trait]
impl NotifyAdapter for DesktopNotifyAdapter {
    async fn notify(&self, notice: &RunNotice) -> Result<bool, NotifyError> {
        let title = format!("cw: {} {}", notice.job_name, notice.status);
        let message = format_message(notice);
        // notify_rust::Notification::show() is synchronous on macOS.
        tokio::task::spawn_blocking(move || {
            tracing::info!(%title, "sending desktop notification");
            notify_rust::Notification::new()
                .summary(&title)
                .body(&message)
                .show()
                .map(|_| true)
                .map_err(|e| NotifyError::SendFailed(e.to_string()))
        })
        .await
        .map_err(|e| NotifyError::SendFailed(e.to_string()))?
    }
}

/// The notifier selected by configuration.
#[derive(Clone, Debug)]
pub enum ConfiguredNotifier {
    Desktop(DesktopNotifyAdapter),
    Slack(SlackNotifyAdapter),
    /// No backend configured; every notice is declined.
    Disabled,
}

#[async_trait]
impl NotifyAdapter for ConfiguredNotifier {
    async fn notify(&self, notice: &RunNotice) -> Result<bool, NotifyError> {
        match self {
            ConfiguredNotifier::Desktop(adapter) => adapter.notify(notice).await,
            ConfiguredNotifier::Slack(adapter) => adapter.notify(notice).await,
            ConfiguredNotifier::Disabled => {
                tracing::debug!(run_id = %notice.run_id, "notifications disabled");
                Ok(false)
            }
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::{format_message, NotifyAdapter, NotifyError, RunNotice};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Recorded notification
    #[derive(Debug, Clone)]
    pub struct NotifyCall {
        pub notice: RunNotice,
        pub message: String,
    }

    struct FakeNotifyState {
        calls: Vec<NotifyCall>,
        fail_with: Option<String>,
    }

    /// Fake notification adapter for testing
    #[derive(Clone)]
    pub struct FakeNotifyAdapter {
        inner: Arc<Mutex<FakeNotifyState>>,
    }

    impl Default for FakeNotifyAdapter {
        fn default() -> Self {
            Self { inner: Arc::new(Mutex::new(FakeNotifyState { calls: Vec::new(), fail_with: None })) }
        }
    }

    impl FakeNotifyAdapter {
        pub fn new() -> Self {
            Self::default()
        }

        /// Make every later call fail (after recording it).
        pub fn fail_with(&self, message: &str) {
            self.inner.lock().fail_with = Some(message.to_string());
        }

        /// Get all recorded notifications
        pub fn calls(&self) -> Vec<NotifyCall> {
            self.inner.lock().calls.clone()
        }
    }

    #[async_trait]
    impl NotifyAdapter for FakeNotifyAdapter {
        async fn notify(&self, notice: &RunNotice) -> Result<bool, NotifyError> {
            let mut inner = self.inner.lock();
            inner.calls.push(NotifyCall { notice: notice.clone(), message: format_message(notice) });
            match &inner.fail_with {
                Some(message) => Err(NotifyError::SendFailed(message.clone())),
                None => Ok(true),
            }
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeNotifyAdapter, NotifyCall};

#[cfg(test)]
#[path = "notify_tests.rs"]
mod tests;
