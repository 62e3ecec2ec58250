// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Slack `chat.postMessage` notifier.

use crate::notify::{format_message, NotifyAdapter, NotifyError, RunNotice};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const SLACK_POST_MESSAGE_URL: &str = "https://slack.com/api/chat.postMessage";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Serialize)]
struct PostMessage<'a> {
    channel: &'a str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct PostMessageResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Clone, Debug)]
pub struct SlackNotifyAdapter {
    client: Client,
    token: String,
    channel: String,
    endpoint: String,
}

impl SlackNotifyAdapter {
    pub fn new(token: impl Into<String>, channel: impl Into<String>) -> Result<Self, NotifyError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            token: token.into(),
            channel: channel.into(),
            endpoint: SLACK_POST_MESSAGE_URL.to_string(),
        })
    }

    /// Post somewhere other than slack.com (a proxy or a test server).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }
}

/// Slack answers 200 with `{"ok": false, "error": "..."}` for most failures.
fn delivered(status_ok: bool, body: &str) -> Result<bool, NotifyError> {
    let response: PostMessageResponse = serde_json::from_str(body)
        .map_err(|e| NotifyError::SendFailed(format!("unexpected slack response: {e}")))?;
    if let Some(error) = response.error.as_deref().filter(|_| !response.ok) {
        tracing::warn!(error, "slack declined message");
    }
    Ok(status_ok && response.ok)
}

#[async_trait]
impl NotifyAdapter for SlackNotifyAdapter {
    async fn notify(&self, notice: &RunNotice) -> Result<bool, NotifyError> {
        let text = format_message(notice);
        let body = PostMessage { channel: &self.channel, text: &text };
        tracing::info!(channel = %self.channel, run_id = %notice.run_id, "posting slack notification");

        let response = self.client.post(&self.endpoint).bearer_auth(&self.token).json(&body).send().await?;
        let status_ok = response.status().is_success();
        let body = response.text().await?;
        delivered(status_ok, &body)
    }
}

#[cfg(test)]
#[path = "slack_tests.rs"]
mod tests;
