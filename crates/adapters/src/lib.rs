// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Adapters for external systems: run notifications.

pub mod notify;
pub mod slack;

pub use notify::{
    format_message, ConfiguredNotifier, DesktopNotifyAdapter, NotifyAdapter, NotifyError, RunNotice,
    LOG_CONTENT_LIMIT,
};
pub use slack::SlackNotifyAdapter;

#[cfg(any(test, feature = "test-support"))]
pub use notify::{FakeNotifyAdapter, NotifyCall};
