//! User-facing notifications produced by the invalidation router.

use std::time::Duration;
use tracing::{error, info, warn};

/// How prominently a notification should be rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Warning,
    Failure,
}

/// A user-facing notification.
///
/// Failures carry a longer display duration than successes so they are not
/// missed.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub title: String,
    pub message: String,
    pub severity: Severity,
    pub duration: Duration,
}

/// Display duration for success notifications.
pub const SUCCESS_DURATION: Duration = Duration::from_secs(5);

/// Display duration for warning notifications.
pub const WARNING_DURATION: Duration = Duration::from_secs(8);

/// Display duration for failure notifications.
pub const FAILURE_DURATION: Duration = Duration::from_secs(10);

impl Notification {
    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            severity: Severity::Success,
            duration: SUCCESS_DURATION,
        }
    }

    pub fn warning(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            severity: Severity::Warning,
            duration: WARNING_DURATION,
        }
    }

    pub fn failure(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            severity: Severity::Failure,
            duration: FAILURE_DURATION,
        }
    }
}

/// Receiver of user-facing notifications.
///
/// Publishing is fire-and-forget and must not fail; sinks that forward to
/// fallible channels handle their own errors.
pub trait NotificationSink: Send + Sync + 'static {
    fn publish(&self, notification: Notification);
}

/// Sink that emits notifications as structured log events.
///
/// Used by the headless console, which has no toast surface to render on.
#[derive(Debug, Clone, Default)]
pub struct TracingSink;

impl TracingSink {
    pub fn new() -> Self {
        Self
    }
}

impl NotificationSink for TracingSink {
    fn publish(&self, notification: Notification) {
        match notification.severity {
            Severity::Success => info!(
                title = notification.title,
                "{}", notification.message
            ),
            Severity::Warning => warn!(
                title = notification.title,
                "{}", notification.message
            ),
            Severity::Failure => error!(
                title = notification.title,
                "{}", notification.message
            ),
        }
    }
}
