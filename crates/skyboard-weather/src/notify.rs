//! Outbound notifications for transient, dismissable messages.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Positive,
    Negative,
}

/// A single notification as delivered to a sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub severity: Severity,
    pub message: String,
}

/// Receiver for user-facing notifications.
///
/// Called at most once per failure event. Implementations must not block;
/// the caller may be in the middle of a fan-out.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, severity: Severity, message: &str);
}

/// Build "<context>: <detail>", or just the context when there is no detail.
pub fn failure_message(context: &str, detail: Option<String>) -> String {
    match detail {
        Some(detail) if !detail.is_empty() => format!("{}: {}", context, detail),
        _ => context.to_string(),
    }
}

/// Sink that writes notifications to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn notify(&self, severity: Severity, message: &str) {
        match severity {
            Severity::Positive => tracing::info!(target: "skyboard::notify", "{}", message),
            Severity::Negative => tracing::warn!(target: "skyboard::notify", "{}", message),
        }
    }
}

/// Sink that keeps every notification for later display.
#[derive(Debug, Default)]
pub struct CollectingSink {
    received: Mutex<Vec<Notification>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take all notifications received so far, leaving the sink empty.
    pub fn drain(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.received.lock())
    }

    pub fn len(&self) -> usize {
        self.received.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.received.lock().is_empty()
    }
}

impl NotificationSink for CollectingSink {
    fn notify(&self, severity: Severity, message: &str) {
        self.received.lock().push(Notification {
            severity,
            message: message.to_string(),
        });
    }
}
