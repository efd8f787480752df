//! Notification broadcaster for transient user-facing messages.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Severity of a notification.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Success,
    Info,
    Error,
}

impl std::fmt::Display for NotificationLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationLevel::Success => write!(f, "success"),
            NotificationLevel::Info => write!(f, "info"),
            NotificationLevel::Error => write!(f, "error"),
        }
    }
}

/// A transient message shown to the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl Notification {
    pub fn new(level: NotificationLevel, message: &str) -> Self {
        Self {
            level,
            message: message.to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// Broadcasts notifications to every subscriber.
#[derive(Clone)]
pub struct Notifier {
    sender: Arc<broadcast::Sender<Notification>>,
}

impl Notifier {
    /// Creates a new notifier with the specified channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn send(&self, notification: Notification) {
        tracing::debug!(level = %notification.level, "{}", notification.message);
        // Ignore errors - no active receivers is fine
        let _ = self.sender.send(notification);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    pub fn success(&self, message: &str) {
        self.send(Notification::new(NotificationLevel::Success, message));
    }

    pub fn info(&self, message: &str) {
        self.send(Notification::new(NotificationLevel::Info, message));
    }

    pub fn error(&self, message: &str) {
        self.send(Notification::new(NotificationLevel::Error, message));
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(100)
    }
}
