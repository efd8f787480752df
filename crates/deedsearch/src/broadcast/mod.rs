//! Broadcasting modules for user-visible events.
//!
//! Notifications are fanned out on a tokio broadcast channel so any host
//! (CLI, desktop shell, tests) can render them as toasts or log lines.

pub mod notifications;

pub use notifications::{Notification, NotificationLevel, Notifier};
