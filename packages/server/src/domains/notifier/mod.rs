//! Notifier - emails subscribers about new submissions and replies
//!
//! Nothing here is persisted. Staged notifications are derived from the log
//! on every catch-up: a `PostLink` or `PostComment` stages one notification
//! per subscriber, and the `QueueEmail` the notifier itself logs when it
//! flushes one unstages it again. A restart replays both and ends up with
//! the same (usually empty) set, so each notification is emailed once.

pub mod consumer;
pub mod models;

pub use consumer::Notifier;
pub use models::{NotificationEvent, ScheduledNotification, NOTIFICATION_TEMPLATE};
