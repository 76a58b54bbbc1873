use std::fmt;

/// Template name of every email the notifier queues.
pub const NOTIFICATION_TEMPLATE: &str = "content-notification";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationEvent {
    NewSubmission,
    NewComment,
}

impl NotificationEvent {
    /// The command kind that caused it.
    pub fn trigger(&self) -> &'static str {
        match self {
            NotificationEvent::NewSubmission => "PostLink",
            NotificationEvent::NewComment => "PostComment",
        }
    }

    pub fn entity(&self) -> &'static str {
        match self {
            NotificationEvent::NewSubmission => "submission",
            NotificationEvent::NewComment => "comment",
        }
    }
}

/// One pending email to one recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledNotification {
    /// Item id of a new submission, or the path a new comment replied to
    pub about: String,
    pub recipient: String,
    pub event: NotificationEvent,
}

impl ScheduledNotification {
    /// `about:recipient`. Also the internal id of the email it becomes.
    pub fn id(&self) -> String {
        notification_id(&self.about, &self.recipient)
    }
}

pub fn notification_id(about: &str, recipient: &str) -> String {
    format!("{}:{}", about, recipient)
}

impl fmt::Display for ScheduledNotification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} about {} ({})", self.recipient, self.about, self.event.trigger())
    }
}
