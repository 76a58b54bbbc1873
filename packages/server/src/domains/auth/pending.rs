use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};

/// Requests older than this are never emailed, even on a fresh replay.
pub const PENDING_WINDOW_HOURS: i64 = 1;

/// Emailed secrets (reset tokens, magic links) waiting to go out, keyed by
/// recipient address. A newer request for the same address replaces the
/// older one.
#[derive(Debug, Default)]
pub struct PendingLinks {
    by_email: BTreeMap<String, String>,
}

impl PendingLinks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage `secret` for `email` if it was requested inside the window
    /// ending at `now`.
    pub fn stage(&mut self, email: &str, secret: &str, requested_at: DateTime<Utc>, now: DateTime<Utc>) {
        if requested_at > now - Duration::hours(PENDING_WINDOW_HOURS) {
            self.by_email.insert(email.to_string(), secret.to_string());
        }
    }

    pub fn unstage(&mut self, secret: &str) {
        self.by_email.retain(|_, pending| pending != secret);
    }

    /// Unstage the secret an already queued email links to: the last path
    /// segment of its action url.
    pub fn unstage_action_url(&mut self, action_url: &str) {
        if let Some(secret) = action_url.rsplit('/').next().filter(|s| !s.is_empty()) {
            self.unstage(secret);
        }
    }

    pub fn take(&mut self) -> BTreeMap<String, String> {
        std::mem::take(&mut self.by_email)
    }

    pub fn len(&self) -> usize {
        self.by_email.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_email.is_empty()
    }

    pub fn get(&self, email: &str) -> Option<&str> {
        self.by_email.get(email).map(String::as_str)
    }
}
