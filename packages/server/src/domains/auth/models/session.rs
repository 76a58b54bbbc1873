use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// How long a login lasts, in hours.
pub const SESSION_HOURS: i64 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub id: String,
    pub username: String,
    pub active_from: DateTime<Utc>,
    pub active_to: DateTime<Utc>,
}

impl Session {
    pub fn open(id: &str, username: &str, at: DateTime<Utc>) -> Self {
        Self {
            id: id.to_string(),
            username: username.to_string(),
            active_from: at,
            active_to: at + Duration::hours(SESSION_HOURS),
        }
    }

    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.active_from <= now && now < self.active_to
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_active_for_one_hour() {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let session = Session::open("s-1", "alice", start);

        assert!(!session.is_active(start - Duration::seconds(1)));
        assert!(session.is_active(start));
        assert!(session.is_active(start + Duration::minutes(59)));
        assert!(!session.is_active(start + Duration::hours(1)));
    }
}
