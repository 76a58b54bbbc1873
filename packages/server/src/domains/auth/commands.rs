use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignUpUser {
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Opens a session when `password_hash` matches the stored hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogInUser {
    pub username: String,
    pub password_hash: String,
    pub session_id: String,
    pub attempted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeUsernamePolicy {
    pub min_length: usize,
    pub max_length: usize,
    #[serde(default)]
    pub blacklist: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkVerifiedEmailToUser {
    pub username: String,
    pub email: String,
    pub linked_at: DateTime<Utc>,
}

/// Replaces the admin set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetAdminUsers {
    pub usernames: Vec<String>,
}

/// Replaces the set of email domains whose owners may sign up by magic link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetMagicDomains {
    pub domains: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestMagicLinkLogin {
    pub email: String,
    pub magic: String,
    pub requested_at: DateTime<Utc>,
}

impl RequestMagicLinkLogin {
    /// The part of the email before `@`.
    pub fn username_from_email(&self) -> &str {
        self.email.split('@').next().unwrap_or_default()
    }

    pub fn domain(&self) -> Option<&str> {
        self.email.rsplit_once('@').map(|(_, domain)| domain)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogInWithMagic {
    pub session_id: String,
    pub magic: String,
    pub attempted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestPasswordReset {
    pub username: String,
    pub email: String,
    pub token: String,
    pub requested_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResetPassword {
    pub token: String,
    pub new_password_hash: String,
    pub attempted_at: DateTime<Utc>,
}
