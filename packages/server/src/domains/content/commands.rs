//! Content commands. Each is one variant of the logged `Command` sum type.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::models::TreeId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostLink {
    pub item_id: String,
    pub submitter: String,
    pub url: String,
    pub title: String,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostComment {
    /// The submission or comment being replied to
    pub parent: TreeId,
    pub author: String,
    pub content: String,
    pub posted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpvoteSubmission {
    pub item_id: String,
    pub voter: String,
    pub voted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HideSubmission {
    pub item_id: String,
    pub hidden_by: String,
    pub hidden_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnhideSubmission {
    pub item_id: String,
    pub unhidden_by: String,
    pub unhidden_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HideComment {
    pub comment_id: TreeId,
    pub hidden_by: String,
    pub hidden_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnhideComment {
    pub comment_id: TreeId,
    pub unhidden_by: String,
    pub unhidden_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetSubmissionPreview {
    pub item_id: String,
    pub extracted_title: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnableSubscriptions {
    pub username: String,
    pub scopes: Vec<String>,
    pub enabled_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisableSubscriptions {
    pub username: String,
    pub scopes: Vec<String>,
    pub disabled_at: DateTime<Utc>,
}

/// Turns notification delivery on or off. Read by the notifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetNotifierConfig {
    pub enabled: bool,
    pub changed_at: DateTime<Utc>,
}
