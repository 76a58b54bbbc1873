use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::Comment;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SubmissionPreview {
    pub title: Option<String>,
    pub image_url: Option<String>,
    pub metadata: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Submission {
    pub item_id: String,
    pub submitter: String,
    pub url: String,
    pub title: String,
    pub submitted_at: DateTime<Utc>,
    pub preview: Option<SubmissionPreview>,
    pub hidden: bool,
    pub vote_count: usize,
    pub score: f64,
    pub comment_count: usize,
    pub comments: Vec<Comment>,
    /// Only meaningful in a query answered for a specific viewer
    pub viewer_has_voted: bool,
}

impl Submission {
    /// Every comment in the forest, depth-first.
    pub fn all_comments(&self) -> impl Iterator<Item = &Comment> + '_ {
        self.comments.iter().flat_map(|comment| comment.walk())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vote {
    pub by: String,
    pub item_id: String,
    pub at: DateTime<Utc>,
}
