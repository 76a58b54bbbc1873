use chrono::{DateTime, Utc};
use serde::Serialize;

use super::TreeId;

/// A node in a submission's comment forest.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comment {
    /// This comment's own full address.
    pub path: TreeId,
    pub content: String,
    /// `content` rendered from markdown when the comment was posted
    pub html: String,
    pub author: String,
    pub posted_at: DateTime<Utc>,
    pub hidden: bool,
    pub children: Vec<Comment>,
}

impl Comment {
    /// What this comment replies to: the submission or another comment.
    pub fn parent_path(&self) -> TreeId {
        self.path.parent().unwrap_or_default()
    }

    /// Position among its siblings.
    pub fn index(&self) -> usize {
        self.path
            .indices()
            .and_then(|indices| indices.last().copied())
            .unwrap_or(0)
    }

    /// This comment and every reply below it, depth-first.
    pub fn walk(&self) -> Box<dyn Iterator<Item = &Comment> + '_> {
        Box::new(std::iter::once(self).chain(self.children.iter().flat_map(|child| child.walk())))
    }
}
