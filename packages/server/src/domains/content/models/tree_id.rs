use std::fmt;

use serde::{Deserialize, Serialize};

/// Address of a node in a submission's comment forest.
///
/// Segment 0 is the submission's item id; each later segment is a decimal
/// index into the sibling list one level down. Written with `/` separators:
/// `post-1` is the submission, `post-1/0` its first comment, `post-1/0/2` the
/// third reply to that comment.
///
/// Comments are append-only, so an index, once assigned, never changes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct TreeId(Vec<String>);

impl TreeId {
    pub const SEPARATOR: char = '/';

    /// Parse the `/`-separated form. Empty input gives the empty id.
    pub fn new(path: &str) -> Self {
        if path.is_empty() {
            return Self::default();
        }
        Self(path.split(Self::SEPARATOR).map(str::to_string).collect())
    }

    pub fn root(item_id: impl Into<String>) -> Self {
        Self(vec![item_id.into()])
    }

    /// The id of the `index`-th child of this node.
    pub fn child(&self, index: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(index.to_string());
        Self(segments)
    }

    /// The submission this node belongs to.
    pub fn item_id(&self) -> &str {
        self.0.first().map(String::as_str).unwrap_or("")
    }

    /// Sibling indices below the submission, or `None` if any is not a number.
    pub fn indices(&self) -> Option<Vec<usize>> {
        self.0.iter().skip(1).map(|segment| segment.parse().ok()).collect()
    }

    /// `None` for a submission or the empty id.
    pub fn parent(&self) -> Option<Self> {
        if self.0.len() < 2 {
            return None;
        }
        Some(Self(self.0[..self.0.len() - 1].to_vec()))
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty() || self.item_id().is_empty()
    }

    /// True when this addresses a submission rather than a comment.
    pub fn is_submission(&self) -> bool {
        self.0.len() == 1
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for TreeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("/"))
    }
}

impl From<String> for TreeId {
    fn from(path: String) -> Self {
        Self::new(&path)
    }
}

impl From<&str> for TreeId {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<TreeId> for String {
    fn from(id: TreeId) -> Self {
        id.to_string()
    }
}
