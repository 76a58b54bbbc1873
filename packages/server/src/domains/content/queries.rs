use super::models::TreeId;

#[derive(Debug, Clone, PartialEq)]
pub struct FindSubmission {
    pub item_id: String,
    /// Sets `viewer_has_voted` on the answer
    pub viewer: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GetFrontpage {
    pub viewer: Option<String>,
    /// Offset into the ranking
    pub after: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FindComment {
    pub id: TreeId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FindSubscribersForNewComment {
    pub parent: TreeId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FindSubscribersForNewSubmission;

#[derive(Debug, Clone, PartialEq)]
pub struct MySubscriptionSettings {
    pub username: String,
}
