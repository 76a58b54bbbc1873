use ledger::HandlerError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContentError {
    #[error("empty title")]
    EmptyTitle,

    #[error("empty url")]
    EmptyUrl,

    #[error("malformed url: {0}")]
    MalformedUrl(String),

    #[error("missing item id")]
    MissingItemId,

    /// Item ids are the first segment of a [`TreeId`](super::TreeId), so they
    /// cannot contain its separator.
    #[error("invalid item id: {0}")]
    InvalidItemId(String),

    #[error("duplicate item id: {0}")]
    DuplicateItemId(String),

    #[error("missing voter")]
    MissingVoter,

    #[error("already voted")]
    AlreadyVoted,

    #[error("comment too long")]
    CommentTooLong,

    #[error("comment too short")]
    CommentTooShort,

    #[error("uncommentable item")]
    UncommentableItem,

    #[error("item not found: {0}")]
    ItemNotFound(String),

    #[error("invalid subscription scope: {0}")]
    InvalidSubscriptionScope(String),
}

impl From<ContentError> for HandlerError {
    fn from(err: ContentError) -> Self {
        HandlerError::rejected(err)
    }
}
