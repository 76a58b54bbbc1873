pub mod comment;
pub mod submission;
pub mod subscription;
pub mod tree_id;

pub use comment::Comment;
pub use submission::{Submission, SubmissionPreview, Vote};
pub use subscription::{canonical_scopes, SubscriptionSettings, ALL_SCOPES, SCOPE_REPLIES, SCOPE_SUBMISSIONS};
pub use tree_id::TreeId;
