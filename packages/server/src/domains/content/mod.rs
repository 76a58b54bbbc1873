//! Content domain - submissions, threaded comments, votes and subscriptions
//!
//! Responsibilities:
//! - Validating and applying link posts, comments and upvotes
//! - Tree addressing of the comment forest (see [`TreeId`])
//! - Time-decayed frontpage ranking
//! - Hide/unhide moderation
//! - Link previews, fetched in the background by [`PreviewGenerator`]
//! - Per-user notification scope settings

pub mod commands;
pub mod errors;
pub mod models;
pub mod module;
pub mod preview_generator;
pub mod queries;
pub mod ranking;

pub use errors::ContentError;
pub use models::{Comment, Submission, SubmissionPreview, SubscriptionSettings, TreeId};
pub use module::Content;
pub use preview_generator::PreviewGenerator;
pub use ranking::FRONTPAGE_SIZE;
