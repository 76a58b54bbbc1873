//! Kernel module - server infrastructure and dependencies.

pub mod command_log;
pub mod deps;
pub mod email_sender;
pub mod markdown;
pub mod password_hasher;
pub mod preview_fetcher;
pub mod system;
pub mod test_dependencies;
pub mod traits;

pub use command_log::{open_command_log, LogLocation};
pub use deps::ServerDeps;
pub use email_sender::{FlakyEmailSender, LoggingEmailSender};
pub use markdown::CommentMarkdownRenderer;
pub use password_hasher::BcryptPasswordHasher;
pub use preview_fetcher::HttpPreviewFetcher;
pub use system::{SystemClock, UuidGenerator};
pub use test_dependencies::{
    MockClock, MockEmailSender, MockPasswordHasher, MockPreviewFetcher, SequentialIds,
    TestDependencies,
};
pub use traits::*;
