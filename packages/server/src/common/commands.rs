//! The logged command set.
//!
//! Every command any module accepts is one variant of [`Command`]. The enum
//! serializes adjacently tagged, so a log row reads
//! `{"type": "PostLink", "message": {"item_id": "post-1", ...}}`, and the
//! registry built by [`command_registry`] decodes it back by `type`.

use std::sync::Arc;

use ledger::{CommandRegistry, JsonCodec};
use serde::{Deserialize, Serialize};

use crate::domains::auth::commands::{
    ChangeUsernamePolicy, LinkVerifiedEmailToUser, LogInUser, LogInWithMagic,
    RequestMagicLinkLogin, RequestPasswordReset, ResetPassword, SetAdminUsers, SetMagicDomains,
    SignUpUser,
};
use crate::domains::content::commands::{
    DisableSubscriptions, EnableSubscriptions, HideComment, HideSubmission, PostComment, PostLink,
    SetNotifierConfig, SetSubmissionPreview, UnhideComment, UnhideSubmission, UpvoteSubmission,
};
use crate::domains::email::commands::{QueueEmail, SetEmailDeliveryStatus};

macro_rules! commands {
    ($($kind:ident),* $(,)?) => {
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        #[serde(tag = "type", content = "message")]
        pub enum Command {
            /// Accepted and ignored by every module. Voided log entries
            /// read back as this.
            Skip,
            $($kind($kind),)*
        }

        impl ledger::Command for Command {
            fn kind(&self) -> &'static str {
                match self {
                    Command::Skip => "Skip",
                    $(Command::$kind(_) => stringify!($kind),)*
                }
            }

            fn noop() -> Self {
                Command::Skip
            }

            fn is_noop(&self) -> bool {
                matches!(self, Command::Skip)
            }
        }

        $(
            impl From<$kind> for Command {
                fn from(command: $kind) -> Self {
                    Command::$kind(command)
                }
            }
        )*

        /// A registry with a decoder for every command kind.
        pub fn command_registry() -> CommandRegistry<Command> {
            let mut registry = CommandRegistry::new();
            registry.register::<()>("Skip", |()| Command::Skip);
            $(registry.register::<$kind>(stringify!($kind), Command::$kind);)*
            registry
        }
    };
}

commands! {
    // auth
    SignUpUser,
    LogInUser,
    ChangeUsernamePolicy,
    LinkVerifiedEmailToUser,
    SetAdminUsers,
    SetMagicDomains,
    RequestMagicLinkLogin,
    LogInWithMagic,
    RequestPasswordReset,
    ResetPassword,
    // content
    PostLink,
    PostComment,
    UpvoteSubmission,
    HideSubmission,
    UnhideSubmission,
    HideComment,
    UnhideComment,
    SetSubmissionPreview,
    EnableSubscriptions,
    DisableSubscriptions,
    SetNotifierConfig,
    // email
    QueueEmail,
    SetEmailDeliveryStatus,
}

pub fn command_codec() -> JsonCodec<Command> {
    JsonCodec::new(Arc::new(command_registry()))
}
