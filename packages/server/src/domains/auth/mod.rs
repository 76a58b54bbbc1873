//! Auth domain - users, sessions and the ways to start one
//!
//! Responsibilities:
//! - Sign-up under a configurable username policy
//! - Password and magic-link login, each opening a one hour session
//! - Verified email addresses and password reset tokens
//! - Admin roles
//! - Emailing reset and magic links (the [`PasswordResetMailer`] and
//!   [`MagicLoginMailer`] consumers)
//!
//! Password hashes are opaque here. Hashing happens before a command is
//! built; the module compares stored hashes and answers
//! [`FindUserPasswordHash`](queries::FindUserPasswordHash) through the
//! injected hasher.

pub mod commands;
pub mod errors;
pub mod magic_login;
pub mod models;
pub mod module;
pub mod password_reset;
pub mod pending;
pub mod queries;

pub use errors::AuthError;
pub use magic_login::{MagicLoginMailer, MAGIC_LINK_TEMPLATE};
pub use models::{Session, User, UserRole, UsernamePolicy};
pub use module::Auth;
pub use password_reset::{PasswordResetMailer, PASSWORD_RESET_TEMPLATE};
