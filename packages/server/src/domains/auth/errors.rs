use ledger::HandlerError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("username not allowed: {0}")]
    UsernameNotAllowed(String),

    #[error("user already exists: {0}")]
    UserExists(String),

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("user not found")]
    UserNotFound,

    #[error("password reset expired")]
    PasswordResetExpired,

    #[error("session not found")]
    SessionNotFound,
}

impl From<AuthError> for HandlerError {
    fn from(err: AuthError) -> Self {
        HandlerError::rejected(err)
    }
}
