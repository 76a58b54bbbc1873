use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShellError {
    /// The `kind` header is neither `command` nor `query`.
    #[error("unknown request kind: {0:?}")]
    UnknownRequestKind(String),

    #[error("missing parameter: {0}")]
    MissingParameter(&'static str),

    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// A builder asked for context no context builder provided.
    #[error("{0} is not in the request context")]
    NotInContext(&'static str),
}
