//! Structured error types for the ledger.
//!
//! Three layers, each pattern-matchable:
//! - [`LedgerError`] covers storage and decoding of log entries.
//! - [`HandlerError`] is what a [`Module`](crate::Module) returns.
//!   `NotAccepted` is a routing signal, not a failure.
//! - [`DispatchError`] is raised by the [`App`](crate::App) when no module
//!   takes a command or query.
//!
//! # The Error Boundary Rule
//!
//! The `App` returns `anyhow::Error` with operation context attached. The
//! typed error underneath is never replaced, so callers compare kinds with
//! `downcast_ref` instead of matching on message text.
//!
//! ```ignore
//! use ledger::DispatchError;
//!
//! match app.handle_command(cmd).await {
//!     Ok(id) => println!("appended as {id}"),
//!     Err(e) => {
//!         if let Some(DispatchError::CommandNotAccepted { kind }) = e.downcast_ref() {
//!             eprintln!("nobody handles {kind}");
//!         } else if let Some(content) = e.downcast_ref::<ContentError>() {
//!             eprintln!("validation failed: {content}");
//!         }
//!     }
//! }
//! ```

use thiserror::Error;

/// Errors from the command log and its codec.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The envelope names a kind that is not in the registry.
    #[error("unknown command kind: {0}")]
    UnknownCommandKind(String),

    /// The envelope was readable but its payload did not fit the kind.
    #[error("invalid payload for {kind}: {source}")]
    InvalidPayload {
        kind: String,
        #[source]
        source: serde_json::Error,
    },

    /// The stored text is not a `{"type": .., "message": ..}` envelope.
    #[error("malformed command envelope: {0}")]
    MalformedEnvelope(#[source] serde_json::Error),

    #[error("failed to encode {kind}: {source}")]
    Encode {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// A stored row could not be decoded. Fatal to the stream that hit it.
    #[error("failed to decode command {id}: {source}")]
    Decode {
        id: u64,
        #[source]
        source: Box<LedgerError>,
    },

    /// A revision targeted an id that was never assigned.
    #[error("unknown command id: {0}")]
    UnknownCommandId(u64),

    /// Storage backend failed (I/O, connection, constraint).
    #[error("storage backend error: {0}")]
    Backend(anyhow::Error),
}

impl From<anyhow::Error> for LedgerError {
    fn from(err: anyhow::Error) -> Self {
        LedgerError::Backend(err)
    }
}

#[cfg(feature = "sqlite")]
impl From<sqlx::Error> for LedgerError {
    fn from(err: sqlx::Error) -> Self {
        LedgerError::Backend(anyhow::Error::new(err))
    }
}

/// Outcome of a module declining or failing a command or query.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The module does not handle this kind. The dispatcher tries the next one.
    #[error("not accepted")]
    NotAccepted,

    /// The module handles this kind and refused it.
    #[error(transparent)]
    Rejected(#[from] anyhow::Error),
}

impl HandlerError {
    /// Wrap a typed domain error as a rejection.
    pub fn rejected<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        HandlerError::Rejected(anyhow::Error::new(err))
    }

    pub fn is_not_accepted(&self) -> bool {
        matches!(self, HandlerError::NotAccepted)
    }
}

/// Routing failures raised by the dispatcher itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// No mounted module accepted the command. It was not appended.
    #[error("command {kind} was not accepted by any module")]
    CommandNotAccepted { kind: String },

    /// No mounted module accepted the query.
    #[error("query {kind} was not accepted by any module")]
    QueryNotAccepted { kind: String },

    /// A module answered a typed query with a result of the wrong shape.
    #[error("query {kind} produced an unexpected result")]
    UnexpectedResult { kind: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("too short")]
    struct TooShort;

    #[test]
    fn test_rejected_keeps_domain_error_reachable() {
        let err = HandlerError::rejected(TooShort);
        match err {
            HandlerError::Rejected(inner) => {
                let inner = inner.context("handling PostComment");
                assert!(inner.downcast_ref::<TooShort>().is_some());
            }
            HandlerError::NotAccepted => panic!("expected a rejection"),
        }
    }

    #[test]
    fn test_dispatch_error_survives_context() {
        let err: anyhow::Error = DispatchError::QueryNotAccepted {
            kind: "FindSession".into(),
        }
        .into();
        let err = err.context("building GetFrontpage");

        assert_eq!(
            err.downcast_ref::<DispatchError>(),
            Some(&DispatchError::QueryNotAccepted {
                kind: "FindSession".into()
            })
        );
    }

    #[test]
    fn test_decode_error_names_the_row() {
        let inner = LedgerError::UnknownCommandKind("Teleport".into());
        let err = LedgerError::Decode {
            id: 7,
            source: Box::new(inner),
        };
        assert_eq!(
            err.to_string(),
            "failed to decode command 7: unknown command kind: Teleport"
        );
    }
}
