use ledger::HandlerError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmailError {
    #[error("missing internal id")]
    MissingInternalId,

    #[error("missing recipients")]
    MissingRecipients,

    #[error("missing template")]
    MissingTemplate,
}

impl From<EmailError> for HandlerError {
    fn from(err: EmailError) -> Self {
        HandlerError::rejected(err)
    }
}
