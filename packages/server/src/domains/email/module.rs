use ledger::{Accepted, HandlerError, Module};

use crate::common::{Command, Query, QueryResult};

use super::EmailError;

/// Validates outbox commands. The outbox itself is built by the mailer.
#[derive(Debug, Default)]
pub struct EmailCommands;

impl Module<Command, Query, QueryResult> for EmailCommands {
    fn name(&self) -> &'static str {
        "email"
    }

    fn handle_command(&mut self, command: &Command) -> Result<Accepted<Command>, HandlerError> {
        match command {
            Command::QueueEmail(queue) => {
                if queue.internal_id.is_empty() {
                    return Err(EmailError::MissingInternalId.into());
                }
                if queue.recipients.trim().is_empty() {
                    return Err(EmailError::MissingRecipients.into());
                }
                if queue.template.is_empty() {
                    return Err(EmailError::MissingTemplate.into());
                }
            }
            Command::SetEmailDeliveryStatus(status) => {
                if status.internal_id.is_empty() {
                    return Err(EmailError::MissingInternalId.into());
                }
            }
            _ => return Err(HandlerError::NotAccepted),
        }
        Ok(Accepted::AsIs)
    }
}
