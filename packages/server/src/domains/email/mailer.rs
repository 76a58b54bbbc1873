use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use ledger::{Consumer, PersistedCommand};
use tracing::{error, info, warn};

use crate::common::{Command, CommonsApp};
use crate::kernel::BaseEmailSender;

use super::commands::SetEmailDeliveryStatus;
use super::models::{DeliveryStatus, Email, Outbox};

/// Failed sends allowed before an email is given up on.
pub const MAX_RETRIES: u32 = 3;

/// Delivers queued email and logs the outcome.
pub struct Mailer {
    app: Arc<CommonsApp>,
    sender: Arc<dyn BaseEmailSender>,
    outbox: Outbox,
}

impl Mailer {
    pub fn new(app: Arc<CommonsApp>, sender: Arc<dyn BaseEmailSender>) -> Self {
        Self {
            app,
            sender,
            outbox: Outbox::new(),
        }
    }

    pub fn outbox(&self) -> &Outbox {
        &self.outbox
    }

    async fn settle(&mut self, email: &Email, status: DeliveryStatus, message: Option<String>) -> Result<()> {
        self.app
            .handle_command(
                SetEmailDeliveryStatus {
                    internal_id: email.internal_id.clone(),
                    status,
                    message: message.clone(),
                }
                .into(),
            )
            .await
            .with_context(|| format!("recording delivery status of {}", email.internal_id))?;

        self.outbox.set_status(&email.internal_id, status, message);
        Ok(())
    }
}

#[async_trait]
impl Consumer<Command> for Mailer {
    fn name(&self) -> &'static str {
        "mailer"
    }

    async fn observe(&mut self, entry: &PersistedCommand<Command>) -> Result<()> {
        match &entry.message {
            Command::QueueEmail(queue) => self.outbox.queue(queue),
            Command::SetEmailDeliveryStatus(update) => {
                self.outbox
                    .set_status(&update.internal_id, update.status, update.message.clone());
            }
            _ => {}
        }
        Ok(())
    }

    async fn tick(&mut self) -> Result<()> {
        let queued: Vec<Email> = self
            .outbox
            .with_status(DeliveryStatus::Queued)
            .into_iter()
            .cloned()
            .collect();

        for email in queued {
            match self.sender.send(&email.outbound()).await {
                Ok(receipt) => {
                    info!(internal_id = %email.internal_id, template = %email.template, "email delivered");
                    self.settle(&email, DeliveryStatus::Delivered, receipt.external_message_id)
                        .await?;
                }
                Err(e) if email.retries < MAX_RETRIES => {
                    let retries = self.outbox.record_failure(&email.internal_id);
                    warn!(internal_id = %email.internal_id, retries, error = %e, "email send failed, will retry");
                }
                Err(e) => {
                    error!(internal_id = %email.internal_id, error = %e, "email send failed, giving up");
                    self.settle(
                        &email,
                        DeliveryStatus::Failed,
                        Some(format!("retries exhausted: {}", e)),
                    )
                    .await?;
                }
            }
        }
        Ok(())
    }
}
