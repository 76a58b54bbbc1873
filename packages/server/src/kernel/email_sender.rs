//! Email transports.
//!
//! Vendor delivery is out of scope; the default transport writes each
//! message to the log. `FlakyEmailSender` wraps any transport and fails a
//! configurable share of sends, which exercises the outbox retry path.

use std::sync::Arc;

use anyhow::{bail, Result};
use async_trait::async_trait;
use rand::Rng;
use tracing::info;
use uuid::Uuid;

use super::{BaseEmailSender, EmailReceipt, OutboundEmail};

#[derive(Debug, Default)]
pub struct LoggingEmailSender;

#[async_trait]
impl BaseEmailSender for LoggingEmailSender {
    async fn send(&self, email: &OutboundEmail) -> Result<EmailReceipt> {
        let message_id = Uuid::new_v4().to_string();
        info!(
            internal_id = %email.internal_id,
            recipients = %email.recipients,
            template = %email.template,
            message_id = %message_id,
            "email sent"
        );
        Ok(EmailReceipt {
            external_message_id: Some(message_id),
        })
    }
}

pub struct FlakyEmailSender {
    inner: Arc<dyn BaseEmailSender>,
    failure_rate: f64,
}

impl FlakyEmailSender {
    /// `failure_rate` is clamped into `[0, 1]`.
    pub fn new(inner: Arc<dyn BaseEmailSender>, failure_rate: f64) -> Self {
        Self {
            inner,
            failure_rate: failure_rate.clamp(0.0, 1.0),
        }
    }
}

#[async_trait]
impl BaseEmailSender for FlakyEmailSender {
    async fn send(&self, email: &OutboundEmail) -> Result<EmailReceipt> {
        let fail = rand::thread_rng().gen::<f64>() < self.failure_rate;
        if fail {
            bail!("simulated transport failure for {}", email.internal_id);
        }
        self.inner.send(email).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email() -> OutboundEmail {
        OutboundEmail {
            internal_id: "welcome-1".into(),
            recipients: "alice@example.com".into(),
            subject: String::new(),
            template: "welcome".into(),
            template_data: serde_json::Map::new(),
        }
    }

    #[tokio::test]
    async fn test_logging_sender_returns_message_id() {
        let receipt = LoggingEmailSender.send(&email()).await.unwrap();
        assert!(receipt.external_message_id.is_some());
    }

    #[tokio::test]
    async fn test_flaky_sender_extremes() {
        let always = FlakyEmailSender::new(Arc::new(LoggingEmailSender), 1.0);
        let never = FlakyEmailSender::new(Arc::new(LoggingEmailSender), 0.0);

        assert!(always.send(&email()).await.is_err());
        assert!(never.send(&email()).await.is_ok());
    }
}
