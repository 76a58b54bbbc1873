use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use ledger::{Consumer, PersistedCommand};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::common::{Command, CommonsApp};
use crate::domains::auth::queries::FindUserByEmail;
use crate::domains::email::commands::QueueEmail;
use crate::kernel::ServerDeps;

use super::pending::PendingLinks;

pub const PASSWORD_RESET_TEMPLATE: &str = "password-reset";

/// Emails a reset link for every fresh `RequestPasswordReset`.
pub struct PasswordResetMailer {
    app: Arc<CommonsApp>,
    deps: ServerDeps,
    pending: PendingLinks,
}

impl PasswordResetMailer {
    pub fn new(app: Arc<CommonsApp>, deps: ServerDeps) -> Self {
        Self {
            app,
            deps,
            pending: PendingLinks::new(),
        }
    }

    pub fn pending(&self) -> &PendingLinks {
        &self.pending
    }

    async fn send(&self, email: &str, secret: &str) -> Result<()> {
        let Some(user) = self
            .app
            .ask(FindUserByEmail {
                email: email.to_string(),
            })
            .await?
        else {
            debug!(email = %email, "no user for password reset, dropping");
            return Ok(());
        };

        let mut data = Map::new();
        data.insert("name".into(), user.username.clone().into());
        data.insert("action_url".into(), self.deps.link(&["reset-password", secret], &[]).into());

        self.app
            .handle_command(
                QueueEmail {
                    internal_id: self.deps.ids.new_id(),
                    recipients: email.to_string(),
                    subject: String::new(),
                    template: PASSWORD_RESET_TEMPLATE.to_string(),
                    template_data: data,
                }
                .into(),
            )
            .await?;
        info!(username = %user.username, "password reset email queued");
        Ok(())
    }
}

#[async_trait]
impl Consumer<Command> for PasswordResetMailer {
    fn name(&self) -> &'static str {
        "password_reset"
    }

    async fn observe(&mut self, entry: &PersistedCommand<Command>) -> Result<()> {
        match &entry.message {
            Command::RequestPasswordReset(request) => {
                let now = self.deps.clock.now();
                self.pending
                    .stage(&request.email, &request.token, request.requested_at, now);
            }
            Command::ResetPassword(reset) => self.pending.unstage(&reset.token),
            Command::QueueEmail(queue) if queue.template == PASSWORD_RESET_TEMPLATE => {
                if let Some(url) = queue.template_data.get("action_url").and_then(Value::as_str) {
                    self.pending.unstage_action_url(url);
                }
            }
            _ => {}
        }
        Ok(())
    }

    async fn tick(&mut self) -> Result<()> {
        for (email, token) in self.pending.take() {
            if let Err(e) = self.send(&email, &token).await {
                warn!(email = %email, error = %e, "failed to queue password reset email");
            }
        }
        Ok(())
    }
}
