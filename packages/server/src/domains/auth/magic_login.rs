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

pub const MAGIC_LINK_TEMPLATE: &str = "magic-link";

/// Emails a login link for every fresh `RequestMagicLinkLogin`.
pub struct MagicLoginMailer {
    app: Arc<CommonsApp>,
    deps: ServerDeps,
    pending: PendingLinks,
}

impl MagicLoginMailer {
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
            debug!(email = %email, "no user for magic link, dropping");
            return Ok(());
        };

        let mut data = Map::new();
        data.insert("name".into(), user.username.clone().into());
        data.insert("action_url".into(), self.deps.link(&["login", "magic", secret], &[]).into());

        self.app
            .handle_command(
                QueueEmail {
                    internal_id: self.deps.ids.new_id(),
                    recipients: email.to_string(),
                    subject: String::new(),
                    template: MAGIC_LINK_TEMPLATE.to_string(),
                    template_data: data,
                }
                .into(),
            )
            .await?;
        info!(username = %user.username, "magic link email queued");
        Ok(())
    }
}

#[async_trait]
impl Consumer<Command> for MagicLoginMailer {
    fn name(&self) -> &'static str {
        "magic_login"
    }

    async fn observe(&mut self, entry: &PersistedCommand<Command>) -> Result<()> {
        match &entry.message {
            Command::RequestMagicLinkLogin(request) => {
                let now = self.deps.clock.now();
                self.pending
                    .stage(&request.email, &request.magic, request.requested_at, now);
            }
            Command::LogInWithMagic(login) => self.pending.unstage(&login.magic),
            Command::QueueEmail(queue) if queue.template == MAGIC_LINK_TEMPLATE => {
                if let Some(url) = queue.template_data.get("action_url").and_then(Value::as_str) {
                    self.pending.unstage_action_url(url);
                }
            }
            _ => {}
        }
        Ok(())
    }

    async fn tick(&mut self) -> Result<()> {
        for (email, magic) in self.pending.take() {
            if let Err(e) = self.send(&email, &magic).await {
                warn!(email = %email, error = %e, "failed to queue magic link email");
            }
        }
        Ok(())
    }
}
