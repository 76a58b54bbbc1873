use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use ledger::{Consumer, PersistedCommand};
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};

use crate::common::{Command, CommonsApp};
use crate::domains::auth::queries::FindUserByName;
use crate::domains::content::queries::{
    FindSubmission, FindSubscribersForNewComment, FindSubscribersForNewSubmission,
};
use crate::domains::content::TreeId;
use crate::domains::email::commands::QueueEmail;
use crate::kernel::ServerDeps;

use super::models::{notification_id, NotificationEvent, ScheduledNotification, NOTIFICATION_TEMPLATE};

pub struct Notifier {
    app: Arc<CommonsApp>,
    deps: ServerDeps,
    scheduled: BTreeMap<String, ScheduledNotification>,
    enabled: bool,
}

impl Notifier {
    pub fn new(app: Arc<CommonsApp>, deps: ServerDeps) -> Self {
        Self {
            app,
            deps,
            scheduled: BTreeMap::new(),
            enabled: true,
        }
    }

    /// Staged notifications, ordered by id.
    pub fn scheduled(&self) -> Vec<&ScheduledNotification> {
        self.scheduled.values().collect()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn stage(&mut self, about: &str, recipients: Vec<String>, event: NotificationEvent) {
        for recipient in recipients {
            let notification = ScheduledNotification {
                about: about.to_string(),
                recipient,
                event,
            };
            debug!(notification = %notification, "notification staged");
            self.scheduled.insert(notification.id(), notification);
        }
    }

    /// Drop whatever `queue` already took care of.
    fn unstage(&mut self, queue: &QueueEmail) {
        if queue.template != NOTIFICATION_TEMPLATE {
            return;
        }

        let about = queue.template_data.get("about").and_then(Value::as_str);
        let name = queue.template_data.get("name").and_then(Value::as_str);
        let id = match (about, name) {
            (Some(about), Some(name)) => notification_id(about, name),
            _ => match queue.internal_id.rsplit_once(':') {
                Some((about, name)) => notification_id(about, name),
                None => return,
            },
        };
        self.scheduled.remove(&id);
    }

    async fn notify(&self, notification: &ScheduledNotification) -> Result<()> {
        let item_id = TreeId::new(&notification.about).item_id().to_string();
        let submission = self
            .app
            .ask(FindSubmission {
                item_id: item_id.clone(),
                viewer: None,
            })
            .await
            .with_context(|| format!("finding submission {}", item_id))?;

        let recipient = self
            .app
            .ask(FindUserByName {
                username: notification.recipient.clone(),
            })
            .await?;
        let Some(email) = recipient.and_then(|user| user.verified_email) else {
            debug!(recipient = %notification.recipient, "no verified email, skipping");
            return Ok(());
        };

        let action_url = self.deps.link(&["item"], &[("id", notification.about.as_str())]);
        let data = json!({
            "about": notification.about,
            "trigger": notification.event.trigger(),
            "name": notification.recipient,
            "title": submission.title,
            "action_url": action_url,
            "entity": notification.event.entity(),
        });
        let template_data: Map<String, Value> = match data {
            Value::Object(map) => map,
            _ => Map::new(),
        };

        self.app
            .handle_command(
                QueueEmail {
                    internal_id: notification.id(),
                    recipients: email,
                    subject: String::new(),
                    template: NOTIFICATION_TEMPLATE.to_string(),
                    template_data,
                }
                .into(),
            )
            .await?;

        info!(notification = %notification, "notification queued");
        Ok(())
    }
}

#[async_trait]
impl Consumer<Command> for Notifier {
    fn name(&self) -> &'static str {
        "notifier"
    }

    async fn observe(&mut self, entry: &PersistedCommand<Command>) -> Result<()> {
        match &entry.message {
            Command::PostLink(post) => {
                let recipients = self.app.ask(FindSubscribersForNewSubmission).await?;
                self.stage(&post.item_id, recipients, NotificationEvent::NewSubmission);
            }
            Command::PostComment(comment) => {
                let recipients = self
                    .app
                    .ask(FindSubscribersForNewComment {
                        parent: comment.parent.clone(),
                    })
                    .await?;
                self.stage(&comment.parent.to_string(), recipients, NotificationEvent::NewComment);
            }
            Command::QueueEmail(queue) => self.unstage(queue),
            Command::SetNotifierConfig(config) => {
                info!(enabled = config.enabled, "notifier configured");
                self.enabled = config.enabled;
            }
            _ => {}
        }
        Ok(())
    }

    async fn tick(&mut self) -> Result<()> {
        if !self.enabled || self.scheduled.is_empty() {
            return Ok(());
        }

        let due: Vec<ScheduledNotification> = self.scheduled.values().cloned().collect();
        for notification in due {
            if let Err(e) = self.notify(&notification).await {
                warn!(notification = %notification, error = %e, "failed to queue notification");
            }
            self.scheduled.remove(&notification.id());
        }
        Ok(())
    }
}
