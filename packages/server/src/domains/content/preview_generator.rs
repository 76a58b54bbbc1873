use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use ledger::{Consumer, PersistedCommand};
use tracing::{info, warn};

use crate::common::{Command, CommonsApp};
use crate::kernel::ServerDeps;

use super::commands::SetSubmissionPreview;

/// Previews younger than this are not fetched again.
pub const PREVIEW_MAX_AGE_DAYS: i64 = 7;

/// Fetches a link preview for every new submission.
pub struct PreviewGenerator {
    app: Arc<CommonsApp>,
    deps: ServerDeps,
    /// item id -> url
    pending: BTreeMap<String, String>,
    generated: HashMap<String, DateTime<Utc>>,
}

impl PreviewGenerator {
    pub fn new(app: Arc<CommonsApp>, deps: ServerDeps) -> Self {
        Self {
            app,
            deps,
            pending: BTreeMap::new(),
            generated: HashMap::new(),
        }
    }

    pub fn pending(&self) -> Vec<&str> {
        self.pending.keys().map(String::as_str).collect()
    }

    fn is_fresh(&self, item_id: &str) -> bool {
        let cutoff = self.deps.clock.now() - Duration::days(PREVIEW_MAX_AGE_DAYS);
        self.generated
            .get(item_id)
            .map_or(false, |generated_at| *generated_at > cutoff)
    }

    async fn generate(&self, item_id: &str, url: &str) -> Result<()> {
        let preview = self
            .deps
            .preview_fetcher
            .fetch(url)
            .await
            .context("fetching preview")?;

        self.app
            .handle_command(
                SetSubmissionPreview {
                    item_id: item_id.to_string(),
                    extracted_title: preview.title,
                    image_url: preview.image_url,
                    metadata: preview.metadata,
                    generated_at: self.deps.clock.now(),
                }
                .into(),
            )
            .await?;
        info!(item_id = %item_id, "preview stored");
        Ok(())
    }
}

#[async_trait]
impl Consumer<Command> for PreviewGenerator {
    fn name(&self) -> &'static str {
        "preview_generator"
    }

    async fn observe(&mut self, entry: &PersistedCommand<Command>) -> Result<()> {
        match &entry.message {
            Command::PostLink(post) if !self.is_fresh(&post.item_id) => {
                self.pending.insert(post.item_id.clone(), post.url.clone());
            }
            Command::SetSubmissionPreview(preview) => {
                self.generated.insert(preview.item_id.clone(), preview.generated_at);
                self.pending.remove(&preview.item_id);
            }
            _ => {}
        }
        Ok(())
    }

    async fn tick(&mut self) -> Result<()> {
        for (item_id, url) in std::mem::take(&mut self.pending) {
            if let Err(e) = self.generate(&item_id, &url).await {
                warn!(item_id = %item_id, url = %url, error = %e, "preview generation failed, dropping");
            }
        }
        Ok(())
    }
}
