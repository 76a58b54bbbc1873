//! Server dependencies for modules, consumers and the shell (using traits for testability)
//!
//! This module provides the central dependency container. All external
//! services use trait abstractions so tests can swap in mocks.

use std::sync::Arc;

use anyhow::{Context, Result};
use url::Url;

use crate::config::Config;
use crate::kernel::{
    BaseClock, BaseEmailSender, BaseIdGenerator, BaseMarkdownRenderer, BasePasswordHasher,
    BasePreviewFetcher, BcryptPasswordHasher, CommentMarkdownRenderer, FlakyEmailSender,
    HttpPreviewFetcher, LoggingEmailSender, SystemClock, UuidGenerator,
};

#[derive(Clone)]
pub struct ServerDeps {
    pub clock: Arc<dyn BaseClock>,
    pub ids: Arc<dyn BaseIdGenerator>,
    pub password_hasher: Arc<dyn BasePasswordHasher>,
    pub markdown: Arc<dyn BaseMarkdownRenderer>,
    pub email_sender: Arc<dyn BaseEmailSender>,
    pub preview_fetcher: Arc<dyn BasePreviewFetcher>,
    /// Public root used to build links in outgoing email
    pub base_url: Url,
}

impl ServerDeps {
    pub fn new(
        clock: Arc<dyn BaseClock>,
        ids: Arc<dyn BaseIdGenerator>,
        password_hasher: Arc<dyn BasePasswordHasher>,
        markdown: Arc<dyn BaseMarkdownRenderer>,
        email_sender: Arc<dyn BaseEmailSender>,
        preview_fetcher: Arc<dyn BasePreviewFetcher>,
        base_url: Url,
    ) -> Self {
        Self {
            clock,
            ids,
            password_hasher,
            markdown,
            email_sender,
            preview_fetcher,
            base_url,
        }
    }

    /// Production adapters, configured from `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .with_context(|| format!("COMMONS_BASE_URL is not a valid url: {}", config.base_url))?;

        let mut email_sender: Arc<dyn BaseEmailSender> = Arc::new(LoggingEmailSender);
        if let Some(rate) = config.email_failure_rate {
            email_sender = Arc::new(FlakyEmailSender::new(email_sender, rate));
        }

        Ok(Self::new(
            Arc::new(SystemClock),
            Arc::new(UuidGenerator),
            Arc::new(BcryptPasswordHasher::new(config.bcrypt_cost)),
            Arc::new(CommentMarkdownRenderer),
            email_sender,
            Arc::new(HttpPreviewFetcher::new()?),
            base_url,
        ))
    }

    /// `<base_url>/<segments...>` with an optional query string.
    pub fn link(&self, segments: &[&str], query: &[(&str, &str)]) -> String {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        url.to_string()
    }
}
