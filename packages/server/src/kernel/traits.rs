// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// Domain modules and consumers take them through ServerDeps.
//
// Naming convention: Base* for trait names (e.g., BaseEmailSender, BaseClock)

use std::collections::BTreeMap;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Clock and ID Generation
// =============================================================================

pub trait BaseClock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub trait BaseIdGenerator: Send + Sync {
    /// A fresh, globally unique identifier (session ids, tokens, magic links)
    fn new_id(&self) -> String;
}

// =============================================================================
// Password Hashing
// =============================================================================

/// Opaque, salted password hashes. Callers never inspect the hash format.
pub trait BasePasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> Result<String>;

    /// `Ok(false)` on mismatch; `Err` only when the stored hash is unreadable.
    fn verify(&self, password: &str, hash: &str) -> Result<bool>;
}

// =============================================================================
// Markdown Rendering
// =============================================================================

/// Markdown to HTML that is safe to embed in a page.
pub trait BaseMarkdownRenderer: Send + Sync {
    fn render(&self, markdown: &str) -> String;
}

// =============================================================================
// Email Transport
// =============================================================================

/// One outbound message as handed to a transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundEmail {
    pub internal_id: String,
    pub recipients: String,
    pub subject: String,
    pub template: String,
    pub template_data: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailReceipt {
    /// Transport-assigned message id, when the transport provides one
    pub external_message_id: Option<String>,
}

#[async_trait]
pub trait BaseEmailSender: Send + Sync {
    async fn send(&self, email: &OutboundEmail) -> Result<EmailReceipt>;
}

// =============================================================================
// Link Previews
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkPreview {
    pub title: Option<String>,
    pub image_url: Option<String>,
    /// Remaining OpenGraph / meta properties, e.g. `og:description`
    pub metadata: BTreeMap<String, String>,
}

#[async_trait]
pub trait BasePreviewFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<LinkPreview>;
}
