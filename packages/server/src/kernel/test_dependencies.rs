// TestDependencies - mock implementations for testing
//
// Provides mock services that can be injected into ServerDeps for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use url::Url;

use super::{
    BaseClock, BaseEmailSender, BaseIdGenerator, BasePasswordHasher, BasePreviewFetcher,
    CommentMarkdownRenderer, EmailReceipt, LinkPreview, OutboundEmail, ServerDeps,
};

// =============================================================================
// Mock Clock
// =============================================================================

/// A clock that only moves when told to.
pub struct MockClock {
    now: Mutex<DateTime<Utc>>,
}

impl MockClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap() = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap())
    }
}

impl BaseClock for MockClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

// =============================================================================
// Mock ID Generator
// =============================================================================

/// Hands out `id-1`, `id-2`, ...
#[derive(Default)]
pub struct SequentialIds {
    next: AtomicU64,
}

impl BaseIdGenerator for SequentialIds {
    fn new_id(&self) -> String {
        format!("id-{}", self.next.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

// =============================================================================
// Mock Password Hasher
// =============================================================================

/// Deterministic, unsalted. Fast enough to use in every test.
#[derive(Default)]
pub struct MockPasswordHasher;

impl BasePasswordHasher for MockPasswordHasher {
    fn hash(&self, password: &str) -> Result<String> {
        Ok(format!("hashed:{}", password))
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool> {
        Ok(hash == format!("hashed:{}", password))
    }
}

// =============================================================================
// Mock Email Sender
// =============================================================================

pub struct MockEmailSender {
    sent: Mutex<Vec<OutboundEmail>>,
    attempts: Mutex<Vec<String>>,
    failures_left: Mutex<Option<usize>>,
}

impl MockEmailSender {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            attempts: Mutex::new(Vec::new()),
            failures_left: Mutex::new(Some(0)),
        }
    }

    /// Fail every send.
    pub fn failing() -> Self {
        let sender = Self::new();
        *sender.failures_left.lock().unwrap() = None;
        sender
    }

    /// Fail the next `n` sends, then succeed.
    pub fn failing_times(n: usize) -> Self {
        let sender = Self::new();
        *sender.failures_left.lock().unwrap() = Some(n);
        sender
    }

    /// Successfully delivered emails, in order.
    pub fn sent(&self) -> Vec<OutboundEmail> {
        self.sent.lock().unwrap().clone()
    }

    /// Internal ids of every attempted send, failed or not.
    pub fn attempts(&self) -> Vec<String> {
        self.attempts.lock().unwrap().clone()
    }
}

impl Default for MockEmailSender {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseEmailSender for MockEmailSender {
    async fn send(&self, email: &OutboundEmail) -> Result<EmailReceipt> {
        self.attempts.lock().unwrap().push(email.internal_id.clone());

        let fail = {
            let mut failures_left = self.failures_left.lock().unwrap();
            match failures_left.as_mut() {
                None => true,
                Some(0) => false,
                Some(n) => {
                    *n -= 1;
                    true
                }
            }
        };
        if fail {
            return Err(anyhow!("mock transport is down"));
        }

        let mut sent = self.sent.lock().unwrap();
        sent.push(email.clone());
        Ok(EmailReceipt {
            external_message_id: Some(format!("mock-{}", sent.len())),
        })
    }
}

// =============================================================================
// Mock Preview Fetcher
// =============================================================================

pub struct MockPreviewFetcher {
    previews: Mutex<HashMap<String, LinkPreview>>,
    calls: Mutex<Vec<String>>,
}

impl MockPreviewFetcher {
    pub fn new() -> Self {
        Self {
            previews: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Serve `preview` for `url`. Unknown urls fail.
    pub fn with_preview(self, url: &str, preview: LinkPreview) -> Self {
        self.previews.lock().unwrap().insert(url.to_string(), preview);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for MockPreviewFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BasePreviewFetcher for MockPreviewFetcher {
    async fn fetch(&self, url: &str) -> Result<LinkPreview> {
        self.calls.lock().unwrap().push(url.to_string());
        self.previews
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow!("no preview for {}", url))
    }
}

// =============================================================================
// TestDependencies - Builder for test dependencies
// =============================================================================

#[derive(Clone)]
pub struct TestDependencies {
    pub clock: Arc<MockClock>,
    pub ids: Arc<SequentialIds>,
    pub email_sender: Arc<MockEmailSender>,
    pub preview_fetcher: Arc<MockPreviewFetcher>,
    pub base_url: Url,
}

impl TestDependencies {
    pub fn new() -> Self {
        Self {
            clock: Arc::new(MockClock::default()),
            ids: Arc::new(SequentialIds::default()),
            email_sender: Arc::new(MockEmailSender::new()),
            preview_fetcher: Arc::new(MockPreviewFetcher::new()),
            base_url: Url::parse("http://localhost:8080").unwrap(),
        }
    }

    /// Set a mock email sender
    pub fn mock_email(mut self, sender: MockEmailSender) -> Self {
        self.email_sender = Arc::new(sender);
        self
    }

    /// Set a mock preview fetcher
    pub fn mock_previews(mut self, fetcher: MockPreviewFetcher) -> Self {
        self.preview_fetcher = Arc::new(fetcher);
        self
    }

    /// Convert into ServerDeps for testing
    pub fn into_deps(self) -> ServerDeps {
        ServerDeps::new(
            self.clock,
            self.ids,
            Arc::new(MockPasswordHasher),
            Arc::new(CommentMarkdownRenderer),
            self.email_sender,
            self.preview_fetcher,
            self.base_url,
        )
    }
}

impl Default for TestDependencies {
    fn default() -> Self {
        Self::new()
    }
}
