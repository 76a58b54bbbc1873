use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::domains::email::commands::QueueEmail;
use crate::kernel::OutboundEmail;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Queued,
    Delivered,
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Email {
    pub internal_id: String,
    pub recipients: String,
    pub subject: String,
    pub template: String,
    pub template_data: serde_json::Map<String, serde_json::Value>,
    pub status: DeliveryStatus,
    /// Failed sends since the email was queued
    pub retries: u32,
    pub message: Option<String>,
}

impl Email {
    pub fn outbound(&self) -> OutboundEmail {
        OutboundEmail {
            internal_id: self.internal_id.clone(),
            recipients: self.recipients.clone(),
            subject: self.subject.clone(),
            template: self.template.clone(),
            template_data: self.template_data.clone(),
        }
    }
}

/// Every email the log has queued, each in exactly one status bucket.
#[derive(Debug, Default)]
pub struct Outbox {
    emails: BTreeMap<String, Email>,
    buckets: BTreeMap<DeliveryStatus, BTreeSet<String>>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `queue`. Queuing an id that is already known resets it to queued.
    pub fn queue(&mut self, queue: &QueueEmail) {
        self.move_to(&queue.internal_id, DeliveryStatus::Queued);
        self.emails.insert(
            queue.internal_id.clone(),
            Email {
                internal_id: queue.internal_id.clone(),
                recipients: queue.recipients.clone(),
                subject: queue.subject.clone(),
                template: queue.template.clone(),
                template_data: queue.template_data.clone(),
                status: DeliveryStatus::Queued,
                retries: 0,
                message: None,
            },
        );
    }

    /// Returns false, changing nothing, for an id that was never queued.
    pub fn set_status(&mut self, internal_id: &str, status: DeliveryStatus, message: Option<String>) -> bool {
        let Some(email) = self.emails.get_mut(internal_id) else {
            return false;
        };
        email.status = status;
        email.message = message;
        self.move_to(internal_id, status);
        true
    }

    /// Count a failed send. Returns the new retry count.
    pub fn record_failure(&mut self, internal_id: &str) -> u32 {
        match self.emails.get_mut(internal_id) {
            Some(email) => {
                email.retries += 1;
                email.retries
            }
            None => 0,
        }
    }

    fn move_to(&mut self, internal_id: &str, status: DeliveryStatus) {
        for bucket in self.buckets.values_mut() {
            bucket.remove(internal_id);
        }
        self.buckets
            .entry(status)
            .or_default()
            .insert(internal_id.to_string());
    }

    pub fn get(&self, internal_id: &str) -> Option<&Email> {
        self.emails.get(internal_id)
    }

    /// Emails in `status`, ordered by internal id.
    pub fn with_status(&self, status: DeliveryStatus) -> Vec<&Email> {
        self.buckets
            .get(&status)
            .into_iter()
            .flatten()
            .filter_map(|id| self.emails.get(id))
            .collect()
    }

    pub fn count(&self, status: DeliveryStatus) -> usize {
        self.buckets.get(&status).map_or(0, BTreeSet::len)
    }
}
