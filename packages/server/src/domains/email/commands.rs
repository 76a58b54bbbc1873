use serde::{Deserialize, Serialize};

use super::models::DeliveryStatus;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueEmail {
    /// Deduplication key, unique per message
    pub internal_id: String,
    pub recipients: String,
    pub subject: String,
    pub template: String,
    #[serde(default)]
    pub template_data: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetEmailDeliveryStatus {
    pub internal_id: String,
    pub status: DeliveryStatus,
    /// Transport message id on delivery, the last error on failure
    #[serde(default)]
    pub message: Option<String>,
}
