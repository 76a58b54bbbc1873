use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domains::content::ContentError;

pub const SCOPE_REPLIES: &str = "replies";
pub const SCOPE_SUBMISSIONS: &str = "submissions";

/// Every scope a user can subscribe to, sorted.
pub const ALL_SCOPES: [&str; 2] = [SCOPE_REPLIES, SCOPE_SUBMISSIONS];

/// Validate, deduplicate and sort requested scopes.
pub fn canonical_scopes(scopes: &[String]) -> Result<Vec<String>, ContentError> {
    let mut canonical = BTreeSet::new();
    for scope in scopes {
        if !ALL_SCOPES.contains(&scope.as_str()) {
            return Err(ContentError::InvalidSubscriptionScope(scope.clone()));
        }
        canonical.insert(scope.clone());
    }
    Ok(canonical.into_iter().collect())
}

/// Which notifications a user wants. `enabled_for` and `disabled_for` never
/// share a scope.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubscriptionSettings {
    pub subscriber: String,
    pub enabled_for: BTreeSet<String>,
    pub disabled_for: BTreeSet<String>,
    pub last_change_at: Option<DateTime<Utc>>,
}

impl SubscriptionSettings {
    /// Settings for a user who never changed them: everything off.
    pub fn defaults_for(subscriber: &str) -> Self {
        Self {
            subscriber: subscriber.to_string(),
            enabled_for: BTreeSet::new(),
            disabled_for: ALL_SCOPES.iter().map(|scope| scope.to_string()).collect(),
            last_change_at: None,
        }
    }

    pub fn enable(&mut self, scopes: &[String], at: DateTime<Utc>) {
        for scope in scopes {
            self.disabled_for.remove(scope);
            self.enabled_for.insert(scope.clone());
        }
        self.last_change_at = Some(at);
    }

    pub fn disable(&mut self, scopes: &[String], at: DateTime<Utc>) {
        for scope in scopes {
            self.enabled_for.remove(scope);
            self.disabled_for.insert(scope.clone());
        }
        self.last_change_at = Some(at);
    }

    pub fn is_enabled(&self, scope: &str) -> bool {
        self.enabled_for.contains(scope)
    }
}
