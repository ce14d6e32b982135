// ABOUTME: Input and output types for document store operations
// ABOUTME: Partial user updates, notification delivery outcomes and search statistics

use chrono::{DateTime, Utc};
use patentdesk_core::{AccountStatus, Notification, SubscriptionTier};
use serde::Serialize;

/// Partial update of a user document.
///
/// `None` leaves a field alone. For nullable fields `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserUpdate {
    pub account_status: Option<AccountStatus>,
    pub email_verified: Option<bool>,
    pub force_logout: Option<bool>,
    pub deactivated_at: Option<Option<DateTime<Utc>>>,
    pub scheduled_deletion_date: Option<Option<DateTime<Utc>>>,
    pub banned_at: Option<Option<DateTime<Utc>>>,
    pub ban_reason: Option<Option<String>>,
    pub suspended_at: Option<Option<DateTime<Utc>>>,
    pub suspend_reason: Option<Option<String>>,
    pub subscription_type: Option<SubscriptionTier>,
    pub subscription_plan: Option<Option<String>>,
    pub subscription_status: Option<Option<String>>,
    pub subscription_end_date: Option<Option<DateTime<Utc>>>,
    pub local_search_count: Option<i64>,
    pub api_search_count: Option<i64>,
}

impl UserUpdate {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Result of writing a notification
#[derive(Debug, Clone, PartialEq)]
pub enum DeliveryOutcome {
    Inserted(Notification),
    /// The idempotency key was already used; holds the original notification id
    Duplicate(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchStats {
    pub local_search_count: i64,
    pub api_search_count: i64,
    pub updated_at: Option<String>,
}

impl SearchStats {
    pub fn total(&self) -> i64 {
        self.local_search_count + self.api_search_count
    }
}
