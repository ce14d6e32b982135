// ABOUTME: Domain type definitions for filings, admins, platform users and notifications
// ABOUTME: Field names follow the camelCase JSON used by the REST backend and document store

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::constants::{MAX_ADMIN_REPLIES, MAX_USER_MESSAGES, REJECTED_STATUS};

fn null_as_false<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

// Older filings predate the isActive column and come back as null.
fn null_as_true<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(true))
}

fn default_true() -> bool {
    true
}

/// A patent application tracked through the five workflow stages.
///
/// The backend owns this record; only the fields the admin console reads or
/// writes are modelled, anything else in the payload is ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatentFiling {
    pub id: i64,

    // Ownership
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub user_email: Option<String>,

    // Applicant
    #[serde(default)]
    pub applicant_name: Option<String>,
    #[serde(default)]
    pub applicant_email: Option<String>,
    #[serde(default)]
    pub applicant_state: Option<String>,
    #[serde(default)]
    pub invention_title: Option<String>,
    #[serde(default)]
    pub application_date: Option<String>,

    // Workflow flags
    #[serde(default, deserialize_with = "null_as_false")]
    pub stage1_filed: bool,
    #[serde(default, deserialize_with = "null_as_false")]
    pub stage2_admin_review: bool,
    #[serde(default, deserialize_with = "null_as_false")]
    pub stage3_technical_review: bool,
    #[serde(default, deserialize_with = "null_as_false")]
    pub stage4_verification: bool,
    #[serde(default, deserialize_with = "null_as_false")]
    pub stage5_granted: bool,

    // Terminal markers
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default = "default_true", deserialize_with = "null_as_true")]
    pub is_active: bool,

    // Grant/reject metadata
    #[serde(default)]
    pub patent_number: Option<String>,
    #[serde(default)]
    pub granted_patent_person_name: Option<String>,
    #[serde(default)]
    pub rejected_patent_number: Option<String>,
    #[serde(default)]
    pub rejected_patent_person_name: Option<String>,
    #[serde(default)]
    pub location: Option<String>,

    // Messaging thread
    #[serde(default)]
    pub m1: Option<String>,
    #[serde(default)]
    pub m2: Option<String>,
    #[serde(default)]
    pub m3: Option<String>,
    #[serde(default)]
    pub m4: Option<String>,
    #[serde(default)]
    pub m5: Option<String>,
    #[serde(default)]
    pub r1: Option<String>,
    #[serde(default)]
    pub r2: Option<String>,
    #[serde(default)]
    pub r3: Option<String>,
    #[serde(default)]
    pub r4: Option<String>,
}

fn filled(value: &Option<String>) -> bool {
    value.as_deref().map(|v| !v.trim().is_empty()).unwrap_or(false)
}

impl PatentFiling {
    pub fn is_rejected(&self) -> bool {
        self.status.as_deref() == Some(REJECTED_STATUS)
    }

    /// Granted means stage 5 set on a filing that was not rejected
    pub fn is_granted(&self) -> bool {
        self.stage5_granted && !self.is_rejected()
    }

    pub fn title(&self) -> &str {
        self.invention_title.as_deref().unwrap_or("Untitled invention")
    }

    /// User messages in slot order, `None` for empty slots
    pub fn messages(&self) -> [Option<&str>; MAX_USER_MESSAGES] {
        [&self.m1, &self.m2, &self.m3, &self.m4, &self.m5]
            .map(|m| m.as_deref().filter(|v| !v.trim().is_empty()))
    }

    /// Admin replies in slot order; slot 5 does not exist
    pub fn replies(&self) -> [Option<&str>; MAX_ADMIN_REPLIES] {
        [&self.r1, &self.r2, &self.r3, &self.r4]
            .map(|r| r.as_deref().filter(|v| !v.trim().is_empty()))
    }

    /// Number of non-empty reply slots
    pub fn reply_count(&self) -> usize {
        [&self.r1, &self.r2, &self.r3, &self.r4]
            .into_iter()
            .filter(|r| filled(r))
            .count()
    }

    /// Field name of the next free reply slot, `None` once r1..r4 are used
    pub fn next_reply_field(&self) -> Option<String> {
        let count = self.reply_count();
        (count < MAX_ADMIN_REPLIES).then(|| format!("r{}", count + 1))
    }

    /// User messages that have no reply in the matching slot.
    ///
    /// A fifth message can never be answered, so it always counts as unread.
    pub fn unread_messages(&self) -> usize {
        let replies = self.replies();
        self.messages()
            .iter()
            .enumerate()
            .filter(|(i, msg)| msg.is_some() && replies.get(*i).copied().flatten().is_none())
            .count()
    }
}

/// Admin-side counters tracked per acting admin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    Granted,
    Rejected,
    Activated,
    Deactivated,
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Granted => "granted",
            Self::Rejected => "rejected",
            Self::Activated => "activated",
            Self::Deactivated => "deactivated",
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "granted" => Ok(Self::Granted),
            "rejected" => Ok(Self::Rejected),
            "activated" => Ok(Self::Activated),
            "deactivated" => Ok(Self::Deactivated),
            other => Err(format!("Unknown action type: {}", other)),
        }
    }
}

/// Admin profile as returned by `/admin/login` and `/admin/all`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUser {
    pub admin_id: i64,
    pub admin_name: String,
    pub email: String,
    #[serde(default)]
    pub patents_granted: Option<u32>,
    #[serde(default)]
    pub patents_rejected: Option<u32>,
    #[serde(default)]
    pub patents_activated: Option<u32>,
    #[serde(default)]
    pub patents_deactivated: Option<u32>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl AdminUser {
    pub fn counter(&self, action: ActionType) -> u32 {
        match action {
            ActionType::Granted => self.patents_granted,
            ActionType::Rejected => self.patents_rejected,
            ActionType::Activated => self.patents_activated,
            ActionType::Deactivated => self.patents_deactivated,
        }
        .unwrap_or(0)
    }
}

/// Admin-entered grant metadata, already validated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantDetails {
    pub patent_number: String,
    pub granted_person_name: String,
    pub location: String,
}

/// Admin-entered rejection metadata, already validated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectDetails {
    pub rejected_patent_number: String,
    pub rejected_person_name: String,
    pub location: String,
}

/// Body of `PUT /patent-filing/{id}/reject`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectRequest {
    pub rejected_patent_number: String,
    pub rejected_person_name: String,
    pub location: String,
    pub status: String,
    pub applicant_email: Option<String>,
    pub invention_title: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionTier {
    #[default]
    Basic,
    Pro,
    Enterprise,
}

impl SubscriptionTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Pro => "pro",
            Self::Enterprise => "enterprise",
        }
    }

    /// Display name used for `subscriptionPlan`
    pub fn plan_name(&self) -> &'static str {
        match self {
            Self::Basic => "Basic",
            Self::Pro => "Pro",
            Self::Enterprise => "Enterprise",
        }
    }

    /// Unknown or missing tiers are treated as basic
    pub fn from_str_lossy(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "pro" => Self::Pro,
            "enterprise" => Self::Enterprise,
            _ => Self::Basic,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    #[default]
    Active,
    Deactivated,
    Suspended,
    Banned,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Deactivated => "deactivated",
            Self::Suspended => "suspended",
            Self::Banned => "banned",
        }
    }
}

impl FromStr for AccountStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            // Documents created before lifecycle tracking have no status
            "" | "active" => Ok(Self::Active),
            "deactivated" => Ok(Self::Deactivated),
            "suspended" => Ok(Self::Suspended),
            "banned" => Ok(Self::Banned),
            other => Err(format!("Unknown account status: {}", other)),
        }
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// End-user account document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformUser {
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,

    // Subscription
    pub subscription_type: SubscriptionTier,
    pub subscription_plan: Option<String>,
    pub subscription_status: Option<String>,
    pub subscription_price: Option<String>,
    pub subscription_end_date: Option<DateTime<Utc>>,

    // Lifecycle
    pub account_status: AccountStatus,
    pub email_verified: bool,
    pub is_online: bool,
    pub force_logout: bool,
    pub deactivated_at: Option<DateTime<Utc>>,
    pub scheduled_deletion_date: Option<DateTime<Utc>>,
    pub banned_at: Option<DateTime<Utc>>,
    pub ban_reason: Option<String>,
    pub suspended_at: Option<DateTime<Utc>>,
    pub suspend_reason: Option<String>,

    // Usage
    pub local_search_count: i64,
    pub api_search_count: i64,

    pub created_at: DateTime<Utc>,
    /// Incremented on every write; used for optimistic concurrency
    pub version: i64,
}

impl PlatformUser {
    pub fn new(id: impl Into<String>, email: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            name: None,
            email: Some(email.into()),
            subscription_type: SubscriptionTier::Basic,
            subscription_plan: None,
            subscription_status: None,
            subscription_price: None,
            subscription_end_date: None,
            account_status: AccountStatus::Active,
            email_verified: false,
            is_online: false,
            force_logout: false,
            deactivated_at: None,
            scheduled_deletion_date: None,
            banned_at: None,
            ban_reason: None,
            suspended_at: None,
            suspend_reason: None,
            local_search_count: 0,
            api_search_count: 0,
            created_at,
            version: 0,
        }
    }

    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or(self.id.as_str())
    }
}

/// Notification payload before it is stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewNotification {
    pub title: String,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

/// Stored notification in a user's capped log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub message: String,
    pub details: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub read: bool,
}
