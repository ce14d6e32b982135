// ABOUTME: Notification content sent to filing owners and platform users
// ABOUTME: Grant/reject messages carry the owner's subscription summary

use patentdesk_core::{GrantDetails, NewNotification, PatentFiling, PlatformUser, RejectDetails};
use serde_json::json;

/// Subscription fields echoed into grant/reject notifications
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionSummary {
    pub plan: String,
    pub amount: String,
    pub valid_until: String,
}

impl Default for SubscriptionSummary {
    fn default() -> Self {
        Self {
            plan: "Basic".to_string(),
            amount: "₹0".to_string(),
            valid_until: "N/A".to_string(),
        }
    }
}

impl SubscriptionSummary {
    /// Missing user documents fall back to Basic / ₹0 / N/A
    pub fn from_user(user: Option<&PlatformUser>) -> Self {
        let Some(user) = user else {
            return Self::default();
        };

        let plan = user
            .subscription_plan
            .clone()
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| user.subscription_type.plan_name().to_string());

        let amount = match user.subscription_price.as_deref().map(str::trim) {
            Some(price) if price.contains('₹') => price.to_string(),
            Some(price) if !price.is_empty() => format!("₹{}", price),
            _ => "₹0".to_string(),
        };

        let valid_until = user
            .subscription_end_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "N/A".to_string());

        Self {
            plan,
            amount,
            valid_until,
        }
    }
}

pub fn patent_granted(
    filing: &PatentFiling,
    details: &GrantDetails,
    subscription: &SubscriptionSummary,
) -> NewNotification {
    NewNotification {
        title: "🎉 Patent Granted!".to_string(),
        message: format!(
            "Congratulations! Your patent \"{}\" has been granted.",
            filing.title()
        ),
        details: Some(json!({
            "patentNumber": details.patent_number,
            "grantedTo": details.granted_person_name,
            "location": details.location,
            "status": "Granted",
            "filingId": filing.id,
            "plan": subscription.plan,
            "amount": subscription.amount,
            "validUntil": subscription.valid_until,
        })),
    }
}

pub fn patent_rejected(
    filing: &PatentFiling,
    details: &RejectDetails,
    subscription: &SubscriptionSummary,
) -> NewNotification {
    NewNotification {
        title: "❌ Patent Rejected".to_string(),
        message: format!(
            "Your patent application \"{}\" has been rejected.",
            filing.title()
        ),
        details: Some(json!({
            "rejectedPatentNumber": details.rejected_patent_number,
            "rejectedBy": details.rejected_person_name,
            "location": details.location,
            "status": "Rejected",
            "filingId": filing.id,
            "plan": subscription.plan,
            "amount": subscription.amount,
            "validUntil": subscription.valid_until,
        })),
    }
}

pub fn patent_deactivated(filing: &PatentFiling) -> NewNotification {
    NewNotification {
        title: "Patent Deactivated".to_string(),
        message: format!(
            "Your patent application \"{}\" has been temporarily deactivated by the admin.",
            filing.title()
        ),
        details: Some(json!(format!(
            "Patent ID: {}. Please contact support for more information.",
            filing.id
        ))),
    }
}

pub fn account_deactivated() -> NewNotification {
    NewNotification {
        title: "🚫 Account Deactivated".to_string(),
        message: "Your account has been deactivated by the admin. You have been logged out. \
                  If you do not login within 30 days, your account will be permanently deleted. \
                  Please contact support if you believe this is an error."
            .to_string(),
        details: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use patentdesk_core::SubscriptionTier;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_summary_defaults_without_user() {
        assert_eq!(
            SubscriptionSummary::from_user(None),
            SubscriptionSummary {
                plan: "Basic".to_string(),
                amount: "₹0".to_string(),
                valid_until: "N/A".to_string(),
            }
        );
    }

    #[test]
    fn test_summary_prefixes_rupee_once() {
        let mut user = PlatformUser::new("u1", "u1@example.com", Utc::now());
        user.subscription_type = SubscriptionTier::Pro;
        user.subscription_price = Some("49".to_string());
        user.subscription_end_date = Some(Utc.with_ymd_and_hms(2025, 3, 31, 0, 0, 0).unwrap());

        let summary = SubscriptionSummary::from_user(Some(&user));
        assert_eq!(summary.plan, "Pro");
        assert_eq!(summary.amount, "₹49");
        assert_eq!(summary.valid_until, "2025-03-31");

        user.subscription_price = Some("₹199".to_string());
        assert_eq!(SubscriptionSummary::from_user(Some(&user)).amount, "₹199");
    }

    #[test]
    fn test_granted_notification_content() {
        let filing = PatentFiling {
            id: 42,
            invention_title: Some("Solar kettle".to_string()),
            ..Default::default()
        };
        let details = GrantDetails {
            patent_number: "IN-123".to_string(),
            granted_person_name: "A. Singh".to_string(),
            location: "Delhi".to_string(),
        };

        let note = patent_granted(&filing, &details, &SubscriptionSummary::default());
        assert_eq!(note.title, "🎉 Patent Granted!");
        assert_eq!(
            note.message,
            "Congratulations! Your patent \"Solar kettle\" has been granted."
        );
        let details = note.details.unwrap();
        assert_eq!(details["patentNumber"], "IN-123");
        assert_eq!(details["grantedTo"], "A. Singh");
        assert_eq!(details["filingId"], 42);
        assert_eq!(details["amount"], "₹0");
    }
}
