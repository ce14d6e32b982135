// ABOUTME: Platform user lifecycle controller
// ABOUTME: Confirmed status changes on user documents plus the 30-day purge of deactivated accounts

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use patentdesk_backend::IdentityProvider;
use patentdesk_core::constants::DEACTIVATION_GRACE_DAYS;
use patentdesk_core::{AccountStatus, PlatformUser, SubscriptionTier};
use patentdesk_storage::{DocumentStore, UserUpdate};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::{WorkflowError, WorkflowResult};
use crate::notifications;
use crate::relay::NotificationRelay;
use crate::report::{PurgeReport, SideEffect, UserActionReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UserAction {
    ResetPassword,
    VerifyEmail,
    Activate,
    Deactivate,
    Suspend,
    Unsuspend,
    Ban,
    Unban,
    CancelSubscription,
    Delete,
}

impl UserAction {
    pub const ALL: [UserAction; 10] = [
        UserAction::ResetPassword,
        UserAction::VerifyEmail,
        UserAction::Activate,
        UserAction::Deactivate,
        UserAction::Suspend,
        UserAction::Unsuspend,
        UserAction::Ban,
        UserAction::Unban,
        UserAction::CancelSubscription,
        UserAction::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UserAction::ResetPassword => "reset-password",
            UserAction::VerifyEmail => "verify-email",
            UserAction::Activate => "activate",
            UserAction::Deactivate => "deactivate",
            UserAction::Suspend => "suspend",
            UserAction::Unsuspend => "unsuspend",
            UserAction::Ban => "ban",
            UserAction::Unban => "unban",
            UserAction::CancelSubscription => "cancel-subscription",
            UserAction::Delete => "delete",
        }
    }

    /// Question shown before the action runs
    pub fn confirmation_prompt(&self, user: &PlatformUser) -> String {
        let name = user.display_name();
        let email = user.email.as_deref().unwrap_or("this user");
        match self {
            UserAction::ResetPassword => format!("Send password reset email to {}?", email),
            UserAction::VerifyEmail => format!("Mark email as verified for {}?", email),
            UserAction::Activate => format!("Activate {}'s account?", name),
            UserAction::Deactivate => format!(
                "Deactivate {}'s account? Account will be scheduled for deletion in {} days.",
                name, DEACTIVATION_GRACE_DAYS
            ),
            UserAction::Suspend => {
                format!("Suspend {}? User will be temporarily restricted.", name)
            }
            UserAction::Unsuspend => format!("Unsuspend {}?", name),
            UserAction::Ban => format!("Ban {}? This is a permanent action until unbanned.", name),
            UserAction::Unban => format!("Unban {}?", name),
            UserAction::CancelSubscription => format!(
                "Cancel {}'s {} subscription? User will be downgraded to Basic plan.",
                name,
                user.subscription_type.as_str()
            ),
            UserAction::Delete => {
                format!("Permanently delete {}? This action cannot be undone!", name)
            }
        }
    }

    /// Field writes for actions that only touch the user document
    fn update(&self, now: DateTime<Utc>) -> Option<UserUpdate> {
        let update = match self {
            UserAction::VerifyEmail => UserUpdate {
                email_verified: Some(true),
                ..Default::default()
            },
            UserAction::Activate => UserUpdate {
                account_status: Some(AccountStatus::Active),
                deactivated_at: Some(None),
                scheduled_deletion_date: Some(None),
                banned_at: Some(None),
                force_logout: Some(false),
                ..Default::default()
            },
            UserAction::Deactivate => UserUpdate {
                account_status: Some(AccountStatus::Deactivated),
                deactivated_at: Some(Some(now)),
                scheduled_deletion_date: Some(Some(now + Duration::days(DEACTIVATION_GRACE_DAYS))),
                force_logout: Some(true),
                ..Default::default()
            },
            UserAction::Suspend => UserUpdate {
                account_status: Some(AccountStatus::Suspended),
                suspended_at: Some(Some(now)),
                suspend_reason: Some(Some("Suspended by admin".to_string())),
                ..Default::default()
            },
            UserAction::Unsuspend => UserUpdate {
                account_status: Some(AccountStatus::Active),
                suspended_at: Some(None),
                suspend_reason: Some(None),
                ..Default::default()
            },
            UserAction::Ban => UserUpdate {
                account_status: Some(AccountStatus::Banned),
                banned_at: Some(Some(now)),
                ban_reason: Some(Some("Banned by admin".to_string())),
                ..Default::default()
            },
            UserAction::Unban => UserUpdate {
                account_status: Some(AccountStatus::Active),
                banned_at: Some(None),
                ban_reason: Some(None),
                ..Default::default()
            },
            UserAction::CancelSubscription => UserUpdate {
                subscription_type: Some(SubscriptionTier::Basic),
                subscription_plan: Some(Some(SubscriptionTier::Basic.plan_name().to_string())),
                subscription_status: Some(Some("cancelled".to_string())),
                subscription_end_date: Some(Some(now)),
                local_search_count: Some(0),
                api_search_count: Some(0),
                ..Default::default()
            },
            UserAction::ResetPassword | UserAction::Delete => return None,
        };
        Some(update)
    }
}

impl fmt::Display for UserAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        UserAction::ALL
            .into_iter()
            .find(|a| a.as_str() == normalized)
            .ok_or_else(|| format!("Unknown user action: {}", s))
    }
}

/// Applies admin actions to platform user documents
pub struct UserLifecycle {
    store: Arc<dyn DocumentStore>,
    relay: NotificationRelay,
    identity: Option<Arc<dyn IdentityProvider>>,
}

impl UserLifecycle {
    pub fn new(store: Arc<dyn DocumentStore>, relay: NotificationRelay) -> Self {
        Self {
            store,
            relay,
            identity: None,
        }
    }

    pub fn with_identity(mut self, identity: Arc<dyn IdentityProvider>) -> Self {
        self.identity = Some(identity);
        self
    }

    pub async fn user(&self, user_id: &str) -> WorkflowResult<PlatformUser> {
        self.store
            .get_user(user_id)
            .await?
            .ok_or_else(|| WorkflowError::UserNotFound(user_id.to_string()))
    }

    /// Runs `action` on `user_id`.
    ///
    /// Nothing is written unless `confirmed` is set. With `expected_version`
    /// the write fails if the document changed since it was read.
    pub async fn apply(
        &self,
        user_id: &str,
        action: UserAction,
        confirmed: bool,
        expected_version: Option<i64>,
        now: DateTime<Utc>,
    ) -> WorkflowResult<UserActionReport> {
        let user = self.user(user_id).await?;
        if !confirmed {
            return Err(WorkflowError::ConfirmationRequired(
                action.confirmation_prompt(&user),
            ));
        }

        match action {
            UserAction::ResetPassword => self.reset_password(user).await,
            UserAction::Delete => {
                self.store.delete_user(user_id).await?;
                info!(user_id, "User deleted");
                Ok(UserActionReport {
                    user: None,
                    notification: SideEffect::Skipped("user deleted".to_string()),
                })
            }
            _ => {
                let Some(update) = action.update(now) else {
                    return Ok(UserActionReport {
                        user: Some(user),
                        notification: SideEffect::Skipped("nothing to write".to_string()),
                    });
                };
                let updated = self
                    .store
                    .update_user(user_id, &update, expected_version)
                    .await?;
                info!(user_id, action = %action, status = %updated.account_status, "User updated");

                let notification = if action == UserAction::Deactivate {
                    let key = format!("user-{}-deactivate-{}", user_id, Uuid::new_v4());
                    self.relay
                        .deliver(user_id, &notifications::account_deactivated(), Some(&key))
                        .await
                } else {
                    SideEffect::Skipped("action does not notify".to_string())
                };

                Ok(UserActionReport {
                    user: Some(updated),
                    notification,
                })
            }
        }
    }

    async fn reset_password(&self, user: PlatformUser) -> WorkflowResult<UserActionReport> {
        let email = user
            .email
            .as_deref()
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| WorkflowError::MissingEmail(user.id.clone()))?;
        let identity = self.identity.as_ref().ok_or_else(|| {
            WorkflowError::IdentityUnavailable("no identity provider API key".to_string())
        })?;

        identity.send_password_reset(email).await?;
        info!(user_id = %user.id, "Password reset email sent");
        Ok(UserActionReport {
            user: Some(user),
            notification: SideEffect::Skipped("reset email sent by identity provider".to_string()),
        })
    }

    /// Hard-deletes accounts deactivated at least 30 days before `now`.
    ///
    /// One failed delete does not stop the run; it lands in `errors`.
    pub async fn purge_deactivated(&self, now: DateTime<Utc>) -> WorkflowResult<PurgeReport> {
        let cutoff = now - Duration::days(DEACTIVATION_GRACE_DAYS);
        let due = self.store.deactivated_before(cutoff).await?;

        let mut report = PurgeReport::default();
        for user in due {
            report.processed += 1;
            match self.store.delete_user(&user.id).await {
                Ok(()) => {
                    report.successful += 1;
                    info!(user_id = %user.id, "Purged deactivated account");
                }
                Err(e) => {
                    report.failed += 1;
                    error!(user_id = %user.id, error = %e, "Failed to purge account");
                    report.errors.push(format!("{}: {}", user.id, e));
                }
            }
        }

        if report.processed == 0 {
            info!("No deactivated accounts due for deletion");
        } else if report.failed > 0 {
            warn!(failed = report.failed, "Purge finished with errors");
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn user() -> PlatformUser {
        let mut user = PlatformUser::new("u1", "asha@example.com", Utc::now());
        user.name = Some("Asha".to_string());
        user.subscription_type = SubscriptionTier::Pro;
        user
    }

    #[test]
    fn test_parse_actions() {
        assert_eq!("ban".parse::<UserAction>(), Ok(UserAction::Ban));
        assert_eq!(
            "cancel_subscription".parse::<UserAction>(),
            Ok(UserAction::CancelSubscription)
        );
        assert_eq!(
            " Reset-Password ".parse::<UserAction>(),
            Ok(UserAction::ResetPassword)
        );
        assert!("obliterate".parse::<UserAction>().is_err());
    }

    #[test]
    fn test_confirmation_prompts_name_the_user() {
        let user = user();
        assert_eq!(
            UserAction::Deactivate.confirmation_prompt(&user),
            "Deactivate Asha's account? Account will be scheduled for deletion in 30 days."
        );
        assert_eq!(
            UserAction::ResetPassword.confirmation_prompt(&user),
            "Send password reset email to asha@example.com?"
        );
        assert_eq!(
            UserAction::CancelSubscription.confirmation_prompt(&user),
            "Cancel Asha's pro subscription? User will be downgraded to Basic plan."
        );
    }

    #[test]
    fn test_deactivate_schedules_deletion_thirty_days_out() {
        let now = Utc::now();
        let update = UserAction::Deactivate.update(now).unwrap();
        assert_eq!(update.deactivated_at, Some(Some(now)));
        assert_eq!(
            update.scheduled_deletion_date,
            Some(Some(now + Duration::days(30)))
        );
        assert_eq!(update.force_logout, Some(true));
    }

    #[test]
    fn test_reset_and_delete_have_no_field_writes() {
        assert!(UserAction::ResetPassword.update(Utc::now()).is_none());
        assert!(UserAction::Delete.update(Utc::now()).is_none());
    }
}
