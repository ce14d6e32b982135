//! User lifecycle, purge and notification relay behavior over a real SQLite store

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use patentdesk_core::{AccountStatus, NewNotification, Notification, PlatformUser, SubscriptionTier};
use patentdesk_storage::{
    DeliveryOutcome, DocumentStore, SearchStats, SqliteDocumentStore, StorageError, StorageResult,
    UserUpdate,
};
use patentdesk_workflow::{
    NotificationRelay, SideEffect, UserAction, UserLifecycle, WorkflowError,
};
use pretty_assertions::assert_eq;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Wraps a real store and fails the first `failures` notification writes
struct FlakyStore {
    inner: SqliteDocumentStore,
    failures: u32,
    attempts: AtomicU32,
}

impl FlakyStore {
    fn new(inner: SqliteDocumentStore, failures: u32) -> Self {
        Self {
            inner,
            failures,
            attempts: AtomicU32::new(0),
        }
    }

    fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentStore for FlakyStore {
    async fn get_user(&self, user_id: &str) -> StorageResult<Option<PlatformUser>> {
        self.inner.get_user(user_id).await
    }

    async fn list_users(&self) -> StorageResult<Vec<PlatformUser>> {
        self.inner.list_users().await
    }

    async fn put_user(&self, user: &PlatformUser) -> StorageResult<()> {
        self.inner.put_user(user).await
    }

    async fn update_user(
        &self,
        user_id: &str,
        update: &UserUpdate,
        expected_version: Option<i64>,
    ) -> StorageResult<PlatformUser> {
        self.inner.update_user(user_id, update, expected_version).await
    }

    async fn delete_user(&self, user_id: &str) -> StorageResult<()> {
        if user_id == "stuck" {
            return Err(StorageError::InvalidData("locked document".to_string()));
        }
        self.inner.delete_user(user_id).await
    }

    async fn deactivated_before(&self, cutoff: DateTime<Utc>) -> StorageResult<Vec<PlatformUser>> {
        self.inner.deactivated_before(cutoff).await
    }

    async fn add_notification(
        &self,
        user_id: &str,
        notification: &NewNotification,
        idempotency_key: Option<&str>,
        now: DateTime<Utc>,
    ) -> StorageResult<DeliveryOutcome> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if attempt <= self.failures {
            return Err(StorageError::InvalidData("document store unavailable".to_string()));
        }
        self.inner
            .add_notification(user_id, notification, idempotency_key, now)
            .await
    }

    async fn list_notifications(&self, user_id: &str) -> StorageResult<Vec<Notification>> {
        self.inner.list_notifications(user_id).await
    }

    async fn delete_notification(
        &self,
        user_id: &str,
        notification_id: &str,
    ) -> StorageResult<bool> {
        self.inner.delete_notification(user_id, notification_id).await
    }

    async fn clear_notifications(&self, user_id: &str) -> StorageResult<u64> {
        self.inner.clear_notifications(user_id).await
    }

    async fn search_stats(&self) -> StorageResult<SearchStats> {
        self.inner.search_stats().await
    }
}

async fn flaky_store(failures: u32) -> Arc<FlakyStore> {
    let inner = SqliteDocumentStore::in_memory().await.unwrap();
    let mut user = PlatformUser::new("u1", "asha@example.com", Utc::now());
    user.name = Some("Asha".to_string());
    user.subscription_type = SubscriptionTier::Pro;
    user.local_search_count = 12;
    user.api_search_count = 4;
    inner.put_user(&user).await.unwrap();
    Arc::new(FlakyStore::new(inner, failures))
}

fn lifecycle(store: &Arc<FlakyStore>, attempts: u32) -> UserLifecycle {
    let store: Arc<dyn DocumentStore> = store.clone();
    let relay = NotificationRelay::new(Arc::clone(&store), attempts)
        .with_initial_interval(StdDuration::from_millis(1));
    UserLifecycle::new(store, relay)
}

fn note() -> NewNotification {
    NewNotification {
        title: "Heads up".to_string(),
        message: "Something happened".to_string(),
        details: None,
    }
}

#[tokio::test]
async fn test_deactivate_then_activate_round_trip() {
    let store = flaky_store(0).await;
    let users = lifecycle(&store, 3);
    let now = Utc.with_ymd_and_hms(2024, 3, 1, 10, 30, 0).unwrap();

    let report = users
        .apply("u1", UserAction::Deactivate, true, None, now)
        .await
        .unwrap();
    let user = report.user.unwrap();
    assert_eq!(user.account_status, AccountStatus::Deactivated);
    assert_eq!(user.deactivated_at, Some(now));
    assert_eq!(
        user.scheduled_deletion_date.unwrap() - user.deactivated_at.unwrap(),
        Duration::days(30)
    );
    assert!(user.force_logout);
    assert_eq!(report.notification, SideEffect::Done);

    let notes = store.list_notifications("u1").await.unwrap();
    assert_eq!(notes[0].title, "🚫 Account Deactivated");

    let user = users
        .apply("u1", UserAction::Activate, true, Some(user.version), now)
        .await
        .unwrap()
        .user
        .unwrap();
    assert_eq!(user.account_status, AccountStatus::Active);
    assert_eq!(user.deactivated_at, None);
    assert_eq!(user.scheduled_deletion_date, None);
    assert_eq!(user.banned_at, None);
    assert!(!user.force_logout);
}

#[tokio::test]
async fn test_unconfirmed_action_writes_nothing() {
    let store = flaky_store(0).await;
    let users = lifecycle(&store, 3);

    let err = users
        .apply("u1", UserAction::Ban, false, None, Utc::now())
        .await
        .unwrap_err();

    match err {
        WorkflowError::ConfirmationRequired(prompt) => {
            assert_eq!(prompt, "Ban Asha? This is a permanent action until unbanned.")
        }
        other => panic!("unexpected error: {other}"),
    }
    let user = store.get_user("u1").await.unwrap().unwrap();
    assert_eq!(user.account_status, AccountStatus::Active);
    assert_eq!(user.version, 0);
}

#[tokio::test]
async fn test_ban_suspend_and_reverse() {
    let store = flaky_store(0).await;
    let users = lifecycle(&store, 3);
    let now = Utc::now();

    let banned = users
        .apply("u1", UserAction::Ban, true, None, now)
        .await
        .unwrap()
        .user
        .unwrap();
    assert_eq!(banned.account_status, AccountStatus::Banned);
    assert_eq!(banned.ban_reason.as_deref(), Some("Banned by admin"));

    let unbanned = users
        .apply("u1", UserAction::Unban, true, None, now)
        .await
        .unwrap()
        .user
        .unwrap();
    assert_eq!(unbanned.account_status, AccountStatus::Active);
    assert_eq!(unbanned.ban_reason, None);

    let suspended = users
        .apply("u1", UserAction::Suspend, true, None, now)
        .await
        .unwrap()
        .user
        .unwrap();
    assert_eq!(suspended.suspend_reason.as_deref(), Some("Suspended by admin"));
    assert_eq!(suspended.suspended_at, Some(now));
}

#[tokio::test]
async fn test_cancel_subscription_downgrades_and_resets_counts() {
    let store = flaky_store(0).await;
    let users = lifecycle(&store, 3);
    let now = Utc::now();

    let user = users
        .apply("u1", UserAction::CancelSubscription, true, None, now)
        .await
        .unwrap()
        .user
        .unwrap();

    assert_eq!(user.subscription_type, SubscriptionTier::Basic);
    assert_eq!(user.subscription_plan.as_deref(), Some("Basic"));
    assert_eq!(user.subscription_status.as_deref(), Some("cancelled"));
    assert_eq!(user.subscription_end_date, Some(now));
    assert_eq!(user.local_search_count, 0);
    assert_eq!(user.api_search_count, 0);
}

#[tokio::test]
async fn test_stale_version_surfaces_conflict() {
    let store = flaky_store(0).await;
    let users = lifecycle(&store, 3);

    users
        .apply("u1", UserAction::VerifyEmail, true, Some(0), Utc::now())
        .await
        .unwrap();
    let err = users
        .apply("u1", UserAction::Suspend, true, Some(0), Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::Storage(StorageError::VersionConflict { .. })
    ));
}

#[tokio::test]
async fn test_delete_removes_user() {
    let store = flaky_store(0).await;
    let users = lifecycle(&store, 3);

    let report = users
        .apply("u1", UserAction::Delete, true, None, Utc::now())
        .await
        .unwrap();
    assert!(report.user.is_none());
    assert!(matches!(
        users.user("u1").await,
        Err(WorkflowError::UserNotFound(_))
    ));
}

#[tokio::test]
async fn test_reset_password_needs_identity_provider() {
    let store = flaky_store(0).await;
    let users = lifecycle(&store, 3);

    let err = users
        .apply("u1", UserAction::ResetPassword, true, None, Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::IdentityUnavailable(_)));
}

#[tokio::test]
async fn test_reset_password_calls_identity_provider() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/accounts:sendOobCode"))
        .and(query_param("key", "test-key"))
        .and(body_json(serde_json::json!({
            "requestType": "PASSWORD_RESET",
            "email": "asha@example.com"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "email": "asha@example.com"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let identity = patentdesk_backend::HttpIdentityProvider::new(
        server.uri(),
        "test-key",
        StdDuration::from_secs(5),
    )
    .unwrap();
    let store = flaky_store(0).await;
    let users = lifecycle(&store, 3).with_identity(Arc::new(identity));

    users
        .apply("u1", UserAction::ResetPassword, true, None, Utc::now())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_purge_deletes_only_expired_accounts() {
    let store = flaky_store(0).await;
    let users = lifecycle(&store, 3);
    let now = Utc.with_ymd_and_hms(2024, 8, 1, 0, 0, 0).unwrap();

    for (id, days_ago) in [("expired", 45), ("edge", 30), ("recent", 29), ("stuck", 60)] {
        let mut user = PlatformUser::new(id, format!("{}@example.com", id), now);
        user.account_status = AccountStatus::Deactivated;
        user.deactivated_at = Some(now - Duration::days(days_ago));
        store.put_user(&user).await.unwrap();
    }

    let report = users.purge_deactivated(now).await.unwrap();

    assert_eq!(report.processed, 3);
    assert_eq!(report.successful, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].starts_with("stuck:"));

    assert!(store.get_user("expired").await.unwrap().is_none());
    assert!(store.get_user("edge").await.unwrap().is_none());
    assert!(store.get_user("recent").await.unwrap().is_some());
    assert!(store.get_user("u1").await.unwrap().is_some());
}

#[tokio::test]
async fn test_relay_retries_transient_failures() {
    let store = flaky_store(2).await;
    let dyn_store: Arc<dyn DocumentStore> = store.clone();
    let relay =
        NotificationRelay::new(dyn_store, 3).with_initial_interval(StdDuration::from_millis(1));

    let outcome = relay.deliver("u1", &note(), Some("k-1")).await;

    assert_eq!(outcome, SideEffect::Done);
    assert_eq!(store.attempts(), 3);
    assert_eq!(store.list_notifications("u1").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_relay_gives_up_after_max_attempts() {
    let store = flaky_store(10).await;
    let dyn_store: Arc<dyn DocumentStore> = store.clone();
    let relay =
        NotificationRelay::new(dyn_store, 3).with_initial_interval(StdDuration::from_millis(1));

    let outcome = relay.deliver("u1", &note(), None).await;

    assert!(outcome.is_failure());
    assert_eq!(store.attempts(), 3);
    assert!(store.list_notifications("u1").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_relay_reports_duplicate_key() {
    let store = flaky_store(0).await;
    let dyn_store: Arc<dyn DocumentStore> = store.clone();
    let relay = NotificationRelay::new(dyn_store, 3);

    assert_eq!(relay.deliver("u1", &note(), Some("k-1")).await, SideEffect::Done);
    assert_eq!(
        relay.deliver("u1", &note(), Some("k-1")).await,
        SideEffect::Duplicate
    );
    assert_eq!(store.list_notifications("u1").await.unwrap().len(), 1);
}
