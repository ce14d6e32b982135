use async_trait::async_trait;
use chrono::{DateTime, Utc};
use patentdesk_core::{NewNotification, Notification, PlatformUser};

use crate::error::StorageResult;
use crate::types::{DeliveryOutcome, SearchStats, UserUpdate};

/// Document store holding user profiles and their notification logs.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get_user(&self, user_id: &str) -> StorageResult<Option<PlatformUser>>;

    /// All users, newest first
    async fn list_users(&self) -> StorageResult<Vec<PlatformUser>>;

    /// Inserts or replaces a whole document as given, version included
    async fn put_user(&self, user: &PlatformUser) -> StorageResult<()>;

    /// Applies a partial update and bumps the version.
    ///
    /// With `expected_version` the write only happens if the stored version
    /// still matches, otherwise `VersionConflict`.
    async fn update_user(
        &self,
        user_id: &str,
        update: &UserUpdate,
        expected_version: Option<i64>,
    ) -> StorageResult<PlatformUser>;

    /// Hard delete of the user document and everything stored under it
    async fn delete_user(&self, user_id: &str) -> StorageResult<()>;

    /// Users deactivated at or before `cutoff`
    async fn deactivated_before(&self, cutoff: DateTime<Utc>) -> StorageResult<Vec<PlatformUser>>;

    /// Inserts a notification and trims the user's log to the cap in one
    /// transaction. A repeated `idempotency_key` is a no-op.
    async fn add_notification(
        &self,
        user_id: &str,
        notification: &NewNotification,
        idempotency_key: Option<&str>,
        now: DateTime<Utc>,
    ) -> StorageResult<DeliveryOutcome>;

    /// Newest first
    async fn list_notifications(&self, user_id: &str) -> StorageResult<Vec<Notification>>;

    /// Returns false when no such notification exists for the user
    async fn delete_notification(&self, user_id: &str, notification_id: &str)
        -> StorageResult<bool>;

    /// Returns the number of notifications removed
    async fn clear_notifications(&self, user_id: &str) -> StorageResult<u64>;

    async fn search_stats(&self) -> StorageResult<SearchStats>;
}
