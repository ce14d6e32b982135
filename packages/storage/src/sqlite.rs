// ABOUTME: SQLite implementation of the document store
// ABOUTME: Versioned user writes and an atomic insert-and-trim for notification logs

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use patentdesk_core::{
    AccountStatus, NewNotification, Notification, PlatformUser, SubscriptionTier, NOTIFICATION_CAP,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{StorageError, StorageResult};
use crate::store::DocumentStore;
use crate::types::{DeliveryOutcome, SearchStats, UserUpdate};

const SEARCH_COUNTER: &str = "searchCounter";

/// Fixed-width UTC timestamps so text comparison matches time order
fn fmt_ts(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn fmt_opt_ts(dt: &Option<DateTime<Utc>>) -> Option<String> {
    dt.as_ref().map(fmt_ts)
}

fn parse_ts(value: &str) -> StorageResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StorageError::InvalidData(format!("bad timestamp '{}': {}", value, e)))
}

fn parse_opt_ts(value: Option<String>) -> StorageResult<Option<DateTime<Utc>>> {
    value.as_deref().map(parse_ts).transpose()
}

pub struct SqliteDocumentStore {
    pool: SqlitePool,
}

impl SqliteDocumentStore {
    /// Opens (creating if needed) the database at `database_url` and migrates it
    pub async fn connect(database_url: &str) -> StorageResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5));

        if let Some(parent) = options.get_filename().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        info!("Opened document store at {}", database_url);
        Self::from_pool(pool).await
    }

    /// Private in-memory database, mainly for tests
    pub async fn in_memory() -> StorageResult<Self> {
        // Single connection: every new connection would see a fresh empty database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        Self::from_pool(pool).await
    }

    pub async fn from_pool(pool: SqlitePool) -> StorageResult<Self> {
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    fn row_to_user(row: &SqliteRow) -> StorageResult<PlatformUser> {
        let account_status: String = row.try_get("account_status")?;
        let subscription_type: String = row.try_get("subscription_type")?;

        Ok(PlatformUser {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            subscription_type: SubscriptionTier::from_str_lossy(&subscription_type),
            subscription_plan: row.try_get("subscription_plan")?,
            subscription_status: row.try_get("subscription_status")?,
            subscription_price: row.try_get("subscription_price")?,
            subscription_end_date: parse_opt_ts(row.try_get("subscription_end_date")?)?,
            account_status: AccountStatus::from_str(&account_status)
                .map_err(StorageError::InvalidData)?,
            email_verified: row.try_get("email_verified")?,
            is_online: row.try_get("is_online")?,
            force_logout: row.try_get("force_logout")?,
            deactivated_at: parse_opt_ts(row.try_get("deactivated_at")?)?,
            scheduled_deletion_date: parse_opt_ts(row.try_get("scheduled_deletion_date")?)?,
            banned_at: parse_opt_ts(row.try_get("banned_at")?)?,
            ban_reason: row.try_get("ban_reason")?,
            suspended_at: parse_opt_ts(row.try_get("suspended_at")?)?,
            suspend_reason: row.try_get("suspend_reason")?,
            local_search_count: row.try_get("local_search_count")?,
            api_search_count: row.try_get("api_search_count")?,
            created_at: parse_ts(&row.try_get::<String, _>("created_at")?)?,
            version: row.try_get("version")?,
        })
    }

    fn row_to_notification(row: &SqliteRow) -> StorageResult<Notification> {
        let details: Option<String> = row.try_get("details")?;

        Ok(Notification {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            title: row.try_get("title")?,
            message: row.try_get("message")?,
            details: details.as_deref().map(serde_json::from_str).transpose()?,
            created_at: parse_ts(&row.try_get::<String, _>("created_at")?)?,
            read: row.try_get("read")?,
        })
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn get_user(&self, user_id: &str) -> StorageResult<Option<PlatformUser>> {
        let row = sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_user).transpose()
    }

    async fn list_users(&self) -> StorageResult<Vec<PlatformUser>> {
        let rows = sqlx::query("SELECT * FROM users ORDER BY created_at DESC, id")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(Self::row_to_user).collect()
    }

    async fn put_user(&self, user: &PlatformUser) -> StorageResult<()> {
        debug!(user_id = %user.id, "Writing user document");

        sqlx::query(
            r#"
            INSERT OR REPLACE INTO users (
                id, name, email,
                subscription_type, subscription_plan, subscription_status,
                subscription_price, subscription_end_date,
                account_status, email_verified, is_online, force_logout,
                deactivated_at, scheduled_deletion_date,
                banned_at, ban_reason, suspended_at, suspend_reason,
                local_search_count, api_search_count,
                created_at, version
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.subscription_type.as_str())
        .bind(&user.subscription_plan)
        .bind(&user.subscription_status)
        .bind(&user.subscription_price)
        .bind(fmt_opt_ts(&user.subscription_end_date))
        .bind(user.account_status.as_str())
        .bind(user.email_verified)
        .bind(user.is_online)
        .bind(user.force_logout)
        .bind(fmt_opt_ts(&user.deactivated_at))
        .bind(fmt_opt_ts(&user.scheduled_deletion_date))
        .bind(fmt_opt_ts(&user.banned_at))
        .bind(&user.ban_reason)
        .bind(fmt_opt_ts(&user.suspended_at))
        .bind(&user.suspend_reason)
        .bind(user.local_search_count)
        .bind(user.api_search_count)
        .bind(fmt_ts(&user.created_at))
        .bind(user.version)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_user(
        &self,
        user_id: &str,
        update: &UserUpdate,
        expected_version: Option<i64>,
    ) -> StorageResult<PlatformUser> {
        debug!(user_id, ?expected_version, "Updating user document");

        if update.is_empty() {
            return self
                .get_user(user_id)
                .await?
                .ok_or_else(|| StorageError::NotFound(user_id.to_string()));
        }

        // Column names are literals; every value goes through push_bind
        let mut query_builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("UPDATE users SET version = version + 1");

        if let Some(status) = update.account_status {
            query_builder.push(", account_status = ");
            query_builder.push_bind(status.as_str());
        }
        if let Some(verified) = update.email_verified {
            query_builder.push(", email_verified = ");
            query_builder.push_bind(verified);
        }
        if let Some(force_logout) = update.force_logout {
            query_builder.push(", force_logout = ");
            query_builder.push_bind(force_logout);
        }
        if let Some(at) = &update.deactivated_at {
            query_builder.push(", deactivated_at = ");
            query_builder.push_bind(fmt_opt_ts(at));
        }
        if let Some(at) = &update.scheduled_deletion_date {
            query_builder.push(", scheduled_deletion_date = ");
            query_builder.push_bind(fmt_opt_ts(at));
        }
        if let Some(at) = &update.banned_at {
            query_builder.push(", banned_at = ");
            query_builder.push_bind(fmt_opt_ts(at));
        }
        if let Some(reason) = &update.ban_reason {
            query_builder.push(", ban_reason = ");
            query_builder.push_bind(reason.clone());
        }
        if let Some(at) = &update.suspended_at {
            query_builder.push(", suspended_at = ");
            query_builder.push_bind(fmt_opt_ts(at));
        }
        if let Some(reason) = &update.suspend_reason {
            query_builder.push(", suspend_reason = ");
            query_builder.push_bind(reason.clone());
        }
        if let Some(tier) = update.subscription_type {
            query_builder.push(", subscription_type = ");
            query_builder.push_bind(tier.as_str());
        }
        if let Some(plan) = &update.subscription_plan {
            query_builder.push(", subscription_plan = ");
            query_builder.push_bind(plan.clone());
        }
        if let Some(status) = &update.subscription_status {
            query_builder.push(", subscription_status = ");
            query_builder.push_bind(status.clone());
        }
        if let Some(at) = &update.subscription_end_date {
            query_builder.push(", subscription_end_date = ");
            query_builder.push_bind(fmt_opt_ts(at));
        }
        if let Some(count) = update.local_search_count {
            query_builder.push(", local_search_count = ");
            query_builder.push_bind(count);
        }
        if let Some(count) = update.api_search_count {
            query_builder.push(", api_search_count = ");
            query_builder.push_bind(count);
        }

        query_builder.push(" WHERE id = ");
        query_builder.push_bind(user_id);
        if let Some(expected) = expected_version {
            query_builder.push(" AND version = ");
            query_builder.push_bind(expected);
        }

        let mut tx = self.pool.begin().await?;

        let result = query_builder.build().execute(&mut *tx).await?;

        if result.rows_affected() == 0 {
            let actual: Option<i64> = sqlx::query_scalar("SELECT version FROM users WHERE id = ?")
                .bind(user_id)
                .fetch_optional(&mut *tx)
                .await?;

            return Err(match actual {
                None => StorageError::NotFound(user_id.to_string()),
                Some(actual) => StorageError::VersionConflict {
                    id: user_id.to_string(),
                    expected: expected_version.unwrap_or(actual),
                    actual,
                },
            });
        }

        let row = sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_one(&mut *tx)
            .await?;
        let user = Self::row_to_user(&row)?;

        tx.commit().await?;

        Ok(user)
    }

    async fn delete_user(&self, user_id: &str) -> StorageResult<()> {
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        if deleted.rows_affected() == 0 {
            return Err(StorageError::NotFound(user_id.to_string()));
        }

        sqlx::query("DELETE FROM notifications WHERE user_id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM notification_deliveries WHERE user_id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        info!(user_id, "Deleted user document");
        Ok(())
    }

    async fn deactivated_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> StorageResult<Vec<PlatformUser>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM users
            WHERE account_status = 'deactivated'
              AND deactivated_at IS NOT NULL
              AND deactivated_at <= ?
            ORDER BY deactivated_at
            "#,
        )
        .bind(fmt_ts(&cutoff))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_user).collect()
    }

    async fn add_notification(
        &self,
        user_id: &str,
        notification: &NewNotification,
        idempotency_key: Option<&str>,
        now: DateTime<Utc>,
    ) -> StorageResult<DeliveryOutcome> {
        let id = Uuid::new_v4().to_string();
        let created_at = fmt_ts(&now);
        let details = notification
            .details
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        // First statement is a write so the transaction holds the write lock
        // for the whole insert-and-trim
        let mut tx = self.pool.begin().await?;

        if let Some(key) = idempotency_key {
            let claimed = sqlx::query(
                r#"
                INSERT OR IGNORE INTO notification_deliveries
                    (idempotency_key, user_id, notification_id, delivered_at)
                VALUES (?, ?, ?, ?)
                "#,
            )
            .bind(key)
            .bind(user_id)
            .bind(&id)
            .bind(&created_at)
            .execute(&mut *tx)
            .await?;

            if claimed.rows_affected() == 0 {
                let existing: String = sqlx::query_scalar(
                    "SELECT notification_id FROM notification_deliveries WHERE idempotency_key = ?",
                )
                .bind(key)
                .fetch_one(&mut *tx)
                .await?;
                tx.rollback().await?;

                debug!(user_id, key, "Notification already delivered");
                return Ok(DeliveryOutcome::Duplicate(existing));
            }
        }

        sqlx::query(
            r#"
            INSERT INTO notifications (id, user_id, title, message, details, created_at, read)
            VALUES (?, ?, ?, ?, ?, ?, 0)
            "#,
        )
        .bind(&id)
        .bind(user_id)
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(&details)
        .bind(&created_at)
        .execute(&mut *tx)
        .await?;

        let trimmed = sqlx::query(
            r#"
            DELETE FROM notifications
            WHERE user_id = ?
              AND seq NOT IN (
                  SELECT seq FROM notifications
                  WHERE user_id = ?
                  ORDER BY seq DESC
                  LIMIT ?
              )
            "#,
        )
        .bind(user_id)
        .bind(user_id)
        .bind(NOTIFICATION_CAP as i64)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(
            user_id,
            notification_id = %id,
            trimmed = trimmed.rows_affected(),
            "Notification stored"
        );

        Ok(DeliveryOutcome::Inserted(Notification {
            id,
            user_id: user_id.to_string(),
            title: notification.title.clone(),
            message: notification.message.clone(),
            details: notification.details.clone(),
            created_at: now,
            read: false,
        }))
    }

    async fn list_notifications(&self, user_id: &str) -> StorageResult<Vec<Notification>> {
        let rows = sqlx::query(
            "SELECT * FROM notifications WHERE user_id = ? ORDER BY seq DESC LIMIT ?",
        )
        .bind(user_id)
        .bind(NOTIFICATION_CAP as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_notification).collect()
    }

    async fn delete_notification(
        &self,
        user_id: &str,
        notification_id: &str,
    ) -> StorageResult<bool> {
        let result = sqlx::query("DELETE FROM notifications WHERE user_id = ? AND id = ?")
            .bind(user_id)
            .bind(notification_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn clear_notifications(&self, user_id: &str) -> StorageResult<u64> {
        let result = sqlx::query("DELETE FROM notifications WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn search_stats(&self) -> StorageResult<SearchStats> {
        let row = sqlx::query(
            "SELECT local_search_count, api_search_count, updated_at FROM global_stats WHERE name = ?",
        )
        .bind(SEARCH_COUNTER)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(SearchStats {
                local_search_count: row.try_get("local_search_count")?,
                api_search_count: row.try_get("api_search_count")?,
                updated_at: row.try_get("updated_at")?,
            }),
            None => Ok(SearchStats::default()),
        }
    }
}
