// ABOUTME: Notification relay into the capped per-user log
// ABOUTME: Retries with exponential backoff; failures are reported, never raised

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use backoff::ExponentialBackoffBuilder;
use chrono::Utc;
use patentdesk_core::NewNotification;
use patentdesk_storage::{DeliveryOutcome, DocumentStore};
use tracing::{debug, error, warn};

use crate::report::SideEffect;

const DEFAULT_INITIAL_INTERVAL: Duration = Duration::from_millis(200);
const MAX_INTERVAL: Duration = Duration::from_secs(2);

/// Idempotency key for a filing transition notification
pub fn filing_key(filing_id: i64, transition: &str) -> String {
    format!("filing-{}-{}", filing_id, transition)
}

#[derive(Clone)]
pub struct NotificationRelay {
    store: Arc<dyn DocumentStore>,
    max_attempts: u32,
    initial_interval: Duration,
}

impl NotificationRelay {
    pub fn new(store: Arc<dyn DocumentStore>, max_attempts: u32) -> Self {
        Self {
            store,
            max_attempts: max_attempts.max(1),
            initial_interval: DEFAULT_INITIAL_INTERVAL,
        }
    }

    pub fn with_initial_interval(mut self, interval: Duration) -> Self {
        self.initial_interval = interval;
        self
    }

    /// Writes `notification` for `user_id`.
    ///
    /// Every attempt reuses the same idempotency key, so an attempt that
    /// committed but looked failed is not written twice.
    pub async fn deliver(
        &self,
        user_id: &str,
        notification: &NewNotification,
        idempotency_key: Option<&str>,
    ) -> SideEffect {
        let policy = ExponentialBackoffBuilder::new()
            .with_initial_interval(self.initial_interval)
            .with_max_interval(MAX_INTERVAL)
            .with_max_elapsed_time(None)
            .build();

        let attempts = AtomicU32::new(0);
        let max_attempts = self.max_attempts;
        let store = &self.store;
        let attempts_ref = &attempts;

        let result = backoff::future::retry(policy, || async move {
            let attempt = attempts_ref.fetch_add(1, Ordering::SeqCst) + 1;
            match store
                .add_notification(user_id, notification, idempotency_key, Utc::now())
                .await
            {
                Ok(outcome) => Ok(outcome),
                Err(e) if attempt >= max_attempts => Err(backoff::Error::permanent(e)),
                Err(e) => {
                    warn!(user_id, attempt, error = %e, "Notification write failed, retrying");
                    Err(backoff::Error::transient(e))
                }
            }
        })
        .await;

        match result {
            Ok(DeliveryOutcome::Inserted(n)) => {
                debug!(user_id, notification_id = %n.id, "Notification delivered");
                SideEffect::Done
            }
            Ok(DeliveryOutcome::Duplicate(id)) => {
                debug!(user_id, notification_id = %id, "Notification already delivered");
                SideEffect::Duplicate
            }
            Err(e) => {
                error!(
                    user_id,
                    attempts = attempts.load(Ordering::SeqCst),
                    error = %e,
                    "Giving up on notification"
                );
                SideEffect::Failed(e.to_string())
            }
        }
    }
}
