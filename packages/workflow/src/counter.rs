// ABOUTME: Per-admin action counter used by the leaderboard
// ABOUTME: Each increment carries a fresh request id so the backend can drop replays

use std::sync::Arc;

use patentdesk_backend::PatentBackend;
use patentdesk_core::ActionType;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::report::SideEffect;

#[derive(Clone)]
pub struct AdminActionCounter {
    backend: Arc<dyn PatentBackend>,
}

impl AdminActionCounter {
    pub fn new(backend: Arc<dyn PatentBackend>) -> Self {
        Self { backend }
    }

    /// Best effort: a failed increment is logged and reported, not raised
    pub async fn record(&self, admin_id: i64, action: ActionType) -> SideEffect {
        let request_id = Uuid::new_v4().to_string();

        match self.backend.track_action(admin_id, action, &request_id).await {
            Ok(()) => {
                debug!(admin_id, action = %action, request_id, "Admin action tracked");
                SideEffect::Done
            }
            Err(e) => {
                warn!(admin_id, action = %action, error = %e, "Failed to track admin action");
                SideEffect::Failed(e.to_string())
            }
        }
    }
}
