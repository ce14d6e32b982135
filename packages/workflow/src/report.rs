// ABOUTME: Outcome types returned by workflow commits
// ABOUTME: Best-effort side effects are reported here instead of failing the commit

use std::fmt;

use patentdesk_backend::FilingUpdateResponse;
use patentdesk_core::{FilingState, PlatformUser};
use serde::Serialize;

/// What happened to a best-effort side effect after the primary write
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SideEffect {
    Done,
    /// Already delivered under the same idempotency key
    Duplicate,
    Skipped(String),
    Failed(String),
}

impl SideEffect {
    pub fn is_failure(&self) -> bool {
        matches!(self, SideEffect::Failed(_))
    }
}

impl fmt::Display for SideEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SideEffect::Done => write!(f, "done"),
            SideEffect::Duplicate => write!(f, "already delivered"),
            SideEffect::Skipped(reason) => write!(f, "skipped ({})", reason),
            SideEffect::Failed(reason) => write!(f, "failed ({})", reason),
        }
    }
}

/// Result of a committed grant or reject
#[derive(Debug, Clone, PartialEq)]
pub struct CommitReport {
    pub filing_id: i64,
    pub state: FilingState,
    pub response: FilingUpdateResponse,
    pub notification: SideEffect,
    pub counter: SideEffect,
    /// False when the post-commit list re-fetch failed
    pub refreshed: bool,
}

/// Two-step grant/reject: the first call only opens the detail form
#[derive(Debug, Clone, PartialEq)]
pub enum CommitOutcome {
    FormOpened { filing_id: i64 },
    Committed(CommitReport),
}

/// Result of activating or deactivating a filing
#[derive(Debug, Clone, PartialEq)]
pub struct ActivationReport {
    pub filing_id: i64,
    pub is_active: bool,
    pub message: Option<String>,
    pub notification: SideEffect,
    pub counter: SideEffect,
    pub refreshed: bool,
}

/// Result of a user lifecycle action
#[derive(Debug, Clone, PartialEq)]
pub struct UserActionReport {
    /// `None` once the user has been deleted
    pub user: Option<PlatformUser>,
    pub notification: SideEffect,
}

/// Outcome of a deactivated-account purge run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PurgeReport {
    pub processed: usize,
    pub successful: usize,
    pub failed: usize,
    pub errors: Vec<String>,
}
