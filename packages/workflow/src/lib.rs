//! PatentDesk workflow
//!
//! The admin-facing operations: grant/reject commits with their best-effort
//! notifications and counters, filing activation, replies, and the platform
//! user lifecycle including the purge of long-deactivated accounts.

pub mod controller;
pub mod counter;
pub mod error;
pub mod form;
pub mod notifications;
pub mod relay;
pub mod report;
pub mod session;
pub mod users;

pub use controller::FilingWorkflow;
pub use counter::AdminActionCounter;
pub use error::{WorkflowError, WorkflowResult};
pub use form::{FormKind, FormSlot, OpenForm};
pub use notifications::SubscriptionSummary;
pub use relay::{filing_key, NotificationRelay};
pub use report::{
    ActivationReport, CommitOutcome, CommitReport, PurgeReport, SideEffect, UserActionReport,
};
pub use session::{AdminSession, SessionStore};
pub use users::{UserAction, UserLifecycle};
