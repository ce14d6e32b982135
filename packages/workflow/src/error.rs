//! Workflow error types
use patentdesk_backend::BackendError;
use patentdesk_core::{TransitionError, ValidationError};
use patentdesk_storage::StorageError;
use thiserror::Error;

/// Result type for workflow operations
pub type WorkflowResult<T> = Result<T, WorkflowError>;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Not logged in. Run 'patentdesk login' first")]
    NotLoggedIn,

    /// Rejected before any network call
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("Document store error: {0}")]
    Storage(#[from] StorageError),

    #[error("Filing {0} not found")]
    FilingNotFound(i64),

    #[error("User {0} not found")]
    UserNotFound(String),

    #[error("User {0} has no email address")]
    MissingEmail(String),

    #[error("Confirmation required: {0}")]
    ConfirmationRequired(String),

    #[error("Password reset is not configured: {0}")]
    IdentityUnavailable(String),

    #[error("Session error: {0}")]
    Session(String),
}

impl WorkflowError {
    /// Labels of the fields a grant/reject form was missing
    pub fn missing_fields(&self) -> &[String] {
        match self {
            WorkflowError::Validation(err) => err.missing_fields(),
            _ => &[],
        }
    }

    pub fn is_validation_error(&self) -> bool {
        matches!(self, WorkflowError::Validation(_))
    }
}

impl From<std::io::Error> for WorkflowError {
    fn from(err: std::io::Error) -> Self {
        Self::Session(err.to_string())
    }
}
