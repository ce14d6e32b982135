//! Backend error types
use thiserror::Error;

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

#[derive(Debug, Error)]
pub enum BackendError {
    /// The request never produced a response (connect failure, timeout, reset)
    #[error("Network error: {0}")]
    Network(String),

    /// The backend answered with a non-2xx status
    #[error("Request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl BackendError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Check if this is a connectivity failure rather than an HTTP answer
    pub fn is_network_error(&self) -> bool {
        matches!(self, BackendError::Network(_))
    }

    /// HTTP status code, when the backend answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            BackendError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::InvalidResponse(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for BackendError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidResponse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_carries_code() {
        let err = BackendError::Status {
            status: 404,
            body: "Filing not found".to_string(),
        };
        assert_eq!(err.status(), Some(404));
        assert!(!err.is_network_error());
        assert_eq!(
            err.to_string(),
            "Request failed with status 404: Filing not found"
        );
    }

    #[test]
    fn test_network_error_has_no_status() {
        let err = BackendError::Network("connection refused".to_string());
        assert!(err.is_network_error());
        assert_eq!(err.status(), None);
    }
}
