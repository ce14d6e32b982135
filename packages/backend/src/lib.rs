//! PatentDesk backend clients
//!
//! Typed access to the REST backend that owns patent filings and admin
//! profiles, plus the identity provider used for password-reset emails.

pub mod api;
pub mod client;
pub mod error;
pub mod identity;

pub use api::{
    ActivationResponse, Feedback, FeedbackStats, FilingUpdateResponse, StatusCount,
    TrackActionRequest, YearlyCount,
};
pub use client::{HttpBackend, PatentBackend, REQUEST_ID_HEADER};
pub use error::{BackendError, BackendResult};
pub use identity::{HttpIdentityProvider, IdentityProvider};
