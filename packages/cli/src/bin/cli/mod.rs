pub mod auth;
pub mod dashboard;
pub mod filings;
pub mod notifications;
pub mod users;
pub mod utils;
