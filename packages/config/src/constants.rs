// ABOUTME: Environment variable name constants and their default values
// ABOUTME: Centralized definitions of all environment variables read by PatentDesk

// REST Backend
pub const PATENTDESK_API_BASE_URL: &str = "PATENTDESK_API_BASE_URL";
pub const PATENTDESK_HTTP_TIMEOUT_SECS: &str = "PATENTDESK_HTTP_TIMEOUT_SECS";

// Document Store
pub const PATENTDESK_DATABASE_URL: &str = "PATENTDESK_DATABASE_URL";
pub const PATENTDESK_NOTIFICATION_RETRIES: &str = "PATENTDESK_NOTIFICATION_RETRIES";

// Identity Provider (password reset emails)
pub const PATENTDESK_IDENTITY_API_KEY: &str = "PATENTDESK_IDENTITY_API_KEY";
pub const PATENTDESK_IDENTITY_URL: &str = "PATENTDESK_IDENTITY_URL";

// Admin Session
pub const PATENTDESK_SESSION_FILE: &str = "PATENTDESK_SESSION_FILE";

// Defaults
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api";
pub const DEFAULT_IDENTITY_URL: &str = "https://identitytoolkit.googleapis.com/v1";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_NOTIFICATION_RETRIES: u32 = 3;

pub const DATA_DIR_NAME: &str = ".patentdesk";
pub const DATABASE_FILE_NAME: &str = "documents.db";
pub const SESSION_FILE_NAME: &str = "session.toml";
