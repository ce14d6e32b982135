//! Logged-in admin identity kept between CLI invocations

use chrono::{DateTime, Utc};
use patentdesk_core::AdminUser;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::error::{WorkflowError, WorkflowResult};

/// Stored as TOML; holds no password
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminSession {
    pub admin_id: i64,
    pub admin_name: String,
    pub email: String,
    pub logged_in_at: DateTime<Utc>,
}

impl AdminSession {
    pub fn new(admin: &AdminUser, logged_in_at: DateTime<Utc>) -> Self {
        Self {
            admin_id: admin.admin_id,
            admin_name: admin.admin_name.clone(),
            email: admin.email.clone(),
            logged_in_at,
        }
    }

    pub fn to_admin(&self) -> AdminUser {
        AdminUser {
            admin_id: self.admin_id,
            admin_name: self.admin_name.clone(),
            email: self.email.clone(),
            ..Default::default()
        }
    }
}

pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn load(&self) -> WorkflowResult<Option<AdminSession>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path).await?;
        let session = toml::from_str(&content)
            .map_err(|e| WorkflowError::Session(format!("Invalid session file: {}", e)))?;
        Ok(Some(session))
    }

    pub async fn save(&self, session: &AdminSession) -> WorkflowResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let content = toml::to_string_pretty(session)
            .map_err(|e| WorkflowError::Session(format!("Failed to serialize session: {}", e)))?;
        fs::write(&self.path, content).await?;
        Ok(())
    }

    /// Returns whether a session existed
    pub async fn clear(&self) -> WorkflowResult<bool> {
        if !self.path.exists() {
            return Ok(false);
        }
        fs::remove_file(&self.path).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_session_round_trip_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("nested").join("session.toml"));
        assert!(store.load().await.unwrap().is_none());

        let admin = AdminUser {
            admin_id: 7,
            admin_name: "Meera".to_string(),
            email: "meera@example.com".to_string(),
            ..Default::default()
        };
        let session = AdminSession::new(&admin, Utc::now());
        store.save(&session).await.unwrap();

        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded, session);
        assert_eq!(loaded.to_admin().admin_id, 7);

        assert!(store.clear().await.unwrap());
        assert!(!store.clear().await.unwrap());
    }

    #[tokio::test]
    async fn test_corrupt_session_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.toml");
        std::fs::write(&path, "admin_id = \"not a number\"").unwrap();

        let err = SessionStore::new(path).load().await.unwrap_err();
        assert!(matches!(err, WorkflowError::Session(_)));
    }
}
