// ABOUTME: Builds the backend client, document store and controllers from Config
// ABOUTME: Restores the logged-in admin from the session file for each invocation

use std::sync::Arc;

use anyhow::{Context, Result};
use patentdesk_backend::{HttpBackend, HttpIdentityProvider, PatentBackend};
use patentdesk_storage::{DocumentStore, SqliteDocumentStore};
use patentdesk_workflow::{
    AdminSession, FilingWorkflow, NotificationRelay, SessionStore, UserLifecycle, WorkflowError,
};
use tracing::debug;

use crate::config::Config;

pub struct AppContext {
    config: Config,
    backend: Arc<dyn PatentBackend>,
    sessions: SessionStore,
    store: Option<Arc<dyn DocumentStore>>,
}

impl AppContext {
    pub fn new(config: Config) -> Result<Self> {
        let backend = HttpBackend::new(&config.api_base_url, config.http_timeout)
            .context("Failed to build REST client")?;
        let sessions = SessionStore::new(&config.session_file);

        Ok(Self {
            config,
            backend: Arc::new(backend),
            sessions,
            store: None,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn backend(&self) -> Arc<dyn PatentBackend> {
        Arc::clone(&self.backend)
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Document store, opened on first use
    pub async fn store(&mut self) -> Result<Arc<dyn DocumentStore>> {
        if let Some(store) = &self.store {
            return Ok(Arc::clone(store));
        }

        debug!(url = %self.config.database_url, "Opening document store");
        let store: Arc<dyn DocumentStore> = Arc::new(
            SqliteDocumentStore::connect(&self.config.database_url)
                .await
                .context("Failed to open document store")?,
        );
        self.store = Some(Arc::clone(&store));
        Ok(store)
    }

    async fn relay(&mut self) -> Result<NotificationRelay> {
        let store = self.store().await?;
        Ok(NotificationRelay::new(store, self.config.notification_retries))
    }

    pub async fn session(&self) -> Result<AdminSession> {
        self.sessions
            .load()
            .await?
            .ok_or_else(|| WorkflowError::NotLoggedIn.into())
    }

    /// Filing workflow acting as the logged-in admin
    pub async fn workflow(&mut self) -> Result<FilingWorkflow> {
        let session = self.session().await?;
        let store = self.store().await?;
        let relay = self.relay().await?;
        Ok(FilingWorkflow::new(self.backend(), store, relay).with_admin(session.to_admin()))
    }

    /// User lifecycle controller; password resets need the identity API key
    pub async fn users(&mut self) -> Result<UserLifecycle> {
        self.session().await?;
        let store = self.store().await?;
        let relay = self.relay().await?;
        let lifecycle = UserLifecycle::new(store, relay);

        match &self.config.identity_api_key {
            Some(key) => {
                let identity = HttpIdentityProvider::new(
                    &self.config.identity_url,
                    key,
                    self.config.http_timeout,
                )?;
                Ok(lifecycle.with_identity(Arc::new(identity)))
            }
            None => Ok(lifecycle),
        }
    }
}
