//! Identity provider client, used only for password-reset emails
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::info;

use crate::error::{BackendError, BackendResult};

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Asks the provider to email a password-reset link to `email`
    async fn send_password_reset(&self, email: &str) -> BackendResult<()>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OobCodeRequest<'a> {
    request_type: &'static str,
    email: &'a str,
}

#[derive(Clone)]
pub struct HttpIdentityProvider {
    http_client: Client,
    base_url: String,
    api_key: String,
}

impl HttpIdentityProvider {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> BackendResult<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(BackendError::config("identity provider API key is empty"));
        }

        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::config(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn send_password_reset(&self, email: &str) -> BackendResult<()> {
        let url = format!("{}/accounts:sendOobCode", self.base_url);
        let response = self
            .http_client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&OobCodeRequest {
                request_type: "PASSWORD_RESET",
                email,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| status.to_string());
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }

        info!("Password reset email requested for {}", email);
        Ok(())
    }
}
