use std::time::Duration;

use async_trait::async_trait;
use patentdesk_core::validation::{LoginRequest, ReplyRequest};
use patentdesk_core::{ActionType, AdminUser, PatentFiling, RejectRequest, StageUpdate};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::api::{
    ActivationResponse, Feedback, FeedbackStats, FilingUpdateResponse, StatusCount,
    TrackActionRequest, YearlyCount,
};
use crate::error::{BackendError, BackendResult};

/// Header carrying the per-request idempotency id on counter increments
pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// Every REST call the admin console makes.
///
/// The workflow crate only sees this trait so tests can swap in a mock.
#[async_trait]
pub trait PatentBackend: Send + Sync {
    // Admins
    async fn login(&self, request: &LoginRequest) -> BackendResult<AdminUser>;
    async fn list_admins(&self) -> BackendResult<Vec<AdminUser>>;
    async fn track_action(
        &self,
        admin_id: i64,
        action: ActionType,
        request_id: &str,
    ) -> BackendResult<()>;

    // Filings
    async fn list_filings(&self) -> BackendResult<Vec<PatentFiling>>;
    async fn filing_count(&self) -> BackendResult<u64>;
    async fn update_stages(
        &self,
        filing_id: i64,
        update: &StageUpdate,
    ) -> BackendResult<FilingUpdateResponse>;
    async fn reject_filing(
        &self,
        filing_id: i64,
        request: &RejectRequest,
    ) -> BackendResult<FilingUpdateResponse>;
    async fn set_filing_active(
        &self,
        filing_id: i64,
        active: bool,
    ) -> BackendResult<ActivationResponse>;
    async fn send_reply(&self, filing_id: i64, reply: &ReplyRequest)
        -> BackendResult<PatentFiling>;

    // Analytics
    async fn count_by_state(&self, state: &str) -> BackendResult<u64>;
    async fn yearly_counts(&self) -> BackendResult<Vec<YearlyCount>>;
    async fn status_counts_by_date(&self) -> BackendResult<Vec<StatusCount>>;
    async fn feedback_stats(&self) -> BackendResult<FeedbackStats>;
    async fn list_feedback(&self) -> BackendResult<Vec<Feedback>>;

    async fn health(&self) -> BackendResult<bool>;
}

/// reqwest implementation of [`PatentBackend`]
#[derive(Clone)]
pub struct HttpBackend {
    http_client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> BackendResult<Self> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::config(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Turns a non-2xx answer into [`BackendError::Status`] with the server text
    async fn check(response: Response) -> BackendResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .ok()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("").to_string());
        Err(BackendError::Status {
            status: status.as_u16(),
            body,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> BackendResult<T> {
        debug!("GET {}", path);
        let response = self.http_client.get(self.url(path)).send().await?;
        let response = Self::check(response).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))
    }

    async fn put_json<B, T>(&self, path: &str, body: &B) -> BackendResult<T>
    where
        B: serde::Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        debug!("PUT {}", path);
        let response = self.http_client.put(self.url(path)).json(body).send().await?;
        let response = Self::check(response).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl PatentBackend for HttpBackend {
    async fn login(&self, request: &LoginRequest) -> BackendResult<AdminUser> {
        debug!(admin_id = request.admin_id, "POST /admin/login");
        let response = self
            .http_client
            .post(self.url("/admin/login"))
            .json(request)
            .send()
            .await?;
        let response = Self::check(response).await?;
        response
            .json::<AdminUser>()
            .await
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))
    }

    async fn list_admins(&self) -> BackendResult<Vec<AdminUser>> {
        self.get_json("/admin/all").await
    }

    async fn track_action(
        &self,
        admin_id: i64,
        action: ActionType,
        request_id: &str,
    ) -> BackendResult<()> {
        let path = format!("/admin/{}/track-action", admin_id);
        debug!(admin_id, action = %action, request_id, "POST {}", path);

        let body = TrackActionRequest {
            action_type: action,
            request_id: request_id.to_string(),
        };
        let response = self
            .http_client
            .post(self.url(&path))
            .header(REQUEST_ID_HEADER, request_id)
            .json(&body)
            .send()
            .await?;

        // Body is a plain-text acknowledgement
        Self::check(response).await.map(|_| ())
    }

    async fn list_filings(&self) -> BackendResult<Vec<PatentFiling>> {
        self.get_json("/patent-filing/all").await
    }

    async fn filing_count(&self) -> BackendResult<u64> {
        self.get_json("/patent-filing/count").await
    }

    async fn update_stages(
        &self,
        filing_id: i64,
        update: &StageUpdate,
    ) -> BackendResult<FilingUpdateResponse> {
        self.put_json(&format!("/patent-filing/{}/stages", filing_id), update)
            .await
    }

    async fn reject_filing(
        &self,
        filing_id: i64,
        request: &RejectRequest,
    ) -> BackendResult<FilingUpdateResponse> {
        self.put_json(&format!("/patent-filing/{}/reject", filing_id), request)
            .await
    }

    async fn set_filing_active(
        &self,
        filing_id: i64,
        active: bool,
    ) -> BackendResult<ActivationResponse> {
        let verb = if active { "activate" } else { "deactivate" };
        let path = format!("/patent-filing/{}/{}", filing_id, verb);
        debug!(filing_id, "PUT {}", path);

        let response = self.http_client.put(self.url(&path)).send().await?;
        let response = Self::check(response).await?;
        response
            .json::<ActivationResponse>()
            .await
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))
    }

    async fn send_reply(
        &self,
        filing_id: i64,
        reply: &ReplyRequest,
    ) -> BackendResult<PatentFiling> {
        self.put_json(&format!("/patent-filing/{}/reply", filing_id), reply)
            .await
    }

    async fn count_by_state(&self, state: &str) -> BackendResult<u64> {
        debug!(state, "GET /patents/count-by-state");
        let response = self
            .http_client
            .get(self.url("/patents/count-by-state"))
            .query(&[("state", state)])
            .send()
            .await?;
        let response = Self::check(response).await?;
        response
            .json::<u64>()
            .await
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))
    }

    async fn yearly_counts(&self) -> BackendResult<Vec<YearlyCount>> {
        self.get_json("/patents/yearly-counts").await
    }

    async fn status_counts_by_date(&self) -> BackendResult<Vec<StatusCount>> {
        self.get_json("/patents/status-counts-by-date").await
    }

    async fn feedback_stats(&self) -> BackendResult<FeedbackStats> {
        self.get_json("/feedback/stats").await
    }

    async fn list_feedback(&self) -> BackendResult<Vec<Feedback>> {
        self.get_json("/feedback/all").await
    }

    async fn health(&self) -> BackendResult<bool> {
        let response = self.http_client.get(self.url("/health")).send().await?;
        Ok(response.status().is_success())
    }
}
