// ABOUTME: Grant/reject workflow controller for patent filings
// ABOUTME: Validates, plans the transition, commits over REST, then runs best-effort side effects

use std::sync::Arc;

use patentdesk_backend::{FilingUpdateResponse, PatentBackend};
use patentdesk_core::validation::{validate_reply, LoginInput};
use patentdesk_core::{
    plan_transition, validate_grant, validate_login, validate_reject, ActionType, AdminUser,
    DetailFields, FilingState, NewNotification, PatentFiling, Stage, StagePolicy, Transition,
    TransitionPlan,
};
use patentdesk_storage::DocumentStore;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::counter::AdminActionCounter;
use crate::error::{WorkflowError, WorkflowResult};
use crate::form::{FormKind, FormSlot, OpenForm};
use crate::notifications::{self, SubscriptionSummary};
use crate::relay::{filing_key, NotificationRelay};
use crate::report::{ActivationReport, CommitOutcome, CommitReport, SideEffect};

/// Drives every admin action on patent filings.
///
/// Holds the acting admin, the single open detail form and the last fetched
/// filing list, the way the console keeps them between clicks.
pub struct FilingWorkflow {
    backend: Arc<dyn PatentBackend>,
    store: Arc<dyn DocumentStore>,
    relay: NotificationRelay,
    counter: AdminActionCounter,
    admin: Option<AdminUser>,
    form: FormSlot,
    filings: Vec<PatentFiling>,
}

impl FilingWorkflow {
    pub fn new(
        backend: Arc<dyn PatentBackend>,
        store: Arc<dyn DocumentStore>,
        relay: NotificationRelay,
    ) -> Self {
        Self {
            counter: AdminActionCounter::new(Arc::clone(&backend)),
            backend,
            store,
            relay,
            admin: None,
            form: FormSlot::default(),
            filings: Vec::new(),
        }
    }

    pub fn with_admin(mut self, admin: AdminUser) -> Self {
        self.admin = Some(admin);
        self
    }

    pub fn admin(&self) -> Option<&AdminUser> {
        self.admin.as_ref()
    }

    fn admin_id(&self) -> WorkflowResult<i64> {
        self.admin
            .as_ref()
            .map(|a| a.admin_id)
            .ok_or(WorkflowError::NotLoggedIn)
    }

    /// Validates the form locally, then authenticates against the backend
    pub async fn login(&mut self, input: &LoginInput) -> WorkflowResult<AdminUser> {
        let request = validate_login(input)?;
        let admin = self.backend.login(&request).await?;
        info!(admin_id = admin.admin_id, "Admin logged in");
        self.admin = Some(admin.clone());
        Ok(admin)
    }

    pub fn logout(&mut self) {
        self.admin = None;
        self.form.close();
        self.filings.clear();
    }

    /// Re-fetches the full filing list
    pub async fn refresh(&mut self) -> WorkflowResult<&[PatentFiling]> {
        self.filings = self.backend.list_filings().await?;
        debug!(count = self.filings.len(), "Filing list refreshed");
        Ok(&self.filings)
    }

    /// Last fetched list, without a network call
    pub fn filings(&self) -> &[PatentFiling] {
        &self.filings
    }

    /// Cached copy of a filing, fetching the list when it is not known yet
    pub async fn filing(&mut self, filing_id: i64) -> WorkflowResult<PatentFiling> {
        if let Some(filing) = self.filings.iter().find(|f| f.id == filing_id) {
            return Ok(filing.clone());
        }
        self.refresh().await?;
        self.filings
            .iter()
            .find(|f| f.id == filing_id)
            .cloned()
            .ok_or(WorkflowError::FilingNotFound(filing_id))
    }

    pub fn open_form(&mut self, filing_id: i64, kind: FormKind) -> Option<OpenForm> {
        self.form.open(filing_id, kind)
    }

    pub fn open_form_state(&self) -> Option<OpenForm> {
        self.form.current()
    }

    /// Grant path. Without an open grant form for this filing the call only
    /// opens it; with one, the fields are validated and the grant committed.
    pub async fn submit_grant(
        &mut self,
        filing_id: i64,
        fields: &DetailFields,
    ) -> WorkflowResult<CommitOutcome> {
        if !self.form.is_open_for(filing_id, FormKind::Grant) {
            self.form.open(filing_id, FormKind::Grant);
            return Ok(CommitOutcome::FormOpened { filing_id });
        }

        let admin_id = self.admin_id()?;
        let details = validate_grant(fields)?;
        let filing = self.filing(filing_id).await?;

        let plan = plan_transition(&filing, &Transition::Grant(details.clone()))?;
        let response = self.commit(filing_id, plan).await?;
        self.form.close();
        info!(filing_id, admin_id, "Patent granted");

        // a reset can reopen a granted filing, so each grant is its own event
        let key = filing_key(filing_id, &format!("grant-{}", Uuid::new_v4()));
        let summary = self.owner_subscription(&filing).await;
        let notification = self
            .notify_owner(
                &filing,
                notifications::patent_granted(&filing, &details, &summary),
                key,
            )
            .await;
        let counter = self.counter.record(admin_id, ActionType::Granted).await;
        let refreshed = self.refresh_after_commit().await;

        Ok(CommitOutcome::Committed(CommitReport {
            filing_id,
            state: FilingState::Granted,
            response,
            notification,
            counter,
            refreshed,
        }))
    }

    /// Reject path, symmetric to [`FilingWorkflow::submit_grant`]
    pub async fn submit_reject(
        &mut self,
        filing_id: i64,
        fields: &DetailFields,
    ) -> WorkflowResult<CommitOutcome> {
        if !self.form.is_open_for(filing_id, FormKind::Reject) {
            self.form.open(filing_id, FormKind::Reject);
            return Ok(CommitOutcome::FormOpened { filing_id });
        }

        let admin_id = self.admin_id()?;
        let details = validate_reject(fields)?;
        let filing = self.filing(filing_id).await?;

        let plan = plan_transition(&filing, &Transition::Reject(details.clone()))?;
        let response = self.commit(filing_id, plan).await?;
        self.form.close();
        info!(filing_id, admin_id, "Patent rejected");

        let summary = self.owner_subscription(&filing).await;
        let notification = self
            .notify_owner(
                &filing,
                notifications::patent_rejected(&filing, &details, &summary),
                filing_key(filing_id, "reject"),
            )
            .await;
        let counter = self.counter.record(admin_id, ActionType::Rejected).await;
        let refreshed = self.refresh_after_commit().await;

        Ok(CommitOutcome::Committed(CommitReport {
            filing_id,
            state: FilingState::Rejected,
            response,
            notification,
            counter,
            refreshed,
        }))
    }

    /// Per-stage toggle
    pub async fn set_stage(
        &mut self,
        filing_id: i64,
        stage: Stage,
        value: bool,
        policy: StagePolicy,
    ) -> WorkflowResult<FilingUpdateResponse> {
        self.admin_id()?;
        let filing = self.filing(filing_id).await?;
        let plan = plan_transition(
            &filing,
            &Transition::SetStage {
                stage,
                value,
                policy,
            },
        )?;

        let response = self.commit(filing_id, plan).await?;
        info!(filing_id, stage = %stage, value, ?policy, "Stage updated");
        self.refresh_after_commit().await;
        Ok(response)
    }

    /// Stage 1 on, stages 2-5 off
    pub async fn reset_stages(&mut self, filing_id: i64) -> WorkflowResult<FilingUpdateResponse> {
        self.admin_id()?;
        let filing = self.filing(filing_id).await?;
        let plan = plan_transition(&filing, &Transition::ResetStages)?;

        let response = self.commit(filing_id, plan).await?;
        info!(filing_id, "Stages reset");
        self.refresh_after_commit().await;
        Ok(response)
    }

    pub async fn activate(&mut self, filing_id: i64) -> WorkflowResult<ActivationReport> {
        let admin_id = self.admin_id()?;
        let response = self.backend.set_filing_active(filing_id, true).await?;
        info!(filing_id, admin_id, "Filing activated");

        let counter = self.counter.record(admin_id, ActionType::Activated).await;
        let refreshed = self.refresh_after_commit().await;

        Ok(ActivationReport {
            filing_id,
            is_active: response.is_active,
            message: response.message,
            notification: SideEffect::Skipped("activation does not notify".to_string()),
            counter,
            refreshed,
        })
    }

    /// Hides the filing from its owner and tells them so
    pub async fn deactivate(&mut self, filing_id: i64) -> WorkflowResult<ActivationReport> {
        let admin_id = self.admin_id()?;
        let filing = self.filing(filing_id).await?;
        let response = self.backend.set_filing_active(filing_id, false).await?;
        info!(filing_id, admin_id, "Filing deactivated");

        // Deactivation can repeat, so each action gets its own key
        let key = filing_key(filing_id, &format!("deactivate-{}", Uuid::new_v4()));
        let notification = self
            .notify_owner(&filing, notifications::patent_deactivated(&filing), key)
            .await;
        let counter = self.counter.record(admin_id, ActionType::Deactivated).await;
        let refreshed = self.refresh_after_commit().await;

        Ok(ActivationReport {
            filing_id,
            is_active: response.is_active,
            message: response.message,
            notification,
            counter,
            refreshed,
        })
    }

    /// Writes the next free reply slot, refusing once r1..r4 are used
    pub async fn send_reply(
        &mut self,
        filing_id: i64,
        content: &str,
    ) -> WorkflowResult<PatentFiling> {
        self.admin_id()?;
        let filing = self.filing(filing_id).await?;
        let request = validate_reply(&filing, content)?;

        let updated = self.backend.send_reply(filing_id, &request).await?;
        info!(filing_id, reply_field = %request.reply_field, "Reply sent");

        if let Some(cached) = self.filings.iter_mut().find(|f| f.id == filing_id) {
            *cached = updated.clone();
        }
        Ok(updated)
    }

    async fn commit(
        &self,
        filing_id: i64,
        plan: TransitionPlan,
    ) -> WorkflowResult<FilingUpdateResponse> {
        let response = match plan {
            TransitionPlan::Stages(update) => self.backend.update_stages(filing_id, &update).await?,
            TransitionPlan::Reject(request) => {
                self.backend.reject_filing(filing_id, &request).await?
            }
        };

        if response.email_sent == Some(false) {
            debug!(filing_id, "Backend did not email the applicant");
        }
        Ok(response)
    }

    async fn owner_subscription(&self, filing: &PatentFiling) -> SubscriptionSummary {
        let Some(user_id) = filing.user_id.as_deref() else {
            return SubscriptionSummary::default();
        };

        match self.store.get_user(user_id).await {
            Ok(user) => SubscriptionSummary::from_user(user.as_ref()),
            Err(e) => {
                warn!(user_id, error = %e, "Could not read owner subscription");
                SubscriptionSummary::default()
            }
        }
    }

    async fn notify_owner(
        &self,
        filing: &PatentFiling,
        notification: NewNotification,
        key: String,
    ) -> SideEffect {
        match filing.user_id.as_deref().filter(|id| !id.is_empty()) {
            Some(user_id) => self.relay.deliver(user_id, &notification, Some(&key)).await,
            None => {
                warn!(filing_id = filing.id, "Filing has no owner, skipping notification");
                SideEffect::Skipped("filing has no owner".to_string())
            }
        }
    }

    async fn refresh_after_commit(&mut self) -> bool {
        match self.refresh().await {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, "Filing list re-fetch failed after commit");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::mock;
    use mockall::predicate::*;
    use patentdesk_backend::{
        ActivationResponse, BackendError, BackendResult, Feedback, FeedbackStats, StatusCount,
        YearlyCount,
    };
    use patentdesk_core::validation::{LoginRequest, ReplyRequest};
    use patentdesk_core::{RejectRequest, StageUpdate, TransitionError, REJECTED_STATUS};
    use patentdesk_storage::SqliteDocumentStore;

    mock! {
        Backend {}

        #[async_trait::async_trait]
        impl PatentBackend for Backend {
            async fn login(&self, request: &LoginRequest) -> BackendResult<AdminUser>;
            async fn list_admins(&self) -> BackendResult<Vec<AdminUser>>;
            async fn track_action(&self, admin_id: i64, action: ActionType, request_id: &str) -> BackendResult<()>;
            async fn list_filings(&self) -> BackendResult<Vec<PatentFiling>>;
            async fn filing_count(&self) -> BackendResult<u64>;
            async fn update_stages(&self, filing_id: i64, update: &StageUpdate) -> BackendResult<FilingUpdateResponse>;
            async fn reject_filing(&self, filing_id: i64, request: &RejectRequest) -> BackendResult<FilingUpdateResponse>;
            async fn set_filing_active(&self, filing_id: i64, active: bool) -> BackendResult<ActivationResponse>;
            async fn send_reply(&self, filing_id: i64, reply: &ReplyRequest) -> BackendResult<PatentFiling>;
            async fn count_by_state(&self, state: &str) -> BackendResult<u64>;
            async fn yearly_counts(&self) -> BackendResult<Vec<YearlyCount>>;
            async fn status_counts_by_date(&self) -> BackendResult<Vec<StatusCount>>;
            async fn feedback_stats(&self) -> BackendResult<FeedbackStats>;
            async fn list_feedback(&self) -> BackendResult<Vec<Feedback>>;
            async fn health(&self) -> BackendResult<bool>;
        }
    }

    fn admin() -> AdminUser {
        AdminUser {
            admin_id: 7,
            admin_name: "Meera".to_string(),
            email: "meera@example.com".to_string(),
            ..Default::default()
        }
    }

    fn filing(id: i64) -> PatentFiling {
        PatentFiling {
            id,
            user_id: Some("owner-1".to_string()),
            invention_title: Some("Solar kettle".to_string()),
            stage1_filed: true,
            stage2_admin_review: true,
            status: Some("Application".to_string()),
            is_active: true,
            ..Default::default()
        }
    }

    async fn workflow(backend: MockBackend) -> FilingWorkflow {
        let store: Arc<dyn DocumentStore> = Arc::new(SqliteDocumentStore::in_memory().await.unwrap());
        let relay = NotificationRelay::new(Arc::clone(&store), 1);
        FilingWorkflow::new(Arc::new(backend), store, relay).with_admin(admin())
    }

    #[tokio::test]
    async fn test_first_grant_call_only_opens_form() {
        let mut backend = MockBackend::new();
        backend.expect_update_stages().times(0);
        backend.expect_list_filings().times(0);

        let mut wf = workflow(backend).await;
        let outcome = wf
            .submit_grant(42, &DetailFields::new("IN-1", "A. Singh", "Delhi"))
            .await
            .unwrap();

        assert_eq!(outcome, CommitOutcome::FormOpened { filing_id: 42 });
        assert_eq!(
            wf.open_form_state(),
            Some(OpenForm {
                filing_id: 42,
                kind: FormKind::Grant
            })
        );
    }

    #[tokio::test]
    async fn test_invalid_grant_issues_no_request() {
        let mut backend = MockBackend::new();
        backend.expect_update_stages().times(0);
        backend.expect_list_filings().times(0);
        backend.expect_track_action().times(0);

        let mut wf = workflow(backend).await;
        wf.open_form(42, FormKind::Grant);
        let err = wf
            .submit_grant(42, &DetailFields::new("IN-1", "  ", ""))
            .await
            .unwrap_err();

        assert_eq!(
            err.missing_fields(),
            ["Granted Patent Person Name".to_string(), "Location".to_string()]
        );
        // form stays open so the admin can fix the fields
        assert!(wf.open_form_state().is_some());
    }

    #[tokio::test]
    async fn test_counter_failure_does_not_fail_grant() {
        let mut backend = MockBackend::new();
        backend
            .expect_list_filings()
            .returning(|| Ok(vec![filing(42)]));
        backend
            .expect_update_stages()
            .with(eq(42), always())
            .times(1)
            .returning(|_, _| {
                Ok(FilingUpdateResponse {
                    success: true,
                    status: Some("Granted".to_string()),
                    all_stages_complete: Some(true),
                    ..Default::default()
                })
            });
        backend
            .expect_track_action()
            .withf(|admin_id, action, _| *admin_id == 7 && *action == ActionType::Granted)
            .times(1)
            .returning(|_, _, _| Err(BackendError::Network("connection reset".to_string())));

        let mut wf = workflow(backend).await;
        wf.open_form(42, FormKind::Grant);
        let outcome = wf
            .submit_grant(42, &DetailFields::new("IN-1", "A. Singh", "Delhi"))
            .await
            .unwrap();

        let CommitOutcome::Committed(report) = outcome else {
            panic!("expected a committed grant");
        };
        assert_eq!(report.state, FilingState::Granted);
        assert_eq!(report.notification, SideEffect::Done);
        assert!(report.counter.is_failure());
        assert!(report.refreshed);
        assert_eq!(wf.open_form_state(), None);
    }

    #[tokio::test]
    async fn test_backend_failure_surfaces_status() {
        let mut backend = MockBackend::new();
        backend
            .expect_list_filings()
            .returning(|| Ok(vec![filing(42)]));
        backend.expect_reject_filing().times(1).returning(|_, _| {
            Err(BackendError::Status {
                status: 500,
                body: "Failed to reject patent".to_string(),
            })
        });
        backend.expect_track_action().times(0);

        let mut wf = workflow(backend).await;
        wf.open_form(42, FormKind::Reject);
        let err = wf
            .submit_reject(42, &DetailFields::new("IN-9", "R. Rao", "Pune"))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("500"));
    }

    #[tokio::test]
    async fn test_rejected_filing_cannot_be_granted() {
        let mut rejected = filing(42);
        rejected.status = Some(REJECTED_STATUS.to_string());

        let mut backend = MockBackend::new();
        backend
            .expect_list_filings()
            .returning(move || Ok(vec![rejected.clone()]));
        backend.expect_update_stages().times(0);

        let mut wf = workflow(backend).await;
        wf.open_form(42, FormKind::Grant);
        let err = wf
            .submit_grant(42, &DetailFields::new("IN-1", "A. Singh", "Delhi"))
            .await
            .unwrap_err();

        assert!(matches!(err, WorkflowError::Transition(_)));
    }

    #[tokio::test]
    async fn test_stage_toggle_cannot_grant() {
        let mut backend = MockBackend::new();
        backend
            .expect_list_filings()
            .returning(|| Ok(vec![filing(42)]));
        backend.expect_update_stages().times(0);
        backend.expect_track_action().times(0);

        let mut wf = workflow(backend).await;
        for policy in [StagePolicy::Cascade, StagePolicy::Raw] {
            let err = wf
                .set_stage(42, Stage::Granted, true, policy)
                .await
                .unwrap_err();
            assert!(matches!(
                err,
                WorkflowError::Transition(TransitionError::GrantRequiresDetails)
            ));
        }
    }

    #[tokio::test]
    async fn test_actions_require_login() {
        let backend = MockBackend::new();
        let store: Arc<dyn DocumentStore> = Arc::new(SqliteDocumentStore::in_memory().await.unwrap());
        let relay = NotificationRelay::new(Arc::clone(&store), 1);
        let mut wf = FilingWorkflow::new(Arc::new(backend), store, relay);

        let err = wf.activate(42).await.unwrap_err();
        assert!(matches!(err, WorkflowError::NotLoggedIn));
    }

    #[tokio::test]
    async fn test_login_validates_before_calling_backend() {
        let mut backend = MockBackend::new();
        backend
            .expect_login()
            .withf(|req| req.admin_id == 7 && req.email == "meera@example.com")
            .times(1)
            .returning(|_| Ok(admin()));

        let store: Arc<dyn DocumentStore> = Arc::new(SqliteDocumentStore::in_memory().await.unwrap());
        let relay = NotificationRelay::new(Arc::clone(&store), 1);
        let mut wf = FilingWorkflow::new(Arc::new(backend), store, relay);

        let bad = LoginInput {
            admin_id: "seven".to_string(),
            admin_name: "Meera".to_string(),
            email: "meera@example.com".to_string(),
            password: "secret".to_string(),
        };
        assert!(wf.login(&bad).await.unwrap_err().is_validation_error());
        assert!(wf.admin().is_none());

        let good = LoginInput {
            admin_id: " 7 ".to_string(),
            ..bad
        };
        let admin = wf.login(&good).await.unwrap();
        assert_eq!(admin.admin_name, "Meera");
        assert_eq!(wf.admin().map(|a| a.admin_id), Some(7));

        wf.logout();
        assert!(wf.admin().is_none());
    }

    #[tokio::test]
    async fn test_reply_uses_next_slot_and_updates_cache() {
        let mut with_reply = filing(5);
        with_reply.r1 = Some("Received".to_string());
        let mut answered = with_reply.clone();
        answered.r2 = Some("Under review".to_string());

        let mut backend = MockBackend::new();
        backend
            .expect_list_filings()
            .times(1)
            .returning(move || Ok(vec![with_reply.clone()]));
        backend
            .expect_send_reply()
            .withf(|id, reply| *id == 5 && reply.reply_field == "r2")
            .times(1)
            .returning(move |_, _| Ok(answered.clone()));

        let mut wf = workflow(backend).await;
        let updated = wf.send_reply(5, "Under review").await.unwrap();
        assert_eq!(updated.reply_count(), 2);
        assert_eq!(wf.filings()[0].reply_count(), 2);
    }
}
