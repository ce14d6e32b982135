// ABOUTME: Five-stage filing lifecycle: cascade resolution and the transition function
// ABOUTME: Every stage write the console makes is planned here before it reaches the backend

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::REJECTED_STATUS;
use crate::types::{GrantDetails, PatentFiling, RejectDetails, RejectRequest};

/// Workflow stages in their fixed order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Filed,
    AdminReview,
    TechnicalReview,
    Verification,
    Granted,
}

impl Stage {
    pub const ORDER: [Stage; 5] = [
        Stage::Filed,
        Stage::AdminReview,
        Stage::TechnicalReview,
        Stage::Verification,
        Stage::Granted,
    ];

    /// Backend field name for this stage's flag
    pub fn field_name(&self) -> &'static str {
        match self {
            Self::Filed => "stage1Filed",
            Self::AdminReview => "stage2AdminReview",
            Self::TechnicalReview => "stage3TechnicalReview",
            Self::Verification => "stage4Verification",
            Self::Granted => "stage5Granted",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Filed => "Filed",
            Self::AdminReview => "Admin Review",
            Self::TechnicalReview => "Technical Review",
            Self::Verification => "Verification",
            Self::Granted => "Granted",
        }
    }

    /// Zero-based position in [`Stage::ORDER`]
    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn is_set(&self, filing: &PatentFiling) -> bool {
        match self {
            Self::Filed => filing.stage1_filed,
            Self::AdminReview => filing.stage2_admin_review,
            Self::TechnicalReview => filing.stage3_technical_review,
            Self::Verification => filing.stage4_verification,
            Self::Granted => filing.stage5_granted,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Stage {
    type Err = String;

    /// Accepts backend field names, short names and stage numbers
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_' && !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();

        match key.as_str() {
            "1" | "filed" | "stage1filed" => Ok(Self::Filed),
            "2" | "adminreview" | "stage2adminreview" => Ok(Self::AdminReview),
            "3" | "technicalreview" | "stage3technicalreview" => Ok(Self::TechnicalReview),
            "4" | "verification" | "stage4verification" => Ok(Self::Verification),
            "5" | "granted" | "stage5granted" => Ok(Self::Granted),
            _ => Err(format!(
                "Unknown stage: {}. Must be one of: filed, admin-review, technical-review, verification, granted",
                s
            )),
        }
    }
}

/// Partial update body for `PUT /patent-filing/{id}/stages`.
///
/// Only the fields that are `Some` are serialized, so the backend leaves the
/// rest of the filing untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage1_filed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage2_admin_review: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage3_technical_review: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage4_verification: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage5_granted: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patent_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub granted_patent_person_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl StageUpdate {
    fn slot(&mut self, stage: Stage) -> &mut Option<bool> {
        match stage {
            Stage::Filed => &mut self.stage1_filed,
            Stage::AdminReview => &mut self.stage2_admin_review,
            Stage::TechnicalReview => &mut self.stage3_technical_review,
            Stage::Verification => &mut self.stage4_verification,
            Stage::Granted => &mut self.stage5_granted,
        }
    }

    pub fn set(&mut self, stage: Stage, value: bool) -> &mut Self {
        *self.slot(stage) = Some(value);
        self
    }

    pub fn get(&self, stage: Stage) -> Option<bool> {
        match stage {
            Stage::Filed => self.stage1_filed,
            Stage::AdminReview => self.stage2_admin_review,
            Stage::TechnicalReview => self.stage3_technical_review,
            Stage::Verification => self.stage4_verification,
            Stage::Granted => self.stage5_granted,
        }
    }

    /// Every stage flag set to `true`, the body of a grant commit
    pub fn all_granted() -> Self {
        let mut update = Self::default();
        for stage in Stage::ORDER {
            update.set(stage, true);
        }
        update
    }

    /// Writes the present fields onto a local copy of the filing
    pub fn apply_to(&self, filing: &mut PatentFiling) {
        if let Some(v) = self.stage1_filed {
            filing.stage1_filed = v;
        }
        if let Some(v) = self.stage2_admin_review {
            filing.stage2_admin_review = v;
        }
        if let Some(v) = self.stage3_technical_review {
            filing.stage3_technical_review = v;
        }
        if let Some(v) = self.stage4_verification {
            filing.stage4_verification = v;
        }
        if let Some(v) = self.stage5_granted {
            filing.stage5_granted = v;
        }
        if let Some(ref v) = self.patent_number {
            filing.patent_number = Some(v.clone());
        }
        if let Some(ref v) = self.granted_patent_person_name {
            filing.granted_patent_person_name = Some(v.clone());
        }
        if let Some(ref v) = self.location {
            filing.location = Some(v.clone());
        }
    }
}

/// Computes the stage fields to persist for "set `stage` to `value`".
///
/// `true` forces every stage at or before `stage` to `true` and leaves later
/// stages out of the update. `false` touches only `stage` itself.
pub fn resolve_cascade(stage: Stage, value: bool) -> StageUpdate {
    let mut update = StageUpdate::default();
    if value {
        for earlier in Stage::ORDER.iter().take(stage.index() + 1) {
            update.set(*earlier, true);
        }
    } else {
        update.set(stage, false);
    }
    update
}

/// How a single-stage toggle is turned into an update
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StagePolicy {
    /// Setting a stage implies every earlier stage
    #[default]
    Cascade,
    /// Write exactly the one flag, even if that leaves a gap
    Raw,
}

/// Where a filing sits in the lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilingState {
    Draft,
    Filed,
    AdminReview,
    TechnicalReview,
    Verification,
    Granted,
    Rejected,
}

impl FilingState {
    /// Derives the state from the stored flags.
    ///
    /// The rejection sentinel wins over any stage flags. Otherwise the
    /// highest stage set decides, so a filing with a gap still reports the
    /// furthest point it reached.
    pub fn of(filing: &PatentFiling) -> Self {
        if filing.status.as_deref() == Some(REJECTED_STATUS) {
            return Self::Rejected;
        }

        match Stage::ORDER.iter().rev().find(|s| s.is_set(filing)) {
            Some(Stage::Granted) => Self::Granted,
            Some(Stage::Verification) => Self::Verification,
            Some(Stage::TechnicalReview) => Self::TechnicalReview,
            Some(Stage::AdminReview) => Self::AdminReview,
            Some(Stage::Filed) => Self::Filed,
            None => Self::Draft,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Granted | Self::Rejected)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Draft => "Draft",
            Self::Filed => "Filed",
            Self::AdminReview => "Admin Review",
            Self::TechnicalReview => "Technical Review",
            Self::Verification => "Verification",
            Self::Granted => "Granted",
            Self::Rejected => "Rejected",
        }
    }
}

impl fmt::Display for FilingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Visibility axis, independent of [`FilingState`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Activity {
    Active,
    Inactive,
}

impl Activity {
    pub fn of(filing: &PatentFiling) -> Self {
        if filing.is_active {
            Self::Active
        } else {
            Self::Inactive
        }
    }
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => f.write_str("Active"),
            Self::Inactive => f.write_str("Inactive"),
        }
    }
}

/// A requested change to a filing's stage data
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    SetStage {
        stage: Stage,
        value: bool,
        policy: StagePolicy,
    },
    ResetStages,
    Grant(GrantDetails),
    Reject(RejectDetails),
}

impl Transition {
    /// Short name used in idempotency keys and logs
    pub fn name(&self) -> &'static str {
        match self {
            Self::SetStage { .. } => "stage",
            Self::ResetStages => "reset",
            Self::Grant(_) => "grant",
            Self::Reject(_) => "reject",
        }
    }
}

/// What to send to the backend for an accepted transition
#[derive(Debug, Clone, PartialEq)]
pub enum TransitionPlan {
    /// `PUT /patent-filing/{id}/stages`
    Stages(StageUpdate),
    /// `PUT /patent-filing/{id}/reject`
    Reject(RejectRequest),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Filing is {0} and cannot be changed further")]
    Terminal(FilingState),

    #[error("Filing is deactivated; activate it before changing its stages")]
    Inactive,

    #[error("Stage 5 is only set by granting the filing with its patent details")]
    GrantRequiresDetails,
}

/// The single authoritative transition function.
///
/// Granted and Rejected are terminal for stage edits. A toggle never sets
/// stage 5; only [`Transition::Grant`] does. Rejection is reachable
/// from any state before Granted, including while the filing is inactive.
/// Reset is allowed on a granted filing so an admin can reopen a mistaken
/// grant, but never on a rejected one.
pub fn plan_transition(
    filing: &PatentFiling,
    transition: &Transition,
) -> Result<TransitionPlan, TransitionError> {
    let state = FilingState::of(filing);
    let activity = Activity::of(filing);

    match transition {
        Transition::SetStage {
            stage,
            value,
            policy,
        } => {
            guard_editable(state, activity)?;
            if *stage == Stage::Granted && *value {
                return Err(TransitionError::GrantRequiresDetails);
            }
            let update = match policy {
                StagePolicy::Cascade => resolve_cascade(*stage, *value),
                StagePolicy::Raw => {
                    let mut update = StageUpdate::default();
                    update.set(*stage, *value);
                    update
                }
            };
            Ok(TransitionPlan::Stages(update))
        }
        Transition::ResetStages => {
            if state == FilingState::Rejected {
                return Err(TransitionError::Terminal(state));
            }
            let mut update = StageUpdate::default();
            update.set(Stage::Filed, true);
            for stage in &Stage::ORDER[1..] {
                update.set(*stage, false);
            }
            Ok(TransitionPlan::Stages(update))
        }
        Transition::Grant(details) => {
            guard_editable(state, activity)?;
            let mut update = StageUpdate::all_granted();
            update.patent_number = Some(details.patent_number.clone());
            update.granted_patent_person_name = Some(details.granted_person_name.clone());
            update.location = Some(details.location.clone());
            Ok(TransitionPlan::Stages(update))
        }
        Transition::Reject(details) => {
            if state.is_terminal() {
                return Err(TransitionError::Terminal(state));
            }
            Ok(TransitionPlan::Reject(RejectRequest {
                rejected_patent_number: details.rejected_patent_number.clone(),
                rejected_person_name: details.rejected_person_name.clone(),
                location: details.location.clone(),
                status: REJECTED_STATUS.to_string(),
                applicant_email: filing.applicant_email.clone(),
                invention_title: filing.invention_title.clone(),
            }))
        }
    }
}

fn guard_editable(state: FilingState, activity: Activity) -> Result<(), TransitionError> {
    if state.is_terminal() {
        return Err(TransitionError::Terminal(state));
    }
    if activity == Activity::Inactive {
        return Err(TransitionError::Inactive);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn filing_at(stages: [bool; 5]) -> PatentFiling {
        PatentFiling {
            id: 42,
            stage1_filed: stages[0],
            stage2_admin_review: stages[1],
            stage3_technical_review: stages[2],
            stage4_verification: stages[3],
            stage5_granted: stages[4],
            status: Some("Application".to_string()),
            is_active: true,
            invention_title: Some("Solar kettle".to_string()),
            applicant_email: Some("inventor@example.com".to_string()),
            ..Default::default()
        }
    }

    fn grant_details() -> GrantDetails {
        GrantDetails {
            patent_number: "IN-123".to_string(),
            granted_person_name: "A. Singh".to_string(),
            location: "Delhi".to_string(),
        }
    }

    #[rstest]
    #[case(Stage::Filed)]
    #[case(Stage::AdminReview)]
    #[case(Stage::TechnicalReview)]
    #[case(Stage::Verification)]
    #[case(Stage::Granted)]
    fn test_cascade_true_sets_prefix_only(#[case] target: Stage) {
        let update = resolve_cascade(target, true);
        for stage in Stage::ORDER {
            if stage <= target {
                assert_eq!(update.get(stage), Some(true), "{} should be set", stage);
            } else {
                assert_eq!(update.get(stage), None, "{} should be untouched", stage);
            }
        }
    }

    #[rstest]
    #[case(Stage::Filed)]
    #[case(Stage::TechnicalReview)]
    #[case(Stage::Granted)]
    fn test_cascade_false_touches_single_field(#[case] target: Stage) {
        let update = resolve_cascade(target, false);
        for stage in Stage::ORDER {
            let expected = (stage == target).then_some(false);
            assert_eq!(update.get(stage), expected);
        }
    }

    #[test]
    fn test_stage_update_serializes_only_present_fields() {
        let json = serde_json::to_value(resolve_cascade(Stage::AdminReview, true)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"stage1Filed": true, "stage2AdminReview": true})
        );
    }

    #[rstest]
    #[case("stage3TechnicalReview", Stage::TechnicalReview)]
    #[case("admin-review", Stage::AdminReview)]
    #[case("5", Stage::Granted)]
    #[case("Verification", Stage::Verification)]
    fn test_stage_from_str(#[case] input: &str, #[case] expected: Stage) {
        assert_eq!(input.parse::<Stage>().unwrap(), expected);
    }

    #[test]
    fn test_filing_state_derivation() {
        assert_eq!(FilingState::of(&filing_at([false; 5])), FilingState::Draft);
        assert_eq!(
            FilingState::of(&filing_at([true, true, true, true, false])),
            FilingState::Verification
        );
        // gap left by a raw toggle still reports the furthest stage
        assert_eq!(
            FilingState::of(&filing_at([true, false, true, false, false])),
            FilingState::TechnicalReview
        );

        let mut rejected = filing_at([true, true, true, true, true]);
        rejected.status = Some(REJECTED_STATUS.to_string());
        assert_eq!(FilingState::of(&rejected), FilingState::Rejected);
    }

    #[test]
    fn test_grant_plan_sets_all_stages_and_metadata() {
        let filing = filing_at([true, true, true, true, false]);
        let plan = plan_transition(&filing, &Transition::Grant(grant_details())).unwrap();

        let TransitionPlan::Stages(update) = plan else {
            panic!("grant must produce a stage update");
        };
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            serde_json::json!({
                "stage1Filed": true,
                "stage2AdminReview": true,
                "stage3TechnicalReview": true,
                "stage4Verification": true,
                "stage5Granted": true,
                "patentNumber": "IN-123",
                "grantedPatentPersonName": "A. Singh",
                "location": "Delhi"
            })
        );
    }

    #[test]
    fn test_raw_policy_writes_one_flag() {
        let filing = filing_at([true, false, false, false, false]);
        let plan = plan_transition(
            &filing,
            &Transition::SetStage {
                stage: Stage::TechnicalReview,
                value: true,
                policy: StagePolicy::Raw,
            },
        )
        .unwrap();

        let mut expected = StageUpdate::default();
        expected.set(Stage::TechnicalReview, true);
        assert_eq!(plan, TransitionPlan::Stages(expected));
    }

    #[rstest]
    #[case(StagePolicy::Cascade)]
    #[case(StagePolicy::Raw)]
    fn test_toggle_cannot_set_granted(#[case] policy: StagePolicy) {
        let filing = filing_at([true, true, true, true, false]);
        let toggle = Transition::SetStage {
            stage: Stage::Granted,
            value: true,
            policy,
        };
        assert_eq!(
            plan_transition(&filing, &toggle),
            Err(TransitionError::GrantRequiresDetails)
        );
    }

    #[test]
    fn test_terminal_states_refuse_stage_edits() {
        let granted = filing_at([true; 5]);
        let toggle = Transition::SetStage {
            stage: Stage::AdminReview,
            value: false,
            policy: StagePolicy::Cascade,
        };
        assert_eq!(
            plan_transition(&granted, &toggle),
            Err(TransitionError::Terminal(FilingState::Granted))
        );

        let mut rejected = filing_at([true, true, false, false, false]);
        rejected.status = Some(REJECTED_STATUS.to_string());
        assert_eq!(
            plan_transition(&rejected, &Transition::Grant(grant_details())),
            Err(TransitionError::Terminal(FilingState::Rejected))
        );
        assert_eq!(
            plan_transition(&rejected, &Transition::ResetStages),
            Err(TransitionError::Terminal(FilingState::Rejected))
        );
    }

    #[test]
    fn test_inactive_filing_can_be_rejected_but_not_advanced() {
        let mut filing = filing_at([true, true, false, false, false]);
        filing.is_active = false;

        assert_eq!(
            plan_transition(&filing, &Transition::Grant(grant_details())),
            Err(TransitionError::Inactive)
        );

        let reject = Transition::Reject(RejectDetails {
            rejected_patent_number: "IN-9".to_string(),
            rejected_person_name: "A. Singh".to_string(),
            location: "Pune".to_string(),
        });
        let TransitionPlan::Reject(body) = plan_transition(&filing, &reject).unwrap() else {
            panic!("reject must produce a reject body");
        };
        assert_eq!(body.status, REJECTED_STATUS);
        assert_eq!(body.applicant_email.as_deref(), Some("inventor@example.com"));
        assert_eq!(body.invention_title.as_deref(), Some("Solar kettle"));
    }

    #[test]
    fn test_reset_reopens_granted_filing() {
        let filing = filing_at([true; 5]);
        let TransitionPlan::Stages(update) =
            plan_transition(&filing, &Transition::ResetStages).unwrap()
        else {
            panic!("reset must produce a stage update");
        };

        let mut reopened = filing.clone();
        update.apply_to(&mut reopened);
        assert_eq!(FilingState::of(&reopened), FilingState::Filed);
    }
}
