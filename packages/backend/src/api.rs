//! Request and response models for the PatentDesk REST backend

use patentdesk_core::ActionType;
use serde::{Deserialize, Serialize};

/// Response of `PUT /patent-filing/{id}/stages` and `/reject`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilingUpdateResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    /// Only reported by the stages endpoint
    #[serde(default)]
    pub all_stages_complete: Option<bool>,
    /// Whether the backend emailed the applicant
    #[serde(default)]
    pub email_sent: Option<bool>,
}

/// Response of `PUT /patent-filing/{id}/activate` and `/deactivate`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivationResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    pub is_active: bool,
}

/// Body of `POST /admin/{adminId}/track-action`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackActionRequest {
    pub action_type: ActionType,
    /// Lets the backend drop a retried increment it has already applied
    pub request_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearlyCount {
    pub year: i32,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCount {
    pub status: String,
    pub count: u64,
    pub year: i32,
    pub month: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackStats {
    #[serde(default)]
    pub total_feedbacks: u64,
    #[serde(default, rename = "averageUIRating")]
    pub average_ui_rating: f64,
    #[serde(default)]
    pub average_performance_rating: f64,
    #[serde(default)]
    pub average_features_rating: f64,
    #[serde(default)]
    pub average_support_rating: f64,
    #[serde(default)]
    pub average_overall_rating: f64,
    #[serde(default)]
    pub overall_average_rating: f64,
}

/// A single end-user feedback entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub id: i64,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub user_email: Option<String>,
    #[serde(default)]
    pub user_interface_rating: Option<u8>,
    #[serde(default)]
    pub performance_rating: Option<u8>,
    #[serde(default)]
    pub features_rating: Option<u8>,
    #[serde(default)]
    pub support_rating: Option<u8>,
    #[serde(default)]
    pub overall_rating: Option<u8>,
    #[serde(default)]
    pub feedback_message: Option<String>,
    #[serde(default)]
    pub average_rating: Option<f64>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_action_body_shape() {
        let body = serde_json::to_value(TrackActionRequest {
            action_type: ActionType::Deactivated,
            request_id: "req-1".to_string(),
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({"actionType": "deactivated", "requestId": "req-1"})
        );
    }

    #[test]
    fn test_feedback_stats_ui_rating_key() {
        let stats: FeedbackStats = serde_json::from_value(serde_json::json!({
            "totalFeedbacks": 4,
            "averageUIRating": 4.5,
            "overallAverageRating": 4.1
        }))
        .unwrap();
        assert_eq!(stats.total_feedbacks, 4);
        assert_eq!(stats.average_ui_rating, 4.5);
        assert_eq!(stats.average_support_rating, 0.0);
    }
}
