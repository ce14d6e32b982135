// ABOUTME: Core types, stage lifecycle and validation rules for PatentDesk
// ABOUTME: Foundational package shared by the backend client, workflow and CLI

pub mod constants;
pub mod dashboard;
pub mod stages;
pub mod types;
pub mod validation;

// Re-export main types
pub use types::{
    AccountStatus, ActionType, AdminUser, GrantDetails, NewNotification, Notification,
    PatentFiling, PlatformUser, RejectDetails, RejectRequest, SubscriptionTier,
};

// Re-export the lifecycle model
pub use stages::{
    plan_transition, resolve_cascade, Activity, FilingState, Stage, StagePolicy, StageUpdate,
    Transition, TransitionError, TransitionPlan,
};

// Re-export validation
pub use validation::{
    validate_grant, validate_login, validate_reject, validate_reply, DetailFields, LoginInput,
    LoginRequest, ReplyRequest, ValidationError,
};

pub use dashboard::{
    filter_filings, filter_users, leaderboard, online_count, paginate, subscription_revenue,
    user_stats, Page, QuickFilter, RevenueSummary, UserStats, UserStatusFilter,
};

pub use constants::{NOTIFICATION_CAP, REJECTED_STATUS};
