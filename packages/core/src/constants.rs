/// Status sentinel the backend stores on rejected filings
pub const REJECTED_STATUS: &str = "Patent is Rejected";

/// Status the backend assigns once all five stages are complete
pub const GRANTED_STATUS: &str = "Granted";

/// Maximum notifications retained per user
pub const NOTIFICATION_CAP: usize = 3;

/// Admin reply slots r1..r4
pub const MAX_ADMIN_REPLIES: usize = 4;

/// User message slots m1..m5
pub const MAX_USER_MESSAGES: usize = 5;

/// Days between account deactivation and scheduled deletion
pub const DEACTIVATION_GRACE_DAYS: i64 = 30;

/// Number of admins shown on the leaderboard
pub const LEADERBOARD_SIZE: usize = 5;

/// Default page size for filing listings
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Monthly plan prices in rupees
pub const PRO_PLAN_PRICE: u64 = 49;
pub const ENTERPRISE_PLAN_PRICE: u64 = 199;
