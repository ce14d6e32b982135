// ABOUTME: Read-side aggregation for the admin dashboard
// ABOUTME: Filing filters and search, pagination, user statistics, revenue and leaderboard

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::constants::{ENTERPRISE_PLAN_PRICE, LEADERBOARD_SIZE, PRO_PLAN_PRICE};
use crate::types::{AccountStatus, ActionType, AdminUser, PatentFiling, PlatformUser, SubscriptionTier};

/// Quick filters on the filing list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum QuickFilter {
    #[default]
    All,
    Granted,
    Rejected,
    Deactivated,
    /// Still in progress: not granted and not rejected
    Application,
}

impl QuickFilter {
    pub fn matches(&self, filing: &PatentFiling) -> bool {
        match self {
            Self::All => true,
            Self::Granted => filing.is_granted(),
            Self::Rejected => filing.is_rejected(),
            Self::Deactivated => !filing.is_active,
            Self::Application => !filing.stage5_granted && !filing.is_rejected(),
        }
    }
}

impl FromStr for QuickFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(Self::All),
            "granted" => Ok(Self::Granted),
            "rejected" => Ok(Self::Rejected),
            "deactivated" => Ok(Self::Deactivated),
            "application" => Ok(Self::Application),
            other => Err(format!(
                "Unknown filter: {}. Must be one of: all, granted, rejected, deactivated, application",
                other
            )),
        }
    }
}

fn contains_ci(haystack: Option<&str>, needle: &str) -> bool {
    haystack
        .map(|h| h.to_lowercase().contains(needle))
        .unwrap_or(false)
}

/// Applies the quick filter then a case-insensitive search over title,
/// applicant name, id and applicant email
pub fn filter_filings<'a>(
    filings: &'a [PatentFiling],
    filter: QuickFilter,
    search: Option<&str>,
) -> Vec<&'a PatentFiling> {
    let needle = search
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty());

    filings
        .iter()
        .filter(|f| filter.matches(f))
        .filter(|f| match &needle {
            None => true,
            Some(n) => {
                contains_ci(f.invention_title.as_deref(), n)
                    || contains_ci(f.applicant_name.as_deref(), n)
                    || f.id.to_string().contains(n.as_str())
                    || contains_ci(f.applicant_email.as_deref(), n)
            }
        })
        .collect()
}

/// One page of a list, pages are 1-based
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

/// Out-of-range pages clamp to the last page; an empty list yields page 1 of 1
pub fn paginate<T: Clone>(items: &[T], page: usize, per_page: usize) -> Page<T> {
    let per_page = per_page.max(1);
    let total_pages = items.len().div_ceil(per_page).max(1);
    let page = page.clamp(1, total_pages);
    let start = (page - 1) * per_page;

    Page {
        items: items.iter().skip(start).take(per_page).cloned().collect(),
        page,
        total_pages,
        total_items: items.len(),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserStats {
    pub total: usize,
    pub basic: usize,
    pub pro: usize,
    pub enterprise: usize,
    pub active: usize,
    pub deactivated: usize,
}

pub fn user_stats(users: &[PlatformUser]) -> UserStats {
    let mut stats = UserStats {
        total: users.len(),
        ..Default::default()
    };

    for user in users {
        match user.subscription_type {
            SubscriptionTier::Basic => stats.basic += 1,
            SubscriptionTier::Pro => stats.pro += 1,
            SubscriptionTier::Enterprise => stats.enterprise += 1,
        }
        if user.account_status == AccountStatus::Deactivated {
            stats.deactivated += 1;
        } else {
            stats.active += 1;
        }
    }

    stats
}

/// Monthly subscription revenue in rupees
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RevenueSummary {
    pub pro_users: usize,
    pub enterprise_users: usize,
    pub pro_revenue: u64,
    pub enterprise_revenue: u64,
    pub total_revenue: u64,
}

pub fn subscription_revenue(users: &[PlatformUser]) -> RevenueSummary {
    let pro_users = users
        .iter()
        .filter(|u| u.subscription_type == SubscriptionTier::Pro)
        .count();
    let enterprise_users = users
        .iter()
        .filter(|u| u.subscription_type == SubscriptionTier::Enterprise)
        .count();
    let pro_revenue = pro_users as u64 * PRO_PLAN_PRICE;
    let enterprise_revenue = enterprise_users as u64 * ENTERPRISE_PLAN_PRICE;

    RevenueSummary {
        pro_users,
        enterprise_users,
        pro_revenue,
        enterprise_revenue,
        total_revenue: pro_revenue + enterprise_revenue,
    }
}

pub fn online_count(users: &[PlatformUser]) -> usize {
    users.iter().filter(|u| u.is_online).count()
}

/// Top admins by the chosen counter, highest first
pub fn leaderboard(admins: &[AdminUser], by: ActionType) -> Vec<&AdminUser> {
    let mut ranked: Vec<&AdminUser> = admins.iter().collect();
    // stable sort keeps backend order for ties
    ranked.sort_by(|a, b| b.counter(by).cmp(&a.counter(by)));
    ranked.truncate(LEADERBOARD_SIZE);
    ranked
}

/// Status filter on the user management list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserStatusFilter {
    Verified,
    Unverified,
    Active,
    Deactivated,
    Suspended,
    Banned,
}

impl UserStatusFilter {
    pub fn matches(&self, user: &PlatformUser) -> bool {
        match self {
            Self::Verified => user.email_verified,
            Self::Unverified => !user.email_verified,
            Self::Active => user.account_status == AccountStatus::Active,
            Self::Deactivated => user.account_status == AccountStatus::Deactivated,
            Self::Suspended => user.account_status == AccountStatus::Suspended,
            Self::Banned => user.account_status == AccountStatus::Banned,
        }
    }
}

impl fmt::Display for UserStatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Verified => "verified",
            Self::Unverified => "unverified",
            Self::Active => "active",
            Self::Deactivated => "deactivated",
            Self::Suspended => "suspended",
            Self::Banned => "banned",
        };
        f.write_str(name)
    }
}

impl FromStr for UserStatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "verified" => Ok(Self::Verified),
            "unverified" => Ok(Self::Unverified),
            "active" => Ok(Self::Active),
            "deactivated" => Ok(Self::Deactivated),
            "suspended" => Ok(Self::Suspended),
            "banned" => Ok(Self::Banned),
            other => Err(format!("Unknown user status filter: {}", other)),
        }
    }
}

pub fn filter_users<'a>(
    users: &'a [PlatformUser],
    status: Option<UserStatusFilter>,
    search: Option<&str>,
) -> Vec<&'a PlatformUser> {
    let needle = search
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty());

    users
        .iter()
        .filter(|u| status.map(|s| s.matches(u)).unwrap_or(true))
        .filter(|u| match &needle {
            None => true,
            Some(n) => {
                contains_ci(u.name.as_deref(), n)
                    || contains_ci(u.email.as_deref(), n)
                    || u.id.to_lowercase().contains(n.as_str())
            }
        })
        .collect()
}
