// ABOUTME: Dashboard figures for the terminal
// ABOUTME: Filing and user totals, revenue, leaderboard, feedback and analytics passthrough

use anyhow::Result;
use clap::Subcommand;
use colored::*;
use patentdesk_backend::PatentBackend;
use patentdesk_cli::AppContext;
use patentdesk_core::constants::{ENTERPRISE_PLAN_PRICE, PRO_PLAN_PRICE};
use patentdesk_core::{
    filter_filings, leaderboard, online_count, subscription_revenue, user_stats, ActionType,
    QuickFilter,
};
use patentdesk_storage::DocumentStore;

use super::utils::{new_table, truncate};

#[derive(Subcommand, Default)]
pub enum DashboardCommands {
    /// Filing, user and revenue totals
    #[default]
    Overview,
    /// Top admins by one counter
    Leaderboard {
        /// granted, rejected, activated or deactivated
        #[arg(long, default_value = "granted")]
        by: ActionType,
    },
    /// Feedback ratings and recent comments
    Feedback,
    /// Yearly and per-status filing counts
    Analytics {
        /// Also count filings from this applicant state
        #[arg(long)]
        state: Option<String>,
    },
}

pub async fn handle_dashboard_command(
    ctx: &mut AppContext,
    command: DashboardCommands,
) -> Result<()> {
    ctx.session().await?;
    match command {
        DashboardCommands::Overview => overview(ctx).await,
        DashboardCommands::Leaderboard { by } => show_leaderboard(ctx, by).await,
        DashboardCommands::Feedback => feedback(ctx).await,
        DashboardCommands::Analytics { state } => analytics(ctx, state.as_deref()).await,
    }
}

async fn overview(ctx: &mut AppContext) -> Result<()> {
    let backend = ctx.backend();
    let filings = backend.list_filings().await?;
    let store = ctx.store().await?;
    let users = store.list_users().await?;
    let searches = store.search_stats().await?;

    println!("{}", "📊 PatentDesk Overview".blue().bold());
    println!();

    let mut table = new_table(vec!["Filings", "Count"]);
    for (label, filter) in [
        ("All", QuickFilter::All),
        ("In application", QuickFilter::Application),
        ("Granted", QuickFilter::Granted),
        ("Rejected", QuickFilter::Rejected),
        ("Deactivated", QuickFilter::Deactivated),
    ] {
        table.add_row(vec![
            label.to_string(),
            filter_filings(&filings, filter, None).len().to_string(),
        ]);
    }
    println!("{}", table);

    let stats = user_stats(&users);
    let mut table = new_table(vec!["Users", "Count"]);
    table.add_row(vec!["Total".to_string(), stats.total.to_string()]);
    table.add_row(vec!["Basic".to_string(), stats.basic.to_string()]);
    table.add_row(vec!["Pro".to_string(), stats.pro.to_string()]);
    table.add_row(vec!["Enterprise".to_string(), stats.enterprise.to_string()]);
    table.add_row(vec!["Active".to_string(), stats.active.to_string()]);
    table.add_row(vec!["Deactivated".to_string(), stats.deactivated.to_string()]);
    table.add_row(vec!["Online now".to_string(), online_count(&users).to_string()]);
    println!("{}", table);

    let revenue = subscription_revenue(&users);
    println!(
        "{} ₹{} (Pro {} × ₹{} = ₹{}, Enterprise {} × ₹{} = ₹{})",
        "Monthly revenue:".bold(),
        revenue.total_revenue.to_string().green(),
        revenue.pro_users,
        PRO_PLAN_PRICE,
        revenue.pro_revenue,
        revenue.enterprise_users,
        ENTERPRISE_PLAN_PRICE,
        revenue.enterprise_revenue
    );
    println!(
        "{} {} (local {}, api {})",
        "Searches:".bold(),
        searches.total().to_string().cyan(),
        searches.local_search_count,
        searches.api_search_count
    );
    Ok(())
}

async fn show_leaderboard(ctx: &AppContext, by: ActionType) -> Result<()> {
    let admins = ctx.backend().list_admins().await?;
    let ranked = leaderboard(&admins, by);

    println!("{}", format!("🏆 Top admins by {}", by).blue().bold());
    let mut table = new_table(vec!["#", "Admin", "Email", by.as_str()]);
    for (rank, admin) in ranked.iter().enumerate() {
        table.add_row(vec![
            (rank + 1).to_string(),
            admin.admin_name.clone(),
            admin.email.clone(),
            admin.counter(by).to_string(),
        ]);
    }
    println!("{}", table);
    Ok(())
}

async fn feedback(ctx: &AppContext) -> Result<()> {
    let backend = ctx.backend();
    let stats = backend.feedback_stats().await?;
    let entries = backend.list_feedback().await?;

    println!("{}", "💬 Feedback".blue().bold());
    println!(
        "  {} responses, overall average {:.1}",
        stats.total_feedbacks,
        stats.overall_average_rating
    );
    println!(
        "  UI {:.1} · performance {:.1} · features {:.1} · support {:.1} · overall {:.1}",
        stats.average_ui_rating,
        stats.average_performance_rating,
        stats.average_features_rating,
        stats.average_support_rating,
        stats.average_overall_rating
    );

    if entries.is_empty() {
        return Ok(());
    }
    let mut table = new_table(vec!["ID", "User", "Overall", "Message"]);
    for entry in &entries {
        table.add_row(vec![
            entry.id.to_string(),
            entry.user_name.clone().unwrap_or_else(|| "—".to_string()),
            entry
                .overall_rating
                .map(|r| r.to_string())
                .unwrap_or_else(|| "—".to_string()),
            truncate(entry.feedback_message.as_deref().unwrap_or(""), 50),
        ]);
    }
    println!("{}", table);
    Ok(())
}

async fn analytics(ctx: &AppContext, state: Option<&str>) -> Result<()> {
    let backend = ctx.backend();
    println!("{}", "📈 Filing analytics".blue().bold());
    println!("  {} {}", "Total filings:".bold(), backend.filing_count().await?);

    if let Some(state) = state {
        println!(
            "  {} {}",
            format!("Filings from {}:", state).bold(),
            backend.count_by_state(state).await?
        );
    }

    let mut table = new_table(vec!["Year", "Filings"]);
    for year in backend.yearly_counts().await? {
        table.add_row(vec![year.year.to_string(), year.count.to_string()]);
    }
    println!("{}", table);

    let mut table = new_table(vec!["Month", "Status", "Count"]);
    for row in backend.status_counts_by_date().await? {
        table.add_row(vec![
            format!("{}-{:02}", row.year, row.month),
            row.status,
            row.count.to_string(),
        ]);
    }
    println!("{}", table);
    Ok(())
}
