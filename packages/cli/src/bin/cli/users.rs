// ABOUTME: CLI commands for platform user accounts
// ABOUTME: Every lifecycle action asks for confirmation unless --yes is given

use anyhow::Result;
use chrono::Utc;
use clap::{Args, Subcommand};
use colored::*;
use patentdesk_cli::AppContext;
use patentdesk_core::{filter_users, AccountStatus, PlatformUser, UserStatusFilter};
use patentdesk_storage::DocumentStore;
use patentdesk_workflow::UserAction;

use super::utils::{confirm, format_opt_date, new_table, print_side_effect, truncate, yes_no};

#[derive(Args)]
pub struct TargetArgs {
    /// User id
    uid: String,
    /// Fail if the user document changed since this version was read
    #[arg(long)]
    expect_version: Option<i64>,
    /// Skip confirmation prompt
    #[arg(short, long)]
    yes: bool,
}

#[derive(Subcommand)]
pub enum UsersCommands {
    /// List users
    List {
        /// verified, unverified, active, deactivated, suspended or banned
        #[arg(long)]
        status: Option<UserStatusFilter>,
        /// Match name, email or id
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Show one user document
    Show { uid: String },
    /// Send a password reset email
    ResetPassword(TargetArgs),
    /// Mark the email address as verified
    VerifyEmail(TargetArgs),
    Activate(TargetArgs),
    /// Deactivate and schedule deletion in 30 days
    Deactivate(TargetArgs),
    Suspend(TargetArgs),
    Unsuspend(TargetArgs),
    Ban(TargetArgs),
    Unban(TargetArgs),
    /// Downgrade to the Basic plan
    CancelSubscription(TargetArgs),
    /// Permanently delete the user
    Delete(TargetArgs),
    /// Delete accounts deactivated 30 or more days ago
    Purge {
        #[arg(short, long)]
        yes: bool,
    },
}

pub async fn handle_users_command(ctx: &mut AppContext, command: UsersCommands) -> Result<()> {
    let (action, target) = match command {
        UsersCommands::List { status, search } => {
            return list_users(ctx, status, search.as_deref()).await
        }
        UsersCommands::Show { uid } => return show_user(ctx, &uid).await,
        UsersCommands::Purge { yes } => return purge(ctx, yes).await,
        UsersCommands::ResetPassword(t) => (UserAction::ResetPassword, t),
        UsersCommands::VerifyEmail(t) => (UserAction::VerifyEmail, t),
        UsersCommands::Activate(t) => (UserAction::Activate, t),
        UsersCommands::Deactivate(t) => (UserAction::Deactivate, t),
        UsersCommands::Suspend(t) => (UserAction::Suspend, t),
        UsersCommands::Unsuspend(t) => (UserAction::Unsuspend, t),
        UsersCommands::Ban(t) => (UserAction::Ban, t),
        UsersCommands::Unban(t) => (UserAction::Unban, t),
        UsersCommands::CancelSubscription(t) => (UserAction::CancelSubscription, t),
        UsersCommands::Delete(t) => (UserAction::Delete, t),
    };
    apply_action(ctx, action, target).await
}

async fn apply_action(ctx: &mut AppContext, action: UserAction, target: TargetArgs) -> Result<()> {
    let users = ctx.users().await?;
    let user = users.user(&target.uid).await?;

    if !confirm(&action.confirmation_prompt(&user), target.yes)? {
        println!("{}", "Cancelled".yellow());
        return Ok(());
    }

    let report = users
        .apply(&target.uid, action, true, target.expect_version, Utc::now())
        .await?;

    match &report.user {
        Some(updated) => println!(
            "{} {} on {} (status {}, version {})",
            "✓".green().bold(),
            action,
            updated.display_name().bold(),
            status_label(updated.account_status),
            updated.version
        ),
        None => println!("{} {} deleted", "✓".green().bold(), user.display_name().bold()),
    }
    print_side_effect("user notification", &report.notification);
    Ok(())
}

async fn list_users(
    ctx: &mut AppContext,
    status: Option<UserStatusFilter>,
    search: Option<&str>,
) -> Result<()> {
    ctx.session().await?;
    let all = ctx.store().await?.list_users().await?;
    let users = filter_users(&all, status, search);

    if users.is_empty() {
        println!("{}", "No users found".yellow());
        return Ok(());
    }

    let mut table = new_table(vec!["ID", "Name", "Email", "Plan", "Status", "Verified", "Online"]);
    for user in &users {
        table.add_row(vec![
            user.id.clone(),
            truncate(user.name.as_deref().unwrap_or("—"), 20),
            truncate(user.email.as_deref().unwrap_or("—"), 28),
            user.subscription_type.plan_name().to_string(),
            status_label(user.account_status).to_string(),
            yes_no(user.email_verified).to_string(),
            yes_no(user.is_online).to_string(),
        ]);
    }
    println!("{}", table);
    println!("Total: {} users", users.len().to_string().cyan());
    Ok(())
}

async fn show_user(ctx: &mut AppContext, uid: &str) -> Result<()> {
    let user: PlatformUser = ctx.users().await?.user(uid).await?;

    println!("{}", format!("👤 {}", user.display_name()).blue().bold());
    println!();
    println!("  {} {}", "ID:".bold(), user.id);
    println!("  {} {}", "Email:".bold(), user.email.as_deref().unwrap_or("—"));
    println!("  {} {}", "Verified:".bold(), yes_no(user.email_verified));
    println!("  {} {}", "Status:".bold(), status_label(user.account_status));
    println!(
        "  {} {} ({})",
        "Plan:".bold(),
        user.subscription_plan
            .as_deref()
            .unwrap_or(user.subscription_type.plan_name()),
        user.subscription_status.as_deref().unwrap_or("—")
    );
    println!("  {} {}", "Plan ends:".bold(), format_opt_date(user.subscription_end_date));
    if user.account_status == AccountStatus::Deactivated {
        println!(
            "  {} {}",
            "Deletion scheduled:".bold(),
            format_opt_date(user.scheduled_deletion_date).red()
        );
    }
    if let Some(reason) = user.ban_reason.as_deref().or(user.suspend_reason.as_deref()) {
        println!("  {} {}", "Reason:".bold(), reason);
    }
    println!(
        "  {} local {}, api {}",
        "Searches:".bold(),
        user.local_search_count,
        user.api_search_count
    );
    println!("  {} {}", "Version:".bold(), user.version);
    Ok(())
}

async fn purge(ctx: &mut AppContext, yes: bool) -> Result<()> {
    let users = ctx.users().await?;
    if !confirm(
        "Permanently delete every account deactivated 30 or more days ago?",
        yes,
    )? {
        println!("{}", "Cancelled".yellow());
        return Ok(());
    }

    let report = users.purge_deactivated(Utc::now()).await?;
    println!(
        "{} Purge finished: {} processed, {} deleted, {} failed",
        "✓".green().bold(),
        report.processed,
        report.successful.to_string().green(),
        report.failed.to_string().red()
    );
    for error in &report.errors {
        println!("  {} {}", "✗".red(), error);
    }
    Ok(())
}

fn status_label(status: AccountStatus) -> ColoredString {
    match status {
        AccountStatus::Active => "active".green(),
        AccountStatus::Deactivated => "deactivated".yellow(),
        AccountStatus::Suspended => "suspended".yellow(),
        AccountStatus::Banned => "banned".red(),
    }
}
