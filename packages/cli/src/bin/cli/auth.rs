// ABOUTME: CLI commands for admin login, logout and session inspection
// ABOUTME: The logged-in admin is saved as TOML so later commands act as the same admin

use anyhow::Result;
use chrono::Utc;
use clap::Args;
use colored::*;
use inquire::{Password, Text};
use patentdesk_backend::PatentBackend;
use patentdesk_cli::AppContext;
use patentdesk_core::{validate_login, LoginInput};
use patentdesk_workflow::AdminSession;
use tracing::info;

use super::utils::format_date;

#[derive(Args)]
pub struct LoginArgs {
    /// Numeric admin id
    #[arg(long)]
    admin_id: Option<String>,
    /// Admin display name
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    email: Option<String>,
    /// Prompted for when omitted
    #[arg(long)]
    password: Option<String>,
}

fn prompt_missing(value: Option<String>, label: &str) -> Result<String> {
    match value {
        Some(v) => Ok(v),
        None => Ok(Text::new(label).prompt()?),
    }
}

pub async fn login(ctx: &AppContext, args: LoginArgs) -> Result<()> {
    let input = LoginInput {
        admin_id: prompt_missing(args.admin_id, "Admin ID:")?,
        admin_name: prompt_missing(args.name, "Admin name:")?,
        email: prompt_missing(args.email, "Email:")?,
        password: match args.password {
            Some(p) => p,
            None => Password::new("Password:").without_confirmation().prompt()?,
        },
    };

    let request = validate_login(&input)?;
    let admin = ctx.backend().login(&request).await?;
    info!(admin_id = admin.admin_id, "Admin logged in");

    ctx.sessions()
        .save(&AdminSession::new(&admin, Utc::now()))
        .await?;

    println!(
        "{} Logged in as {} (admin {})",
        "✓".green().bold(),
        admin.admin_name.bold(),
        admin.admin_id.to_string().cyan()
    );
    Ok(())
}

pub async fn logout(ctx: &AppContext) -> Result<()> {
    if ctx.sessions().clear().await? {
        println!("{} Logged out", "✓".green().bold());
    } else {
        println!("{}", "No admin session to clear".yellow());
    }
    Ok(())
}

pub async fn whoami(ctx: &AppContext) -> Result<()> {
    let session = ctx.session().await?;
    println!("{}", "👤 Current Admin".blue().bold());
    println!();
    println!("  {} {}", "ID:".bold(), session.admin_id);
    println!("  {} {}", "Name:".bold(), session.admin_name);
    println!("  {} {}", "Email:".bold(), session.email);
    println!(
        "  {} {}",
        "Since:".bold(),
        format_date(&session.logged_in_at.to_rfc3339())
    );
    println!(
        "  {} {}",
        "Session:".bold(),
        ctx.sessions().path().display().to_string().dimmed()
    );
    Ok(())
}

pub async fn health(ctx: &AppContext) -> Result<()> {
    let url = &ctx.config().api_base_url;
    match ctx.backend().health().await {
        Ok(true) => {
            println!("{} Backend is healthy ({})", "✓".green().bold(), url);
            Ok(())
        }
        Ok(false) => anyhow::bail!("Backend at {} answered but reported unhealthy", url),
        Err(e) => Err(anyhow::Error::new(e).context(format!("Backend at {} is unreachable", url))),
    }
}
