use anyhow::Result;
use clap::Subcommand;
use colored::*;
use patentdesk_backend::FilingUpdateResponse;
use patentdesk_cli::AppContext;
use patentdesk_core::constants::DEFAULT_PAGE_SIZE;
use patentdesk_core::{
    filter_filings, paginate, Activity, DetailFields, FilingState, PatentFiling, QuickFilter,
    Stage, StagePolicy,
};
use patentdesk_workflow::{ActivationReport, CommitOutcome, CommitReport, FormKind};

use super::utils::{new_table, print_side_effect, truncate};

#[derive(Subcommand)]
pub enum FilingsCommands {
    /// List filings
    List {
        /// granted, rejected, deactivated or application
        #[arg(short, long)]
        filter: Option<QuickFilter>,
        /// Match title, applicant name, id or applicant email
        #[arg(short, long)]
        search: Option<String>,
        #[arg(short, long, default_value = "1")]
        page: usize,
    },
    /// Show one filing with its stages and message thread
    Show { id: i64 },
    /// Set or clear one of stages 1-4; setting also sets the earlier stages
    Stage {
        id: i64,
        /// filed, admin-review, technical-review, verification or 1-4
        #[arg(value_parser = parse_toggle_stage)]
        stage: Stage,
        #[arg(action = clap::ArgAction::Set)]
        value: bool,
        /// Write only this stage, without cascading
        #[arg(long)]
        raw: bool,
    },
    /// Grant a filing
    Grant {
        id: i64,
        #[arg(long, default_value = "")]
        patent_number: String,
        /// Granted patent person name
        #[arg(long, default_value = "")]
        person: String,
        #[arg(long, default_value = "")]
        location: String,
    },
    /// Reject a filing
    Reject {
        id: i64,
        /// Rejected patent number
        #[arg(long, default_value = "")]
        patent_number: String,
        /// Rejected patent person name
        #[arg(long, default_value = "")]
        person: String,
        #[arg(long, default_value = "")]
        location: String,
    },
    /// Reset to stage 1 only
    Reset { id: i64 },
    /// Make a filing visible to its owner again
    Activate { id: i64 },
    /// Hide a filing from its owner
    Deactivate { id: i64 },
    /// Answer the owner in the next free reply slot
    Reply { id: i64, text: String },
}

/// Stage 5 is reached through `filings grant`, never a toggle
fn parse_toggle_stage(value: &str) -> Result<Stage, String> {
    match value.parse::<Stage>()? {
        Stage::Granted => {
            Err("stage 5 is set by `filings grant` with the patent details".to_string())
        }
        stage => Ok(stage),
    }
}

pub async fn handle_filings_command(ctx: &mut AppContext, command: FilingsCommands) -> Result<()> {
    match command {
        FilingsCommands::List {
            filter,
            search,
            page,
        } => list_filings(ctx, filter.unwrap_or_default(), search.as_deref(), page).await,
        FilingsCommands::Show { id } => show_filing(ctx, id).await,
        FilingsCommands::Stage {
            id,
            stage,
            value,
            raw,
        } => {
            let policy = if raw {
                StagePolicy::Raw
            } else {
                StagePolicy::Cascade
            };
            let response = ctx.workflow().await?.set_stage(id, stage, value, policy).await?;
            print_update(id, &response);
            Ok(())
        }
        FilingsCommands::Grant {
            id,
            patent_number,
            person,
            location,
        } => {
            let fields = DetailFields::new(patent_number, person, location);
            let mut workflow = ctx.workflow().await?;
            workflow.open_form(id, FormKind::Grant);
            let outcome = workflow.submit_grant(id, &fields).await?;
            print_commit(outcome);
            Ok(())
        }
        FilingsCommands::Reject {
            id,
            patent_number,
            person,
            location,
        } => {
            let fields = DetailFields::new(patent_number, person, location);
            let mut workflow = ctx.workflow().await?;
            workflow.open_form(id, FormKind::Reject);
            let outcome = workflow.submit_reject(id, &fields).await?;
            print_commit(outcome);
            Ok(())
        }
        FilingsCommands::Reset { id } => {
            let response = ctx.workflow().await?.reset_stages(id).await?;
            print_update(id, &response);
            Ok(())
        }
        FilingsCommands::Activate { id } => {
            let report = ctx.workflow().await?.activate(id).await?;
            print_activation(&report);
            Ok(())
        }
        FilingsCommands::Deactivate { id } => {
            let report = ctx.workflow().await?.deactivate(id).await?;
            print_activation(&report);
            Ok(())
        }
        FilingsCommands::Reply { id, text } => {
            let filing = ctx.workflow().await?.send_reply(id, &text).await?;
            println!(
                "{} Reply sent to filing {} ({} of 4 replies used)",
                "✓".green().bold(),
                id,
                filing.reply_count()
            );
            Ok(())
        }
    }
}

async fn list_filings(
    ctx: &mut AppContext,
    filter: QuickFilter,
    search: Option<&str>,
    page: usize,
) -> Result<()> {
    let mut workflow = ctx.workflow().await?;
    let filings = workflow.refresh().await?;
    let matched: Vec<PatentFiling> = filter_filings(filings, filter, search)
        .into_iter()
        .cloned()
        .collect();

    if matched.is_empty() {
        println!("{}", "No filings found".yellow());
        return Ok(());
    }

    let page = paginate(&matched, page, DEFAULT_PAGE_SIZE);
    let mut table = new_table(vec!["ID", "Title", "Applicant", "State", "Active", "Unread"]);
    for filing in &page.items {
        table.add_row(vec![
            filing.id.to_string(),
            truncate(filing.title(), 30),
            truncate(filing.applicant_name.as_deref().unwrap_or("—"), 20),
            FilingState::of(filing).label().to_string(),
            Activity::of(filing).to_string(),
            filing.unread_messages().to_string(),
        ]);
    }

    println!("{}", table);
    println!(
        "Page {} of {} ({} filings)",
        page.page.to_string().cyan(),
        page.total_pages,
        page.total_items
    );
    Ok(())
}

async fn show_filing(ctx: &mut AppContext, id: i64) -> Result<()> {
    let filing = ctx.workflow().await?.filing(id).await?;

    println!("{}", format!("📄 Filing {} - {}", filing.id, filing.title()).blue().bold());
    println!();
    println!(
        "  {} {}",
        "Applicant:".bold(),
        filing.applicant_name.as_deref().unwrap_or("—")
    );
    println!(
        "  {} {}",
        "Email:".bold(),
        filing.applicant_email.as_deref().unwrap_or("—")
    );
    println!("  {} {}", "State:".bold(), FilingState::of(&filing));
    println!("  {} {}", "Activity:".bold(), Activity::of(&filing));
    if let Some(status) = &filing.status {
        println!("  {} {}", "Status:".bold(), status);
    }
    if let Some(number) = filing.patent_number.as_deref().or(filing.rejected_patent_number.as_deref()) {
        println!("  {} {}", "Patent number:".bold(), number);
    }

    println!();
    println!("{}", "Stages".bold());
    for stage in Stage::ORDER {
        let mark = if stage.is_set(&filing) {
            "✓".green()
        } else {
            "·".dimmed()
        };
        println!("  {} {}", mark, stage.label());
    }

    let messages = filing.messages();
    let replies = filing.replies();
    if messages.iter().any(Option::is_some) {
        println!();
        println!(
            "{} ({} unread)",
            "Messages".bold(),
            filing.unread_messages().to_string().cyan()
        );
        for (i, message) in messages.iter().enumerate() {
            if let Some(message) = message {
                println!("  {} {}", format!("m{}:", i + 1).dimmed(), message);
                if let Some(reply) = replies.get(i).copied().flatten() {
                    println!("    {} {}", format!("r{}:", i + 1).green(), reply);
                }
            }
        }
    }
    Ok(())
}

fn print_update(id: i64, response: &FilingUpdateResponse) {
    println!(
        "{} Filing {} updated{}",
        "✓".green().bold(),
        id,
        response
            .status
            .as_deref()
            .map(|s| format!(": {}", s))
            .unwrap_or_default()
    );
    if response.email_sent == Some(true) {
        println!("  {} applicant emailed", "✓".green());
    }
}

fn print_commit(outcome: CommitOutcome) {
    match outcome {
        CommitOutcome::FormOpened { filing_id } => {
            println!("Detail form opened for filing {}", filing_id);
        }
        CommitOutcome::Committed(CommitReport {
            filing_id,
            state,
            response,
            notification,
            counter,
            refreshed,
        }) => {
            println!("{} Filing {} is now {}", "✓".green().bold(), filing_id, state.to_string().bold());
            if let Some(message) = &response.message {
                println!("  {}", message.dimmed());
            }
            if response.email_sent == Some(true) {
                println!("  {} applicant emailed", "✓".green());
            }
            print_side_effect("owner notification", &notification);
            print_side_effect("admin counter", &counter);
            if !refreshed {
                println!("  {} filing list could not be re-fetched", "⚠".yellow());
            }
        }
    }
}

fn print_activation(report: &ActivationReport) {
    let state = if report.is_active {
        "active".green()
    } else {
        "inactive".yellow()
    };
    println!("{} Filing {} is now {}", "✓".green().bold(), report.filing_id, state);
    print_side_effect("owner notification", &report.notification);
    print_side_effect("admin counter", &report.counter);
}
