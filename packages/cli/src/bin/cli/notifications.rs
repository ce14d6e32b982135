use anyhow::Result;
use clap::Subcommand;
use colored::*;
use patentdesk_cli::AppContext;
use patentdesk_storage::DocumentStore;

use super::utils::{confirm, format_opt_date, new_table, truncate};

#[derive(Subcommand)]
pub enum NotificationsCommands {
    /// Show a user's latest notifications (at most 3 are kept)
    List { uid: String },
    /// Remove one notification
    Clear { uid: String, notification_id: String },
    /// Remove all of a user's notifications
    ClearAll {
        uid: String,
        #[arg(short, long)]
        yes: bool,
    },
}

pub async fn handle_notifications_command(
    ctx: &mut AppContext,
    command: NotificationsCommands,
) -> Result<()> {
    ctx.session().await?;
    let store = ctx.store().await?;

    match command {
        NotificationsCommands::List { uid } => {
            let notifications = store.list_notifications(&uid).await?;
            if notifications.is_empty() {
                println!("{}", format!("No notifications for {}", uid).yellow());
                return Ok(());
            }

            let mut table = new_table(vec!["ID", "Title", "Message", "Created", "Read"]);
            for n in &notifications {
                table.add_row(vec![
                    n.id.clone(),
                    n.title.clone(),
                    truncate(&n.message, 50),
                    format_opt_date(Some(n.created_at)),
                    if n.read { "yes" } else { "no" }.to_string(),
                ]);
            }
            println!("{}", table);
        }
        NotificationsCommands::Clear {
            uid,
            notification_id,
        } => {
            if store.delete_notification(&uid, &notification_id).await? {
                println!("{} Notification {} removed", "✓".green().bold(), notification_id);
            } else {
                anyhow::bail!("Notification {} not found for user {}", notification_id, uid);
            }
        }
        NotificationsCommands::ClearAll { uid, yes } => {
            if !confirm(&format!("Clear all notifications for {}?", uid), yes)? {
                println!("{}", "Cancelled".yellow());
                return Ok(());
            }
            let removed = store.clear_notifications(&uid).await?;
            println!("{} Removed {} notifications", "✓".green().bold(), removed);
        }
    }
    Ok(())
}
