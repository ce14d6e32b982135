// ABOUTME: Shared CLI helpers for tables, text truncation and confirmation prompts
// ABOUTME: Destructive commands confirm through inquire unless --yes was given

use anyhow::Result;
use chrono::{DateTime, Utc};
use colored::*;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, ContentArrangement, Table};
use inquire::Confirm;
use patentdesk_workflow::SideEffect;

pub fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(header);
    table
}

pub fn truncate(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

/// RFC3339 (or anything chrono parses as such) to `YYYY-MM-DD HH:MM`
pub fn format_date(value: &str) -> String {
    match DateTime::parse_from_rfc3339(value) {
        Ok(dt) => dt.with_timezone(&Utc).format("%Y-%m-%d %H:%M").to_string(),
        Err(_) => value.to_string(),
    }
}

pub fn format_opt_date(value: Option<DateTime<Utc>>) -> String {
    value
        .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "—".to_string())
}

pub fn yes_no(value: bool) -> ColoredString {
    if value {
        "yes".green()
    } else {
        "no".dimmed()
    }
}

/// `--yes` skips the prompt
pub fn confirm(prompt: &str, assume_yes: bool) -> Result<bool> {
    if assume_yes {
        return Ok(true);
    }
    Ok(Confirm::new(prompt).with_default(false).prompt()?)
}

/// One line per best-effort side effect
pub fn print_side_effect(label: &str, effect: &SideEffect) {
    match effect {
        SideEffect::Done | SideEffect::Duplicate => {
            println!("  {} {}: {}", "✓".green(), label, effect)
        }
        SideEffect::Skipped(_) => println!("  {} {}: {}", "-".dimmed(), label, effect),
        SideEffect::Failed(_) => println!("  {} {}: {}", "⚠".yellow(), label, effect.to_string().yellow()),
    }
}
