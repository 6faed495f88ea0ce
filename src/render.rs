//! Terminal rendering of the views

use chrono::Local;
use std::fmt::Write;

use crate::backend::{FeedActivity, Team};
use crate::entry::EntryForm;
use crate::feed::{team_color, FeedState};
use crate::shell::Tab;

/// Tab bar with the active tab bracketed
pub fn tab_bar(active: Tab) -> String {
    Tab::all()
        .iter()
        .map(|tab| {
            if *tab == active {
                format!("[{}]", tab.label())
            } else {
                format!(" {} ", tab.label())
            }
        })
        .collect::<Vec<_>>()
        .join("   ")
}

/// The entry view: code field, team options, submit control
pub fn entry_view(form: &EntryForm) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Entry");
    let _ = writeln!(out);
    let code = if form.code().is_empty() {
        "(7 digits numbers)"
    } else {
        form.code()
    };
    let _ = writeln!(out, "1. Enter a Treasure code: {}", code);
    let _ = writeln!(out, "2. Your Team:");

    if form.directory().is_empty() {
        let _ = writeln!(out, "   (no teams available)");
    }
    for team in form.directory().teams() {
        let marker = if form.selected_team_id() == Some(team.id) {
            "*"
        } else {
            " "
        };
        let _ = writeln!(out, "   {} {:>3}  {}", marker, team.id, team.team_name);
    }

    let button = if form.is_submitting() {
        "[ Submitting... ]"
    } else if form.can_submit() {
        "[ next ]"
    } else {
        "[ next ] (disabled)"
    };
    let _ = writeln!(out);
    let _ = write!(out, "{}", button);
    out
}

/// Team directory as a two-column listing
pub fn team_list(teams: &[Team]) -> String {
    if teams.is_empty() {
        return "No teams found.".to_string();
    }
    let mut out = format!("{:<6} {}\n{}", "ID", "Team", "-".repeat(30));
    for team in teams {
        let _ = write!(out, "\n{:<6} {}", team.id, team.team_name);
    }
    out
}

/// The feed view in its current render state
pub fn feed_view(state: &FeedState, color: bool) -> String {
    match state {
        FeedState::Loading => "Loading activity feed...".to_string(),
        FeedState::Failed(message) => format!("Error:\n{}", message),
        FeedState::Loaded(rows) if rows.is_empty() => {
            "No activity yet.\nStart hunting to see the feed populate!".to_string()
        }
        FeedState::Loaded(rows) => feed_table(rows, color),
    }
}

/// Feed rows as a table; team names are tinted with their colour when `color`
pub fn feed_table(rows: &[FeedActivity], color: bool) -> String {
    let mut out = format!(
        "{:<6} {:<20} {:<16} {:<10} {:<16} {:>8}\n{}",
        "ID",
        "created_at",
        "team_name",
        "scan",
        "treasure_name_zh",
        "points",
        "-".repeat(81)
    );

    for row in rows {
        let created = row
            .created_at
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string();
        let team = format!("{:<16}", row.team_name);
        let team = if color { tint(&team, &row.team_name) } else { team };
        let _ = write!(
            out,
            "\n{:<6} {:<20} {} {:<10} {:<16} {:>8}",
            row.id,
            created,
            team,
            row.scan,
            row.treasure_name_zh,
            row.points_earned
        );
    }
    out
}

fn tint(text: &str, team_name: &str) -> String {
    let (r, g, b) = team_color(team_name).to_rgb();
    format!("\x1b[1;38;2;{};{};{}m{}\x1b[0m", r, g, b, text)
}
