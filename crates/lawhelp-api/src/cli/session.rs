//! Session management CLI commands: create, list, messages.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use lawhelp_types::chat::{ChatSession, ConversationTurn, TurnRole};
use lawhelp_types::identity::SubjectId;

use crate::state::ConcreteChatService;

/// Create a session owned by `owner`.
///
/// # Examples
///
/// ```bash
/// lawhelp session create --owner u1 --title "Night theft"
/// ```
pub async fn create_session(
    service: &ConcreteChatService,
    owner: &str,
    title: Option<String>,
    json: bool,
) -> Result<()> {
    let session = service
        .create_session(SubjectId::new(owner), title)
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&session)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} Session {} created for {}",
        style("✓").green().bold(),
        style(&session.id).cyan(),
        style(&session.owner_id).bold()
    );
    println!();
    Ok(())
}

/// List a subject's sessions.
///
/// # Examples
///
/// ```bash
/// lawhelp session list --owner u1
/// lawhelp session list --owner u1 --json
/// ```
pub async fn list_sessions(service: &ConcreteChatService, owner: &str, json: bool) -> Result<()> {
    let owner = SubjectId::new(owner);
    let sessions = service.list_sessions(&owner, None, None).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&sessions)?);
        return Ok(());
    }

    if sessions.is_empty() {
        println!();
        println!(
            "  {} No sessions found for '{}'. Create one with: {}",
            style("i").blue().bold(),
            style(&owner).cyan(),
            style(format!("lawhelp session create --owner {owner}")).yellow()
        );
        println!();
        return Ok(());
    }

    println!();
    println!("  Sessions for '{}'", style(&owner).cyan().bold());
    println!();
    println!("{}", sessions_table(&sessions));
    println!();
    println!(
        "  {} session{}",
        style(sessions.len()).bold(),
        if sessions.len() == 1 { "" } else { "s" }
    );
    println!();

    Ok(())
}

fn sessions_table(sessions: &[ChatSession]) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("ID").fg(Color::White),
        Cell::new("Title").fg(Color::White),
        Cell::new("Created").fg(Color::White),
        Cell::new("Last activity").fg(Color::White),
    ]);

    for session in sessions {
        table.add_row(vec![
            Cell::new(&session.id).fg(Color::DarkGrey),
            Cell::new(truncate(session.title.as_deref().unwrap_or("(untitled)"), 40))
                .fg(Color::Cyan),
            Cell::new(session.created_at.format("%Y-%m-%d %H:%M").to_string()).fg(Color::White),
            Cell::new(session.updated_at.format("%Y-%m-%d %H:%M").to_string()).fg(Color::White),
        ]);
    }
    table
}

/// Print a session's transcript.
///
/// # Examples
///
/// ```bash
/// lawhelp session messages 0192f0c4-...
/// ```
pub async fn show_messages(service: &ConcreteChatService, session_id: &str, json: bool) -> Result<()> {
    let turns = service.transcript_unchecked(session_id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&turns)?);
        return Ok(());
    }

    println!();
    if turns.is_empty() {
        println!("  {} No messages yet.", style("i").blue().bold());
        println!();
        return Ok(());
    }

    for turn in &turns {
        println!("{}", format_turn(turn));
        println!();
    }
    Ok(())
}

fn format_turn(turn: &ConversationTurn) -> String {
    let label = match turn.role {
        TurnRole::User => style(format!("{} ({})", "You", turn.subject_id)).cyan().bold(),
        TurnRole::Ai => style("Legal assistant".to_string()).green().bold(),
    };
    format!(
        "  {} {}\n  {}",
        label,
        style(turn.created_at.format("%Y-%m-%d %H:%M:%S")).dim(),
        turn.content.replace('\n', "\n  ")
    )
}

/// Truncate to `max` characters, adding an ellipsis.
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let head: String = s.chars().take(max.saturating_sub(3)).collect();
    format!("{head}...")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_is_char_safe() {
        assert_eq!(truncate("short", 40), "short");
        assert_eq!(truncate("Vol qualifié à main armée", 10), "Vol qua...");
    }

    #[test]
    fn test_format_turn_indents_continuation_lines() {
        let turn = ConversationTurn::new("s1", SubjectId::new("u1"), TurnRole::Ai, "line one\nline two");
        let text = console::strip_ansi_codes(&format_turn(&turn)).to_string();
        assert!(text.contains("Legal assistant"));
        assert!(text.ends_with("line one\n  line two"));
    }

    #[test]
    fn test_sessions_table_lists_every_session() {
        let sessions = vec![
            ChatSession::new(SubjectId::new("u1"), Some("Theft".to_string())),
            ChatSession::new(SubjectId::new("u1"), None),
        ];
        let rendered = sessions_table(&sessions).to_string();
        assert!(rendered.contains("Theft"));
        assert!(rendered.contains("(untitled)"));
    }
}
