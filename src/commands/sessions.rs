use crate::cli::SessionCommand;
use crate::config::Config;
use crate::error::Result;
use crate::providers::Message;
use crate::storage::{SqliteStorage, StoredSession};

use chrono::{Local, TimeZone};
use colored::Colorize;
use prettytable::{format, Table};

const TITLE_WIDTH: usize = 40;

fn format_timestamp(epoch_ms: i64) -> String {
    Local
        .timestamp_millis_opt(epoch_ms)
        .single()
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn shorten(text: &str, width: usize) -> String {
    if text.chars().count() > width {
        format!("{}...", text.chars().take(width - 3).collect::<String>())
    } else {
        text.to_string()
    }
}

/// Build the session listing table
pub fn session_table(sessions: &[StoredSession]) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);

    table.add_row(prettytable::row![
        "ID".bold(),
        "Title".bold(),
        "Messages".bold(),
        "Last Message".bold()
    ]);

    for session in sessions {
        table.add_row(prettytable::row![
            session.session_id.cyan(),
            shorten(&session.title, TITLE_WIDTH),
            session.message_count,
            format_timestamp(session.last_message_at)
        ]);
    }

    table
}

fn print_message(message: &Message) {
    let stamp = message
        .timestamp
        .map(format_timestamp)
        .unwrap_or_else(|| "-".to_string());

    let label = match message.role.as_str() {
        "user" => "user".green().bold(),
        "assistant" if message.is_error() => "assistant".red().bold(),
        "assistant" => "assistant".cyan().bold(),
        other => other.to_string().dimmed(),
    };

    if message.has_tool_calls() {
        let names: Vec<&str> = message
            .tool_calls
            .iter()
            .flatten()
            .map(|call| call.function.name.as_str())
            .collect();
        println!("[{}] {} calls {}", stamp, label, names.join(", ").yellow());
    } else {
        println!("[{}] {}: {}", stamp, label, message.text());
    }
}

/// Handle `sessions` subcommands
pub fn handle_sessions(config: &Config, command: SessionCommand) -> Result<()> {
    let storage = SqliteStorage::open(&config.storage)?;
    let default_user = || config.web.user_id.clone();

    match command {
        SessionCommand::List { limit, user, json } => {
            let user_id = user.unwrap_or_else(default_user);
            let sessions = storage.list_sessions(&user_id, limit)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&sessions)?);
                return Ok(());
            }

            if sessions.is_empty() {
                println!("{}", format!("No sessions found for {}.", user_id).yellow());
                return Ok(());
            }

            println!("\nSessions for {}:", user_id.bold());
            session_table(&sessions).printstd();
            println!();
            println!(
                "Use {} to continue a session.",
                "aura chat --session <ID>".cyan()
            );
            println!();
        }
        SessionCommand::Show { id, limit, user } => {
            let user_id = user.unwrap_or_else(default_user);
            let Some(session) = storage.get_session(&user_id, &id)? else {
                println!("{}", format!("Session {} not found.", id).yellow());
                return Ok(());
            };

            println!(
                "\n{} ({} messages)\n",
                session.title.bold(),
                session.message_count
            );
            for message in storage.load_messages(&user_id, &id, limit)? {
                print_message(&message);
            }
            println!();
        }
        SessionCommand::Delete { id, user } => {
            let user_id = user.unwrap_or_else(default_user);
            let removed = storage.delete_session(&user_id, &id)?;
            println!(
                "{}",
                format!("Deleted session {} ({} messages removed)", id, removed).green()
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shorten_counts_chars() {
        assert_eq!(shorten("short", 10), "short");
        assert_eq!(shorten("ééééééééééé", 8), "ééééé...");
    }

    #[test]
    fn test_session_table_has_header_and_rows() {
        let sessions = vec![StoredSession {
            session_id: "abc".to_string(),
            user_id: "u".to_string(),
            title: "Chat - 2024-05-01 10:00".to_string(),
            created_at: 0,
            last_message_at: 0,
            message_count: 4,
        }];
        assert_eq!(session_table(&sessions).len(), 2);
    }

    #[test]
    fn test_delete_reports_removed_messages() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.storage.db_path = Some(dir.path().join("aura.db"));

        let storage = SqliteStorage::open(&config.storage).unwrap();
        storage
            .append_messages("default_user", "s1", &[Message::user("hi")], 1)
            .unwrap();

        handle_sessions(
            &config,
            SessionCommand::Delete {
                id: "s1".to_string(),
                user: None,
            },
        )
        .unwrap();
        assert_eq!(storage.message_count("default_user", "s1").unwrap(), 0);
    }
}
