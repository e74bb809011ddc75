//! Special commands for the interactive chat
//!
//! Lines starting with `/` are handled by the CLI instead of being sent to
//! the assistant. Commands are case-insensitive.

use colored::Colorize;
use thiserror::Error;

/// Errors that can occur when parsing special commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown command was entered
    #[error("Unknown command: {0}\n\nType '/help' to see available commands")]
    UnknownCommand(String),

    /// Command requires an argument but none was provided
    #[error("Command {command} requires an argument\n\nUsage: {usage}")]
    MissingArgument { command: String, usage: String },
}

/// Commands understood by the interactive chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialCommand {
    /// Start a fresh session
    New,
    /// List recent sessions
    Sessions,
    /// Continue an existing session
    Resume(String),
    /// Show help
    Help,
    /// Leave the chat
    Exit,
    /// Not a special command; send the line to the assistant
    None,
}

/// Parse a line of chat input
///
/// # Examples
///
/// ```
/// use aura::commands::special_commands::{parse_special_command, SpecialCommand};
///
/// assert_eq!(parse_special_command("/NEW").unwrap(), SpecialCommand::New);
/// assert_eq!(parse_special_command("my vacuum beeps").unwrap(), SpecialCommand::None);
/// ```
pub fn parse_special_command(input: &str) -> Result<SpecialCommand, CommandError> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return Ok(SpecialCommand::None);
    }

    let mut parts = trimmed.split_whitespace();
    let command = parts.next().unwrap_or_default().to_lowercase();
    let arg = parts.next();

    match command.as_str() {
        "/new" => Ok(SpecialCommand::New),
        "/sessions" => Ok(SpecialCommand::Sessions),
        "/resume" => match arg {
            Some(id) => Ok(SpecialCommand::Resume(id.to_string())),
            None => Err(CommandError::MissingArgument {
                command: "/resume".to_string(),
                usage: "/resume <SESSION_ID>".to_string(),
            }),
        },
        "/help" | "/?" => Ok(SpecialCommand::Help),
        "/exit" | "/quit" => Ok(SpecialCommand::Exit),
        _ => Err(CommandError::UnknownCommand(command)),
    }
}

/// Print the list of chat commands
pub fn print_help() {
    println!();
    println!("{}", "Chat commands".bold());
    println!("  {}              Start a new session", "/new".cyan());
    println!("  {}         List recent sessions", "/sessions".cyan());
    println!("  {}  Continue a stored session", "/resume <ID>".cyan());
    println!("  {}             Show this help", "/help".cyan());
    println!("  {}             Leave the chat", "/exit".cyan());
    println!();
    println!("Anything else is sent to the assistant, e.g. \"My device AURA-1 shows E-401\".");
    println!();
}
