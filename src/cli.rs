//! Command-line interface definition for Aura
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for chatting, serving the web UI, and maintaining
//! the session store and knowledge base.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Aura - IoT troubleshooting assistant
///
/// Diagnose device problems through conversation. The assistant searches
/// troubleshooting guides, checks device connectivity and reads device
/// error logs before proposing a fix.
#[derive(Parser, Debug, Clone)]
#[command(name = "aura")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Override the chat provider from config (azure, ollama)
    #[arg(long, global = true)]
    pub provider: Option<String>,

    /// Override the SQLite database path
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Log output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human readable lines
    Text,
    /// One JSON object per line
    Json,
}

/// Available commands for Aura
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start an interactive troubleshooting chat
    Chat {
        /// Resume an existing session instead of starting a new one
        #[arg(short, long)]
        session: Option<String>,

        /// User id owning the session (defaults to web.user_id)
        #[arg(short, long)]
        user: Option<String>,
    },

    /// Ask a single question and print the answer
    Ask {
        /// The problem description
        #[arg(short, long)]
        query: String,

        /// Device identifier to include as context
        #[arg(long)]
        device_id: Option<String>,

        /// Error code to include as context
        #[arg(long)]
        error_code: Option<String>,

        /// Append to an existing session
        #[arg(short, long)]
        session: Option<String>,

        /// User id owning the session (defaults to web.user_id)
        #[arg(short, long)]
        user: Option<String>,
    },

    /// Serve the web chat UI
    Serve {
        /// Socket address to bind (overrides web.bind)
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Manage stored chat sessions
    Sessions {
        /// Session management subcommand
        #[command(subcommand)]
        command: SessionCommand,
    },

    /// Ingest markdown guides into the knowledge index
    Ingest {
        /// Knowledge base directory (overrides knowledge.base_path)
        #[arg(short, long)]
        path: Option<PathBuf>,
    },

    /// Report on the contents of the knowledge index
    Verify,

    /// Check configuration, database and hosted services
    Preflight,

    /// Create the database tables
    SetupDb,
}

/// Session management subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum SessionCommand {
    /// List recent sessions
    List {
        /// Maximum number of sessions to show
        #[arg(short, long, default_value_t = 20)]
        limit: usize,

        /// User id (defaults to web.user_id)
        #[arg(short, long)]
        user: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the most recent messages of a session
    Show {
        /// Session id
        id: String,

        /// Maximum number of messages to show
        #[arg(short, long, default_value_t = 20)]
        limit: usize,

        /// User id (defaults to web.user_id)
        #[arg(short, long)]
        user: Option<String>,
    },

    /// Delete a session and all of its messages
    Delete {
        /// Session id
        id: String,

        /// User id (defaults to web.user_id)
        #[arg(short, long)]
        user: Option<String>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            verbose: false,
            log_format: LogFormat::Text,
            provider: None,
            db: None,
            command: Commands::Preflight,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default() {
        let cli = Cli::default();
        assert_eq!(cli.config, Some("config/config.yaml".to_string()));
        assert!(!cli.verbose);
        assert_eq!(cli.log_format, LogFormat::Text);
    }

    #[test]
    fn test_cli_parse_chat_command() {
        let cli = Cli::try_parse_from(["aura", "chat"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Chat {
                session: None,
                user: None
            }
        ));
    }

    #[test]
    fn test_cli_parse_chat_resume_session() {
        let cli = Cli::try_parse_from(["aura", "chat", "--session", "abc"]).unwrap();
        if let Commands::Chat { session, .. } = cli.command {
            assert_eq!(session, Some("abc".to_string()));
        } else {
            panic!("Expected Chat command");
        }
    }

    #[test]
    fn test_cli_parse_ask_with_context() {
        let cli = Cli::try_parse_from([
            "aura",
            "ask",
            "--query",
            "vacuum is weak",
            "--device-id",
            "AURA-1",
            "--error-code",
            "E-401",
        ])
        .unwrap();

        if let Commands::Ask {
            query,
            device_id,
            error_code,
            ..
        } = cli.command
        {
            assert_eq!(query, "vacuum is weak");
            assert_eq!(device_id, Some("AURA-1".to_string()));
            assert_eq!(error_code, Some("E-401".to_string()));
        } else {
            panic!("Expected Ask command");
        }
    }

    #[test]
    fn test_cli_parse_ask_requires_query() {
        let cli = Cli::try_parse_from(["aura", "ask"]);
        assert!(cli.is_err());
    }

    #[test]
    fn test_cli_parse_global_overrides_after_subcommand() {
        let cli = Cli::try_parse_from([
            "aura",
            "setup-db",
            "--db",
            "/tmp/aura.db",
            "--provider",
            "ollama",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::SetupDb));
        assert_eq!(cli.db, Some(PathBuf::from("/tmp/aura.db")));
        assert_eq!(cli.provider, Some("ollama".to_string()));
    }

    #[test]
    fn test_cli_parse_sessions_list_defaults() {
        let cli = Cli::try_parse_from(["aura", "sessions", "list"]).unwrap();
        if let Commands::Sessions {
            command: SessionCommand::List { limit, user, json },
        } = cli.command
        {
            assert_eq!(limit, 20);
            assert!(user.is_none());
            assert!(!json);
        } else {
            panic!("Expected Sessions List command");
        }
    }

    #[test]
    fn test_cli_parse_sessions_delete() {
        let cli = Cli::try_parse_from(["aura", "sessions", "delete", "sess-1"]).unwrap();
        if let Commands::Sessions {
            command: SessionCommand::Delete { id, .. },
        } = cli.command
        {
            assert_eq!(id, "sess-1");
        } else {
            panic!("Expected Sessions Delete command");
        }
    }

    #[test]
    fn test_cli_parse_json_log_format() {
        let cli = Cli::try_parse_from(["aura", "--log-format", "json", "verify"]).unwrap();
        assert_eq!(cli.log_format, LogFormat::Json);
    }

    #[test]
    fn test_cli_parse_with_verbose() {
        let cli = Cli::try_parse_from(["aura", "-v", "preflight"]).unwrap();
        assert!(cli.verbose);
    }

    #[test]
    fn test_cli_parse_ingest_with_path() {
        let cli = Cli::try_parse_from(["aura", "ingest", "--path", "guides"]).unwrap();
        if let Commands::Ingest { path } = cli.command {
            assert_eq!(path, Some(PathBuf::from("guides")));
        } else {
            panic!("Expected Ingest command");
        }
    }

    #[test]
    fn test_cli_parse_missing_command() {
        let cli = Cli::try_parse_from(["aura"]);
        assert!(cli.is_err());
    }

    #[test]
    fn test_cli_parse_invalid_command() {
        let cli = Cli::try_parse_from(["aura", "invalid"]);
        assert!(cli.is_err());
    }
}
