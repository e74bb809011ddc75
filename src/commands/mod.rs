/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

- `chat`     : Interactive troubleshooting chat and one-shot `ask`
- `serve`    : Web chat UI
- `setup`    : Database schema creation
- `sessions` : Session listing, inspection and purge
- `knowledge`: Knowledge base ingestion and verification
- `preflight`: Configuration and service diagnostics

Handlers are thin: the turn itself always goes through
[`ChatService`](crate::agent::ChatService).
*/

pub mod knowledge;
pub mod preflight;
pub mod sessions;
pub mod special_commands;

pub mod chat {
    use crate::agent::{ChatService, TurnOutcome};
    use crate::commands::special_commands::{parse_special_command, print_help, SpecialCommand};
    use crate::commands::sessions::session_table;
    use crate::config::Config;
    use crate::error::Result;
    use crate::prompts::{compose_query, GREETING};

    use colored::Colorize;
    use rustyline::error::ReadlineError;
    use rustyline::DefaultEditor;
    use std::sync::Arc;

    fn print_outcome(outcome: &TurnOutcome) {
        if outcome.degraded {
            println!("\n{}\n", outcome.answer.red());
        } else {
            println!("\n{}\n", outcome.answer);
        }
        if !outcome.persisted {
            println!(
                "{}",
                "! This exchange could not be saved to the session history".yellow()
            );
        }
    }

    fn print_session_banner(chat: &ChatService, user_id: &str, session_id: &str) {
        let history = chat.history();
        let title = history
            .session(user_id, session_id)
            .map(|s| s.title)
            .unwrap_or_else(|| "New session".to_string());
        println!("Session: {} ({})", title.bold(), session_id.cyan());

        let window = history.load(user_id, session_id, history.window());
        let visible = crate::web::page::visible_messages(&window);
        if visible.is_empty() {
            println!("\n{}\n", GREETING);
            return;
        }
        for message in visible {
            let label = if message.role == "user" {
                "you".green().bold()
            } else {
                "aura".cyan().bold()
            };
            println!("{}: {}", label, message.text());
        }
        println!();
    }

    /// Start the interactive chat
    ///
    /// # Arguments
    ///
    /// * `config` - Global configuration (consumed)
    /// * `session` - Session to continue; a new one is created when `None`
    /// * `user` - Owning user; defaults to `web.user_id`
    pub async fn run_chat(
        config: Config,
        session: Option<String>,
        user: Option<String>,
    ) -> Result<()> {
        let config = Arc::new(config);
        let user_id = user.unwrap_or_else(|| config.web.user_id.clone());
        let chat = ChatService::from_config(Arc::clone(&config))?;

        let mut session_id = match session {
            Some(id) => id,
            None => chat.history().new_session(&user_id, None),
        };

        let mut rl = DefaultEditor::new()?;

        println!("\n{}", "Aura - IoT Troubleshooting Assistant".bold());
        println!("Type {} for commands.\n", "/help".cyan());
        print_session_banner(&chat, &user_id, &session_id);

        loop {
            let prompt = format!("{} ", "you>".green().bold());
            match rl.readline(&prompt) {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    rl.add_history_entry(trimmed)?;

                    match parse_special_command(trimmed) {
                        Ok(SpecialCommand::None) => {}
                        Ok(SpecialCommand::Exit) => break,
                        Ok(SpecialCommand::Help) => {
                            print_help();
                            continue;
                        }
                        Ok(SpecialCommand::New) => {
                            session_id = chat.history().new_session(&user_id, None);
                            print_session_banner(&chat, &user_id, &session_id);
                            continue;
                        }
                        Ok(SpecialCommand::Resume(id)) => {
                            session_id = id;
                            print_session_banner(&chat, &user_id, &session_id);
                            continue;
                        }
                        Ok(SpecialCommand::Sessions) => {
                            let sessions = chat
                                .history()
                                .list_sessions(&user_id, config.web.recent_sessions);
                            if sessions.is_empty() {
                                println!("{}", "No sessions found.".yellow());
                            } else {
                                session_table(&sessions).printstd();
                            }
                            continue;
                        }
                        Err(e) => {
                            println!("{}", e.to_string().yellow());
                            continue;
                        }
                    }

                    let outcome = chat.send(&user_id, &session_id, trimmed).await;
                    print_outcome(&outcome);
                }
                Err(ReadlineError::Interrupted) => {
                    println!("CTRL-C");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    println!("CTRL-D");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {:?}", err);
                    break;
                }
            }
        }

        println!("Session saved as {}", session_id.cyan());
        Ok(())
    }

    /// Answer a single question and exit
    ///
    /// The device id and error code, when given, are appended to the
    /// question as context.
    pub async fn run_ask(
        config: Config,
        query: String,
        device_id: Option<String>,
        error_code: Option<String>,
        session: Option<String>,
        user: Option<String>,
    ) -> Result<()> {
        let config = Arc::new(config);
        let user_id = user.unwrap_or_else(|| config.web.user_id.clone());
        let chat = ChatService::from_config(Arc::clone(&config))?;

        let text = compose_query(&query, device_id.as_deref(), error_code.as_deref());
        let session_id = match session {
            Some(id) => id,
            None => chat.history().new_session(&user_id, None),
        };
        tracing::debug!(session_id = %session_id, "Running one-shot query");

        let outcome = chat.send(&user_id, &session_id, &text).await;
        print_outcome(&outcome);
        println!("Session: {}", session_id.cyan());
        Ok(())
    }
}

pub mod serve {
    use crate::agent::ChatService;
    use crate::config::Config;
    use crate::error::Result;
    use crate::web::{self, AppState};

    use std::sync::Arc;

    /// Serve the web chat UI until the process is stopped
    pub async fn run_serve(config: Config, bind: Option<String>) -> Result<()> {
        let config = Arc::new(config);
        let bind = bind.unwrap_or_else(|| config.web.bind.clone());
        let state = AppState {
            chat: Arc::new(ChatService::from_config(Arc::clone(&config))?),
            user_id: config.web.user_id.clone(),
            recent_sessions: config.web.recent_sessions,
        };
        web::serve(state, &bind).await
    }
}

pub mod setup {
    use crate::config::Config;
    use crate::error::Result;
    use crate::storage::SqliteStorage;

    use colored::Colorize;

    /// Create every table and index, then list the tables
    pub fn run_setup_db(config: &Config) -> Result<()> {
        let storage = SqliteStorage::open(&config.storage)?;
        storage.init()?;

        println!(
            "{}",
            format!("✓ Database ready at {}", storage.path().display()).green()
        );
        for table in storage.table_names()? {
            println!("  - {}", table);
        }
        Ok(())
    }

}
