//! Aura - IoT troubleshooting assistant
//!
//! Main entry point for the Aura CLI.

use anyhow::Result;

use aura::cli::{Cli, Commands};
use aura::commands;
use aura::config::Config;
use aura::logging::init_logging;

#[tokio::main]
async fn main() -> Result<()> {
    // Credentials usually live in .env next to the config
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Warning: failed to load .env: {}", e);
        }
    }

    let cli = Cli::parse_args();
    init_logging(cli.verbose, cli.log_format)?;

    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Preflight reports an invalid config as a failed check instead
    if !matches!(cli.command, Commands::Preflight) {
        config.validate()?;
    }

    match cli.command {
        Commands::Chat { session, user } => {
            tracing::info!("Starting interactive chat");
            commands::chat::run_chat(config, session, user).await
        }
        Commands::Ask {
            query,
            device_id,
            error_code,
            session,
            user,
        } => commands::chat::run_ask(config, query, device_id, error_code, session, user).await,
        Commands::Serve { bind } => {
            tracing::info!("Starting web UI");
            commands::serve::run_serve(config, bind).await
        }
        Commands::Sessions { command } => commands::sessions::handle_sessions(&config, command),
        Commands::Ingest { path } => commands::knowledge::run_ingest(&config, path).await,
        Commands::Verify => commands::knowledge::run_verify(&config),
        Commands::Preflight => commands::preflight::run_preflight(&config).await,
        Commands::SetupDb => commands::setup::run_setup_db(&config),
    }
}
