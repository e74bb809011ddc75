//! Aura - IoT troubleshooting assistant library
//!
//! This library provides the core functionality for Aura, a tool-calling
//! chat agent that diagnoses device problems and remembers every
//! conversation per user and session.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `agent`: Reasoning loop and the chat service that runs one turn end to end
//! - `history`: Conversation windowing over the session store
//! - `storage`: SQLite session store and knowledge index
//! - `providers`: Chat model abstraction (Azure OpenAI, Ollama)
//! - `embeddings`: Text embedding services and the local image embedder
//! - `knowledge`: Chunking, ingestion, verification and retrieval of guides
//! - `tools`: Guide search, device connectivity and error log tools
//! - `web`: HTML chat page and JSON API
//! - `config`: Configuration management and validation
//! - `logging`: Tracing subscriber setup
//! - `error`: Error types and result aliases
//! - `cli` / `commands`: Command-line interface and handlers
//!
//! # Example
//!
//! ```no_run
//! use aura::agent::ChatService;
//! use aura::Config;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config/config.yaml", &Default::default())?;
//!     config.validate()?;
//!
//!     let chat = ChatService::from_config(Arc::new(config))?;
//!     let session = chat.history().new_session("alice", None);
//!     let outcome = chat.send("alice", &session, "My device AURA-1 shows E-401").await;
//!     println!("{}", outcome.answer);
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod cli;
pub mod commands;
pub mod config;
pub mod embeddings;
pub mod error;
pub mod history;
pub mod knowledge;
pub mod logging;
pub mod prompts;
pub mod providers;
pub mod storage;
pub mod tools;
pub mod web;

// Re-export commonly used types
pub use agent::{Agent, ChatService};
pub use config::Config;
pub use error::{AuraError, Result};
pub use history::HistoryManager;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
