//! Error types for Aura
//!
//! This module defines the error taxonomy shared by the agent loop, the
//! history manager, the knowledge index and the command handlers, using
//! `thiserror` for the enum and `anyhow` for propagation.

use thiserror::Error;

/// Main error type for Aura operations
///
/// Infrastructure failures (store, embedding service, hosted model) are
/// mapped into these variants at the collaborator boundary so callers can
/// decide whether to degrade gracefully or surface them.
#[derive(Error, Debug)]
pub enum AuraError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Chat model provider errors (API calls, bad responses)
    #[error("Provider error: {0}")]
    Provider(String),

    /// Embedding service errors
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Tool execution errors
    #[error("Tool execution error: {0}")]
    Tool(String),

    /// Knowledge base ingestion or retrieval errors
    #[error("Knowledge base error: {0}")]
    Knowledge(String),

    /// Session and message storage errors (database operations)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Reasoning loop exceeded its step budget
    #[error("Agent exceeded maximum iterations: limit={limit}, {message}")]
    MaxIterationsExceeded {
        /// The configured iteration limit
        limit: usize,
        /// Additional context about the failure
        message: String,
    },

    /// A conversation turn ran past its wall-clock budget
    #[error("Turn timed out after {seconds} seconds")]
    TurnTimeout {
        /// The configured budget in seconds
        seconds: u64,
    },

    /// Missing credentials for a hosted service
    #[error("Missing credentials for provider: {0}")]
    MissingCredentials(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// SQLite errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Result type alias for Aura operations
///
/// Uses `anyhow::Error` so call sites can attach context while the
/// underlying `AuraError` stays downcastable.
pub type Result<T> = anyhow::Result<T>;
