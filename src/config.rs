//! Configuration management for Aura
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.
//!
//! Precedence, lowest to highest: built-in defaults, YAML file,
//! environment variables (including those loaded from `.env`), CLI flags.

use crate::error::{AuraError, Result};
use crate::tools::error_logs::MAX_LOG_ENTRIES;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Providers understood by the chat and embedding factories
pub const VALID_PROVIDERS: [&str; 2] = ["azure", "ollama"];

/// Main configuration structure for Aura
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Chat model provider configuration
    pub provider: ProviderConfig,
    /// Embedding service configuration
    #[serde(default)]
    pub embeddings: EmbeddingConfig,
    /// Reasoning loop behaviour
    #[serde(default)]
    pub agent: AgentConfig,
    /// Session store location
    #[serde(default)]
    pub storage: StorageConfig,
    /// Knowledge base ingestion settings
    #[serde(default)]
    pub knowledge: KnowledgeConfig,
    /// Web chat surface
    #[serde(default)]
    pub web: WebConfig,
}

/// Provider configuration
///
/// Specifies which hosted chat model to use and its settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Type of provider to use (`azure` or `ollama`)
    #[serde(rename = "type")]
    pub provider_type: String,

    /// Azure OpenAI configuration
    #[serde(default)]
    pub azure: AzureOpenAiConfig,

    /// Ollama configuration
    #[serde(default)]
    pub ollama: OllamaConfig,
}

/// Azure OpenAI configuration, shared by the chat provider and the embedder
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AzureOpenAiConfig {
    /// Resource endpoint, e.g. `https://my-resource.openai.azure.com`
    #[serde(default)]
    pub endpoint: String,

    /// API key; usually supplied through `AZURE_OPENAI_API_KEY`
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// REST API version query parameter
    #[serde(default = "default_azure_api_version")]
    pub api_version: String,

    /// Chat completion deployment name
    #[serde(default)]
    pub chat_deployment: String,

    /// Embedding deployment name
    #[serde(default)]
    pub embedding_deployment: String,

    /// Sampling temperature for chat completions
    #[serde(default)]
    pub temperature: f32,

    /// HTTP request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

fn default_azure_api_version() -> String {
    "2024-02-15-preview".to_string()
}

fn default_request_timeout() -> u64 {
    120
}

impl Default for AzureOpenAiConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key: None,
            api_version: default_azure_api_version(),
            chat_deployment: String::new(),
            embedding_deployment: String::new(),
            temperature: 0.0,
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

/// Ollama provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Ollama server host
    #[serde(default = "default_ollama_host")]
    pub host: String,

    /// Chat model to use
    #[serde(default = "default_ollama_model")]
    pub model: String,

    /// Embedding model to use
    #[serde(default = "default_ollama_embedding_model")]
    pub embedding_model: String,
}

fn default_ollama_host() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "llama3.2:latest".to_string()
}

fn default_ollama_embedding_model() -> String {
    "nomic-embed-text".to_string()
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: default_ollama_host(),
            model: default_ollama_model(),
            embedding_model: default_ollama_embedding_model(),
        }
    }
}

/// Embedding service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Embedding provider; defaults to the chat provider type when unset
    #[serde(rename = "type", default)]
    pub provider_type: Option<String>,

    /// Number of texts sent per embedding request during ingestion
    #[serde(default = "default_embedding_batch_size")]
    pub batch_size: usize,
}

fn default_embedding_batch_size() -> usize {
    16
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider_type: None,
            batch_size: default_embedding_batch_size(),
        }
    }
}

impl EmbeddingConfig {
    /// Effective embedding provider given the chat provider type
    pub fn effective_provider<'a>(&'a self, provider: &'a ProviderConfig) -> &'a str {
        self.provider_type
            .as_deref()
            .unwrap_or(provider.provider_type.as_str())
    }
}

/// Reasoning loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Maximum number of model calls in one turn
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Wall-clock budget for one conversation turn (seconds)
    #[serde(default = "default_turn_timeout")]
    pub turn_timeout_seconds: u64,

    /// Number of persisted messages loaded as conversation context
    #[serde(default = "default_history_window")]
    pub history_window: usize,

    /// Tool execution settings
    #[serde(default)]
    pub tools: ToolsConfig,
}

fn default_max_iterations() -> usize {
    10
}

fn default_turn_timeout() -> u64 {
    120
}

fn default_history_window() -> usize {
    20
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            turn_timeout_seconds: default_turn_timeout(),
            history_window: default_history_window(),
            tools: ToolsConfig::default(),
        }
    }
}

/// Tool execution configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Maximum tool output size in bytes before truncation
    #[serde(default = "default_max_output")]
    pub max_output_size: usize,

    /// Number of guide chunks returned by the knowledge search
    #[serde(default = "default_search_top_k")]
    pub search_top_k: usize,

    /// Upper bound on simulated error log entries
    #[serde(default = "default_max_log_entries")]
    pub max_log_entries: usize,
}

fn default_max_output() -> usize {
    65_536
}

fn default_search_top_k() -> usize {
    3
}

fn default_max_log_entries() -> usize {
    15
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            max_output_size: default_max_output(),
            search_top_k: default_search_top_k(),
            max_log_entries: default_max_log_entries(),
        }
    }
}

/// Session store configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// SQLite database path; the platform data directory is used when unset
    #[serde(default)]
    pub db_path: Option<PathBuf>,
}

impl StorageConfig {
    /// Resolve the database path, falling back to `<data dir>/aura.db`
    ///
    /// # Errors
    ///
    /// Returns `AuraError::Storage` if no data directory can be determined
    pub fn resolve_db_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.db_path {
            return Ok(path.clone());
        }

        let proj_dirs = ProjectDirs::from("com", "aura", "aura")
            .ok_or_else(|| AuraError::Storage("Could not determine data directory".into()))?;
        Ok(proj_dirs.data_dir().join("aura.db"))
    }
}

/// Knowledge base ingestion configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    /// Directory holding markdown guides and their images
    #[serde(default = "default_knowledge_base")]
    pub base_path: PathBuf,

    /// Target chunk size in characters
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Characters shared between consecutive chunks
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

fn default_knowledge_base() -> PathBuf {
    PathBuf::from("knowledge_base")
}

fn default_chunk_size() -> usize {
    1000
}

fn default_chunk_overlap() -> usize {
    200
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            base_path: default_knowledge_base(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

/// Web chat configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    /// Socket address the web UI binds to
    #[serde(default = "default_bind")]
    pub bind: String,

    /// User id that owns sessions created through the UI
    #[serde(default = "default_user_id")]
    pub user_id: String,

    /// Number of sessions listed in the sidebar
    #[serde(default = "default_recent_sessions")]
    pub recent_sessions: usize,
}

fn default_bind() -> String {
    "127.0.0.1:8501".to_string()
}

fn default_user_id() -> String {
    "default_user".to_string()
}

fn default_recent_sessions() -> usize {
    10
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            user_id: default_user_id(),
            recent_sessions: default_recent_sessions(),
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// A missing file is not an error: defaults are used and a warning is
    /// logged, so maintenance commands work on a fresh checkout.
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default_config()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn default_config() -> Self {
        Self {
            provider: ProviderConfig {
                provider_type: "azure".to_string(),
                azure: AzureOpenAiConfig::default(),
                ollama: OllamaConfig::default(),
            },
            embeddings: EmbeddingConfig::default(),
            agent: AgentConfig::default(),
            storage: StorageConfig::default(),
            knowledge: KnowledgeConfig::default(),
            web: WebConfig::default(),
        }
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| AuraError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| AuraError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(provider_type) = std::env::var("AURA_PROVIDER") {
            self.provider.provider_type = provider_type;
        }

        // Azure OpenAI uses the SDK's conventional variable names
        if let Ok(endpoint) = std::env::var("AZURE_OPENAI_ENDPOINT") {
            self.provider.azure.endpoint = endpoint;
        }
        if let Ok(api_key) = std::env::var("AZURE_OPENAI_API_KEY") {
            self.provider.azure.api_key = Some(api_key);
        }
        if let Ok(api_version) = std::env::var("OPENAI_API_VERSION") {
            self.provider.azure.api_version = api_version;
        }
        if let Ok(deployment) = std::env::var("AZURE_OPENAI_CHAT_DEPLOYMENT_NAME") {
            self.provider.azure.chat_deployment = deployment;
        }
        if let Ok(deployment) = std::env::var("AZURE_OPENAI_EMBEDDING_DEPLOYMENT_NAME") {
            self.provider.azure.embedding_deployment = deployment;
        }

        if let Ok(host) = std::env::var("AURA_OLLAMA_HOST") {
            self.provider.ollama.host = host;
        }
        if let Ok(model) = std::env::var("AURA_OLLAMA_MODEL") {
            self.provider.ollama.model = model;
        }
        if let Ok(model) = std::env::var("AURA_OLLAMA_EMBEDDING_MODEL") {
            self.provider.ollama.embedding_model = model;
        }

        if let Ok(db_path) = std::env::var("AURA_DB_PATH") {
            self.storage.db_path = Some(PathBuf::from(db_path));
        }
        if let Ok(base) = std::env::var("AURA_KNOWLEDGE_BASE") {
            self.knowledge.base_path = PathBuf::from(base);
        }

        if let Ok(max_iterations) = std::env::var("AURA_MAX_ITERATIONS") {
            if let Ok(value) = max_iterations.parse() {
                self.agent.max_iterations = value;
            } else {
                tracing::warn!("Invalid AURA_MAX_ITERATIONS: {}", max_iterations);
            }
        }

        if let Ok(timeout) = std::env::var("AURA_TURN_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.agent.turn_timeout_seconds = value;
            } else {
                tracing::warn!("Invalid AURA_TURN_TIMEOUT_SECONDS: {}", timeout);
            }
        }

        if let Ok(window) = std::env::var("AURA_HISTORY_WINDOW") {
            if let Ok(value) = window.parse() {
                self.agent.history_window = value;
            } else {
                tracing::warn!("Invalid AURA_HISTORY_WINDOW: {}", window);
            }
        }

        if let Ok(bind) = std::env::var("AURA_WEB_BIND") {
            self.web.bind = bind;
        }
        if let Ok(user_id) = std::env::var("AURA_USER_ID") {
            self.web.user_id = user_id;
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(provider) = &cli.provider {
            tracing::debug!("Using provider override: {}", provider);
            self.provider.provider_type = provider.clone();
        }

        if let Some(db) = &cli.db {
            tracing::debug!("Using database override: {}", db.display());
            self.storage.db_path = Some(db.clone());
        }
    }

    /// Validate the configuration
    ///
    /// Checks value ranges and provider names. Credentials are not checked
    /// here; providers report them on construction and `preflight` reports
    /// them explicitly.
    ///
    /// # Errors
    ///
    /// Returns `AuraError::Config` describing the first failing check
    pub fn validate(&self) -> Result<()> {
        if !VALID_PROVIDERS.contains(&self.provider.provider_type.as_str()) {
            return Err(AuraError::Config(format!(
                "Invalid provider type: {}. Must be one of: {}",
                self.provider.provider_type,
                VALID_PROVIDERS.join(", ")
            ))
            .into());
        }

        let embedding_provider = self.embeddings.effective_provider(&self.provider);
        if !VALID_PROVIDERS.contains(&embedding_provider) {
            return Err(AuraError::Config(format!(
                "Invalid embeddings type: {}. Must be one of: {}",
                embedding_provider,
                VALID_PROVIDERS.join(", ")
            ))
            .into());
        }

        if self.embeddings.batch_size == 0 {
            return Err(AuraError::Config(
                "embeddings.batch_size must be greater than 0".to_string(),
            )
            .into());
        }

        if self.agent.max_iterations == 0 || self.agent.max_iterations > 1000 {
            return Err(AuraError::Config(
                "agent.max_iterations must be between 1 and 1000".to_string(),
            )
            .into());
        }

        if self.agent.turn_timeout_seconds == 0 {
            return Err(AuraError::Config(
                "agent.turn_timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.agent.history_window == 0 {
            return Err(AuraError::Config(
                "agent.history_window must be greater than 0".to_string(),
            )
            .into());
        }

        if self.agent.tools.max_output_size == 0 {
            return Err(AuraError::Config(
                "tools.max_output_size must be greater than 0".to_string(),
            )
            .into());
        }

        if self.agent.tools.search_top_k == 0 {
            return Err(
                AuraError::Config("tools.search_top_k must be greater than 0".to_string()).into(),
            );
        }

        if self.agent.tools.max_log_entries == 0
            || self.agent.tools.max_log_entries > MAX_LOG_ENTRIES
        {
            return Err(AuraError::Config(format!(
                "tools.max_log_entries must be between 1 and {}",
                MAX_LOG_ENTRIES
            ))
            .into());
        }

        if self.knowledge.chunk_size == 0 {
            return Err(AuraError::Config(
                "knowledge.chunk_size must be greater than 0".to_string(),
            )
            .into());
        }

        if self.knowledge.chunk_overlap >= self.knowledge.chunk_size {
            return Err(AuraError::Config(
                "knowledge.chunk_overlap must be smaller than knowledge.chunk_size".to_string(),
            )
            .into());
        }

        if self.web.bind.trim().is_empty() {
            return Err(AuraError::Config("web.bind cannot be empty".to_string()).into());
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}
