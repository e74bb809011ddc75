//! Ollama embeddings client (`/api/embed`)

use crate::config::OllamaConfig;
use crate::embeddings::Embedder;
use crate::error::{AuraError, Result};

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// Embedder backed by a local Ollama embedding model
pub struct OllamaEmbedder {
    client: Client,
    config: OllamaConfig,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

impl OllamaEmbedder {
    /// Create a new Ollama embedder
    pub fn new(config: OllamaConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| AuraError::Embedding(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/api/embed", self.config.host.trim_end_matches('/'));
        let body = serde_json::json!({
            "model": self.config.embedding_model,
            "input": texts,
            "truncate": true
        });

        let response = self.client.post(&url).json(&body).send().await.map_err(|e| {
            AuraError::Embedding(format!(
                "Failed to reach Ollama at {} (is it running?): {}",
                url, e
            ))
        })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AuraError::Embedding(format!("Ollama http error {}: {}", status, text)).into());
        }

        let out: EmbedResponse = response.json().await.map_err(|e| {
            AuraError::Embedding(format!("Ollama /api/embed returned invalid JSON: {}", e))
        })?;

        if out.embeddings.len() != texts.len() {
            return Err(AuraError::Embedding(format!(
                "Ollama /api/embed returned {} embeddings for {} inputs",
                out.embeddings.len(),
                texts.len()
            ))
            .into());
        }

        Ok(out.embeddings)
    }

    fn model_name(&self) -> String {
        self.config.embedding_model.clone()
    }
}
