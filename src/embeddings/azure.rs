//! Azure OpenAI embeddings client

use crate::config::AzureOpenAiConfig;
use crate::embeddings::Embedder;
use crate::error::{AuraError, Result};
use crate::providers::azure::require_credentials;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Embedder backed by an Azure OpenAI embedding deployment
pub struct AzureOpenAiEmbedder {
    client: Client,
    config: AzureOpenAiConfig,
    api_key: String,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    #[serde(default)]
    index: usize,
}

impl AzureOpenAiEmbedder {
    /// Create a new embedder for the configured embedding deployment
    ///
    /// # Errors
    ///
    /// Returns `AuraError::MissingCredentials` when the endpoint, API key or
    /// embedding deployment is missing
    pub fn new(config: AzureOpenAiConfig) -> Result<Self> {
        let api_key = require_credentials(
            &config,
            &config.embedding_deployment,
            "embedding deployment (AZURE_OPENAI_EMBEDDING_DEPLOYMENT_NAME)",
        )?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|e| AuraError::Embedding(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config,
            api_key,
        })
    }

    fn embeddings_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/embeddings?api-version={}",
            self.config.endpoint.trim_end_matches('/'),
            self.config.embedding_deployment,
            self.config.api_version
        )
    }
}

#[async_trait]
impl Embedder for AzureOpenAiEmbedder {
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        tracing::debug!("Requesting {} Azure OpenAI embeddings", texts.len());

        let response = self
            .client
            .post(self.embeddings_url())
            .header("api-key", &self.api_key)
            .json(&EmbeddingRequest { input: texts })
            .send()
            .await
            .map_err(|e| AuraError::Embedding(format!("Azure OpenAI embedding request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AuraError::Embedding(format!(
                "Azure OpenAI embeddings returned error {}: {}",
                status, error_text
            ))
            .into());
        }

        let mut body: EmbeddingResponse = response.json().await.map_err(|e| {
            AuraError::Embedding(format!("Failed to parse Azure OpenAI embeddings: {}", e))
        })?;

        if body.data.len() != texts.len() {
            return Err(AuraError::Embedding(format!(
                "Azure OpenAI returned {} embeddings for {} inputs",
                body.data.len(),
                texts.len()
            ))
            .into());
        }

        body.data.sort_by_key(|d| d.index);
        Ok(body.data.into_iter().map(|d| d.embedding).collect())
    }

    fn model_name(&self) -> String {
        self.config.embedding_deployment.clone()
    }
}
