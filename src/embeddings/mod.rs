//! Embedding services for Aura
//!
//! Text embeddings come from a hosted model (Azure OpenAI or Ollama) behind
//! the [`Embedder`] trait. Image embeddings are computed locally by
//! [`ImageEmbedder`]. This module also holds the vector helpers shared by
//! the knowledge index: normalisation, cosine similarity and the
//! little-endian `f32` blob encoding used in SQLite.

pub mod azure;
pub mod visual;
pub mod ollama;

pub use azure::AzureOpenAiEmbedder;
pub use visual::{ImageEmbedder, IMAGE_EMBEDDING_DIM};
pub use ollama::OllamaEmbedder;

use crate::config::{EmbeddingConfig, ProviderConfig};
use crate::error::{AuraError, Result};
use async_trait::async_trait;

/// Text embedding service
///
/// Implementations send one request per call; batching is the caller's
/// concern (see the ingestion job).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a batch of documents, one vector per input in input order
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single search query
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_documents(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| AuraError::Embedding("Embedding service returned no vectors".into()).into())
    }

    /// Model or deployment name, for diagnostics
    fn model_name(&self) -> String;
}

/// Create the embedding service selected by configuration
///
/// The embedding provider defaults to the chat provider type.
///
/// # Errors
///
/// Returns `AuraError::Embedding` for an unknown provider and
/// `AuraError::MissingCredentials` for an unconfigured Azure deployment
pub fn create_embedder(
    embeddings: &EmbeddingConfig,
    provider: &ProviderConfig,
) -> Result<Box<dyn Embedder>> {
    match embeddings.effective_provider(provider) {
        "azure" => Ok(Box::new(AzureOpenAiEmbedder::new(provider.azure.clone())?)),
        "ollama" => Ok(Box::new(OllamaEmbedder::new(provider.ollama.clone())?)),
        other => Err(AuraError::Embedding(format!("Unknown embedding provider: {}", other)).into()),
    }
}

/// Scale a vector to unit length; zero vectors are left untouched
pub fn normalize_in_place(v: &mut [f32]) {
    let norm2: f32 = v.iter().map(|x| x * x).sum();
    if norm2 <= 0.0 {
        return;
    }
    let inv = 1.0f32 / norm2.sqrt();
    for x in v.iter_mut() {
        *x *= inv;
    }
}

/// Cosine similarity of two vectors
///
/// Returns 0.0 for vectors of different lengths or with zero magnitude.
///
/// # Examples
///
/// ```
/// use aura::embeddings::cosine_similarity;
///
/// assert!((cosine_similarity(&[1.0, 0.0], &[2.0, 0.0]) - 1.0).abs() < 1e-6);
/// assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
/// assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
/// ```
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0f32;
    let mut na = 0.0f32;
    let mut nb = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        na += x * x;
        nb += y * y;
    }
    if na <= 0.0 || nb <= 0.0 {
        return 0.0;
    }
    dot / (na.sqrt() * nb.sqrt())
}

/// Encode a vector as a little-endian `f32` blob
pub fn vector_to_blob(v: &[f32]) -> Vec<u8> {
    v.iter().flat_map(|x| x.to_le_bytes()).collect()
}

/// Decode a little-endian `f32` blob
///
/// # Errors
///
/// Returns `AuraError::Knowledge` when the blob length is not a multiple of 4
pub fn blob_to_vector(blob: &[u8]) -> Result<Vec<f32>> {
    if blob.len() % 4 != 0 {
        return Err(AuraError::Knowledge(format!(
            "Embedding blob has invalid length {}",
            blob.len()
        ))
        .into());
    }
    Ok(blob
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}
