//! Nearest-neighbour retrieval over the knowledge index

use crate::config::Config;
use crate::embeddings::{create_embedder, Embedder};
use crate::error::{AuraError, Result};
use crate::storage::{ChunkHit, SqliteStorage};

use async_trait::async_trait;
use std::sync::Arc;

/// Search interface over the embedded knowledge base
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Retriever: Send + Sync {
    /// The `k` chunks closest to `query`, best first
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<ChunkHit>>;
}

/// Retriever backed by the SQLite knowledge tables and a text embedder
pub struct KnowledgeRetriever {
    storage: SqliteStorage,
    embedder: Arc<dyn Embedder>,
}

impl KnowledgeRetriever {
    /// Create a retriever from explicit collaborators
    pub fn new(storage: SqliteStorage, embedder: Arc<dyn Embedder>) -> Self {
        Self { storage, embedder }
    }

    /// Open the store and embedding service named by `config`
    ///
    /// An empty index is not an error: searches simply find nothing until
    /// `aura ingest` has run.
    ///
    /// # Errors
    ///
    /// Fails when the store cannot be opened or the embedding service is not
    /// configured.
    pub fn open(config: &Config) -> Result<Self> {
        let storage = SqliteStorage::open(&config.storage)?;
        if storage.count_rows("knowledge_chunks")? == 0 {
            tracing::warn!(
                db = %storage.path().display(),
                "Knowledge index is empty; run `aura ingest` to populate it"
            );
        }
        let embedder: Arc<dyn Embedder> =
            Arc::from(create_embedder(&config.embeddings, &config.provider)?);
        tracing::info!(
            db = %storage.path().display(),
            model = %embedder.model_name(),
            "Opened knowledge index"
        );
        Ok(Self::new(storage, embedder))
    }
}

#[async_trait]
impl Retriever for KnowledgeRetriever {
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<ChunkHit>> {
        let storage = self.storage.clone();
        let indexed = tokio::task::spawn_blocking(move || storage.count_rows("knowledge_chunks"))
            .await
            .map_err(|e| AuraError::Knowledge(format!("Search task failed: {}", e)))??;
        if indexed == 0 {
            tracing::debug!(query, "Knowledge index is empty");
            return Ok(Vec::new());
        }

        let vector = self.embedder.embed_query(query).await?;
        let storage = self.storage.clone();
        let hits = tokio::task::spawn_blocking(move || storage.search_chunks(&vector, k))
            .await
            .map_err(|e| AuraError::Knowledge(format!("Search task failed: {}", e)))??;
        tracing::debug!(query, hits = hits.len(), "Knowledge search finished");
        Ok(hits)
    }
}
