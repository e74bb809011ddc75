//! `ingest` and `verify` command handlers

use crate::config::Config;
use crate::embeddings::{create_embedder, Embedder};
use crate::error::{AuraError, Result};
use crate::knowledge::{Chunker, IngestReport, Ingestor, VerificationReport};
use crate::storage::SqliteStorage;

use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;

/// Summary printed after an ingestion run
pub fn render_ingest_report(report: &IngestReport) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{}\n",
        format!(
            "✓ Ingested {} documents: {} chunks, {} images, {} chunk-image links",
            report.documents, report.chunks, report.images, report.links
        )
        .green()
    ));

    if report.images_skipped > 0 {
        out.push_str(&format!(
            "{}\n",
            format!(
                "! Skipped {} image references that were missing or unreadable",
                report.images_skipped
            )
            .yellow()
        ));
    }

    for (document, reason) in &report.failed {
        out.push_str(&format!(
            "{}\n",
            format!("✗ {} was not ingested: {}", document, reason).red()
        ));
    }

    out
}

/// Ingest the knowledge base directory into the index
///
/// # Errors
///
/// Fails when the directory is missing, the embedding service cannot be
/// configured, or any document could not be committed
pub async fn run_ingest(config: &Config, path: Option<PathBuf>) -> Result<()> {
    let base = path.unwrap_or_else(|| config.knowledge.base_path.clone());
    tracing::info!("Ingesting knowledge base from {}", base.display());

    let storage = SqliteStorage::open(&config.storage)?;
    let embedder: Arc<dyn Embedder> =
        Arc::from(create_embedder(&config.embeddings, &config.provider)?);
    tracing::debug!("Using embedding model {}", embedder.model_name());

    let chunker = Chunker::new(config.knowledge.chunk_size, config.knowledge.chunk_overlap);
    let mut ingestor = Ingestor::new(storage, embedder, chunker, config.embeddings.batch_size)?;
    let report = ingestor.ingest_dir(&base).await?;

    print!("{}", render_ingest_report(&report));

    if report.is_complete() {
        Ok(())
    } else {
        Err(AuraError::Knowledge(format!(
            "{} of {} documents failed to ingest",
            report.failed.len(),
            report.failed.len() + report.documents
        ))
        .into())
    }
}

/// Print the verification report for the knowledge index
pub fn run_verify(config: &Config) -> Result<()> {
    let storage = SqliteStorage::open(&config.storage)?;
    let report = VerificationReport::collect(&storage)?;
    print!("{}", report.render());

    if report.total_chunks() == 0 {
        return Err(AuraError::Knowledge(
            "Knowledge index is empty; run `aura ingest` first".to_string(),
        )
        .into());
    }
    Ok(())
}
