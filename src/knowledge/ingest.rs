//! Knowledge base ingestion
//!
//! Every markdown guide under the knowledge base directory is chunked,
//! embedded and written to the knowledge tables. Images referenced with
//! `![alt](path)` are embedded once each and linked to the chunks that
//! mention them.
//!
//! Each document is committed on its own: all of its embeddings are
//! computed before anything is written, so a failing document leaves the
//! index exactly as it was and the remaining documents still go in.

use crate::embeddings::{Embedder, ImageEmbedder};
use crate::error::{AuraError, Result};
use crate::knowledge::Chunker;
use crate::storage::{DocumentWrite, NewChunk, NewImage, SqliteStorage};

use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

/// Outcome of an ingestion run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestReport {
    /// Documents committed
    pub documents: usize,
    /// Chunks written
    pub chunks: usize,
    /// Distinct images written
    pub images: usize,
    /// Chunk-image links written
    pub links: usize,
    /// Image references that were missing or undecodable
    pub images_skipped: usize,
    /// Documents that were not committed, with the reason
    pub failed: Vec<(String, String)>,
}

impl IngestReport {
    /// Whether every discovered document was committed
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Markdown files under `base`, sorted by path
///
/// # Errors
///
/// Returns `AuraError::Knowledge` if `base` is not a directory
pub fn discover_documents(base: &Path) -> Result<Vec<PathBuf>> {
    if !base.is_dir() {
        return Err(AuraError::Knowledge(format!(
            "Knowledge base directory not found: {}",
            base.display()
        ))
        .into());
    }

    let mut paths: Vec<PathBuf> = WalkDir::new(base)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("Skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("md"))
        })
        .collect();
    paths.sort();
    Ok(paths)
}

fn relative_name(base: &Path, path: &Path) -> String {
    path.strip_prefix(base)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Ingestion job over one store and embedding service
pub struct Ingestor {
    storage: SqliteStorage,
    embedder: Arc<dyn Embedder>,
    images: ImageEmbedder,
    chunker: Chunker,
    batch_size: usize,
    image_ref: Regex,
}

impl Ingestor {
    /// Create an ingestion job
    pub fn new(
        storage: SqliteStorage,
        embedder: Arc<dyn Embedder>,
        chunker: Chunker,
        batch_size: usize,
    ) -> Result<Self> {
        Ok(Self {
            storage,
            embedder,
            images: ImageEmbedder::new(),
            chunker,
            batch_size: batch_size.max(1),
            image_ref: Regex::new(r"!\[[^\]]*\]\(([^)\s]+)")?,
        })
    }

    /// Image paths referenced from markdown `text`, in order of appearance
    pub fn image_references(&self, text: &str) -> Vec<String> {
        let mut refs: Vec<String> = Vec::new();
        for (_, target) in self.image_occurrences(text) {
            if !refs.contains(&target) {
                refs.push(target);
            }
        }
        refs
    }

    /// Every local image reference with the byte range of its markdown
    fn image_occurrences(&self, text: &str) -> Vec<(Range<usize>, String)> {
        self.image_ref
            .captures_iter(text)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let target = caps.get(1)?.as_str();
                (!target.contains("://")).then(|| (whole.range(), target.to_string()))
            })
            .collect()
    }

    /// Ingest every markdown document under `base`
    ///
    /// # Errors
    ///
    /// Only fails if `base` cannot be listed; per-document failures are
    /// recorded in the report.
    pub async fn ingest_dir(&mut self, base: &Path) -> Result<IngestReport> {
        let documents = discover_documents(base)?;
        tracing::info!(
            base = %base.display(),
            documents = documents.len(),
            "Starting knowledge base ingestion"
        );

        let mut report = IngestReport::default();
        for path in documents {
            let name = relative_name(base, &path);
            match self.ingest_document(base, &path, &mut report).await {
                Ok(written) => {
                    tracing::info!(
                        document = %name,
                        chunks = written.chunks,
                        images = written.images,
                        links = written.links,
                        "Ingested document"
                    );
                    report.documents += 1;
                    report.chunks += written.chunks;
                    report.images += written.images;
                    report.links += written.links;
                }
                Err(e) => {
                    tracing::error!(document = %name, "Failed to ingest document: {:#}", e);
                    report.failed.push((name, format!("{:#}", e)));
                }
            }
        }

        tracing::info!(
            documents = report.documents,
            failed = report.failed.len(),
            chunks = report.chunks,
            "Ingestion finished"
        );
        Ok(report)
    }

    /// Ingest one document, replacing any earlier version of it
    pub async fn ingest_document(
        &mut self,
        base: &Path,
        path: &Path,
        report: &mut IngestReport,
    ) -> Result<DocumentWrite> {
        let source = relative_name(base, path);
        let document_id = source
            .strip_suffix(".md")
            .or_else(|| source.strip_suffix(".MD"))
            .unwrap_or(&source)
            .to_string();

        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            AuraError::Knowledge(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let spans = self.chunker.split_spans(&content);
        if spans.is_empty() {
            tracing::warn!(document = %source, "Document has no text");
            return self.storage.replace_document(&document_id, &source, &[], &[]);
        }

        let texts: Vec<String> = spans.iter().map(|span| span.text.clone()).collect();
        let mut embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            let vectors = self.embedder.embed_documents(batch).await?;
            if vectors.len() != batch.len() {
                return Err(AuraError::Embedding(format!(
                    "Expected {} embeddings, got {}",
                    batch.len(),
                    vectors.len()
                ))
                .into());
            }
            embeddings.extend(vectors);
        }

        // References are resolved against the whole document so one that
        // straddles a chunk boundary is still linked
        let doc_dir = path.parent().unwrap_or(base);
        let canonical_base = base.canonicalize().unwrap_or_else(|_| base.to_path_buf());
        let mut images: BTreeMap<String, NewImage> = BTreeMap::new();
        let mut resolved_refs: HashMap<String, Option<String>> = HashMap::new();
        let mut placed: Vec<(Range<usize>, String)> = Vec::new();

        for (range, reference) in self.image_occurrences(&content) {
            let key = match resolved_refs.get(&reference) {
                Some(key) => key.clone(),
                None => {
                    let file = doc_dir.join(&reference);
                    let key = match self.images.embed_path(&file) {
                        Ok(vector) => {
                            let resolved = file.canonicalize().unwrap_or_else(|_| file.clone());
                            let key = relative_name(&canonical_base, &resolved);
                            images.entry(key.clone()).or_insert_with(|| NewImage {
                                path: key.clone(),
                                embedding: vector,
                            });
                            Some(key)
                        }
                        Err(e) => {
                            tracing::warn!(document = %source, image = %reference, "Skipping image: {:#}", e);
                            report.images_skipped += 1;
                            None
                        }
                    };
                    resolved_refs.insert(reference, key.clone());
                    key
                }
            };
            if let Some(key) = key {
                placed.push((range, key));
            }
        }

        let mut chunks = Vec::with_capacity(spans.len());
        for (index, (span, embedding)) in spans.into_iter().zip(embeddings).enumerate() {
            let mut image_paths: Vec<String> = Vec::new();
            for (range, key) in &placed {
                if span.overlaps(range.start, range.end) && !image_paths.contains(key) {
                    image_paths.push(key.clone());
                }
            }
            chunks.push(NewChunk {
                chunk_index: index,
                text: span.text,
                embedding,
                image_paths,
            });
        }

        let images: Vec<NewImage> = images.into_values().collect();
        self.storage
            .replace_document(&document_id, &source, &chunks, &images)
    }
}
