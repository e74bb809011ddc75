//! Knowledge index verification report

use crate::error::Result;
use crate::storage::{ChunkHit, ChunkRecord, DocumentStats, ImageStats, SqliteStorage};

use colored::Colorize;
use prettytable::{format, Table};

const PREVIEW_CHARS: usize = 100;

fn preview(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() > max_chars {
        format!("{}...", flat.chars().take(max_chars).collect::<String>())
    } else {
        flat
    }
}

fn new_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);
    table.set_titles(headers.iter().map(|h| h.bold()).collect());
    table
}

/// Snapshot of what the knowledge index holds
#[derive(Debug, Clone)]
pub struct VerificationReport {
    /// Chunk statistics per document
    pub documents: Vec<DocumentStats>,
    /// Stored images
    pub images: Vec<ImageStats>,
    /// Total chunk-image links
    pub links: usize,
    /// `(dimension, chunk count)` groups of text embeddings
    pub text_dimensions: Vec<(usize, usize)>,
    /// First stored chunk
    pub sample: Option<ChunkRecord>,
    /// Nearest neighbours of the sample chunk's own embedding
    pub self_search: Vec<ChunkHit>,
}

impl VerificationReport {
    /// Read the report from the store
    pub fn collect(storage: &SqliteStorage) -> Result<Self> {
        let sample = storage.sample_chunk()?;
        let self_search = match &sample {
            Some(chunk) => storage.search_chunks(&chunk.embedding, 3)?,
            None => Vec::new(),
        };

        Ok(Self {
            documents: storage.document_stats()?,
            images: storage.image_stats()?,
            links: storage.count_rows("chunk_image_links")?,
            text_dimensions: storage.embedding_dimensions()?,
            sample,
            self_search,
        })
    }

    /// Total chunks across documents
    pub fn total_chunks(&self) -> usize {
        self.documents.iter().map(|d| d.chunks).sum()
    }

    /// Whether the sample chunk finds itself first
    pub fn search_works(&self) -> bool {
        match (&self.sample, self.self_search.first()) {
            (Some(sample), Some(best)) => best.chunk_id == sample.id,
            _ => false,
        }
    }

    /// Render the report as text tables
    pub fn render(&self) -> String {
        let rule = "=".repeat(80);
        let mut out = format!("\n{}\n{}\n{}\n\n", rule, "KNOWLEDGE INDEX VERIFICATION".bold(), rule);

        out.push_str(&format!("{}\n", "Text chunks".bold()));
        if self.documents.is_empty() {
            out.push_str(&format!("{}\n\n", "✗ No text chunks found".red()));
        } else {
            let mut table = new_table(&["Document ID", "Chunks", "Avg Chunk Length"]);
            for doc in &self.documents {
                table.add_row(prettytable::row![
                    doc.document_id,
                    doc.chunks,
                    format!("{:.1}", doc.avg_chunk_len)
                ]);
            }
            out.push_str(&table.to_string());
            out.push_str(&format!(
                "{}\n\n",
                format!("✓ Total text chunks: {}", self.total_chunks()).green()
            ));
        }

        out.push_str(&format!("{}\n", "Image embeddings".bold()));
        if self.images.is_empty() {
            out.push_str(&format!("{}\n\n", "! No image embeddings found".yellow()));
        } else {
            let mut table = new_table(&["Image Path", "Dimension", "Linked Chunks"]);
            for image in &self.images {
                table.add_row(prettytable::row![image.path, image.dimension, image.links]);
            }
            out.push_str(&table.to_string());
            out.push_str(&format!(
                "{}\n\n",
                format!(
                    "✓ Total images: {}, chunk-image links: {}",
                    self.images.len(),
                    self.links
                )
                .green()
            ));
        }

        if let Some(sample) = &self.sample {
            out.push_str(&format!("{}\n", "Sample chunk".bold()));
            out.push_str(&format!(
                "Document: {}\nChunk Index: {}\nText Preview: {}\nText Embedding Dimension: {}\n\n",
                sample.document_id,
                sample.chunk_index,
                preview(&sample.text, 200),
                sample.embedding.len()
            ));
        }

        if !self.text_dimensions.is_empty() || !self.images.is_empty() {
            out.push_str(&format!("{}\n", "Embedding dimensions".bold()));
            let mut table = new_table(&["Type", "Dimension", "Count"]);
            for (dimension, count) in &self.text_dimensions {
                table.add_row(prettytable::row!["Text", dimension, count]);
            }
            let mut image_dims: Vec<(usize, usize)> = Vec::new();
            for image in &self.images {
                match image_dims.iter_mut().find(|(d, _)| *d == image.dimension) {
                    Some((_, count)) => *count += 1,
                    None => image_dims.push((image.dimension, 1)),
                }
            }
            for (dimension, count) in image_dims {
                table.add_row(prettytable::row!["Image", dimension, count]);
            }
            out.push_str(&table.to_string());
            out.push('\n');
        }

        if !self.self_search.is_empty() {
            out.push_str(&format!("{}\n", "Similarity search".bold()));
            let mut table = new_table(&["Source", "Preview", "Distance"]);
            for hit in &self.self_search {
                table.add_row(prettytable::row![
                    hit.source,
                    preview(&hit.text, PREVIEW_CHARS),
                    format!("{:.4}", 1.0 - hit.score)
                ]);
            }
            out.push_str(&table.to_string());
            if self.search_works() {
                out.push_str(&format!("{}\n", "✓ Vector similarity search is working".green()));
            } else {
                out.push_str(&format!(
                    "{}\n",
                    "✗ Sample chunk is not its own nearest neighbour".red()
                ));
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::NewChunk;
    use tempfile::tempdir;

    #[test]
    fn test_preview_truncates_on_chars() {
        assert_eq!(preview("a  b\nc", 10), "a b c");
        assert_eq!(preview("ééééé", 3), "ééé...");
    }

    #[test]
    fn test_empty_index_report() {
        let dir = tempdir().unwrap();
        let storage = SqliteStorage::new_with_path(dir.path().join("aura.db")).unwrap();
        let report = VerificationReport::collect(&storage).unwrap();

        assert_eq!(report.total_chunks(), 0);
        assert!(!report.search_works());
        assert!(report.render().contains("No text chunks found"));
    }

    #[test]
    fn test_report_with_chunks() {
        let dir = tempdir().unwrap();
        let storage = SqliteStorage::new_with_path(dir.path().join("aura.db")).unwrap();
        let chunks = vec![
            NewChunk {
                chunk_index: 0,
                text: "Clean the suction filter".to_string(),
                embedding: vec![1.0, 0.0, 0.0],
                image_paths: Vec::new(),
            },
            NewChunk {
                chunk_index: 1,
                text: "Reset the WiFi module".to_string(),
                embedding: vec![0.0, 1.0, 0.0],
                image_paths: Vec::new(),
            },
        ];
        storage.replace_document("e401", "e401.md", &chunks, &[]).unwrap();

        let report = VerificationReport::collect(&storage).unwrap();
        assert_eq!(report.total_chunks(), 2);
        assert_eq!(report.text_dimensions, vec![(3, 2)]);
        assert!(report.search_works());

        let text = report.render();
        assert!(text.contains("e401"));
        assert!(text.contains("Vector similarity search is working"));
    }
}
