//! Knowledge index tables: guide chunks, images and their links

use super::{storage_err, SqliteStorage};
use crate::embeddings::{blob_to_vector, cosine_similarity, vector_to_blob};
use crate::error::Result;
use crate::storage::types::{
    ChunkHit, ChunkRecord, DocumentStats, DocumentWrite, ImageStats, NewChunk, NewImage,
};
use anyhow::Context;
use rusqlite::{params, OptionalExtension};
use std::collections::HashMap;

impl SqliteStorage {
    /// Replace a document's chunks in one transaction
    ///
    /// Previous chunks of the document (and their image links) are removed
    /// first. Images are upserted by path so an image shared by several
    /// guides is stored once.
    pub fn replace_document(
        &self,
        document_id: &str,
        source: &str,
        chunks: &[NewChunk],
        images: &[NewImage],
    ) -> Result<DocumentWrite> {
        let mut conn = self.connect()?;
        let tx = Self::write_transaction(&mut conn)?;

        tx.execute(
            "DELETE FROM knowledge_chunks WHERE document_id = ?1",
            params![document_id],
        )
        .context("Failed to remove previous chunks")
        .map_err(storage_err)?;

        let mut image_ids: HashMap<&str, i64> = HashMap::new();
        for image in images {
            let id: i64 = tx
                .query_row(
                    "INSERT INTO knowledge_images (image_path, image_embedding)
                     VALUES (?1, ?2)
                     ON CONFLICT(image_path) DO UPDATE SET image_embedding = excluded.image_embedding
                     RETURNING id",
                    params![image.path, vector_to_blob(&image.embedding)],
                    |row| row.get(0),
                )
                .context("Failed to upsert image")
                .map_err(storage_err)?;
            image_ids.insert(image.path.as_str(), id);
        }

        let mut written = DocumentWrite {
            images: image_ids.len(),
            ..Default::default()
        };

        for chunk in chunks {
            tx.execute(
                "INSERT INTO knowledge_chunks
                    (document_id, chunk_index, source, text_content, text_embedding)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    document_id,
                    chunk.chunk_index as i64,
                    source,
                    chunk.text,
                    vector_to_blob(&chunk.embedding)
                ],
            )
            .context("Failed to insert chunk")
            .map_err(storage_err)?;
            let chunk_id = tx.last_insert_rowid();
            written.chunks += 1;

            for path in &chunk.image_paths {
                let Some(image_id) = image_ids.get(path.as_str()) else {
                    continue;
                };
                written.links += tx
                    .execute(
                        "INSERT OR IGNORE INTO chunk_image_links (chunk_id, image_id) VALUES (?1, ?2)",
                        params![chunk_id, image_id],
                    )
                    .context("Failed to link chunk to image")
                    .map_err(storage_err)?;
            }
        }

        tx.commit()
            .context("Failed to commit transaction")
            .map_err(storage_err)?;
        Ok(written)
    }

    /// All stored chunks with their embeddings, in document order
    pub fn all_chunks(&self) -> Result<Vec<ChunkRecord>> {
        let conn = self.connect()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, document_id, chunk_index, source, text_content, text_embedding
                 FROM knowledge_chunks
                 ORDER BY document_id, chunk_index",
            )
            .context("Failed to prepare statement")
            .map_err(storage_err)?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, Vec<u8>>(5)?,
                ))
            })
            .context("Failed to query chunks")
            .map_err(storage_err)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("Failed to read chunks")
            .map_err(storage_err)?;

        rows.into_iter()
            .map(|(id, document_id, chunk_index, source, text, blob)| {
                Ok(ChunkRecord {
                    id,
                    document_id,
                    chunk_index: chunk_index as usize,
                    source,
                    text,
                    embedding: blob_to_vector(&blob)?,
                })
            })
            .collect()
    }

    /// Nearest chunks to `query` by cosine similarity, best first
    ///
    /// Chunks whose embedding dimension differs from the query are skipped.
    pub fn search_chunks(&self, query: &[f32], k: usize) -> Result<Vec<ChunkHit>> {
        let mut scored: Vec<(f32, ChunkRecord)> = self
            .all_chunks()?
            .into_iter()
            .filter(|c| c.embedding.len() == query.len())
            .map(|c| (cosine_similarity(query, &c.embedding), c))
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored.truncate(k);

        scored
            .into_iter()
            .map(|(score, chunk)| {
                Ok(ChunkHit {
                    chunk_id: chunk.id,
                    image_paths: self.linked_images(chunk.id)?,
                    source: chunk.source,
                    text: chunk.text,
                    score,
                })
            })
            .collect()
    }

    /// Image paths linked to a chunk
    pub fn linked_images(&self, chunk_id: i64) -> Result<Vec<String>> {
        let conn = self.connect()?;
        let mut stmt = conn
            .prepare(
                "SELECT i.image_path FROM chunk_image_links l
                 JOIN knowledge_images i ON i.id = l.image_id
                 WHERE l.chunk_id = ?1
                 ORDER BY i.image_path",
            )
            .context("Failed to prepare statement")
            .map_err(storage_err)?;
        let paths = stmt
            .query_map(params![chunk_id], |row| row.get::<_, String>(0))
            .context("Failed to query linked images")
            .map_err(storage_err)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("Failed to read linked images")
            .map_err(storage_err)?;
        Ok(paths)
    }

    /// Chunk counts and average chunk length per document
    pub fn document_stats(&self) -> Result<Vec<DocumentStats>> {
        let conn = self.connect()?;
        let mut stmt = conn
            .prepare(
                "SELECT document_id, COUNT(*), AVG(LENGTH(text_content))
                 FROM knowledge_chunks
                 GROUP BY document_id
                 ORDER BY document_id",
            )
            .context("Failed to prepare statement")
            .map_err(storage_err)?;
        let stats = stmt
            .query_map([], |row| {
                Ok(DocumentStats {
                    document_id: row.get(0)?,
                    chunks: row.get::<_, i64>(1)? as usize,
                    avg_chunk_len: row.get::<_, Option<f64>>(2)?.unwrap_or(0.0),
                })
            })
            .context("Failed to query document stats")
            .map_err(storage_err)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("Failed to read document stats")
            .map_err(storage_err)?;
        Ok(stats)
    }

    /// Stored images with their embedding dimension and link count
    pub fn image_stats(&self) -> Result<Vec<ImageStats>> {
        let conn = self.connect()?;
        let mut stmt = conn
            .prepare(
                "SELECT i.image_path, LENGTH(i.image_embedding) / 4,
                        (SELECT COUNT(*) FROM chunk_image_links l WHERE l.image_id = i.id)
                 FROM knowledge_images i
                 ORDER BY i.image_path",
            )
            .context("Failed to prepare statement")
            .map_err(storage_err)?;
        let stats = stmt
            .query_map([], |row| {
                Ok(ImageStats {
                    path: row.get(0)?,
                    dimension: row.get::<_, i64>(1)? as usize,
                    links: row.get::<_, i64>(2)? as usize,
                })
            })
            .context("Failed to query image stats")
            .map_err(storage_err)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("Failed to read image stats")
            .map_err(storage_err)?;
        Ok(stats)
    }

    /// Number of chunks per text embedding dimension
    pub fn embedding_dimensions(&self) -> Result<Vec<(usize, usize)>> {
        let conn = self.connect()?;
        let mut stmt = conn
            .prepare(
                "SELECT LENGTH(text_embedding) / 4 AS dim, COUNT(*)
                 FROM knowledge_chunks
                 GROUP BY dim
                 ORDER BY dim",
            )
            .context("Failed to prepare statement")
            .map_err(storage_err)?;
        let groups = stmt
            .query_map([], |row| {
                Ok((row.get::<_, i64>(0)? as usize, row.get::<_, i64>(1)? as usize))
            })
            .context("Failed to query embedding dimensions")
            .map_err(storage_err)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("Failed to read embedding dimensions")
            .map_err(storage_err)?;
        Ok(groups)
    }

    /// The first stored chunk, if any
    pub fn sample_chunk(&self) -> Result<Option<ChunkRecord>> {
        let conn = self.connect()?;
        let row = conn
            .query_row(
                "SELECT id, document_id, chunk_index, source, text_content, text_embedding
                 FROM knowledge_chunks
                 ORDER BY id
                 LIMIT 1",
                [],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, Vec<u8>>(5)?,
                    ))
                },
            )
            .optional()
            .context("Failed to query sample chunk")
            .map_err(storage_err)?;

        row.map(|(id, document_id, chunk_index, source, text, blob)| {
            Ok(ChunkRecord {
                id,
                document_id,
                chunk_index: chunk_index as usize,
                source,
                text,
                embedding: blob_to_vector(&blob)?,
            })
        })
        .transpose()
    }

    /// Row count of a knowledge table
    pub fn count_rows(&self, table: &str) -> Result<usize> {
        if !super::TABLES.contains(&table) {
            return Err(crate::error::AuraError::Storage(format!("Unknown table: {}", table)).into());
        }
        let conn = self.connect()?;
        let count: i64 = conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))
            .context("Failed to count rows")
            .map_err(storage_err)?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn chunk(index: usize, text: &str, embedding: Vec<f32>, images: &[&str]) -> NewChunk {
        NewChunk {
            chunk_index: index,
            text: text.to_string(),
            embedding,
            image_paths: images.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn image(path: &str) -> NewImage {
        NewImage {
            path: path.to_string(),
            embedding: vec![0.5, 0.5, 0.5, 0.5],
        }
    }

    #[test]
    fn test_replace_document_writes_chunks_images_and_links() {
        let dir = tempdir().unwrap();
        let storage = SqliteStorage::new_with_path(dir.path().join("aura.db")).unwrap();

        let written = storage
            .replace_document(
                "suction.md",
                "suction.md",
                &[
                    chunk(0, "E-401 suction power reduced", vec![1.0, 0.0], &["img/filter.png"]),
                    chunk(1, "Empty the dust bin", vec![0.0, 1.0], &[]),
                ],
                &[image("img/filter.png")],
            )
            .unwrap();

        assert_eq!(
            written,
            DocumentWrite {
                chunks: 2,
                images: 1,
                links: 1
            }
        );
        assert_eq!(storage.count_rows("knowledge_chunks").unwrap(), 2);
        assert_eq!(storage.image_stats().unwrap()[0].links, 1);
        assert_eq!(storage.image_stats().unwrap()[0].dimension, 4);
    }

    #[test]
    fn test_replace_document_removes_previous_chunks() {
        let dir = tempdir().unwrap();
        let storage = SqliteStorage::new_with_path(dir.path().join("aura.db")).unwrap();

        storage
            .replace_document(
                "a.md",
                "a.md",
                &[
                    chunk(0, "one", vec![1.0, 0.0], &["x.png"]),
                    chunk(1, "two", vec![1.0, 0.0], &[]),
                ],
                &[image("x.png")],
            )
            .unwrap();
        storage
            .replace_document("a.md", "a.md", &[chunk(0, "only", vec![1.0, 0.0], &[])], &[])
            .unwrap();

        let stats = storage.document_stats().unwrap();
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].chunks, 1);
        // Links of the removed chunks cascade away, the image itself stays
        assert_eq!(storage.count_rows("chunk_image_links").unwrap(), 0);
        assert_eq!(storage.count_rows("knowledge_images").unwrap(), 1);
    }

    #[test]
    fn test_search_chunks_ranks_by_cosine_similarity() {
        let dir = tempdir().unwrap();
        let storage = SqliteStorage::new_with_path(dir.path().join("aura.db")).unwrap();
        storage
            .replace_document(
                "guide.md",
                "guides/guide.md",
                &[
                    chunk(0, "battery", vec![0.0, 1.0], &[]),
                    chunk(1, "suction", vec![1.0, 0.1], &["img/a.png"]),
                    chunk(2, "wifi", vec![-1.0, 0.0], &[]),
                ],
                &[image("img/a.png")],
            )
            .unwrap();

        let hits = storage.search_chunks(&[1.0, 0.0], 2).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].text, "suction");
        assert_eq!(hits[0].source, "guides/guide.md");
        assert_eq!(hits[0].image_paths, vec!["img/a.png".to_string()]);
        assert_eq!(hits[1].text, "battery");
    }

    #[test]
    fn test_search_chunks_skips_mismatched_dimensions() {
        let dir = tempdir().unwrap();
        let storage = SqliteStorage::new_with_path(dir.path().join("aura.db")).unwrap();
        storage
            .replace_document("a.md", "a.md", &[chunk(0, "x", vec![1.0, 0.0, 0.0], &[])], &[])
            .unwrap();
        assert!(storage.search_chunks(&[1.0, 0.0], 3).unwrap().is_empty());
        assert_eq!(storage.embedding_dimensions().unwrap(), vec![(3, 1)]);
    }

    #[test]
    fn test_sample_chunk_on_empty_index() {
        let dir = tempdir().unwrap();
        let storage = SqliteStorage::new_with_path(dir.path().join("aura.db")).unwrap();
        assert!(storage.sample_chunk().unwrap().is_none());
        assert!(storage.count_rows("not_a_table").is_err());
    }
}
