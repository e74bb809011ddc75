use serde::{Deserialize, Serialize};

/// Metadata for a stored chat session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSession {
    /// Unique identifier for the session
    pub session_id: String,
    /// Owning user
    pub user_id: String,
    /// Display title
    pub title: String,
    /// Creation time, epoch milliseconds
    pub created_at: i64,
    /// Time of the most recent message, epoch milliseconds
    pub last_message_at: i64,
    /// Number of persisted messages
    pub message_count: usize,
}

/// One chunk of a guide, ready to be written to the knowledge index
#[derive(Debug, Clone)]
pub struct NewChunk {
    /// Position of the chunk within its document
    pub chunk_index: usize,
    /// Chunk text
    pub text: String,
    /// Text embedding
    pub embedding: Vec<f32>,
    /// Paths of images referenced from this chunk
    pub image_paths: Vec<String>,
}

/// An embedded image, ready to be written to the knowledge index
#[derive(Debug, Clone)]
pub struct NewImage {
    /// Image path relative to the knowledge base
    pub path: String,
    /// Image descriptor
    pub embedding: Vec<f32>,
}

/// Rows written for one document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DocumentWrite {
    /// Chunks inserted
    pub chunks: usize,
    /// Images inserted or refreshed
    pub images: usize,
    /// Chunk-image links inserted
    pub links: usize,
}

/// A nearest-neighbour hit from the knowledge index
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChunkHit {
    /// Chunk row id
    pub chunk_id: i64,
    /// Source document path
    pub source: String,
    /// Chunk text
    pub text: String,
    /// Cosine similarity to the query
    pub score: f32,
    /// Images linked to the chunk
    pub image_paths: Vec<String>,
}

/// Per-document summary used by the verification report
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentStats {
    /// Document identifier
    pub document_id: String,
    /// Number of chunks
    pub chunks: usize,
    /// Average chunk length in characters
    pub avg_chunk_len: f64,
}

/// Stored image summary used by the verification report
#[derive(Debug, Clone, PartialEq)]
pub struct ImageStats {
    /// Image path
    pub path: String,
    /// Embedding dimension
    pub dimension: usize,
    /// Number of chunks linking to the image
    pub links: usize,
}

/// A stored chunk with its embedding
#[derive(Debug, Clone)]
pub struct ChunkRecord {
    /// Chunk row id
    pub id: i64,
    /// Document identifier
    pub document_id: String,
    /// Position within the document
    pub chunk_index: usize,
    /// Source document path
    pub source: String,
    /// Chunk text
    pub text: String,
    /// Text embedding
    pub embedding: Vec<f32>,
}
