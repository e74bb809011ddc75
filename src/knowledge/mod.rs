//! Knowledge base: chunking, ingestion, verification and retrieval
//!
//! The ingestion job fills the knowledge tables of the SQLite store; the
//! retriever searches them for the `search_troubleshooting_guides` tool.

pub mod chunker;
pub mod ingest;
pub mod retriever;
pub mod verify;

pub use chunker::{ChunkSpan, Chunker};
pub use ingest::{discover_documents, IngestReport, Ingestor};
#[cfg(test)]
pub use retriever::MockRetriever;
pub use retriever::{KnowledgeRetriever, Retriever};
pub use verify::VerificationReport;
