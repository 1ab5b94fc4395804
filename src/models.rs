//! Core data types that flow through the ingestion and query pipeline.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A document held by the registry: extracted text plus its ordered
/// chunk sequence. Immutable after creation except for deletion; owned
/// exclusively by the [`DocumentStore`](crate::store::DocumentStore).
#[derive(Debug, Clone)]
pub struct Document {
    pub id: String,
    pub filename: String,
    pub text: String,
    pub chunks: Vec<Chunk>,
    pub uploaded_at: DateTime<Utc>,
}

/// A bounded contiguous span of a document's extracted text; the unit
/// of retrieval. Association with the source document is positional:
/// the document owns its chunk vector and `index` is the chunk's place
/// in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub index: usize,
    pub text: String,
}

/// Lightweight listing shape for `list()` and the documents API.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentSummary {
    pub document_id: String,
    pub filename: String,
    pub uploaded_at: DateTime<Utc>,
    pub chunk_count: usize,
    pub text_length: usize,
}

/// A chunk scored against one specific question. Query-scoped and never
/// persisted; carries owned clones so ranking never borrows the store.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub document_id: String,
    pub filename: String,
    pub chunk_index: usize,
    pub text: String,
    pub score: f64,
}
