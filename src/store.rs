//! In-memory document registry.
//!
//! The store is an explicitly owned instance (the server shares it via
//! `Arc`), not ambient global state, so tests can create isolated
//! stores per case. Documents live for the lifetime of the process;
//! there is no persistence and no update-in-place.
//!
//! Inserts and deletes are atomic with respect to concurrent readers:
//! all access goes through one `RwLock`, and the query path ranks over
//! an owned [`snapshot`](DocumentStore::snapshot), so a reader never
//! observes a half-constructed document or a dangling reference to a
//! deleted one.

use std::sync::RwLock;

use chrono::Utc;
use uuid::Uuid;

use crate::error::Error;
use crate::models::{Chunk, Document, DocumentSummary};

#[derive(Default)]
pub struct DocumentStore {
    // Vec keeps insertion order, which list() and the ranker's
    // tie-break both rely on.
    docs: RwLock<Vec<Document>>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self {
            docs: RwLock::new(Vec::new()),
        }
    }

    /// Stores a new document and returns its generated identifier.
    pub fn put(&self, filename: &str, text: String, chunks: Vec<Chunk>) -> String {
        let mut docs = self.docs.write().unwrap();
        let mut id = Uuid::new_v4().to_string();
        // Collisions are vanishingly unlikely; regenerate rather than
        // ever overwrite an existing record.
        while docs.iter().any(|d| d.id == id) {
            id = Uuid::new_v4().to_string();
        }
        docs.push(Document {
            id: id.clone(),
            filename: filename.to_string(),
            text,
            chunks,
            uploaded_at: Utc::now(),
        });
        id
    }

    pub fn get(&self, id: &str) -> Result<Document, Error> {
        let docs = self.docs.read().unwrap();
        docs.iter()
            .find(|d| d.id == id)
            .cloned()
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    /// Summaries of all documents in insertion order.
    pub fn list(&self) -> Vec<DocumentSummary> {
        let docs = self.docs.read().unwrap();
        docs.iter()
            .map(|d| DocumentSummary {
                document_id: d.id.clone(),
                filename: d.filename.clone(),
                uploaded_at: d.uploaded_at,
                chunk_count: d.chunks.len(),
                text_length: d.text.len(),
            })
            .collect()
    }

    /// Removes a document. Deleting an unknown (or already deleted) id
    /// fails with [`Error::NotFound`].
    pub fn delete(&self, id: &str) -> Result<(), Error> {
        let mut docs = self.docs.write().unwrap();
        let pos = docs
            .iter()
            .position(|d| d.id == id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        docs.remove(pos);
        Ok(())
    }

    /// Owned view of every document in insertion order, for the query
    /// path.
    pub fn snapshot(&self) -> Vec<Document> {
        self.docs.read().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.docs.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
