//! Error taxonomy for the ingestion and query pipeline.
//!
//! Extraction and chunking failures abort the upload with the specific
//! kind; they never degrade into an empty document. Query-time LLM
//! failures are converted to a labeled answer string by the composer
//! and do not escape the query path.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Declared content type is not one of the supported formats.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Extraction succeeded but produced no text.
    #[error("document contains no extractable text")]
    EmptyDocument,

    #[error("text extraction failed: {0}")]
    ExtractionFailed(String),

    /// Input text yielded no chunks after discarding empties.
    #[error("no chunks produced from document text")]
    NoChunksProduced,

    #[error("document not found: {0}")]
    NotFound(String),

    /// LLM or network failure, including timeouts.
    #[error("external service error: {0}")]
    ExternalService(String),

    #[error("validation error: {0}")]
    Validation(String),
}
