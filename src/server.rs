//! HTTP API server.
//!
//! Thin transport layer over the core pipeline: handlers decode
//! requests into store/pipeline calls and encode results or errors
//! into JSON responses. All state is held in [`AppState`] and injected
//! at startup; nothing in here is process-global.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/health` | Health check (version + document count) |
//! | `POST` | `/api/v1/documents/upload` | Multipart upload, extract + chunk + store |
//! | `GET` | `/api/v1/documents` | List stored document summaries |
//! | `GET` | `/api/v1/documents/{id}` | Document detail with previews |
//! | `DELETE` | `/api/v1/documents/{id}` | Remove a document |
//! | `POST` | `/api/v1/query` | Ask a question, get a grounded answer |
//!
//! # Error Contract
//!
//! All error responses share one schema:
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "question is required" } }
//! ```
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted to support
//! browser-based clients.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};

use crate::answer::{self, SourceAttribution};
use crate::chunk::chunk_text;
use crate::config::Config;
use crate::error::Error;
use crate::extract::{self, extract_text};
use crate::llm::CompletionProvider;
use crate::models::DocumentSummary;
use crate::search::rank_chunks;
use crate::store::DocumentStore;

/// Bound on question length, mirroring the API contract.
const MAX_QUESTION_CHARS: usize = 500;

/// Callers may request at most this many chunks per query.
const MAX_RESULTS_CEILING: usize = 10;

/// Preview lengths for the document-detail endpoint.
const TEXT_PREVIEW_CHARS: usize = 300;
const CHUNK_PREVIEW_CHARS: usize = 200;

/// Shared application state passed to all route handlers via Axum's
/// `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<DocumentStore>,
    pub llm: Arc<dyn CompletionProvider>,
}

/// Starts the HTTP server and runs until the process is terminated.
pub async fn run_server(
    config: Arc<Config>,
    store: Arc<DocumentStore>,
    llm: Arc<dyn CompletionProvider>,
) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let app = build_router(AppState { config, store, llm });

    tracing::info!("listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Builds the router with all routes, CORS, and the body-size limit.
/// Separate from [`run_server`] so tests can drive handlers directly.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Slack on top of the file cap for multipart framing overhead.
    let body_limit = state.config.upload.max_file_bytes + 64 * 1024;

    Router::new()
        .route("/health", get(handle_health))
        .route("/api/v1/documents/upload", post(handle_upload))
        .route("/api/v1/documents", get(handle_list))
        .route(
            "/api/v1/documents/{id}",
            get(handle_get_document).delete(handle_delete),
        )
        .route("/api/v1/query", post(handle_query))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .with_state(state)
}

// ============ Error response ============

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    /// Machine-readable error code (e.g., `"bad_request"`, `"not_found"`).
    code: String,
    /// Human-readable error message.
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<Error> for AppError {
    fn from(err: Error) -> Self {
        let (status, code) = match &err {
            Error::UnsupportedFormat(_) => (StatusCode::BAD_REQUEST, "unsupported_format"),
            Error::EmptyDocument => (StatusCode::BAD_REQUEST, "empty_document"),
            Error::ExtractionFailed(_) => (StatusCode::BAD_REQUEST, "extraction_failed"),
            Error::NoChunksProduced => (StatusCode::BAD_REQUEST, "no_chunks_produced"),
            Error::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            Error::ExternalService(_) => (StatusCode::BAD_GATEWAY, "external_service"),
            Error::Validation(_) => (StatusCode::BAD_REQUEST, "bad_request"),
        };
        AppError {
            status,
            code: code.to_string(),
            message: err.to_string(),
        }
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    documents_loaded: usize,
}

async fn handle_health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        documents_loaded: state.store.len(),
    })
}

// ============ POST /api/v1/documents/upload ============

#[derive(Serialize)]
struct UploadResponse {
    document_id: String,
    filename: String,
    status: String,
    message: String,
    chunks_created: usize,
    text_length: usize,
    processing_time: f64,
}

async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let started = Instant::now();

    let mut upload: Option<(String, String, Vec<u8>)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::Validation(format!("invalid multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| Error::Validation("no filename provided".to_string()))?;
        let content_type = field
            .content_type()
            .map(str::to_string)
            .unwrap_or_else(|| content_type_for(&filename));
        let bytes = field
            .bytes()
            .await
            .map_err(|e| Error::Validation(format!("failed to read upload: {}", e)))?;
        upload = Some((filename, content_type, bytes.to_vec()));
    }

    let (filename, content_type, bytes) =
        upload.ok_or_else(|| Error::Validation("missing multipart field 'file'".to_string()))?;

    if bytes.is_empty() {
        return Err(Error::Validation("empty file".to_string()).into());
    }
    if bytes.len() > state.config.upload.max_file_bytes {
        return Err(Error::Validation(format!(
            "file too large: maximum size is {} bytes",
            state.config.upload.max_file_bytes
        ))
        .into());
    }

    let text = extract_text(&bytes, &content_type)?;
    let chunks = chunk_text(
        &text,
        state.config.chunking.max_chars,
        state.config.chunking.overlap_chars,
    )?;

    let chunks_created = chunks.len();
    let text_length = text.len();
    let document_id = state.store.put(&filename, text, chunks);

    tracing::info!(
        "stored document {} ({}): {} chunks, {} chars",
        document_id,
        filename,
        chunks_created,
        text_length
    );

    Ok(Json(UploadResponse {
        document_id,
        filename,
        status: "success".to_string(),
        message: format!("Document processed: {} chunks created", chunks_created),
        chunks_created,
        text_length,
        processing_time: started.elapsed().as_secs_f64(),
    }))
}

/// Fallback content type by extension, for clients that omit one on
/// the multipart field.
fn content_type_for(filename: &str) -> String {
    let lower = filename.to_lowercase();
    if lower.ends_with(".pdf") {
        extract::MIME_PDF.to_string()
    } else if lower.ends_with(".txt") || lower.ends_with(".md") {
        extract::MIME_TXT.to_string()
    } else if lower.ends_with(".docx") {
        extract::MIME_DOCX.to_string()
    } else {
        "application/octet-stream".to_string()
    }
}

// ============ GET /api/v1/documents ============

#[derive(Serialize)]
struct DocumentListResponse {
    documents: Vec<DocumentSummary>,
    total_count: usize,
}

async fn handle_list(State(state): State<AppState>) -> Json<DocumentListResponse> {
    let documents = state.store.list();
    let total_count = documents.len();
    Json(DocumentListResponse {
        documents,
        total_count,
    })
}

// ============ GET /api/v1/documents/{id} ============

#[derive(Serialize)]
struct DocumentDetailResponse {
    document_id: String,
    filename: String,
    uploaded_at: DateTime<Utc>,
    chunk_count: usize,
    text_length: usize,
    text_preview: String,
    chunks: Vec<ChunkPreview>,
}

#[derive(Serialize)]
struct ChunkPreview {
    index: usize,
    preview: String,
}

async fn handle_get_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DocumentDetailResponse>, AppError> {
    let doc = state.store.get(&id)?;
    Ok(Json(DocumentDetailResponse {
        document_id: doc.id,
        filename: doc.filename,
        uploaded_at: doc.uploaded_at,
        chunk_count: doc.chunks.len(),
        text_length: doc.text.len(),
        text_preview: truncate(&doc.text, TEXT_PREVIEW_CHARS),
        chunks: doc
            .chunks
            .iter()
            .map(|c| ChunkPreview {
                index: c.index,
                preview: truncate(&c.text, CHUNK_PREVIEW_CHARS),
            })
            .collect(),
    }))
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let head: String = text.chars().take(max_chars).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

// ============ DELETE /api/v1/documents/{id} ============

#[derive(Serialize)]
struct DeleteResponse {
    document_id: String,
    status: String,
}

async fn handle_delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, AppError> {
    state.store.delete(&id)?;
    tracing::info!("deleted document {}", id);
    Ok(Json(DeleteResponse {
        document_id: id,
        status: "deleted".to_string(),
    }))
}

// ============ POST /api/v1/query ============

#[derive(Deserialize)]
struct QueryRequest {
    question: String,
    /// Restrict retrieval to one document.
    document_id: Option<String>,
    /// Overrides `retrieval.top_k`, clamped to `1..=10`.
    max_results: Option<usize>,
}

#[derive(Serialize)]
struct QueryResponse {
    answer: String,
    sources: Vec<SourceAttribution>,
    confidence: f64,
    processing_time: f64,
    timestamp: DateTime<Utc>,
}

async fn handle_query(
    State(state): State<AppState>,
    Json(req): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, AppError> {
    let started = Instant::now();

    let question = req.question.trim();
    if question.is_empty() {
        return Err(Error::Validation("question is required".to_string()).into());
    }
    if question.chars().count() > MAX_QUESTION_CHARS {
        return Err(Error::Validation(format!(
            "question exceeds {} characters",
            MAX_QUESTION_CHARS
        ))
        .into());
    }

    let top_k = req
        .max_results
        .unwrap_or(state.config.retrieval.top_k)
        .clamp(1, MAX_RESULTS_CEILING);

    // Owned snapshot: a concurrent delete cannot invalidate the ranking.
    let documents = match &req.document_id {
        Some(id) => vec![state.store.get(id)?],
        None => state.store.snapshot(),
    };

    let composed = if documents.is_empty() {
        answer::no_documents_answer()
    } else {
        let retrieved = rank_chunks(
            question,
            &documents,
            top_k,
            state.config.retrieval.min_score,
        );
        answer::compose_answer(state.llm.as_ref(), question, &retrieved).await
    };

    tracing::info!(
        "query answered with {} sources, confidence {:.2}",
        composed.sources.len(),
        composed.confidence
    );

    Ok(Json(QueryResponse {
        answer: composed.answer,
        sources: composed.sources,
        confidence: composed.confidence,
        processing_time: started.elapsed().as_secs_f64(),
        timestamp: Utc::now(),
    }))
}
