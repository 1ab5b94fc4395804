//! Answer composition.
//!
//! Joins the retrieved chunks into a context block, delegates to the
//! completion provider, and packages the reply with source attributions
//! and a similarity-derived confidence estimate. Retrieval misses and
//! provider failures both produce fixed, clearly-labeled answer strings
//! instead of errors: a query never fails because the LLM did.

use serde::Serialize;

use crate::llm::CompletionProvider;
use crate::models::ScoredChunk;

/// Upper bound on the source content preview in query responses.
const SOURCE_PREVIEW_CHARS: usize = 200;

/// System instruction pinned for every completion call.
const SYSTEM_INSTRUCTION: &str =
    "You are a helpful assistant that answers questions using only the supplied context. \
     If the answer is not present in the context, say so explicitly.";

pub const NO_DOCUMENTS_ANSWER: &str =
    "No documents uploaded yet. Please upload a document first.";

pub const NO_RELEVANT_CONTEXT_ANSWER: &str =
    "I couldn't find relevant information in the uploaded documents to answer your question.";

/// One cited source in a query response.
#[derive(Debug, Clone, Serialize)]
pub struct SourceAttribution {
    pub document_id: String,
    pub filename: String,
    pub chunk_index: usize,
    /// Chunk text truncated to a bounded preview length.
    pub content: String,
    pub relevance_score: f64,
}

/// The composed result of a query: answer text, cited sources, and a
/// confidence estimate derived from the top retrieval score.
#[derive(Debug, Clone, Serialize)]
pub struct ComposedAnswer {
    pub answer: String,
    pub sources: Vec<SourceAttribution>,
    pub confidence: f64,
}

/// Fixed answer for queries against an empty store. Never calls the
/// provider.
pub fn no_documents_answer() -> ComposedAnswer {
    ComposedAnswer {
        answer: NO_DOCUMENTS_ANSWER.to_string(),
        sources: Vec::new(),
        confidence: 0.0,
    }
}

/// Builds the grounding context from `retrieved` (ranked order, chunks
/// separated by a blank line), asks the provider, and packages the
/// reply. With no retrieved chunks, short-circuits to a fixed answer
/// without calling the provider.
pub async fn compose_answer(
    provider: &dyn CompletionProvider,
    question: &str,
    retrieved: &[ScoredChunk],
) -> ComposedAnswer {
    if retrieved.is_empty() {
        return ComposedAnswer {
            answer: NO_RELEVANT_CONTEXT_ANSWER.to_string(),
            sources: Vec::new(),
            confidence: 0.0,
        };
    }

    let context = retrieved
        .iter()
        .map(|sc| sc.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    let user_prompt = format!("Context:\n{}\n\nQuestion: {}\n\nAnswer:", context, question);

    let answer = match provider.complete(SYSTEM_INSTRUCTION, &user_prompt).await {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!("completion failed: {}", e);
            format!("Error getting AI response: {}", e)
        }
    };

    let sources = retrieved.iter().map(source_attribution).collect();
    // `retrieved` is ranked best-first, so [0] carries the top score.
    let confidence = (retrieved[0].score * 2.0).min(1.0);

    ComposedAnswer {
        answer,
        sources,
        confidence,
    }
}

fn source_attribution(sc: &ScoredChunk) -> SourceAttribution {
    let content = if sc.text.chars().count() > SOURCE_PREVIEW_CHARS {
        let preview: String = sc.text.chars().take(SOURCE_PREVIEW_CHARS).collect();
        format!("{}...", preview)
    } else {
        sc.text.clone()
    };
    SourceAttribution {
        document_id: sc.document_id.clone(),
        filename: sc.filename.clone(),
        chunk_index: sc.chunk_index,
        content,
        relevance_score: sc.score,
    }
}
