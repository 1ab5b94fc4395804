//! Lexical relevance scoring and chunk ranking.
//!
//! Scoring is Jaccard similarity over lowercased, whitespace-delimited
//! token sets: a lexical-overlap heuristic, not semantic similarity.
//! There is no stemming and no stop-word removal; tokens are compared
//! verbatim. This is a documented limitation of the lexical retrieval
//! mode.

use std::collections::HashSet;

use crate::models::{Document, ScoredChunk};

/// Jaccard similarity of the two texts' token sets, in `[0, 1]`.
///
/// `1.0` for identical token sets, `0.0` for disjoint vocabularies or
/// when either side has no tokens.
pub fn jaccard_similarity(question: &str, chunk: &str) -> f64 {
    let q = tokenize(question);
    let c = tokenize(chunk);
    if q.is_empty() || c.is_empty() {
        return 0.0;
    }
    let intersection = q.intersection(&c).count();
    let union = q.union(&c).count();
    intersection as f64 / union as f64
}

fn tokenize(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Scores every chunk of every document against the question and
/// returns up to `top_k` chunks scoring above `min_score`, best first.
///
/// The sort is stable and documents are visited in insertion order, so
/// equal scores keep document-then-chunk order and the ranking is
/// deterministic. An empty result means no relevant context — a valid
/// outcome, not an error.
pub fn rank_chunks(
    question: &str,
    documents: &[Document],
    top_k: usize,
    min_score: f64,
) -> Vec<ScoredChunk> {
    let mut scored: Vec<ScoredChunk> = documents
        .iter()
        .flat_map(|doc| {
            doc.chunks.iter().map(|chunk| ScoredChunk {
                document_id: doc.id.clone(),
                filename: doc.filename.clone(),
                chunk_index: chunk.index,
                text: chunk.text.clone(),
                score: jaccard_similarity(question, &chunk.text),
            })
        })
        .collect();

    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    scored.retain(|sc| sc.score > min_score);
    scored.truncate(top_k);
    scored
}
