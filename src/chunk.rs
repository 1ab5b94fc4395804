//! Paragraph-boundary text chunker with sentence fallback and overlap.
//!
//! Splits extracted text into [`Chunk`]s bounded by `max_chars`.
//! Paragraphs (`\n\n`) are accumulated greedily; a paragraph that alone
//! exceeds the limit is split at sentence boundaries instead, and a
//! single sentence larger than the limit is emitted whole rather than
//! cut mid-word.
//!
//! When `overlap_chars` is non-zero, every chunk after the first is
//! prefixed with the trailing words of its predecessor. The carryover
//! is capped by both the overlap budget and the chunk's remaining
//! headroom under `max_chars`, so the size bound holds for overlapped
//! chunks too.

use crate::error::Error;
use crate::models::Chunk;

/// Split text into ordered chunks, indices contiguous from 0.
///
/// Returns [`Error::NoChunksProduced`] when the text contains nothing
/// but whitespace once empty paragraphs are discarded.
pub fn chunk_text(text: &str, max_chars: usize, overlap_chars: usize) -> Result<Vec<Chunk>, Error> {
    let mut pieces: Vec<String> = Vec::new();
    let mut buf = String::new();

    for para in text.split("\n\n") {
        let para = para.trim();
        if para.is_empty() {
            continue;
        }

        // If adding this paragraph would exceed the limit, flush first.
        let would_be = if buf.is_empty() {
            para.len()
        } else {
            buf.len() + 2 + para.len() // +2 for the \n\n separator
        };
        if would_be > max_chars && !buf.is_empty() {
            pieces.push(std::mem::take(&mut buf));
        }

        if para.len() > max_chars {
            if !buf.is_empty() {
                pieces.push(std::mem::take(&mut buf));
            }
            pieces.extend(split_oversized(para, max_chars));
        } else {
            if !buf.is_empty() {
                buf.push_str("\n\n");
            }
            buf.push_str(para);
        }
    }
    if !buf.is_empty() {
        pieces.push(buf);
    }

    if pieces.is_empty() {
        return Err(Error::NoChunksProduced);
    }

    let chunks = pieces
        .iter()
        .enumerate()
        .map(|(index, piece)| {
            let text = if index == 0 || overlap_chars == 0 {
                piece.clone()
            } else {
                let headroom = max_chars.saturating_sub(piece.len() + 1);
                match carryover(&pieces[index - 1], overlap_chars.min(headroom)) {
                    Some(prefix) => format!("{} {}", prefix, piece),
                    None => piece.clone(),
                }
            };
            Chunk { index, text }
        })
        .collect();

    Ok(chunks)
}

/// Greedy sentence accumulation for a paragraph larger than `max_chars`.
fn split_oversized(paragraph: &str, max_chars: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut buf = String::new();

    for sentence in split_sentences(paragraph) {
        let would_be = if buf.is_empty() {
            sentence.len()
        } else {
            buf.len() + 1 + sentence.len()
        };
        if would_be > max_chars && !buf.is_empty() {
            pieces.push(std::mem::take(&mut buf));
        }

        if sentence.len() > max_chars {
            if !buf.is_empty() {
                pieces.push(std::mem::take(&mut buf));
            }
            // An indivisible sentence above the limit is kept whole.
            pieces.push(sentence.to_string());
        } else {
            if !buf.is_empty() {
                buf.push(' ');
            }
            buf.push_str(sentence);
        }
    }
    if !buf.is_empty() {
        pieces.push(buf);
    }
    pieces
}

/// Split on terminal punctuation (`.` `!` `?`), keeping the punctuation
/// attached to its sentence. Runs of punctuation stay together.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut prev_terminal = false;

    for (i, ch) in text.char_indices() {
        let terminal = matches!(ch, '.' | '!' | '?');
        if prev_terminal && !terminal {
            let sentence = text[start..i].trim();
            if !sentence.is_empty() {
                sentences.push(sentence);
            }
            start = i;
        }
        prev_terminal = terminal;
    }

    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail);
    }
    sentences
}

/// Trailing words of `prev` fitting within `budget` characters, in
/// original order. `None` when not even one word fits.
fn carryover(prev: &str, budget: usize) -> Option<String> {
    if budget == 0 {
        return None;
    }
    let mut words: Vec<&str> = Vec::new();
    let mut used = 0;
    for word in prev.split_whitespace().rev() {
        let cost = if words.is_empty() {
            word.len()
        } else {
            word.len() + 1
        };
        if used + cost > budget {
            break;
        }
        used += cost;
        words.push(word);
    }
    if words.is_empty() {
        return None;
    }
    words.reverse();
    Some(words.join(" "))
}
