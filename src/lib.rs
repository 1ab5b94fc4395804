//! # askdocs
//!
//! A document Q&A service: upload PDF, TXT, or DOCX documents, ask
//! questions in natural language, and get answers grounded in the
//! uploaded content with cited sources.
//!
//! Retrieval is lexical: chunks are ranked by Jaccard word overlap
//! with the question and the best ones are handed to an external
//! completion provider as grounding context. There is no embedding
//! index and no persistence; documents live in memory for the lifetime
//! of the process.
//!
//! ## Architecture
//!
//! ```text
//! upload ──▶ extract ──▶ chunk ──▶ store
//!                                    │
//! query ──▶ rank (Jaccard) ◀─ snapshot
//!              │
//!              ▼
//!          compose ──▶ completion provider ──▶ answer + sources
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and validation |
//! | [`error`] | Pipeline error taxonomy |
//! | [`models`] | Core data types |
//! | [`extract`] | Multi-format text extraction |
//! | [`chunk`] | Paragraph/sentence chunker with overlap |
//! | [`store`] | In-memory document registry |
//! | [`search`] | Jaccard scoring and chunk ranking |
//! | [`llm`] | Completion provider abstraction |
//! | [`answer`] | Answer composition |
//! | [`server`] | HTTP API |

pub mod answer;
pub mod chunk;
pub mod config;
pub mod error;
pub mod extract;
pub mod llm;
pub mod models;
pub mod search;
pub mod server;
pub mod store;
