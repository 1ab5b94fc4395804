//! # askdocs CLI
//!
//! Single configuration-driven entry point for the document Q&A
//! service. All tunables — bind address, chunk size and overlap,
//! result count, relevance threshold, completion provider — live in
//! one TOML file; the CLI just points at it.
//!
//! ## Usage
//!
//! ```bash
//! askdocs --config ./askdocs.toml serve
//! ```
//!
//! A missing config file is not an error: the service starts with
//! built-in defaults, and the OpenAI key is read from the
//! `OPENAI_API_KEY` environment variable.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use askdocs::config;
use askdocs::llm;
use askdocs::server;
use askdocs::store::DocumentStore;

/// askdocs — a document Q&A service with lexical retrieval and
/// LLM-grounded answers.
#[derive(Parser)]
#[command(
    name = "askdocs",
    about = "Document Q&A service: upload documents, ask questions, get grounded answers",
    version
)]
struct Cli {
    /// Path to configuration file (TOML). Started with defaults when
    /// the file does not exist.
    #[arg(long, global = true, default_value = "./askdocs.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server.
    ///
    /// Binds to the address in `[server].bind` and serves the upload,
    /// query, and document management endpoints until terminated.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let cfg = if cli.config.exists() {
        config::load_config(&cli.config)?
    } else {
        tracing::info!(
            "config file {} not found, using defaults",
            cli.config.display()
        );
        config::Config::default()
    };

    match cli.command {
        Commands::Serve => {
            let provider = llm::create_provider(&cfg.llm)?;
            server::run_server(
                Arc::new(cfg),
                Arc::new(DocumentStore::new()),
                Arc::from(provider),
            )
            .await?;
        }
    }

    Ok(())
}
