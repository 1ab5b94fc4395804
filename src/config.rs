//! TOML configuration parsing and validation.
//!
//! Every section is optional and every field has a default, so an
//! empty (or absent) config file yields a usable service. The single
//! config-driven entry point replaces ad-hoc per-deployment bootstrap
//! variants: chunk size, overlap, result count, relevance threshold,
//! retrieval mode, and the completion provider are all set here.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub llm: LlmConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct UploadConfig {
    /// Hard cap on uploaded file size in bytes.
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: default_max_file_bytes(),
        }
    }
}

fn default_max_file_bytes() -> usize {
    10 * 1024 * 1024
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    /// Target maximum chunk size in characters.
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,
    /// Characters of the previous chunk carried into the next one.
    #[serde(default = "default_overlap_chars")]
    pub overlap_chars: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chars: default_max_chars(),
            overlap_chars: default_overlap_chars(),
        }
    }
}

fn default_max_chars() -> usize {
    1000
}

fn default_overlap_chars() -> usize {
    200
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    /// `lexical` is the only mode this build supports; `semantic` is
    /// recognized and rejected with a pointer at the reason.
    #[serde(default = "default_mode")]
    pub mode: String,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Chunks scoring at or below this are discarded.
    #[serde(default = "default_min_score")]
    pub min_score: f64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            top_k: default_top_k(),
            min_score: default_min_score(),
        }
    }
}

fn default_mode() -> String {
    "lexical".to_string()
}

fn default_top_k() -> usize {
    3
}

fn default_min_score() -> f64 {
    0.1
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    /// `openai` or `disabled`.
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Bound on the completion round-trip, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

fn default_provider() -> String {
    "openai".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    validate(&config)?;

    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.chunking.max_chars == 0 {
        anyhow::bail!("chunking.max_chars must be > 0");
    }
    if config.chunking.overlap_chars >= config.chunking.max_chars {
        anyhow::bail!("chunking.overlap_chars must be smaller than chunking.max_chars");
    }

    if config.retrieval.top_k < 1 {
        anyhow::bail!("retrieval.top_k must be >= 1");
    }
    if !(0.0..1.0).contains(&config.retrieval.min_score) {
        anyhow::bail!("retrieval.min_score must be in [0.0, 1.0)");
    }
    match config.retrieval.mode.as_str() {
        "lexical" => {}
        "semantic" => anyhow::bail!(
            "retrieval.mode 'semantic' requires an embedding backend, \
             which this build does not include; use 'lexical'"
        ),
        other => anyhow::bail!(
            "Unknown retrieval.mode: '{}'. Must be lexical or semantic.",
            other
        ),
    }

    if config.upload.max_file_bytes == 0 {
        anyhow::bail!("upload.max_file_bytes must be > 0");
    }

    match config.llm.provider.as_str() {
        "openai" | "disabled" => {}
        other => anyhow::bail!(
            "Unknown llm.provider: '{}'. Must be openai or disabled.",
            other
        ),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn load_from_str(toml_text: &str) -> Result<Config> {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(toml_text.as_bytes()).unwrap();
        load_config(file.path())
    }

    #[test]
    fn empty_file_yields_defaults() {
        let cfg = load_from_str("").unwrap();
        assert_eq!(cfg.server.bind, "127.0.0.1:8080");
        assert_eq!(cfg.chunking.max_chars, 1000);
        assert_eq!(cfg.chunking.overlap_chars, 200);
        assert_eq!(cfg.retrieval.mode, "lexical");
        assert_eq!(cfg.retrieval.top_k, 3);
        assert!((cfg.retrieval.min_score - 0.1).abs() < 1e-9);
        assert_eq!(cfg.llm.provider, "openai");
        assert_eq!(cfg.llm.model, "gpt-4o-mini");
    }

    #[test]
    fn sections_override_defaults() {
        let cfg = load_from_str(
            r#"
            [chunking]
            max_chars = 500
            overlap_chars = 50

            [retrieval]
            top_k = 5
            min_score = 0.2

            [llm]
            provider = "disabled"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.chunking.max_chars, 500);
        assert_eq!(cfg.chunking.overlap_chars, 50);
        assert_eq!(cfg.retrieval.top_k, 5);
        assert_eq!(cfg.llm.provider, "disabled");
    }

    #[test]
    fn overlap_must_be_smaller_than_max() {
        let err = load_from_str(
            r#"
            [chunking]
            max_chars = 100
            overlap_chars = 100
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("overlap_chars"));
    }

    #[test]
    fn semantic_mode_is_recognized_but_rejected() {
        let err = load_from_str(
            r#"
            [retrieval]
            mode = "semantic"
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("embedding backend"));
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let err = load_from_str(
            r#"
            [llm]
            provider = "mystery"
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("llm.provider"));
    }

    #[test]
    fn out_of_range_min_score_is_rejected() {
        let err = load_from_str(
            r#"
            [retrieval]
            min_score = 1.0
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("min_score"));
    }
}
