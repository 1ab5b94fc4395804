//! Completion provider abstraction for the external LLM collaborator.
//!
//! A provider accepts a system instruction and a user prompt and
//! returns a text completion. Concrete implementations:
//! - **[`OpenAiProvider`]** — calls the OpenAI chat completions API
//!   with a bounded timeout and capped exponential-backoff retry.
//! - **[`DisabledProvider`]** — always fails; used when
//!   `llm.provider = "disabled"`.
//!
//! # Retry Strategy
//!
//! - HTTP 429 (rate limited) and 5xx (server error) → retry
//! - HTTP 4xx (client error, not 429) → fail immediately
//! - Network errors and timeouts → retry
//! - Backoff: 1s, 2s, 4s, ... (capped at 2^5)
//!
//! The completion call is read-only, so retries cannot duplicate side
//! effects.

use std::time::Duration;

use async_trait::async_trait;

use crate::config::LlmConfig;
use crate::error::Error;

#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Runs one completion round-trip. All transport, credential, and
    /// upstream-response failures surface as [`Error::ExternalService`].
    async fn complete(&self, system: &str, user: &str) -> Result<String, Error>;

    /// Returns the model identifier (e.g. `"gpt-4o-mini"`).
    fn model_name(&self) -> &str;
}

/// A no-op provider that always returns errors.
pub struct DisabledProvider;

#[async_trait]
impl CompletionProvider for DisabledProvider {
    async fn complete(&self, _system: &str, _user: &str) -> Result<String, Error> {
        Err(Error::ExternalService(
            "completion provider is disabled; set llm.provider in config".to_string(),
        ))
    }

    fn model_name(&self) -> &str {
        "disabled"
    }
}

/// Completion provider backed by the OpenAI chat completions API.
///
/// The API key is read from `OPENAI_API_KEY` at construction; a missing
/// key is reported on the first call rather than at startup, so the
/// service still boots and queries get a labeled error answer instead.
pub struct OpenAiProvider {
    client: reqwest::Client,
    api_key: Option<String>,
    model: String,
    max_retries: u32,
}

impl OpenAiProvider {
    pub fn new(config: &LlmConfig) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::ExternalService(e.to_string()))?;
        Ok(Self {
            client,
            api_key: std::env::var("OPENAI_API_KEY").ok(),
            model: config.model.clone(),
            max_retries: config.max_retries,
        })
    }
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    async fn complete(&self, system: &str, user: &str) -> Result<String, Error> {
        let api_key = self.api_key.as_ref().ok_or_else(|| {
            Error::ExternalService("OPENAI_API_KEY environment variable not set".to_string())
        })?;

        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": user},
            ],
            "temperature": 0.1,
            "max_tokens": 300,
        });

        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s, ...
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                tokio::time::sleep(delay).await;
            }

            let resp = self
                .client
                .post("https://api.openai.com/v1/chat/completions")
                .header("Authorization", format!("Bearer {}", api_key))
                .json(&body)
                .send()
                .await;

            match resp {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let json: serde_json::Value = response
                            .json()
                            .await
                            .map_err(|e| Error::ExternalService(e.to_string()))?;
                        return parse_completion(&json);
                    }

                    // Rate limited or server error — retry
                    if status.as_u16() == 429 || status.is_server_error() {
                        let body_text = response.text().await.unwrap_or_default();
                        last_err = Some(Error::ExternalService(format!(
                            "completion API error {}: {}",
                            status, body_text
                        )));
                        continue;
                    }

                    // Client error (not 429) — don't retry
                    let body_text = response.text().await.unwrap_or_default();
                    return Err(Error::ExternalService(format!(
                        "completion API error {}: {}",
                        status, body_text
                    )));
                }
                Err(e) => {
                    last_err = Some(Error::ExternalService(e.to_string()));
                    continue;
                }
            }
        }

        Err(last_err.unwrap_or_else(|| {
            Error::ExternalService("completion failed after retries".to_string())
        }))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Pulls `choices[0].message.content` out of a chat completions
/// response. A malformed response becomes an error, never a panic.
fn parse_completion(json: &serde_json::Value) -> Result<String, Error> {
    json.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|t| t.as_str())
        .map(str::to_string)
        .ok_or_else(|| {
            Error::ExternalService(
                "malformed completion response: missing choices[0].message.content".to_string(),
            )
        })
}

/// Create the appropriate [`CompletionProvider`] based on configuration.
pub fn create_provider(config: &LlmConfig) -> Result<Box<dyn CompletionProvider>, Error> {
    match config.provider.as_str() {
        "disabled" => Ok(Box::new(DisabledProvider)),
        "openai" => Ok(Box::new(OpenAiProvider::new(config)?)),
        other => Err(Error::ExternalService(format!(
            "unknown completion provider: {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_completion() {
        let json = serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": "The answer."}}]
        });
        assert_eq!(parse_completion(&json).unwrap(), "The answer.");
    }

    #[test]
    fn parse_malformed_completion_is_an_error() {
        for json in [
            serde_json::json!({}),
            serde_json::json!({"choices": []}),
            serde_json::json!({"choices": [{"message": {}}]}),
            serde_json::json!({"choices": [{"message": {"content": 42}}]}),
        ] {
            assert!(matches!(
                parse_completion(&json),
                Err(Error::ExternalService(_))
            ));
        }
    }

    #[tokio::test]
    async fn disabled_provider_always_fails() {
        let err = DisabledProvider.complete("sys", "user").await.unwrap_err();
        assert!(matches!(err, Error::ExternalService(_)));
    }
}
