//! Language-model seam and the Ollama production client.
//!
//! The engine only ever needs one capability from the model: turn a prompt
//! into completion text. Everything else (endpoint, retries, timeouts) stays
//! behind `LanguageModel`, which keeps fusion and risk assessment pure and
//! lets tests substitute a deterministic stub.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::OllamaConfig;

/// Number of retry attempts for transient failures.
const MAX_RETRIES: u32 = 2;

/// Initial backoff delay for retries.
const INITIAL_BACKOFF_MS: u64 = 500;

/// Maximum backoff delay.
const MAX_BACKOFF_MS: u64 = 4000;

/// Errors from the language-model service. The classifier treats every
/// variant as a fail-soft condition; none of them abort a turn.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Invalid model endpoint '{url}': {reason}")]
    InvalidEndpoint { url: String, reason: String },
    #[error("Model request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Model HTTP error {status}: {body}")]
    Http { status: u16, body: String },
    #[error("Model returned an empty completion")]
    EmptyCompletion,
}

/// Narrow text-completion capability consumed by the classifier.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Complete `prompt`, returning the raw model text.
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    models: Vec<TagEntry>,
}

#[derive(Debug, Deserialize)]
struct TagEntry {
    name: String,
}

/// Result of a connectivity probe against the model server.
#[derive(Debug, Clone)]
pub struct LlmStatus {
    pub connected: bool,
    pub available_models: Vec<String>,
    pub error: Option<String>,
}

/// Ollama `/api/generate` client.
#[derive(Debug)]
pub struct OllamaClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

/// Transient network issues and server-side errors are retryable.
fn is_retryable_error(err: &reqwest::Error) -> bool {
    if err.is_connect() || err.is_timeout() {
        return true;
    }
    if let Some(status) = err.status() {
        return status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS;
    }
    false
}

fn is_retryable_status(status: reqwest::StatusCode) -> bool {
    status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS
}

/// Exponential backoff, capped.
fn calculate_backoff(attempt: u32) -> Duration {
    let delay = INITIAL_BACKOFF_MS.saturating_mul(2u64.saturating_pow(attempt));
    Duration::from_millis(delay.min(MAX_BACKOFF_MS))
}

impl OllamaClient {
    /// Create a client from config, validating the endpoint URL up front.
    pub fn new(config: &OllamaConfig) -> Result<Self, LlmError> {
        let cleaned_url = config.host.trim_end_matches('/').to_string();

        let parsed =
            reqwest::Url::parse(&cleaned_url).map_err(|e| LlmError::InvalidEndpoint {
                url: cleaned_url.clone(),
                reason: e.to_string(),
            })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(LlmError::InvalidEndpoint {
                url: cleaned_url,
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }

        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        info!("OllamaClient created for {} ({})", cleaned_url, config.model);

        Ok(Self {
            client,
            base_url: cleaned_url,
            model: config.model.clone(),
        })
    }

    async fn generate_once(&self, prompt: &str) -> Result<String, LlmError> {
        let url = format!("{}/api/generate", self.base_url);
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
        };

        let response = self.client.post(&url).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let truncated: String = body.chars().take(200).collect();
            return Err(LlmError::Http {
                status: status.as_u16(),
                body: truncated,
            });
        }

        let parsed: GenerateResponse = response.json().await?;
        if parsed.response.trim().is_empty() {
            return Err(LlmError::EmptyCompletion);
        }
        Ok(parsed.response)
    }

    async fn list_models(&self) -> Result<Vec<String>, LlmError> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let truncated: String = body.chars().take(200).collect();
            return Err(LlmError::Http {
                status: status.as_u16(),
                body: truncated,
            });
        }

        let parsed: TagsResponse = response.json().await?;
        Ok(parsed.models.into_iter().map(|m| m.name).collect())
    }

    /// Check connection status and list available models.
    pub async fn check_status(&self) -> LlmStatus {
        match self.list_models().await {
            Ok(models) => LlmStatus {
                connected: true,
                available_models: models,
                error: None,
            },
            Err(e) => LlmStatus {
                connected: false,
                available_models: vec![],
                error: Some(e.to_string()),
            },
        }
    }
}

#[async_trait]
impl LanguageModel for OllamaClient {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let mut attempt = 0;
        loop {
            match self.generate_once(prompt).await {
                Ok(text) => {
                    debug!("Ollama completion: {} chars", text.len());
                    return Ok(text);
                }
                Err(e) if attempt < MAX_RETRIES && is_transient(&e) => {
                    let backoff = calculate_backoff(attempt);
                    warn!(
                        "Ollama request failed (attempt {}): {}. Retrying in {:?}",
                        attempt + 1,
                        e,
                        backoff
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

fn is_transient(err: &LlmError) -> bool {
    match err {
        LlmError::Request(e) => is_retryable_error(e),
        LlmError::Http { status, .. } => reqwest::StatusCode::from_u16(*status)
            .map(is_retryable_status)
            .unwrap_or(false),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_http_endpoint() {
        let config = OllamaConfig {
            host: "ftp://localhost:11434".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            OllamaClient::new(&config),
            Err(LlmError::InvalidEndpoint { .. })
        ));
    }

    #[test]
    fn test_rejects_unparsable_endpoint() {
        let config = OllamaConfig {
            host: "not a url".to_string(),
            ..Default::default()
        };
        assert!(OllamaClient::new(&config).is_err());
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let config = OllamaConfig {
            host: "http://localhost:11434/".to_string(),
            ..Default::default()
        };
        let client = OllamaClient::new(&config).unwrap();
        assert_eq!(client.base_url, "http://localhost:11434");
    }

    #[test]
    fn test_backoff_grows_and_caps() {
        assert_eq!(calculate_backoff(0), Duration::from_millis(500));
        assert_eq!(calculate_backoff(1), Duration::from_millis(1000));
        assert_eq!(calculate_backoff(10), Duration::from_millis(MAX_BACKOFF_MS));
    }

    #[test]
    fn test_http_5xx_is_transient() {
        let err = LlmError::Http {
            status: 503,
            body: String::new(),
        };
        assert!(is_transient(&err));
        let err = LlmError::Http {
            status: 404,
            body: String::new(),
        };
        assert!(!is_transient(&err));
    }

    #[test]
    fn test_empty_completion_is_not_transient() {
        assert!(!is_transient(&LlmError::EmptyCompletion));
    }
}
