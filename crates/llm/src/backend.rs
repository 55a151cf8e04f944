//! LLM Backend implementations
//!
//! The [`LlmBackend`] trait plus the local Ollama chat backend.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use claritas_config::constants::{endpoints, models, timeouts};

use crate::prompt::Message;
use crate::LlmError;

/// LLM configuration
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Model name/ID
    pub model: String,
    /// API endpoint
    pub endpoint: String,
    /// TCP connect deadline
    pub connect_timeout: Duration,
    /// Whole-request deadline
    pub timeout: Duration,
    /// Retry attempts for transient failures
    pub max_retries: u32,
    /// Initial backoff duration (doubles each retry)
    pub initial_backoff: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: models::OLLAMA_CHAT.to_string(),
            endpoint: endpoints::OLLAMA_DEFAULT.to_string(),
            connect_timeout: Duration::from_millis(timeouts::LLM_CONNECT_MS),
            timeout: Duration::from_millis(timeouts::LLM_REQUEST_MS),
            max_retries: 0,
            initial_backoff: Duration::from_millis(200),
        }
    }
}

/// LLM generation result
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationResult {
    /// Generated text, trimmed
    pub text: String,
    /// Total generation time (ms)
    pub total_time_ms: u64,
    /// Model that produced the text
    pub model: String,
}

/// LLM Backend trait
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Generate a single non-streaming reply
    async fn generate(
        &self,
        messages: &[Message],
        temperature: f32,
    ) -> Result<GenerationResult, LlmError>;

    /// Check if the backend can currently serve requests
    async fn is_available(&self) -> bool;

    /// Get model name
    fn model_name(&self) -> &str;
}

/// Build an HTTP client with both deadlines applied
pub(crate) fn http_client(connect_timeout: Duration, timeout: Duration) -> Result<Client, LlmError> {
    Client::builder()
        .connect_timeout(connect_timeout)
        .timeout(timeout)
        .build()
        .map_err(|e| LlmError::Configuration(format!("Failed to create HTTP client: {}", e)))
}

/// Ollama chat backend (`POST /api/chat`, non-streaming)
#[derive(Clone)]
pub struct OllamaBackend {
    client: Client,
    config: LlmConfig,
}

impl OllamaBackend {
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let client = http_client(config.connect_timeout, config.timeout)?;
        Ok(Self { client, config })
    }

    /// Build the API URL
    fn api_url(&self, path: &str) -> String {
        format!("{}/api{}", self.config.endpoint.trim_end_matches('/'), path)
    }

    /// Execute a single request (used by retry logic)
    async fn execute_request(
        &self,
        request: &OllamaChatRequest,
    ) -> Result<OllamaChatResponse, LlmError> {
        let response = self
            .client
            .post(self.api_url("/chat"))
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error = response.text().await.unwrap_or_default();
            // 5xx errors are retryable, 4xx are not
            if status.is_server_error() {
                return Err(LlmError::Network(format!("Server error {}: {}", status, error)));
            }
            return Err(LlmError::Api(format!("{}: {}", status, error)));
        }

        response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))
    }

    fn is_retryable(error: &LlmError) -> bool {
        matches!(error, LlmError::Network(_) | LlmError::Timeout)
    }
}

#[async_trait]
impl LlmBackend for OllamaBackend {
    async fn generate(
        &self,
        messages: &[Message],
        temperature: f32,
    ) -> Result<GenerationResult, LlmError> {
        let start = Instant::now();

        let request = OllamaChatRequest {
            model: self.config.model.clone(),
            messages: messages.iter().map(OllamaMessage::from).collect(),
            stream: false,
            options: OllamaOptions {
                temperature: Some(temperature),
            },
        };

        let mut last_error = None;
        let mut backoff = self.config.initial_backoff;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                tracing::warn!(
                    "LLM request failed, retrying in {:?} (attempt {}/{})",
                    backoff,
                    attempt,
                    self.config.max_retries
                );
                tokio::time::sleep(backoff).await;
                backoff *= 2;
            }

            match self.execute_request(&request).await {
                Ok(result) => {
                    return Ok(GenerationResult {
                        text: result.message.content.trim().to_string(),
                        total_time_ms: start.elapsed().as_millis() as u64,
                        model: self.config.model.clone(),
                    });
                },
                Err(e) if Self::is_retryable(&e) => {
                    last_error = Some(e);
                },
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| LlmError::Network("Max retries exceeded".to_string())))
    }

    async fn is_available(&self) -> bool {
        self.client
            .get(self.api_url("/tags"))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

// Ollama API types
#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    content: String,
}

impl From<&Message> for OllamaMessage {
    fn from(msg: &Message) -> Self {
        Self {
            role: msg.role.to_string(),
            content: msg.content.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: OllamaMessage,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = LlmConfig::default();
        assert_eq!(config.model, "mistral-ctx:latest");
        assert_eq!(config.timeout, Duration::from_secs(180));
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_request_serialization() {
        let request = OllamaChatRequest {
            model: "m".to_string(),
            messages: vec![
                OllamaMessage::from(&Message::system("sys")),
                OllamaMessage::from(&Message::user("hi")),
            ],
            stream: false,
            options: OllamaOptions {
                temperature: Some(0.0),
            },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "hi");
        assert_eq!(json["stream"], false);
        assert_eq!(json["options"]["temperature"], 0.0);
    }

    #[test]
    fn test_response_parsing() {
        let body = r#"{"model":"m","message":{"role":"assistant","content":" {\"book\":\"Life Eternal\"} "},"done":true}"#;
        let parsed: OllamaChatResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.message.content.trim(), r#"{"book":"Life Eternal"}"#);
    }

    #[tokio::test]
    async fn test_unreachable_server() {
        let backend = OllamaBackend::new(LlmConfig {
            endpoint: "http://127.0.0.1:9".to_string(),
            connect_timeout: Duration::from_millis(200),
            timeout: Duration::from_millis(500),
            ..LlmConfig::default()
        })
        .unwrap();

        assert!(!backend.is_available().await);
        let err = backend.generate(&[Message::user("hi")], 0.0).await.unwrap_err();
        assert!(err.is_unavailable());
    }
}
