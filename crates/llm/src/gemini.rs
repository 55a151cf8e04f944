//! Gemini Backend
//!
//! Calls `POST {endpoint}/v1beta/{model}:generateContent?key=...`. System
//! messages go to `systemInstruction`, everything else to `contents`.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use claritas_config::constants::{endpoints, models, timeouts};

use crate::backend::{http_client, GenerationResult, LlmBackend};
use crate::prompt::{Message, Role};
use crate::LlmError;

/// Configuration for Gemini backend
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub endpoint: String,
    /// Model resource name, e.g. `models/gemini-2.0-flash`
    pub model: String,
    pub api_key: Option<String>,
    pub connect_timeout: Duration,
    pub timeout: Duration,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            endpoint: endpoints::GEMINI_DEFAULT.to_string(),
            model: models::GEMINI_CHAT.to_string(),
            api_key: None,
            connect_timeout: Duration::from_millis(timeouts::LLM_CONNECT_MS),
            timeout: Duration::from_millis(timeouts::LLM_REQUEST_MS),
        }
    }
}

pub struct GeminiBackend {
    client: Client,
    config: GeminiConfig,
}

impl GeminiBackend {
    pub fn new(config: GeminiConfig) -> Result<Self, LlmError> {
        let client = http_client(config.connect_timeout, config.timeout)?;
        Ok(Self { client, config })
    }

    fn generate_url(&self) -> String {
        let model = if self.config.model.starts_with("models/") {
            self.config.model.clone()
        } else {
            format!("models/{}", self.config.model)
        };
        format!(
            "{}/v1beta/{}:generateContent",
            self.config.endpoint.trim_end_matches('/'),
            model
        )
    }

    fn build_request(messages: &[Message], temperature: f32) -> GeminiRequest {
        let system: Vec<GeminiPart> = messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| GeminiPart {
                text: m.content.clone(),
            })
            .collect();

        let contents = messages
            .iter()
            .filter(|m| m.role != Role::System)
            .map(|m| GeminiContent {
                role: Some(match m.role {
                    Role::Assistant => "model".to_string(),
                    _ => "user".to_string(),
                }),
                parts: vec![GeminiPart {
                    text: m.content.clone(),
                }],
            })
            .collect();

        GeminiRequest {
            system_instruction: if system.is_empty() {
                None
            } else {
                Some(GeminiContent {
                    role: None,
                    parts: system,
                })
            },
            contents,
            generation_config: GenerationConfig { temperature },
        }
    }

    fn extract_text(response: GeminiResponse) -> Result<String, LlmError> {
        let candidate = response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::InvalidResponse("No candidates returned".to_string()))?;

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();

        Ok(text.trim().to_string())
    }
}

#[async_trait]
impl LlmBackend for GeminiBackend {
    async fn generate(
        &self,
        messages: &[Message],
        temperature: f32,
    ) -> Result<GenerationResult, LlmError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| LlmError::Configuration("Gemini API key is not set".to_string()))?;

        let start = Instant::now();
        let response = self
            .client
            .post(self.generate_url())
            .query(&[("key", api_key)])
            .json(&Self::build_request(messages, temperature))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error = response.text().await.unwrap_or_default();
            return Err(LlmError::Api(format!("{}: {}", status, error)));
        }

        let parsed: GeminiResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        Ok(GenerationResult {
            text: Self::extract_text(parsed)?,
            total_time_ms: start.elapsed().as_millis() as u64,
            model: self.config.model.clone(),
        })
    }

    async fn is_available(&self) -> bool {
        self.config.api_key.is_some()
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    contents: Vec<GeminiContent>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}
