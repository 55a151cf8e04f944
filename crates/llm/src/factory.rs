//! LLM Factory
//!
//! Turns the configured [`BackendPolicy`] into a single backend handle.
//! Callers receive the handle at construction and never consult the
//! policy again.

use std::sync::Arc;

use async_trait::async_trait;

use claritas_config::{BackendPolicy, LlmSettings};

use crate::backend::{GenerationResult, LlmBackend, LlmConfig, OllamaBackend};
use crate::gemini::{GeminiBackend, GeminiConfig};
use crate::prompt::Message;
use crate::LlmError;

pub struct LlmFactory;

impl LlmFactory {
    /// Create the backend selected by `settings.backend`
    pub fn create(settings: &LlmSettings) -> Result<Arc<dyn LlmBackend>, LlmError> {
        let backend: Arc<dyn LlmBackend> = match settings.backend {
            BackendPolicy::Local => Arc::new(Self::ollama(settings)?),
            BackendPolicy::Gemini => Arc::new(Self::gemini(settings)?),
            BackendPolicy::LocalThenGemini => Arc::new(FailoverBackend::new(
                Arc::new(Self::ollama(settings)?),
                Arc::new(Self::gemini(settings)?),
            )),
        };

        tracing::info!(
            policy = ?settings.backend,
            model = backend.model_name(),
            "LLM backend initialized"
        );

        Ok(backend)
    }

    fn ollama(settings: &LlmSettings) -> Result<OllamaBackend, LlmError> {
        OllamaBackend::new(LlmConfig {
            model: settings.ollama_model.clone(),
            endpoint: settings.ollama_endpoint.clone(),
            connect_timeout: settings.connect_timeout(),
            timeout: settings.request_timeout(),
            max_retries: settings.max_retries,
            ..LlmConfig::default()
        })
    }

    fn gemini(settings: &LlmSettings) -> Result<GeminiBackend, LlmError> {
        GeminiBackend::new(GeminiConfig {
            endpoint: settings.gemini_endpoint.clone(),
            model: settings.gemini_model.clone(),
            api_key: settings.gemini_api_key.clone(),
            connect_timeout: settings.connect_timeout(),
            timeout: settings.request_timeout(),
        })
    }
}

/// Tries `primary`, then `secondary` when the primary fails
pub struct FailoverBackend {
    primary: Arc<dyn LlmBackend>,
    secondary: Arc<dyn LlmBackend>,
}

impl FailoverBackend {
    pub fn new(primary: Arc<dyn LlmBackend>, secondary: Arc<dyn LlmBackend>) -> Self {
        Self { primary, secondary }
    }
}

#[async_trait]
impl LlmBackend for FailoverBackend {
    async fn generate(
        &self,
        messages: &[Message],
        temperature: f32,
    ) -> Result<GenerationResult, LlmError> {
        match self.primary.generate(messages, temperature).await {
            Ok(result) => Ok(result),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    primary = self.primary.model_name(),
                    secondary = self.secondary.model_name(),
                    "Primary LLM failed, falling back"
                );
                self.secondary.generate(messages, temperature).await
            },
        }
    }

    async fn is_available(&self) -> bool {
        self.primary.is_available().await || self.secondary.is_available().await
    }

    fn model_name(&self) -> &str {
        self.primary.model_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StaticBackend {
        name: &'static str,
        reply: Option<&'static str>,
        calls: AtomicUsize,
    }

    impl StaticBackend {
        fn new(name: &'static str, reply: Option<&'static str>) -> Arc<Self> {
            Arc::new(Self {
                name,
                reply,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl LlmBackend for StaticBackend {
        async fn generate(&self, _: &[Message], _: f32) -> Result<GenerationResult, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.reply {
                Some(text) => Ok(GenerationResult {
                    text: text.to_string(),
                    total_time_ms: 1,
                    model: self.name.to_string(),
                }),
                None => Err(LlmError::Network("connection refused".to_string())),
            }
        }

        async fn is_available(&self) -> bool {
            self.reply.is_some()
        }

        fn model_name(&self) -> &str {
            self.name
        }
    }

    #[tokio::test]
    async fn test_failover_uses_secondary_on_error() {
        let primary = StaticBackend::new("local", None);
        let secondary = StaticBackend::new("gemini", Some("from gemini"));
        let backend = FailoverBackend::new(primary.clone(), secondary.clone());

        let result = backend.generate(&[Message::user("q")], 0.0).await.unwrap();
        assert_eq!(result.text, "from gemini");
        assert_eq!(primary.calls.load(Ordering::SeqCst), 1);
        assert_eq!(secondary.calls.load(Ordering::SeqCst), 1);
        assert!(backend.is_available().await);
    }

    #[tokio::test]
    async fn test_failover_skips_secondary_on_success() {
        let primary = StaticBackend::new("local", Some("from local"));
        let secondary = StaticBackend::new("gemini", Some("from gemini"));
        let backend = FailoverBackend::new(primary, secondary.clone());

        let result = backend.generate(&[Message::user("q")], 0.0).await.unwrap();
        assert_eq!(result.text, "from local");
        assert_eq!(secondary.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failover_both_fail() {
        let backend = FailoverBackend::new(
            StaticBackend::new("local", None),
            StaticBackend::new("gemini", None),
        );
        assert!(backend.generate(&[Message::user("q")], 0.0).await.is_err());
        assert!(!backend.is_available().await);
    }

    #[test]
    fn test_factory_policies() {
        let settings = LlmSettings::default();
        assert_eq!(
            LlmFactory::create(&settings).unwrap().model_name(),
            "mistral-ctx:latest"
        );

        let settings = LlmSettings {
            backend: BackendPolicy::Gemini,
            ..LlmSettings::default()
        };
        assert_eq!(
            LlmFactory::create(&settings).unwrap().model_name(),
            "models/gemini-2.0-flash"
        );

        let settings = LlmSettings {
            backend: BackendPolicy::LocalThenGemini,
            ..LlmSettings::default()
        };
        assert_eq!(
            LlmFactory::create(&settings).unwrap().model_name(),
            "mistral-ctx:latest"
        );
    }
}
