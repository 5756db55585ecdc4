//! The generation client used by every pipeline stage.
//!
//! Wraps a [`Provider`] with the model settings resolved at construction and
//! a caller deadline per call. Failures and deadline overruns are returned as
//! [`QueryError`]s and never retried here.

use crate::error::QueryError;
use kgrag_config::AppConfig;
use kgrag_core::message::Message;
use kgrag_core::provider::{Provider, ProviderRequest};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Clone)]
pub struct Generator {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    timeout: Duration,
}

impl Generator {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.0,
            max_tokens: None,
            timeout: Duration::from_secs(120),
        }
    }

    /// Build from the `default_*` and `request_timeout_secs` settings.
    pub fn from_config(provider: Arc<dyn Provider>, config: &AppConfig) -> Self {
        Self::new(provider, config.default_model.clone())
            .with_temperature(config.default_temperature)
            .with_max_tokens(config.default_max_tokens)
            .with_timeout(Duration::from_secs(config.request_timeout_secs))
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Send a single user prompt.
    pub async fn ask(&self, prompt: impl Into<String>) -> Result<String, QueryError> {
        self.chat(vec![Message::user(prompt)]).await
    }

    /// Send a message list and return the response text verbatim.
    pub async fn chat(&self, messages: Vec<Message>) -> Result<String, QueryError> {
        let request = ProviderRequest {
            model: self.model.clone(),
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            stop: Vec::new(),
        };

        debug!(
            provider = self.provider.name(),
            model = %self.model,
            prompt_chars = request.prompt_text().len(),
            "Generation call"
        );

        match tokio::time::timeout(self.timeout, self.provider.complete(request)).await {
            Ok(Ok(response)) => Ok(response.message.content),
            Ok(Err(e)) => {
                warn!(provider = self.provider.name(), error = %e, "Generation call failed");
                Err(QueryError::Upstream(e))
            }
            Err(_) => {
                warn!(
                    provider = self.provider.name(),
                    secs = self.timeout.as_secs(),
                    "Generation call timed out"
                );
                Err(QueryError::Timeout {
                    secs: self.timeout.as_secs(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{FailingProvider, SequentialMockProvider, SlowProvider};

    #[tokio::test]
    async fn returns_response_text() {
        let provider = Arc::new(SequentialMockProvider::from_texts(&["Paris"]));
        let generator = Generator::new(provider.clone(), "gpt-3.5-turbo-0125");
        assert_eq!(generator.ask("capital of France?").await.unwrap(), "Paris");
        assert_eq!(provider.call_count(), 1);
        assert_eq!(provider.prompts()[0], "capital of France?");
    }

    #[tokio::test]
    async fn upstream_errors_propagate() {
        let generator = Generator::new(Arc::new(FailingProvider), "m");
        let err = generator.ask("q").await.unwrap_err();
        assert!(matches!(err, QueryError::Upstream(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_is_a_hard_failure() {
        let generator = Generator::new(Arc::new(SlowProvider(Duration::from_secs(60))), "m")
            .with_timeout(Duration::from_secs(2));
        let err = generator.ask("q").await.unwrap_err();
        assert!(matches!(err, QueryError::Timeout { secs: 2 }));
    }

    #[test]
    fn from_config_uses_defaults() {
        let config = AppConfig::default();
        let generator = Generator::from_config(Arc::new(FailingProvider), &config);
        assert_eq!(generator.model(), "gpt-3.5-turbo-0125");
        assert_eq!(generator.max_tokens, Some(1024));
        assert_eq!(generator.timeout, Duration::from_secs(120));
        assert_eq!(generator.provider_name(), "failing");
    }
}
