//! Shared test doubles for pipeline tests.

use async_trait::async_trait;
use kgrag_core::error::{GraphError, ProviderError};
use kgrag_core::graph::{EntityLookup, ScoredEntity};
use kgrag_core::message::Message;
use kgrag_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use std::sync::Mutex;
use std::time::Duration;

/// A mock provider that returns a sequence of scripted responses.
///
/// Each call to `complete` returns the next response in the queue and
/// records the prompt it was sent. Panics if more calls are made than
/// responses provided.
pub struct SequentialMockProvider {
    responses: Mutex<Vec<ProviderResponse>>,
    call_count: Mutex<usize>,
    prompts: Mutex<Vec<String>>,
}

impl SequentialMockProvider {
    pub fn new(responses: Vec<ProviderResponse>) -> Self {
        Self {
            responses: Mutex::new(responses),
            call_count: Mutex::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn from_texts(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| make_text_response(t)).collect())
    }

    pub fn call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    /// Every prompt sent so far, messages joined by newlines.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for SequentialMockProvider {
    fn name(&self) -> &str {
        "sequential_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut count = self.call_count.lock().unwrap();
        let responses = self.responses.lock().unwrap();

        if *count >= responses.len() {
            panic!(
                "SequentialMockProvider: no more responses (call #{}, have {})",
                *count,
                responses.len()
            );
        }

        self.prompts.lock().unwrap().push(request.prompt_text());
        let response = responses[*count].clone();
        *count += 1;
        Ok(response)
    }
}

/// Create a simple text response.
pub fn make_text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
        metadata: serde_json::Map::new(),
    }
}

/// Always fails with a server error.
pub struct FailingProvider;

#[async_trait]
impl Provider for FailingProvider {
    fn name(&self) -> &str {
        "failing"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        Err(ProviderError::ApiError {
            status_code: 500,
            message: "upstream down".into(),
        })
    }
}

/// Answers after a fixed delay.
pub struct SlowProvider(pub Duration);

#[async_trait]
impl Provider for SlowProvider {
    fn name(&self) -> &str {
        "slow"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        tokio::time::sleep(self.0).await;
        Ok(make_text_response("late"))
    }
}

/// Entity lookup over a fixed ranking, also counting calls.
pub struct RankedLookup {
    ranking: Vec<String>,
    calls: Mutex<usize>,
}

impl RankedLookup {
    pub fn new(ranking: &[&str]) -> Self {
        Self {
            ranking: ranking.iter().map(|s| s.to_string()).collect(),
            calls: Mutex::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl EntityLookup for RankedLookup {
    fn name(&self) -> &str {
        "ranked"
    }

    async fn top_k(&self, _query: &str, top_k: usize) -> Result<Vec<ScoredEntity>, GraphError> {
        *self.calls.lock().unwrap() += 1;
        Ok(self
            .ranking
            .iter()
            .take(top_k)
            .enumerate()
            .map(|(i, name)| ScoredEntity {
                entity_name: name.clone(),
                score: 1.0 / (i as f32 + 1.0),
            })
            .collect())
    }
}
