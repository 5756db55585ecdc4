//! Query engine: runs one query end to end.
//!
//! 1. Assemble evidence with the configured strategy
//! 2. Empty evidence → return [`FAIL_RESPONSE`] with no generation call
//! 3. Otherwise send the strategy's answer messages to the generator

use crate::assembler::{self, ContextAssembler, GraphServices, PipelineSettings};
use crate::budget::token::TokenCounter;
use crate::error::QueryError;
use crate::generator::Generator;
use crate::metadata::ContextMetadata;
use crate::prompts::{self, FAIL_RESPONSE};
use kgrag_config::AppConfig;
use kgrag_core::provider::Provider;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::info;

/// Wall-clock timings for one query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryTimings {
    /// Time spent assembling evidence, including ranking calls.
    pub retrieval_ms: u64,
    /// Time until the answer was available.
    pub total_ms: u64,
}

/// The answer to one query and how it was produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryOutcome {
    pub query: String,
    pub answer: String,
    /// The context sent to the answering call; `None` when evidence was empty.
    pub context: Option<String>,
    pub metadata: ContextMetadata,
    pub timings: QueryTimings,
}

impl QueryOutcome {
    /// True when no evidence was found and the fixed fallback was returned.
    pub fn short_circuited(&self) -> bool {
        self.context.is_none()
    }
}

pub struct QueryEngine {
    assembler: Arc<dyn ContextAssembler>,
    generator: Generator,
    counter: TokenCounter,
}

impl QueryEngine {
    pub fn new(assembler: Arc<dyn ContextAssembler>, generator: Generator) -> Self {
        let counter = TokenCounter::for_model(generator.model());
        Self {
            assembler,
            generator,
            counter,
        }
    }

    /// Resolve the strategy, model settings and budgets from configuration.
    pub fn from_config(
        config: &AppConfig,
        provider: Arc<dyn Provider>,
        services: GraphServices,
    ) -> Self {
        let generator = Generator::from_config(provider, config);
        let settings = PipelineSettings::from_config(config);
        let assembler = assembler::from_mode(config.query.mode, services, generator.clone(), settings);
        info!(
            strategy = assembler.name(),
            provider = generator.provider_name(),
            model = generator.model(),
            "Query engine ready"
        );
        Self::new(assembler, generator)
    }

    pub fn strategy(&self) -> &str {
        self.assembler.name()
    }

    pub fn model(&self) -> &str {
        self.generator.model()
    }

    pub async fn query(&self, query: &str) -> Result<QueryOutcome, QueryError> {
        let start = Instant::now();
        let assembled = self.assembler.assemble(query).await?;
        let retrieval_ms = start.elapsed().as_millis() as u64;
        info!(strategy = self.strategy(), retrieval_ms, "Evidence retrieved");

        let Some(context) = assembled.evidence.as_context().map(str::to_string) else {
            info!(strategy = self.strategy(), "Empty evidence, returning fallback");
            return Ok(QueryOutcome {
                query: query.to_string(),
                answer: FAIL_RESPONSE.to_string(),
                context: None,
                metadata: assembled.metadata,
                timings: QueryTimings {
                    retrieval_ms,
                    total_ms: start.elapsed().as_millis() as u64,
                },
            });
        };

        let answer = self
            .generator
            .chat(self.assembler.answer_messages(query, &context))
            .await?;
        let total_ms = start.elapsed().as_millis() as u64;

        info!(
            strategy = self.strategy(),
            total_ms,
            context_tokens = self.counter.count(&context),
            "Query answered"
        );

        Ok(QueryOutcome {
            query: query.to_string(),
            answer,
            context: Some(context),
            metadata: assembled.metadata,
            timings: QueryTimings {
                retrieval_ms,
                total_ms,
            },
        })
    }

    /// Answer over caller-supplied context entries, numbered from 1.
    ///
    /// Missing or empty context returns [`FAIL_RESPONSE`] without a call.
    pub async fn generation_qa(
        &self,
        query: &str,
        context: Option<&[String]>,
    ) -> Result<String, QueryError> {
        let Some(entries) = context.filter(|c| !c.is_empty()) else {
            return Ok(FAIL_RESPONSE.to_string());
        };
        let numbered = prompts::numbered(entries);
        self.generator
            .chat(self.assembler.answer_messages(query, &numbered))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{FailingProvider, RankedLookup, SequentialMockProvider};
    use kgrag_config::QueryMode;
    use kgrag_graph::KnowledgeGraph;

    fn services(ranking: &[&str]) -> GraphServices {
        let graph = Arc::new(KnowledgeGraph::from_triples([
            ("Paris", "capitalOf", "France"),
            ("France", "continent", "Europe"),
        ]));
        GraphServices {
            entities: Arc::new(RankedLookup::new(ranking)),
            graph: graph.clone(),
            relations: graph,
        }
    }

    fn config(mode: QueryMode) -> AppConfig {
        let mut config = AppConfig::default();
        config.query.mode = mode;
        config.query.top_k_entity = 1;
        config
    }

    #[tokio::test]
    async fn cross_set_query_answers_with_candidates() {
        let provider = Arc::new(SequentialMockProvider::from_texts(&[
            "answer1:\"France\", answer2:\"Europe\"",
        ]));
        let engine = QueryEngine::from_config(
            &config(QueryMode::CrossSet),
            provider.clone(),
            services(&["Paris"]),
        );
        assert_eq!(engine.strategy(), "cross_set");

        let outcome = engine.query("Paris is the capital of?").await.unwrap();
        assert_eq!(outcome.answer, "answer1:\"France\", answer2:\"Europe\"");
        assert_eq!(outcome.context.as_deref(), Some("Paris capitalOf France, "));
        assert!(!outcome.short_circuited());
        assert_eq!(provider.call_count(), 1);
        assert!(provider.prompts()[0].starts_with(prompts::CROSS_SET_SYSTEM));
    }

    #[tokio::test]
    async fn empty_evidence_short_circuits_without_generation() {
        let engine = QueryEngine::from_config(
            &config(QueryMode::CrossSet),
            Arc::new(FailingProvider),
            services(&[]),
        );
        let outcome = engine.query("anything").await.unwrap();
        assert_eq!(outcome.answer, FAIL_RESPONSE);
        assert!(outcome.short_circuited());
    }

    #[tokio::test]
    async fn path_rerank_mode_is_selected() {
        let engine = QueryEngine::from_config(
            &config(QueryMode::PathRerank),
            Arc::new(FailingProvider),
            services(&["Paris"]),
        );
        assert_eq!(engine.strategy(), "path_rerank");
        let err = engine.query("q").await.unwrap_err();
        assert!(matches!(err, QueryError::Upstream(_)));
    }

    #[tokio::test]
    async fn generation_qa_numbers_context() {
        let provider = Arc::new(SequentialMockProvider::from_texts(&["France"]));
        let engine = QueryEngine::from_config(
            &config(QueryMode::PathRerank),
            provider.clone(),
            services(&[]),
        );
        let answer = engine
            .generation_qa(
                "Paris is the capital of?",
                Some(&["Paris capitalOf France".to_string(), "France continent Europe".to_string()]),
            )
            .await
            .unwrap();
        assert_eq!(answer, "France");
        assert!(provider.prompts()[0].contains("1: Paris capitalOf France\n2: France continent Europe"));
    }

    #[tokio::test]
    async fn generation_qa_without_context_fails_fast() {
        let engine = QueryEngine::from_config(
            &config(QueryMode::PathRerank),
            Arc::new(FailingProvider),
            services(&[]),
        );
        assert_eq!(engine.generation_qa("q", None).await.unwrap(), FAIL_RESPONSE);
        assert_eq!(engine.generation_qa("q", Some(&[])).await.unwrap(), FAIL_RESPONSE);
    }
}
