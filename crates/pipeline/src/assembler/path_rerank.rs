//! Path-rerank strategy.
//!
//! seeds → simple paths + neighbour facts → one ranking call per collection →
//! one normalization call per ranked block → a reasoning-step call → compiled
//! context → ratio shrink.

use super::{AssembledEvidence, ContextAssembler, Evidence, GraphServices, PipelineSettings};
use crate::budget::shrink::shrink_ratio;
use crate::budget::token::TokenCounter;
use crate::error::QueryError;
use crate::generator::Generator;
use crate::metadata::{ContextMetadata, TrimKind, TrimRecord};
use crate::prompts;
use crate::rerank::{RerankOutcome, Reranker};
use crate::retrieval::seeder::EntitySeeder;
use crate::retrieval::subgraph::SubgraphAssembler;
use async_trait::async_trait;
use kgrag_core::message::Message;
use tracing::{debug, info};

pub struct PathRerankAssembler {
    seeder: EntitySeeder,
    subgraph: SubgraphAssembler,
    reranker: Reranker,
    generator: Generator,
    counter: TokenCounter,
    settings: PipelineSettings,
}

impl PathRerankAssembler {
    pub fn new(services: GraphServices, generator: Generator, settings: PipelineSettings) -> Self {
        let counter = TokenCounter::for_model(generator.model());
        Self {
            seeder: EntitySeeder::new(services.entities, settings.max_seed_rounds),
            subgraph: SubgraphAssembler::new(services.graph),
            reranker: Reranker::new(
                generator.clone(),
                counter.clone(),
                settings.rerank_candidate_cap,
                settings.max_context_tokens,
            ),
            generator,
            counter,
            settings,
        }
    }

    /// Rewrite a ranked block as prose. An empty block stays empty without a call.
    async fn normalize(
        &self,
        ranked: &str,
        metadata: &mut ContextMetadata,
    ) -> Result<String, QueryError> {
        if ranked.trim().is_empty() {
            return Ok(String::new());
        }
        metadata.generation_calls += 1;
        self.generator.ask(prompts::convert(ranked)).await
    }

    fn absorb(metadata: &mut ContextMetadata, outcome: &RerankOutcome) {
        metadata.candidates.push(outcome.stats.clone());
        for trim in &outcome.trims {
            metadata.record(trim.clone());
        }
        if outcome.called {
            metadata.generation_calls += 1;
        }
    }
}

#[async_trait]
impl ContextAssembler for PathRerankAssembler {
    fn name(&self) -> &str {
        "path_rerank"
    }

    async fn assemble(&self, query: &str) -> Result<AssembledEvidence, QueryError> {
        let mut metadata = ContextMetadata::new(self.name(), self.settings.max_context_tokens);

        let seeds = super::resolve_seeds(
            &self.seeder,
            &self.generator,
            &self.settings,
            query,
            &mut metadata,
        )
        .await?;
        if seeds.is_empty() {
            return Ok(AssembledEvidence {
                evidence: Evidence::Empty,
                metadata,
            });
        }

        let paths = self.subgraph.paths(&seeds.entities, self.settings.k_hop).await?;
        let neighbors = self.subgraph.neighbors(&seeds.entities).await?;
        debug!(paths = paths.len(), neighbors = neighbors.len(), "Raw path evidence");

        if paths.is_empty() && neighbors.is_empty() {
            info!(seeds = seeds.len(), "No paths or neighbours, evidence is empty");
            return Ok(AssembledEvidence {
                evidence: Evidence::Empty,
                metadata,
            });
        }

        let path_lines = paths.iter().map(|p| p.render()).collect();
        let ranked_paths = self.reranker.rerank("paths", path_lines, query).await?;
        Self::absorb(&mut metadata, &ranked_paths);

        let neighbor_lines = neighbors.iter().map(|t| t.render()).collect();
        let ranked_neighbors = self
            .reranker
            .rerank("neighbors", neighbor_lines, query)
            .await?;
        Self::absorb(&mut metadata, &ranked_neighbors);

        if !ranked_paths.called && !ranked_neighbors.called {
            info!("Both candidate lists shrank to nothing, evidence is empty");
            return Ok(AssembledEvidence {
                evidence: Evidence::Empty,
                metadata,
            });
        }

        let paths_nl = self.normalize(&ranked_paths.text, &mut metadata).await?;
        let neighbors_nl = self.normalize(&ranked_neighbors.text, &mut metadata).await?;

        let step = self
            .generator
            .ask(prompts::step(query, &paths_nl, &neighbors_nl))
            .await?;
        metadata.generation_calls += 1;

        let compiled = prompts::context(&paths_nl, &neighbors_nl, &step);
        let (context, report) = shrink_ratio(
            &compiled,
            self.settings.shrink_ratio,
            |text| self.counter.count(text),
            self.settings.max_context_tokens,
        );
        if report.trimmed() {
            info!(
                from = report.initial_cost,
                to = report.final_cost,
                rounds = report.steps - 1,
                "Context too long, trimmed"
            );
        }
        metadata.record(TrimRecord::from_shrink("context", TrimKind::Ratio, &report));
        metadata.set_context_tokens(report.final_cost);

        info!(
            seeds = seeds.len(),
            context_tokens = report.final_cost,
            generation_calls = metadata.generation_calls,
            "Path-rerank context assembled"
        );

        Ok(AssembledEvidence {
            evidence: Evidence::Context(context),
            metadata,
        })
    }

    fn answer_messages(&self, query: &str, context: &str) -> Vec<Message> {
        vec![Message::user(prompts::query(query, context))]
    }
}
