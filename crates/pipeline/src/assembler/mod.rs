//! Evidence-shaping strategies.
//!
//! A [`ContextAssembler`] turns a query into an [`Evidence`] payload that fits
//! the token budget, and knows how its evidence should be presented to the
//! answering call. Strategies are selected by [`QueryMode`].

mod cross_set;
mod path_rerank;

pub use cross_set::CrossSetAssembler;
pub use path_rerank::PathRerankAssembler;

use crate::error::QueryError;
use crate::generator::Generator;
use crate::metadata::ContextMetadata;
use crate::prompts;
use crate::retrieval::seeder::{EntitySeeder, SeedSet, parse_mentions};
use async_trait::async_trait;
use kgrag_config::{AppConfig, QueryMode, SeedMode};
use kgrag_core::graph::{EntityLookup, GraphLookup, RelationLookup};
use kgrag_core::message::Message;
use std::sync::Arc;
use tracing::{debug, info};

// ── Types ─────────────────────────────────────────────────────────────────

/// Evidence produced for one query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Evidence {
    /// Nothing relevant was found. Callers skip generation.
    Empty,
    /// A budget-compliant context string.
    Context(String),
}

impl Evidence {
    pub fn is_empty(&self) -> bool {
        matches!(self, Evidence::Empty)
    }

    pub fn as_context(&self) -> Option<&str> {
        match self {
            Evidence::Empty => None,
            Evidence::Context(text) => Some(text),
        }
    }
}

/// Evidence plus what it took to build it.
#[derive(Debug, Clone)]
pub struct AssembledEvidence {
    pub evidence: Evidence,
    pub metadata: ContextMetadata,
}

/// The read-only services every strategy consults.
#[derive(Clone)]
pub struct GraphServices {
    pub entities: Arc<dyn EntityLookup>,
    pub graph: Arc<dyn GraphLookup>,
    pub relations: Arc<dyn RelationLookup>,
}

/// Numeric settings resolved once from configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSettings {
    pub seed_mode: SeedMode,
    pub top_k_entity: usize,
    pub k_hop: usize,
    pub max_seed_rounds: usize,
    pub max_context_tokens: usize,
    pub rerank_candidate_cap: usize,
    pub shrink_ratio: f64,
    pub relation_separator: String,
}

impl PipelineSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            seed_mode: config.query.seed_mode,
            top_k_entity: config.query.top_k_entity,
            k_hop: config.query.k_hop,
            max_seed_rounds: config.query.max_seed_rounds,
            max_context_tokens: config.budget.max_context_tokens,
            rerank_candidate_cap: config.budget.rerank_candidate_cap,
            shrink_ratio: config.budget.shrink_ratio,
            relation_separator: config.budget.relation_separator.clone(),
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

// ── Capability ────────────────────────────────────────────────────────────

#[async_trait]
pub trait ContextAssembler: Send + Sync {
    /// Strategy name used in logs and metadata.
    fn name(&self) -> &str;

    /// Build the evidence for `query`.
    async fn assemble(&self, query: &str) -> Result<AssembledEvidence, QueryError>;

    /// Messages for the final answering call over `context`.
    fn answer_messages(&self, query: &str, context: &str) -> Vec<Message>;
}

/// Build the strategy named by `mode`.
pub fn from_mode(
    mode: QueryMode,
    services: GraphServices,
    generator: Generator,
    settings: PipelineSettings,
) -> Arc<dyn ContextAssembler> {
    match mode {
        QueryMode::CrossSet => Arc::new(CrossSetAssembler::new(services, generator, settings)),
        QueryMode::PathRerank => Arc::new(PathRerankAssembler::new(services, generator, settings)),
    }
}

// ── Shared seeding ────────────────────────────────────────────────────────

/// Resolve seeds for `query` according to `settings.seed_mode`.
///
/// Extracted mode spends one generation call on mention extraction and
/// falls back to similarity seeding when nothing usable comes back.
pub(crate) async fn resolve_seeds(
    seeder: &EntitySeeder,
    generator: &Generator,
    settings: &PipelineSettings,
    query: &str,
    metadata: &mut ContextMetadata,
) -> Result<SeedSet, QueryError> {
    let seeds = match settings.seed_mode {
        SeedMode::Similarity => seeder.seed(query, settings.top_k_entity).await?,
        SeedMode::Extracted => {
            let response = generator.ask(prompts::extract_entities(query)).await?;
            metadata.generation_calls += 1;
            let mentions = parse_mentions(&response);
            debug!(mentions = mentions.len(), "Extracted query entities");

            let linked = if mentions.is_empty() {
                SeedSet::default()
            } else {
                seeder.link(&mentions).await?
            };
            if linked.is_empty() {
                info!("No entities extracted, falling back to similarity seeding");
                seeder.seed(query, settings.top_k_entity).await?
            } else {
                linked
            }
        }
    };

    metadata.seeds = seeds.entities.clone();
    metadata.seed_rounds = seeds.rounds;
    metadata.seed_exhausted = seeds.exhausted;
    Ok(seeds)
}
