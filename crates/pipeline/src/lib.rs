//! # kgrag Pipeline
//!
//! Turns a natural-language query into a size-bounded evidence payload drawn
//! from a knowledge graph, then hands it to a generation service.
//!
//! ## Stages
//!
//! ```text
//! query → seeding → subgraph / paths / neighbours → materialize + truncate
//!       → rerank → compile → budget shrink → answer generation
//! ```
//!
//! Two evidence-shaping strategies implement [`ContextAssembler`]:
//!
//! - [`CrossSetAssembler`] keeps only edges bridging the seed set and its
//!   1-hop neighbourhood, materializes their relations and clamps the result.
//! - [`PathRerankAssembler`] ranks paths and neighbour facts through the
//!   generator, normalizes both blocks and adds a reasoning step.
//!
//! [`QueryEngine`] selects a strategy from configuration and runs a query end
//! to end, short-circuiting to [`prompts::FAIL_RESPONSE`] when no evidence is found.

pub mod assembler;
pub mod budget;
pub mod engine;
pub mod error;
pub mod evidence;
pub mod generator;
pub mod metadata;
pub mod prompts;
pub mod rerank;
pub mod retrieval;

#[cfg(test)]
mod test_helpers;

pub use assembler::{
    AssembledEvidence, ContextAssembler, CrossSetAssembler, Evidence, GraphServices,
    PathRerankAssembler, PipelineSettings,
};
pub use budget::shrink::{ShrinkReport, clamp_to_budget, shrink_list, shrink_ratio};
pub use budget::token::{TokenCounter, count_tokens};
pub use engine::{QueryEngine, QueryOutcome, QueryTimings};
pub use error::QueryError;
pub use evidence::relation::materialize;
pub use evidence::truncate::{TruncationReport, per_edge_cap, truncate_relations};
pub use generator::Generator;
pub use metadata::{CandidateStats, ContextMetadata, TrimKind, TrimRecord};
pub use rerank::{RerankOutcome, Reranker};
pub use retrieval::seeder::{EntitySeeder, SeedSet};
pub use retrieval::subgraph::{CrossSetSubgraph, SubgraphAssembler, cross_set_edges};
