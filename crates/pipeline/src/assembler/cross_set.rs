//! Cross-set strategy.
//!
//! seeds `S` → 1-hop `N1` → edges bridging `S` and `N1` → relation fields →
//! materialized facts → tiered truncation → token clamp.

use super::{AssembledEvidence, ContextAssembler, Evidence, GraphServices, PipelineSettings};
use crate::budget::shrink::clamp_to_budget;
use crate::budget::token::TokenCounter;
use crate::error::QueryError;
use crate::evidence::relation::materialize_all;
use crate::evidence::truncate::truncate_relations;
use crate::generator::Generator;
use crate::metadata::{ContextMetadata, TrimKind, TrimRecord};
use crate::prompts;
use crate::retrieval::seeder::EntitySeeder;
use crate::retrieval::subgraph::SubgraphAssembler;
use async_trait::async_trait;
use kgrag_core::message::Message;
use std::sync::Arc;
use tracing::info;

pub struct CrossSetAssembler {
    seeder: EntitySeeder,
    subgraph: SubgraphAssembler,
    relations: Arc<dyn kgrag_core::RelationLookup>,
    generator: Generator,
    counter: TokenCounter,
    settings: PipelineSettings,
}

impl CrossSetAssembler {
    pub fn new(services: GraphServices, generator: Generator, settings: PipelineSettings) -> Self {
        Self {
            seeder: EntitySeeder::new(services.entities, settings.max_seed_rounds),
            subgraph: SubgraphAssembler::new(services.graph),
            relations: services.relations,
            counter: TokenCounter::for_model(generator.model()),
            generator,
            settings,
        }
    }
}

#[async_trait]
impl ContextAssembler for CrossSetAssembler {
    fn name(&self) -> &str {
        "cross_set"
    }

    async fn assemble(&self, query: &str) -> Result<AssembledEvidence, QueryError> {
        let mut metadata = ContextMetadata::new(self.name(), self.settings.max_context_tokens);
        let empty = |metadata: ContextMetadata| AssembledEvidence {
            evidence: Evidence::Empty,
            metadata,
        };

        let seeds = super::resolve_seeds(
            &self.seeder,
            &self.generator,
            &self.settings,
            query,
            &mut metadata,
        )
        .await?;
        if seeds.is_empty() {
            return Ok(empty(metadata));
        }

        let subgraph = self.subgraph.cross_set(&seeds.entities).await?;
        metadata.edges = subgraph.edges.len();
        if subgraph.is_empty() {
            info!(seeds = seeds.len(), "No cross-set edges, evidence is empty");
            return Ok(empty(metadata));
        }

        let fields = self.relations.relation_fields(&subgraph.edges).await?;
        let blocks = materialize_all(&subgraph.edges, &fields, &self.settings.relation_separator)?;

        let (joined, truncation) = truncate_relations(&blocks);
        if truncation.dropped_relations > 0 {
            metadata.record(TrimRecord {
                stage: "relations".into(),
                kind: TrimKind::EdgeCap,
                removed: truncation.dropped_relations,
                tokens_before: 0,
                tokens_after: 0,
                fits: true,
            });
        }
        if joined.is_empty() {
            info!(edges = subgraph.edges.len(), "Relation fields held no labels, evidence is empty");
            return Ok(empty(metadata));
        }

        let (context, clamp) = clamp_to_budget(
            &joined,
            |text| self.counter.count(text),
            self.settings.max_context_tokens,
        );
        metadata.record(TrimRecord::from_shrink("context", TrimKind::TokenClamp, &clamp));
        metadata.set_context_tokens(clamp.final_cost);

        info!(
            edges = subgraph.edges.len(),
            per_edge_cap = truncation.cap,
            truncated_edges = truncation.truncated_edges,
            context_tokens = clamp.final_cost,
            "Cross-set context assembled"
        );

        Ok(AssembledEvidence {
            evidence: Evidence::Context(context),
            metadata,
        })
    }

    fn answer_messages(&self, query: &str, context: &str) -> Vec<Message> {
        vec![
            Message::system(prompts::CROSS_SET_SYSTEM),
            Message::user(prompts::candidate_answers(query, context)),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{RankedLookup, SequentialMockProvider};
    use kgrag_core::error::GraphError;
    use kgrag_core::graph::{Edge, RelationLookup};
    use kgrag_graph::KnowledgeGraph;

    fn services(graph: Arc<KnowledgeGraph>, ranking: &[&str]) -> GraphServices {
        GraphServices {
            entities: Arc::new(RankedLookup::new(ranking)),
            graph: graph.clone(),
            relations: graph,
        }
    }

    fn assembler(services: GraphServices, settings: PipelineSettings) -> CrossSetAssembler {
        let provider = Arc::new(SequentialMockProvider::from_texts(&[]));
        CrossSetAssembler::new(services, Generator::new(provider, "gpt-3.5-turbo-0125"), settings)
    }

    fn one_seed() -> PipelineSettings {
        PipelineSettings {
            top_k_entity: 1,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn bridges_are_materialized() {
        let graph = Arc::new(KnowledgeGraph::from_triples([
            ("Alice", "bornIn", "Paris"),
            ("Alice", "diedIn", "Paris"),
            ("Paris", "capitalOf", "France"),
            ("France", "continent", "Europe"),
        ]));
        let asm = assembler(services(graph, &["Paris"]), one_seed());
        let out = asm.assemble("Where was Alice born?").await.unwrap();

        assert_eq!(
            out.evidence,
            Evidence::Context(
                "Paris capitalOf France, Alice bornIn Paris, Alice diedIn Paris, ".into()
            )
        );
        assert_eq!(out.metadata.seeds, vec!["Paris"]);
        assert_eq!(out.metadata.edges, 2);
        assert_eq!(out.metadata.generation_calls, 0);
    }

    #[tokio::test]
    async fn custom_separator_splits_folded_labels() {
        let graph = Arc::new(
            KnowledgeGraph::from_triples([("Alice", "bornIn", "Paris"), ("Alice", "diedIn", "Paris")])
                .with_separator("|"),
        );
        let settings = PipelineSettings {
            relation_separator: "|".into(),
            ..one_seed()
        };
        let asm = assembler(services(graph, &["Paris"]), settings);
        let out = asm.assemble("Who was born in Paris?").await.unwrap();

        assert_eq!(
            out.evidence,
            Evidence::Context("Alice bornIn Paris, Alice diedIn Paris, ".into())
        );
    }

    #[tokio::test]
    async fn no_bridge_is_empty_evidence() {
        let mut kg = KnowledgeGraph::from_triples([("x", "r", "y")]);
        kg.add_triple("solo", "r", "solo");
        let asm = assembler(services(Arc::new(kg), &["solo"]), one_seed());
        let out = asm.assemble("q").await.unwrap();
        assert_eq!(out.evidence, Evidence::Empty);
    }

    #[tokio::test]
    async fn no_seeds_is_empty_evidence() {
        let graph = Arc::new(KnowledgeGraph::from_triples([("a", "r", "b")]));
        let asm = assembler(services(graph, &[]), one_seed());
        let out = asm.assemble("q").await.unwrap();
        assert!(out.evidence.is_empty());
        assert!(out.metadata.seed_exhausted);
    }

    #[tokio::test]
    async fn context_is_clamped_to_budget() {
        let triples: Vec<(String, String, String)> = (0..50)
            .map(|i| ("hub".to_string(), format!("relation{i}"), format!("leaf{i}")))
            .collect();
        let graph = Arc::new(KnowledgeGraph::from_triples(triples));
        let settings = PipelineSettings {
            max_context_tokens: 40,
            ..one_seed()
        };
        let asm = assembler(services(graph, &["hub"]), settings);
        let out = asm.assemble("q").await.unwrap();

        let context = out.evidence.as_context().unwrap().to_string();
        let counter = TokenCounter::for_model("gpt-3.5-turbo-0125");
        assert!(counter.count(&context) <= 40);
        assert!(context.starts_with("hub relation0 leaf0, "));
        assert!(out.metadata.trims.iter().any(|t| t.kind == TrimKind::TokenClamp));
        assert_eq!(out.metadata.context_tokens, counter.count(&context));
    }

    struct ShortRelations;

    #[async_trait]
    impl RelationLookup for ShortRelations {
        async fn relation_fields(&self, _edges: &[Edge]) -> Result<Vec<String>, GraphError> {
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn misaligned_relation_lookup_fails_the_query() {
        let graph = Arc::new(KnowledgeGraph::from_triples([("a", "r", "b")]));
        let services = GraphServices {
            entities: Arc::new(RankedLookup::new(&["a"])),
            graph,
            relations: Arc::new(ShortRelations),
        };
        let err = assembler(services, one_seed()).assemble("q").await.unwrap_err();
        assert!(matches!(err, QueryError::RelationMisaligned { edges: 1, fields: 0 }));
    }

    #[test]
    fn answer_messages_ask_for_ten_candidates() {
        let graph = Arc::new(KnowledgeGraph::new());
        let asm = assembler(services(graph, &[]), one_seed());
        let messages = asm.answer_messages("q", "a r b, ");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, prompts::CROSS_SET_SYSTEM);
        assert!(messages[1].content.contains("the provided information is (list separated by ,): a r b, "));
    }
}
