//! Knowledge-graph domain types and the lookup services the pipeline consumes.
//!
//! The pipeline never owns the graph or the vector index. It talks to three
//! request/response boundaries:
//!
//! | Trait | Question it answers |
//! |-------|---------------------|
//! | [`EntityLookup`] | which entity names are closest to this text? |
//! | [`GraphLookup`] | what surrounds these entities? |
//! | [`RelationLookup`] | which relation labels sit on these edges? |
//!
//! All three are read-only and may be shared by concurrent queries.

use crate::error::GraphError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Separator used when several relation labels are folded into one stored field.
pub const GRAPH_FIELD_SEP: &str = "<SEP>";

/// An entity name with its similarity to a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredEntity {
    pub entity_name: String,
    pub score: f32,
}

/// A directed edge between two entities, without its relation labels.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
}

impl Edge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

/// A single `(source, relation, target)` fact.
///
/// Used both as one hop of a [`Path`] and as a flattened neighbour record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Triple {
    pub source: String,
    pub relation: String,
    pub target: String,
}

impl Triple {
    pub fn new(
        source: impl Into<String>,
        relation: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            relation: relation.into(),
            target: target.into(),
        }
    }

    /// Arrow form used in ranking prompts: `src->relation->tgt`.
    pub fn render(&self) -> String {
        format!("{}->{}->{}", self.source, self.relation, self.target)
    }
}

/// An ordered chain of hops starting at a seed entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Path {
    pub hops: Vec<Triple>,
}

impl Path {
    pub fn new(hops: Vec<Triple>) -> Self {
        Self { hops }
    }

    pub fn len(&self) -> usize {
        self.hops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hops.is_empty()
    }

    /// The entity the path starts from, if it has any hop.
    pub fn start(&self) -> Option<&str> {
        self.hops.first().map(|h| h.source.as_str())
    }

    /// Render as `start->rel-> next->rel-> last`.
    pub fn render(&self) -> String {
        let Some(start) = self.start() else {
            return String::new();
        };
        let mut out = start.to_string();
        for hop in &self.hops {
            out.push_str("->");
            out.push_str(&hop.relation);
            out.push_str("-> ");
            out.push_str(&hop.target);
        }
        out
    }
}

/// Nodes and edges returned by an induced-subgraph query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Subgraph {
    pub nodes: Vec<String>,
    pub edges: Vec<Edge>,
}

/// Nearest-neighbour entity resolution.
#[async_trait]
pub trait EntityLookup: Send + Sync {
    /// Index name for logging (e.g., "keyword", "vector").
    fn name(&self) -> &str;

    /// Return up to `top_k` entities ordered by descending similarity.
    ///
    /// Results for a larger `top_k` must extend the results for a smaller one.
    async fn top_k(&self, query: &str, top_k: usize) -> Result<Vec<ScoredEntity>, GraphError>;
}

/// Structural queries against the knowledge graph.
#[async_trait]
pub trait GraphLookup: Send + Sync {
    /// Entities within `k` hops of any seed, excluding the seeds themselves.
    async fn k_hop_neighbors(
        &self,
        seeds: &[String],
        k: usize,
    ) -> Result<HashSet<String>, GraphError>;

    /// The subgraph induced on `nodes`: every stored edge with both endpoints in the set.
    async fn induced_subgraph(&self, nodes: &[String]) -> Result<Subgraph, GraphError>;

    /// All simple paths of 1..=`cutoff` hops starting at each seed.
    async fn paths(&self, seeds: &[String], cutoff: usize) -> Result<Vec<Path>, GraphError>;

    /// Every edge touching a seed, flattened to one record per relation label.
    async fn neighbors(&self, seeds: &[String]) -> Result<Vec<Triple>, GraphError>;
}

/// Relation labels for edges.
#[async_trait]
pub trait RelationLookup: Send + Sync {
    /// One relation field per edge, aligned positionally with `edges`.
    ///
    /// A field may hold several labels joined by [`GRAPH_FIELD_SEP`].
    async fn relation_fields(&self, edges: &[Edge]) -> Result<Vec<String>, GraphError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_renders_arrow_chain() {
        let path = Path::new(vec![
            Triple::new("Paris", "capitalOf", "France"),
            Triple::new("France", "continent", "Europe"),
        ]);
        assert_eq!(path.render(), "Paris->capitalOf-> France->continent-> Europe");
        assert_eq!(path.start(), Some("Paris"));
        assert_eq!(path.len(), 2);
    }

    #[test]
    fn empty_path_renders_empty() {
        assert_eq!(Path::default().render(), "");
        assert!(Path::default().is_empty());
    }

    #[test]
    fn triple_renders_neighbor_form() {
        let t = Triple::new("Alice", "bornIn", "Paris");
        assert_eq!(t.render(), "Alice->bornIn->Paris");
    }
}
