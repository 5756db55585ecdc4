//! Subgraph assembler.
//!
//! Two retrieval shapes over a [`GraphLookup`]: simple paths from the seeds,
//! and the cross-set edge set between the seeds `S` and their 1-hop
//! neighbourhood `N1`.

use crate::error::QueryError;
use kgrag_core::graph::{Edge, GraphLookup, Path, Triple};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Result of the induced-subgraph shape.
#[derive(Debug, Clone, Default)]
pub struct CrossSetSubgraph {
    pub seeds: HashSet<String>,
    pub one_hop: HashSet<String>,
    /// Every edge of the induced subgraph on `S ∪ N1`.
    pub induced_edges: usize,
    /// Edges with one endpoint in `S` and the other in `N1`.
    pub edges: Vec<Edge>,
}

impl CrossSetSubgraph {
    /// No cross-set edge survived: the query has no evidence.
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

/// Keep edges bridging `seeds` and `one_hop`, in either direction.
///
/// Edges inside one partition are discarded. A repeated `(source, target)`
/// pair is kept once.
pub fn cross_set_edges(
    edges: &[Edge],
    seeds: &HashSet<String>,
    one_hop: &HashSet<String>,
) -> Vec<Edge> {
    let mut seen = HashSet::new();
    edges
        .iter()
        .filter(|e| {
            (seeds.contains(&e.source) && one_hop.contains(&e.target))
                || (seeds.contains(&e.target) && one_hop.contains(&e.source))
        })
        .filter(|e| seen.insert((*e).clone()))
        .cloned()
        .collect()
}

pub struct SubgraphAssembler {
    graph: Arc<dyn GraphLookup>,
}

impl SubgraphAssembler {
    pub fn new(graph: Arc<dyn GraphLookup>) -> Self {
        Self { graph }
    }

    /// Induced-subgraph shape: `N1` = 1-hop of `S`, induce on `S ∪ N1`, keep cross-set edges.
    pub async fn cross_set(&self, seeds: &[String]) -> Result<CrossSetSubgraph, QueryError> {
        let seed_set: HashSet<String> = seeds.iter().cloned().collect();
        let mut one_hop = self.graph.k_hop_neighbors(seeds, 1).await?;
        one_hop.retain(|n| !seed_set.contains(n));

        let mut extra: Vec<String> = one_hop.iter().cloned().collect();
        extra.sort();
        let mut induced: Vec<String> = seeds.to_vec();
        induced.extend(extra);

        let subgraph = self.graph.induced_subgraph(&induced).await?;
        let edges = cross_set_edges(&subgraph.edges, &seed_set, &one_hop);

        debug!(
            seeds = seed_set.len(),
            one_hop = one_hop.len(),
            induced_edges = subgraph.edges.len(),
            cross_set_edges = edges.len(),
            "Cross-set subgraph"
        );

        Ok(CrossSetSubgraph {
            seeds: seed_set,
            one_hop,
            induced_edges: subgraph.edges.len(),
            edges,
        })
    }

    /// Path shape: every simple path up to `cutoff` hops, duplicates across seeds kept.
    pub async fn paths(&self, seeds: &[String], cutoff: usize) -> Result<Vec<Path>, QueryError> {
        Ok(self.graph.paths(seeds, cutoff).await?)
    }

    /// Flattened neighbour records of the seeds.
    pub async fn neighbors(&self, seeds: &[String]) -> Result<Vec<Triple>, QueryError> {
        Ok(self.graph.neighbors(seeds).await?)
    }
}
