//! petgraph-backed knowledge graph.
//!
//! Nodes are entity names. Each directed `(source, target)` pair is stored as
//! a single edge whose weight holds every relation label seen between the two
//! entities, in insertion order. The graph is built once and then only read,
//! so one instance can be shared by concurrent queries behind an `Arc`.

use async_trait::async_trait;
use kgrag_core::error::GraphError;
use kgrag_core::graph::{
    Edge, GRAPH_FIELD_SEP, GraphLookup, Path, RelationLookup, Subgraph, Triple,
};
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::debug;

/// Upper bound on paths returned by one `paths` query.
pub const DEFAULT_PATH_LIMIT: usize = 10_000;

/// An in-memory directed multi-relation graph.
pub struct KnowledgeGraph {
    graph: DiGraph<String, Vec<String>>,
    index: HashMap<String, NodeIndex>,
    path_limit: usize,
    separator: String,
}

impl KnowledgeGraph {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            index: HashMap::new(),
            path_limit: DEFAULT_PATH_LIMIT,
            separator: GRAPH_FIELD_SEP.to_string(),
        }
    }

    /// Cap the number of paths a single query may enumerate.
    pub fn with_path_limit(mut self, limit: usize) -> Self {
        self.path_limit = limit.max(1);
        self
    }

    /// Join folded relation labels with `separator` instead of [`GRAPH_FIELD_SEP`].
    ///
    /// Must match the separator the pipeline splits relation fields on.
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }

    /// Build a graph from `(source, relation, target)` triples.
    pub fn from_triples<I, S>(triples: I) -> Self
    where
        I: IntoIterator<Item = (S, S, S)>,
        S: AsRef<str>,
    {
        let mut graph = Self::new();
        for (source, relation, target) in triples {
            graph.add_triple(source.as_ref(), relation.as_ref(), target.as_ref());
        }
        graph
    }

    fn node(&mut self, name: &str) -> NodeIndex {
        if let Some(idx) = self.index.get(name) {
            return *idx;
        }
        let idx = self.graph.add_node(name.to_string());
        self.index.insert(name.to_string(), idx);
        idx
    }

    /// Insert a fact. A repeated `(source, target)` pair folds the new label
    /// into the existing edge; a repeated label is ignored.
    pub fn add_triple(&mut self, source: &str, relation: &str, target: &str) {
        let a = self.node(source);
        let b = self.node(target);
        match self.graph.find_edge(a, b) {
            Some(edge) => {
                if let Some(labels) = self.graph.edge_weight_mut(edge) {
                    if !labels.iter().any(|l| l == relation) {
                        labels.push(relation.to_string());
                    }
                }
            }
            None => {
                self.graph.add_edge(a, b, vec![relation.to_string()]);
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains(&self, entity: &str) -> bool {
        self.index.contains_key(entity)
    }

    /// Every entity name, sorted.
    pub fn entity_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.index.keys().cloned().collect();
        names.sort();
        names
    }

    /// Relation labels stored on the `source -> target` edge.
    pub fn relation_labels(&self, source: &str, target: &str) -> Option<&[String]> {
        let a = *self.index.get(source)?;
        let b = *self.index.get(target)?;
        let edge = self.graph.find_edge(a, b)?;
        self.graph.edge_weight(edge).map(|labels| labels.as_slice())
    }

    /// Edges touching `node` in one direction, ordered by the other endpoint's name.
    fn sorted_edges(&self, node: NodeIndex, dir: Direction) -> Vec<(NodeIndex, &[String])> {
        let mut edges: Vec<(NodeIndex, &[String])> = self
            .graph
            .edges_directed(node, dir)
            .map(|e| {
                let other = match dir {
                    Direction::Outgoing => e.target(),
                    Direction::Incoming => e.source(),
                };
                (other, e.weight().as_slice())
            })
            .collect();
        edges.sort_by(|a, b| self.graph[a.0].cmp(&self.graph[b.0]));
        edges
    }

    fn resolve_unique(&self, names: &[String]) -> Vec<NodeIndex> {
        let mut seen = HashSet::new();
        names
            .iter()
            .filter_map(|n| self.index.get(n).copied())
            .filter(|idx| seen.insert(*idx))
            .collect()
    }

    fn walk(
        &self,
        node: NodeIndex,
        cutoff: usize,
        on_path: &mut Vec<NodeIndex>,
        hops: &mut Vec<Triple>,
        out: &mut Vec<Path>,
    ) {
        for (next, labels) in self.sorted_edges(node, Direction::Outgoing) {
            if out.len() >= self.path_limit {
                return;
            }
            if on_path.contains(&next) {
                continue;
            }
            hops.push(Triple::new(
                self.graph[node].clone(),
                labels.join("/"),
                self.graph[next].clone(),
            ));
            out.push(Path::new(hops.clone()));
            if hops.len() < cutoff {
                on_path.push(next);
                self.walk(next, cutoff, on_path, hops, out);
                on_path.pop();
            }
            hops.pop();
        }
    }
}

impl Default for KnowledgeGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GraphLookup for KnowledgeGraph {
    async fn k_hop_neighbors(
        &self,
        seeds: &[String],
        k: usize,
    ) -> Result<HashSet<String>, GraphError> {
        let starts = self.resolve_unique(seeds);
        let mut visited: HashSet<NodeIndex> = starts.iter().copied().collect();
        let mut queue: VecDeque<(NodeIndex, usize)> = starts.iter().map(|n| (*n, 0)).collect();
        let mut found = HashSet::new();

        while let Some((node, depth)) = queue.pop_front() {
            if depth >= k {
                continue;
            }
            for next in self.graph.neighbors_undirected(node) {
                if visited.insert(next) {
                    found.insert(self.graph[next].clone());
                    queue.push_back((next, depth + 1));
                }
            }
        }

        debug!(seeds = starts.len(), k, found = found.len(), "k-hop expansion");
        Ok(found)
    }

    async fn induced_subgraph(&self, nodes: &[String]) -> Result<Subgraph, GraphError> {
        let members = self.resolve_unique(nodes);
        let member_set: HashSet<NodeIndex> = members.iter().copied().collect();

        let mut edges = Vec::new();
        for node in &members {
            for (target, _) in self.sorted_edges(*node, Direction::Outgoing) {
                if member_set.contains(&target) {
                    edges.push(Edge::new(self.graph[*node].clone(), self.graph[target].clone()));
                }
            }
        }

        Ok(Subgraph {
            nodes: members.iter().map(|n| self.graph[*n].clone()).collect(),
            edges,
        })
    }

    async fn paths(&self, seeds: &[String], cutoff: usize) -> Result<Vec<Path>, GraphError> {
        let mut out = Vec::new();
        if cutoff == 0 {
            return Ok(out);
        }
        for seed in seeds {
            let Some(start) = self.index.get(seed).copied() else {
                continue;
            };
            let mut on_path = vec![start];
            let mut hops = Vec::new();
            self.walk(start, cutoff, &mut on_path, &mut hops, &mut out);
            if out.len() >= self.path_limit {
                debug!(limit = self.path_limit, "path enumeration hit limit");
                break;
            }
        }
        Ok(out)
    }

    async fn neighbors(&self, seeds: &[String]) -> Result<Vec<Triple>, GraphError> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for node in self.resolve_unique(seeds) {
            let outgoing = self
                .sorted_edges(node, Direction::Outgoing)
                .into_iter()
                .map(|(other, labels)| (node, other, labels));
            let incoming = self
                .sorted_edges(node, Direction::Incoming)
                .into_iter()
                .map(|(other, labels)| (other, node, labels));

            for (src, tgt, labels) in outgoing.chain(incoming) {
                for label in labels {
                    let triple =
                        Triple::new(self.graph[src].clone(), label.clone(), self.graph[tgt].clone());
                    if seen.insert(triple.clone()) {
                        out.push(triple);
                    }
                }
            }
        }
        Ok(out)
    }
}

#[async_trait]
impl RelationLookup for KnowledgeGraph {
    async fn relation_fields(&self, edges: &[Edge]) -> Result<Vec<String>, GraphError> {
        Ok(edges
            .iter()
            .map(|e| {
                self.relation_labels(&e.source, &e.target)
                    .map(|labels| labels.join(&self.separator))
                    .unwrap_or_default()
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    fn geography() -> KnowledgeGraph {
        KnowledgeGraph::from_triples([
            ("Paris", "capitalOf", "France"),
            ("France", "continent", "Europe"),
            ("Alice", "bornIn", "Paris"),
            ("Alice", "diedIn", "Paris"),
        ])
    }

    #[test]
    fn repeated_pairs_fold_into_one_edge() {
        let g = geography();
        assert_eq!(g.node_count(), 4);
        assert_eq!(g.edge_count(), 3);
        assert_eq!(
            g.relation_labels("Alice", "Paris").unwrap(),
            &["bornIn".to_string(), "diedIn".to_string()]
        );
    }

    #[tokio::test]
    async fn relation_fields_join_with_configured_separator() {
        let edges = vec![Edge::new("Alice", "Paris"), Edge::new("Paris", "Nowhere")];

        let fields = geography().relation_fields(&edges).await.unwrap();
        assert_eq!(fields, vec!["bornIn<SEP>diedIn".to_string(), String::new()]);

        let g = geography().with_separator("|");
        assert_eq!(g.separator(), "|");
        let fields = g.relation_fields(&edges).await.unwrap();
        assert_eq!(fields[0], "bornIn|diedIn");
    }

    #[test]
    fn duplicate_label_ignored() {
        let mut g = KnowledgeGraph::new();
        g.add_triple("a", "r", "b");
        g.add_triple("a", "r", "b");
        assert_eq!(g.relation_labels("a", "b").unwrap().len(), 1);
    }

    #[tokio::test]
    async fn k_hop_excludes_seeds() {
        let g = geography();
        let one = g.k_hop_neighbors(&names(&["Paris"]), 1).await.unwrap();
        let expected: HashSet<String> = names(&["France", "Alice"]).into_iter().collect();
        assert_eq!(one, expected);

        let two = g.k_hop_neighbors(&names(&["Paris"]), 2).await.unwrap();
        assert!(two.contains("Europe"));
        assert!(!two.contains("Paris"));
    }

    #[tokio::test]
    async fn k_hop_unknown_seed_is_empty() {
        let g = geography();
        assert!(g.k_hop_neighbors(&names(&["Atlantis"]), 3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn induced_subgraph_keeps_internal_edges_only() {
        let g = geography();
        let sub = g.induced_subgraph(&names(&["Paris", "France"])).await.unwrap();
        assert_eq!(sub.nodes, names(&["Paris", "France"]));
        assert_eq!(sub.edges, vec![Edge::new("Paris", "France")]);
    }

    #[tokio::test]
    async fn paths_enumerate_prefixes_up_to_cutoff() {
        let g = geography();
        let paths = g.paths(&names(&["Paris"]), 2).await.unwrap();
        let rendered: Vec<String> = paths.iter().map(|p| p.render()).collect();
        assert_eq!(
            rendered,
            vec![
                "Paris->capitalOf-> France".to_string(),
                "Paris->capitalOf-> France->continent-> Europe".to_string(),
            ]
        );

        let short = g.paths(&names(&["Paris"]), 1).await.unwrap();
        assert_eq!(short.len(), 1);
    }

    #[tokio::test]
    async fn paths_render_multi_label_hops() {
        let g = geography();
        let paths = g.paths(&names(&["Alice"]), 1).await.unwrap();
        assert_eq!(paths[0].render(), "Alice->bornIn/diedIn-> Paris");
    }

    #[tokio::test]
    async fn paths_are_simple_and_bounded() {
        let g = KnowledgeGraph::from_triples([("a", "r", "b"), ("b", "r", "a"), ("b", "r", "c")])
            .with_path_limit(2);
        let paths = g.paths(&names(&["a"]), 5).await.unwrap();
        assert_eq!(paths.len(), 2);
        for p in &paths {
            assert!(p.hops.iter().all(|h| h.target != "a"));
        }
    }

    #[tokio::test]
    async fn duplicate_paths_across_seeds_are_kept() {
        let g = geography();
        let paths = g.paths(&names(&["France", "France"]), 1).await.unwrap();
        assert_eq!(paths.len(), 2);
        assert_eq!(paths[0], paths[1]);
    }

    #[tokio::test]
    async fn neighbors_flatten_labels_both_directions() {
        let g = geography();
        let neis = g.neighbors(&names(&["Paris"])).await.unwrap();
        let rendered: Vec<String> = neis.iter().map(|t| t.render()).collect();
        assert_eq!(
            rendered,
            vec![
                "Paris->capitalOf->France",
                "Alice->bornIn->Paris",
                "Alice->diedIn->Paris",
            ]
        );
    }

    #[tokio::test]
    async fn relation_fields_align_with_edges() {
        let g = geography();
        let fields = g
            .relation_fields(&[
                Edge::new("Alice", "Paris"),
                Edge::new("Europe", "Paris"),
                Edge::new("Paris", "France"),
            ])
            .await
            .unwrap();
        assert_eq!(fields, vec!["bornIn<SEP>diedIn", "", "capitalOf"]);
    }
}
