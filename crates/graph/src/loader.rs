//! Tab-separated triple files.
//!
//! One fact per line: `source<TAB>relation<TAB>target`, optionally followed by
//! a fourth timestamp column which is ignored. Blank lines, lines with the
//! wrong column count and lines with an empty field are skipped and counted.

use crate::store::KnowledgeGraph;
use kgrag_core::error::GraphError;
use kgrag_core::graph::Triple;
use std::path::Path;
use tracing::{info, warn};

/// Summary of one load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub triples: usize,
    pub skipped: usize,
    pub entities: usize,
    pub edges: usize,
}

/// Parse triple lines. Never fails; malformed lines are counted in the second value.
pub fn parse_triples(content: &str) -> (Vec<Triple>, usize) {
    let mut triples = Vec::new();
    let mut skipped = 0;

    for line in content.lines() {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        let parts: Vec<&str> = line.split('\t').collect();
        if !(parts.len() == 3 || parts.len() == 4) {
            skipped += 1;
            continue;
        }
        let (source, relation, target) = (parts[0].trim(), parts[1].trim(), parts[2].trim());
        if source.is_empty() || relation.is_empty() || target.is_empty() {
            skipped += 1;
            continue;
        }
        triples.push(Triple::new(source, relation, target));
    }

    (triples, skipped)
}

/// Load a triple file into a new graph.
pub async fn load_triples(
    path: &Path,
    path_limit: usize,
) -> Result<(KnowledgeGraph, LoadReport), GraphError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| GraphError::Storage(format!("{}: {e}", path.display())))?;

    let (triples, skipped) = parse_triples(&content);
    if skipped > 0 {
        warn!(path = %path.display(), skipped, "Skipped malformed triple lines");
    }

    let mut graph = KnowledgeGraph::new().with_path_limit(path_limit);
    for t in &triples {
        graph.add_triple(&t.source, &t.relation, &t.target);
    }

    let report = LoadReport {
        triples: triples.len(),
        skipped,
        entities: graph.node_count(),
        edges: graph.edge_count(),
    };
    info!(
        path = %path.display(),
        triples = report.triples,
        entities = report.entities,
        edges = report.edges,
        "Knowledge graph loaded"
    );
    Ok((graph, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parse_accepts_three_and_four_columns() {
        let (triples, skipped) =
            parse_triples("Paris\tcapitalOf\tFrance\nFrance\tcontinent\tEurope\t2001-01-01\n");
        assert_eq!(skipped, 0);
        assert_eq!(triples.len(), 2);
        assert_eq!(triples[1], Triple::new("France", "continent", "Europe"));
    }

    #[test]
    fn parse_skips_malformed_lines() {
        let content = "\nonly\ttwo\n\tr\tb\na\t\tb\na\tr\tb\tdate\textra\nok\tr\tfine\n";
        let (triples, skipped) = parse_triples(content);
        assert_eq!(triples, vec![Triple::new("ok", "r", "fine")]);
        assert_eq!(skipped, 4);
    }

    #[tokio::test]
    async fn load_folds_repeated_pairs() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Alice\tbornIn\tParis\t1990").unwrap();
        writeln!(file, "Alice\tdiedIn\tParis\t2050").unwrap();
        writeln!(file, "Paris\tcapitalOf\tFrance\t1990").unwrap();
        writeln!(file, "broken line").unwrap();

        let (graph, report) = load_triples(file.path(), 100).await.unwrap();
        assert_eq!(
            report,
            LoadReport {
                triples: 3,
                skipped: 1,
                entities: 3,
                edges: 2,
            }
        );
        assert_eq!(graph.relation_labels("Alice", "Paris").unwrap().len(), 2);
    }

    #[tokio::test]
    async fn load_missing_file_is_storage_error() {
        let err = load_triples(Path::new("/nonexistent/train.txt"), 10)
            .await
            .err()
            .unwrap();
        assert!(matches!(err, GraphError::Storage(_)));
    }
}
