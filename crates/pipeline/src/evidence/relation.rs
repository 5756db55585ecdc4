//! Relation materializer.

use crate::error::QueryError;
use kgrag_core::graph::Edge;

/// Expand one edge's relation field into `"{source} {relation} {target}"` strings.
///
/// The field may fold several labels together with `separator`. Every
/// non-empty segment yields exactly one string, in field order, with the
/// label kept verbatim. A field with no non-empty segment yields nothing.
pub fn materialize(edge: &Edge, relation_field: &str, separator: &str) -> Vec<String> {
    relation_field
        .split(separator)
        .filter(|label| !label.is_empty())
        .map(|label| format!("{} {} {}", edge.source, label, edge.target))
        .collect()
}

/// Materialize a batch of edges against positionally aligned relation fields.
pub fn materialize_all(
    edges: &[Edge],
    fields: &[String],
    separator: &str,
) -> Result<Vec<Vec<String>>, QueryError> {
    if edges.len() != fields.len() {
        return Err(QueryError::RelationMisaligned {
            edges: edges.len(),
            fields: fields.len(),
        });
    }
    Ok(edges
        .iter()
        .zip(fields)
        .map(|(edge, field)| materialize(edge, field, separator))
        .collect())
}
