//! Terminal failures of a single query.
//!
//! Empty evidence and unreachable budgets are not errors: they are reported
//! through [`crate::Evidence::Empty`] and [`crate::ShrinkReport::fits`].

use kgrag_core::error::{GraphError, ProviderError};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum QueryError {
    #[error("Generation service failed: {0}")]
    Upstream(#[from] ProviderError),

    #[error("Graph service failed: {0}")]
    Graph(#[from] GraphError),

    #[error("Relation lookup returned {fields} fields for {edges} edges")]
    RelationMisaligned { edges: usize, fields: usize },

    #[error("Generation call exceeded the {secs}s deadline")]
    Timeout { secs: u64 },
}

impl From<QueryError> for kgrag_core::Error {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::Upstream(e) => kgrag_core::Error::Provider(e),
            QueryError::Graph(e) => kgrag_core::Error::Graph(e),
            other => kgrag_core::Error::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn misaligned_message_names_both_counts() {
        let err = QueryError::RelationMisaligned {
            edges: 3,
            fields: 2,
        };
        assert_eq!(err.to_string(), "Relation lookup returned 2 fields for 3 edges");
    }

    #[test]
    fn converts_into_core_error() {
        let core: kgrag_core::Error = QueryError::Graph(GraphError::Storage("down".into())).into();
        assert!(matches!(core, kgrag_core::Error::Graph(_)));

        let core: kgrag_core::Error = QueryError::Timeout { secs: 5 }.into();
        assert!(core.to_string().contains("5s"));
    }
}
