//! In-process implementations of the lookup services the pipeline consumes.
//!
//! - [`KnowledgeGraph`]: petgraph-backed store answering [`GraphLookup`] and
//!   [`RelationLookup`] queries
//! - [`KeywordEntityIndex`] / [`VectorEntityIndex`]: brute-force [`EntityLookup`]
//! - [`loader`]: reads tab-separated triple files into a graph
//!
//! [`GraphLookup`]: kgrag_core::GraphLookup
//! [`RelationLookup`]: kgrag_core::RelationLookup
//! [`EntityLookup`]: kgrag_core::EntityLookup

pub mod entity_index;
pub mod loader;
pub mod store;
pub mod vector;

pub use entity_index::{KeywordEntityIndex, VectorEntityIndex};
pub use loader::{LoadReport, load_triples, parse_triples};
pub use store::KnowledgeGraph;
