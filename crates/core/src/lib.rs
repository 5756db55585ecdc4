//! # kgrag Core
//!
//! Domain types, service traits, and error definitions for the kgrag
//! knowledge-graph retrieval pipeline. This crate has **no I/O**: it defines
//! the model that every other crate implements against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator of the context pipeline is a trait here:
//! - [`EntityLookup`]: nearest-neighbour entity resolution
//! - [`GraphLookup`]: k-hop, induced subgraph, path and neighbour queries
//! - [`RelationLookup`]: relation fields for a list of edges
//! - [`Provider`]: text generation and embeddings
//!
//! Implementations live in their respective crates, so the pipeline can be
//! driven by a remote service, the in-process graph store, or a test double.

pub mod error;
pub mod graph;
pub mod message;
pub mod provider;

// Re-export key types at crate root for ergonomics
pub use error::{Error, GraphError, ProviderError, Result};
pub use graph::{
    Edge, EntityLookup, GRAPH_FIELD_SEP, GraphLookup, Path, RelationLookup, ScoredEntity,
    Subgraph, Triple,
};
pub use message::{Message, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
