//! Seed resolution and graph retrieval.

pub mod seeder;
pub mod subgraph;
