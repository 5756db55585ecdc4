//! Token estimation and the generic shrink loops.

pub mod shrink;
pub mod token;
