//! Evaluation errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EvalError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON at line {line}: {source}")]
    Json {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Record at line {line} is missing field '{field}'")]
    MissingField { line: usize, field: &'static str },
}
