//! # kgrag-eval
//!
//! Offline evaluation for kgrag runs.
//!
//! - [`dataset`] loads question files (`Question.json` lines or a `train.json` array)
//! - [`normalize`] canonicalizes answer text before matching
//! - [`scoring`] extracts `answerN` candidates and computes hits@1/5/10
//! - [`stats`] aggregates scores, extraction rates and run telemetry

pub mod dataset;
pub mod error;
pub mod normalize;
pub mod scoring;
pub mod stats;

pub use dataset::{
    QaItem, RunRecord, UNKNOWN_LABEL, load_dataset, load_run_records, parse_dataset,
    parse_run_records,
};
pub use error::EvalError;
pub use normalize::normalize_text;
pub use scoring::{ItemScore, extract_answer, extract_answers, score_item};
pub use stats::{EvalStats, ExtractionStats, HitTally, HitsAtK, LatencyStats};
