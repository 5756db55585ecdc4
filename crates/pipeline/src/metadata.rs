//! Per-query assembly telemetry.
//!
//! Everything logged through `tracing` during assembly is also collected here
//! so hosts without a subscriber can still inspect what happened.

use crate::budget::shrink::ShrinkReport;
use serde::{Deserialize, Serialize};

/// How evidence was cut down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrimKind {
    /// Candidate list cut to the fixed maximum before budgeting.
    CandidateCap,
    /// Last items dropped until the prompt fit.
    ListTail,
    /// Trailing share of the text dropped per round.
    Ratio,
    /// Longest fitting prefix kept.
    TokenClamp,
    /// Per-edge relation cap from the tier table.
    EdgeCap,
}

/// One trimming step applied to a named stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrimRecord {
    pub stage: String,
    pub kind: TrimKind,
    /// Items or characters removed, depending on `kind`.
    pub removed: usize,
    pub tokens_before: usize,
    pub tokens_after: usize,
    pub fits: bool,
}

impl TrimRecord {
    pub fn from_shrink(stage: impl Into<String>, kind: TrimKind, report: &ShrinkReport) -> Self {
        Self {
            stage: stage.into(),
            kind,
            removed: report.removed,
            tokens_before: report.initial_cost,
            tokens_after: report.final_cost,
            fits: report.fits,
        }
    }
}

/// Candidate counts for one reranked collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateStats {
    pub collection: String,
    pub original: usize,
    pub after_cap: usize,
    pub after_shrink: usize,
}

/// Metadata about one assembled context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextMetadata {
    /// Strategy name ("cross_set" or "path_rerank").
    pub strategy: String,
    pub seeds: Vec<String>,
    pub seed_rounds: usize,
    pub seed_exhausted: bool,
    /// Edges kept after cross-set filtering (cross-set strategy only).
    pub edges: usize,
    pub candidates: Vec<CandidateStats>,
    pub trims: Vec<TrimRecord>,
    /// Estimated tokens in the final context.
    pub context_tokens: usize,
    pub budget: usize,
    /// Budget utilization percentage (0.0–100.0).
    pub utilization_pct: f32,
    /// Generation calls issued while assembling (answer call excluded).
    pub generation_calls: usize,
}

impl ContextMetadata {
    pub fn new(strategy: impl Into<String>, budget: usize) -> Self {
        Self {
            strategy: strategy.into(),
            seeds: Vec::new(),
            seed_rounds: 0,
            seed_exhausted: false,
            edges: 0,
            candidates: Vec::new(),
            trims: Vec::new(),
            context_tokens: 0,
            budget,
            utilization_pct: 0.0,
            generation_calls: 0,
        }
    }

    /// Record a trim if it removed anything.
    pub fn record(&mut self, trim: TrimRecord) {
        if trim.removed > 0 {
            self.trims.push(trim);
        }
    }

    pub fn set_context_tokens(&mut self, tokens: usize) {
        self.context_tokens = tokens;
        self.utilization_pct = if self.budget == 0 {
            0.0
        } else {
            (tokens as f32 / self.budget as f32) * 100.0
        };
    }
}
