//! Reranker: one generation call per candidate collection.
//!
//! The candidate list is capped, then shrunk from the tail until the
//! outbound ranking prompt fits the budget. The response is returned verbatim.

use crate::budget::shrink::shrink_list;
use crate::budget::token::TokenCounter;
use crate::error::QueryError;
use crate::generator::Generator;
use crate::metadata::{CandidateStats, TrimKind, TrimRecord};
use crate::prompts;
use tracing::{debug, info};

/// Result of ranking one collection.
#[derive(Debug, Clone, Default)]
pub struct RerankOutcome {
    /// Ranked evidence, or empty when nothing was sent.
    pub text: String,
    pub stats: CandidateStats,
    pub trims: Vec<TrimRecord>,
    /// Whether a generation call was issued.
    pub called: bool,
}

pub struct Reranker {
    generator: Generator,
    counter: TokenCounter,
    candidate_cap: usize,
    budget: usize,
}

impl Reranker {
    pub fn new(generator: Generator, counter: TokenCounter, candidate_cap: usize, budget: usize) -> Self {
        Self {
            generator,
            counter,
            candidate_cap,
            budget,
        }
    }

    pub async fn rerank(
        &self,
        collection: &str,
        mut candidates: Vec<String>,
        query: &str,
    ) -> Result<RerankOutcome, QueryError> {
        let mut outcome = RerankOutcome {
            stats: CandidateStats {
                collection: collection.to_string(),
                original: candidates.len(),
                ..Default::default()
            },
            ..Default::default()
        };

        if candidates.is_empty() {
            debug!(collection, "No candidates, skipping rerank");
            return Ok(outcome);
        }

        if candidates.len() > self.candidate_cap {
            let before = candidates.len();
            candidates.truncate(self.candidate_cap);
            outcome.trims.push(TrimRecord {
                stage: collection.to_string(),
                kind: TrimKind::CandidateCap,
                removed: before - candidates.len(),
                tokens_before: 0,
                tokens_after: 0,
                fits: true,
            });
        }
        outcome.stats.after_cap = candidates.len();

        let (prompt, report) = shrink_list(
            &mut candidates,
            |items: &[String]| prompts::rerank(&items.join("\n"), query),
            |text: &str| self.counter.count(text),
            self.budget,
        );
        outcome.stats.after_shrink = candidates.len();
        if report.trimmed() {
            outcome
                .trims
                .push(TrimRecord::from_shrink(collection, TrimKind::ListTail, &report));
        }

        info!(
            collection,
            original = outcome.stats.original,
            after_cap = outcome.stats.after_cap,
            final_count = outcome.stats.after_shrink,
            prompt_tokens = report.final_cost,
            "Rerank candidates"
        );

        if candidates.is_empty() {
            return Ok(outcome);
        }

        outcome.text = self.generator.ask(prompt).await?;
        outcome.called = true;
        Ok(outcome)
    }
}
