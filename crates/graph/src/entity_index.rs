//! Brute-force entity indexes.
//!
//! Both indexes score every entity on every lookup and order results by
//! descending score, then by name, so asking for more results only ever
//! appends to the list returned for fewer.

use crate::vector::rank_by_similarity;
use async_trait::async_trait;
use kgrag_core::error::GraphError;
use kgrag_core::graph::{EntityLookup, ScoredEntity};
use kgrag_core::provider::{EmbeddingRequest, Provider};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

/// Entity names per embedding request.
const EMBED_BATCH: usize = 256;

fn tokenize(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

// ── Keyword index ─────────────────────────────────────────────

/// Scores entities by the share of their name's words that occur in the query.
///
/// An entity whose full name appears verbatim in the query scores above any
/// partial match.
pub struct KeywordEntityIndex {
    entries: Vec<(String, String, HashSet<String>)>,
}

impl KeywordEntityIndex {
    pub fn new(names: impl IntoIterator<Item = String>) -> Self {
        let mut entries: Vec<(String, String, HashSet<String>)> = names
            .into_iter()
            .map(|name| {
                let lower = name.to_lowercase();
                let tokens = tokenize(&name);
                (name, lower, tokens)
            })
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries.dedup_by(|a, b| a.0 == b.0);
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn score(query_lower: &str, query_tokens: &HashSet<String>, lower: &str, tokens: &HashSet<String>) -> f32 {
        if tokens.is_empty() {
            return 0.0;
        }
        let overlap = tokens.intersection(query_tokens).count() as f32 / tokens.len() as f32;
        if query_lower.contains(lower) {
            overlap + 1.0
        } else {
            overlap
        }
    }
}

#[async_trait]
impl EntityLookup for KeywordEntityIndex {
    fn name(&self) -> &str {
        "keyword"
    }

    async fn top_k(&self, query: &str, top_k: usize) -> Result<Vec<ScoredEntity>, GraphError> {
        let query_lower = query.to_lowercase();
        let query_tokens = tokenize(query);

        let mut scored: Vec<ScoredEntity> = self
            .entries
            .iter()
            .map(|(name, lower, tokens)| ScoredEntity {
                entity_name: name.clone(),
                score: Self::score(&query_lower, &query_tokens, lower, tokens),
            })
            .collect();

        // Entries are pre-sorted by name and the sort is stable.
        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(top_k);
        Ok(scored)
    }
}

// ── Embedding index ───────────────────────────────────────────

/// Entity names embedded once through a provider, queries embedded per lookup.
pub struct VectorEntityIndex {
    provider: Arc<dyn Provider>,
    model: String,
    entries: Vec<(String, Vec<f32>)>,
}

impl VectorEntityIndex {
    /// Embed every entity name and build the index.
    pub async fn build(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        names: Vec<String>,
    ) -> Result<Self, GraphError> {
        let model = model.into();
        let mut entries = Vec::with_capacity(names.len());

        for chunk in names.chunks(EMBED_BATCH) {
            let vectors = embed(&provider, &model, chunk.to_vec()).await?;
            if vectors.len() != chunk.len() {
                return Err(GraphError::EmbeddingFailed(format!(
                    "expected {} embeddings, got {}",
                    chunk.len(),
                    vectors.len()
                )));
            }
            entries.extend(chunk.iter().cloned().zip(vectors));
        }

        info!(provider = provider.name(), model = %model, entities = entries.len(), "Entity embeddings built");
        Ok(Self {
            provider,
            model,
            entries,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

async fn embed(
    provider: &Arc<dyn Provider>,
    model: &str,
    inputs: Vec<String>,
) -> Result<Vec<Vec<f32>>, GraphError> {
    let response = provider
        .embed(EmbeddingRequest {
            model: model.to_string(),
            inputs,
        })
        .await
        .map_err(|e| GraphError::EmbeddingFailed(e.to_string()))?;
    Ok(response.embeddings)
}

#[async_trait]
impl EntityLookup for VectorEntityIndex {
    fn name(&self) -> &str {
        "vector"
    }

    async fn top_k(&self, query: &str, top_k: usize) -> Result<Vec<ScoredEntity>, GraphError> {
        let query_vec = embed(&self.provider, &self.model, vec![query.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| GraphError::EmbeddingFailed("empty embedding response".into()))?;

        let ranked = rank_by_similarity(&self.entries, &query_vec, top_k);
        debug!(top_k, returned = ranked.len(), "Vector entity lookup");
        Ok(ranked)
    }
}
