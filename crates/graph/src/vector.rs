//! Cosine similarity and brute-force ranking over entity embeddings.

use kgrag_core::graph::ScoredEntity;

/// Compute cosine similarity between two vectors.
///
/// Returns a value in [-1, 1] where 1 = identical, 0 = orthogonal, -1 = opposite.
/// Returns 0.0 if the lengths differ or either vector is empty or zero.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (x, y) in a.iter().zip(b.iter()) {
        let x = *x as f64;
        let y = *y as f64;
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < 1e-10 {
        return 0.0;
    }

    (dot / denom) as f32
}

/// Rank named embeddings by cosine similarity to `query`.
///
/// Ties are broken by name so that a longer result list always extends a
/// shorter one.
pub fn rank_by_similarity(
    entries: &[(String, Vec<f32>)],
    query: &[f32],
    limit: usize,
) -> Vec<ScoredEntity> {
    let mut scored: Vec<ScoredEntity> = entries
        .iter()
        .map(|(name, emb)| ScoredEntity {
            entity_name: name.clone(),
            score: cosine_similarity(emb, query),
        })
        .collect();

    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.entity_name.cmp(&b.entity_name))
    });
    scored.truncate(limit);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_vectors_score_one() {
        let v = vec![0.3, 0.4, 0.5];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn orthogonal_and_degenerate_vectors_score_zero() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn ranking_orders_by_score_then_name() {
        let entries = vec![
            ("b".to_string(), vec![1.0, 0.0]),
            ("a".to_string(), vec![1.0, 0.0]),
            ("c".to_string(), vec![0.0, 1.0]),
        ];
        let ranked = rank_by_similarity(&entries, &[1.0, 0.0], 10);
        let order: Vec<&str> = ranked.iter().map(|s| s.entity_name.as_str()).collect();
        assert_eq!(order, vec!["a", "b", "c"]);

        let top1 = rank_by_similarity(&entries, &[1.0, 0.0], 1);
        assert_eq!(top1[0].entity_name, "a");
    }
}
