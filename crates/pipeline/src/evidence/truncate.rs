//! Tiered truncation of per-edge relation blocks.
//!
//! | edges `E`      | per-edge cap |
//! |----------------|--------------|
//! | `E > 250`      | 120          |
//! | `100 < E ≤ 250`| 200          |
//! | `E ≤ 100`      | 300          |

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Per-edge cap for a collection of `edge_count` edges.
pub fn per_edge_cap(edge_count: usize) -> usize {
    if edge_count > 250 {
        120
    } else if edge_count > 100 {
        200
    } else {
        300
    }
}

/// What tiered truncation removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TruncationReport {
    pub edges: usize,
    pub cap: usize,
    pub truncated_edges: usize,
    pub dropped_relations: usize,
}

/// Cap each block at [`per_edge_cap`] and concatenate.
///
/// Kept strings are joined with `", "` and every non-empty block is followed
/// by `", "`. Empty blocks contribute nothing.
pub fn truncate_relations(blocks: &[Vec<String>]) -> (String, TruncationReport) {
    let cap = per_edge_cap(blocks.len());
    let mut report = TruncationReport {
        edges: blocks.len(),
        cap,
        ..Default::default()
    };

    let mut out = String::new();
    for block in blocks {
        if block.is_empty() {
            continue;
        }
        if block.len() > cap {
            debug!(from = block.len(), to = cap, "Truncating relation block");
            report.truncated_edges += 1;
            report.dropped_relations += block.len() - cap;
        }
        let kept = &block[..block.len().min(cap)];
        out.push_str(&kept.join(", "));
        out.push_str(", ");
    }

    (out, report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(edge: usize, n: usize) -> Vec<String> {
        (0..n).map(|i| format!("e{edge} r{i} t")).collect()
    }

    #[test]
    fn tier_boundaries() {
        assert_eq!(per_edge_cap(0), 300);
        assert_eq!(per_edge_cap(100), 300);
        assert_eq!(per_edge_cap(101), 200);
        assert_eq!(per_edge_cap(250), 200);
        assert_eq!(per_edge_cap(251), 120);
    }

    #[test]
    fn joins_blocks_with_trailing_separator() {
        let blocks = vec![
            vec!["Alice bornIn Paris".to_string(), "Alice diedIn Paris".to_string()],
            vec!["Paris capitalOf France".to_string()],
        ];
        let (text, report) = truncate_relations(&blocks);
        assert_eq!(
            text,
            "Alice bornIn Paris, Alice diedIn Paris, Paris capitalOf France, "
        );
        assert_eq!(report.truncated_edges, 0);
        assert_eq!(report.cap, 300);
    }

    #[test]
    fn empty_blocks_are_skipped() {
        let blocks = vec![vec![], vec!["a r b".to_string()], vec![]];
        assert_eq!(truncate_relations(&blocks).0, "a r b, ");
    }

    #[test]
    fn dense_collections_get_tighter_caps() {
        let blocks: Vec<Vec<String>> = (0..251).map(|e| block(e, if e == 0 { 150 } else { 1 })).collect();
        let (text, report) = truncate_relations(&blocks);
        assert_eq!(report.cap, 120);
        assert_eq!(report.truncated_edges, 1);
        assert_eq!(report.dropped_relations, 30);
        assert!(text.starts_with("e0 r0 t, "));
        assert!(text.contains("e0 r119 t, e1 r0 t"));
        assert!(!text.contains("e0 r120 t"));
    }

    #[test]
    fn truncation_is_idempotent() {
        let blocks: Vec<Vec<String>> = (0..120).map(|e| block(e, 250)).collect();
        let (first, _) = truncate_relations(&blocks);
        let cap = per_edge_cap(blocks.len());
        let capped: Vec<Vec<String>> = blocks.iter().map(|b| b[..b.len().min(cap)].to_vec()).collect();
        let (second, report) = truncate_relations(&capped);
        assert_eq!(first, second);
        assert_eq!(report.truncated_edges, 0);
    }
}
