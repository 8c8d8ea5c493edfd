//! Reciprocal Rank Fusion: score = Σ 1/(K + rank + 1) with zero-based
//! ranks.
//!
//! Combines ranked id lists from different retrieval methods without
//! normalising their scores. Ids appearing in several lists accumulate
//! one term per list.

use std::collections::HashMap;

use lore_core::constants::RRF_K;

/// Fuse ranked id lists into `(id, score)` pairs, best first. Ties are
/// broken by id ascending so output order is deterministic regardless of
/// the order the input lists are supplied in.
pub fn fuse(ranked_lists: &[Vec<String>]) -> Vec<(String, f64)> {
    let mut scores: HashMap<String, f64> = HashMap::new();

    for list in ranked_lists {
        for (rank, id) in list.iter().enumerate() {
            *scores.entry(id.clone()).or_default() += 1.0 / (RRF_K + rank as f64 + 1.0);
        }
    }

    let mut fused: Vec<(String, f64)> = scores.into_iter().collect();
    fused.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    fused
}
