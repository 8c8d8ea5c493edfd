//! Hybrid search: FTS ∥ vector → RRF → decay filter.

use chrono::Utc;
use tracing::warn;

use lore_core::constants::OVERFETCH_FACTOR;
use lore_core::search::{MatchSource, SearchQuery, SearchResult};
use lore_core::KbResult;
use lore_embeddings::EmbeddingClient;
use lore_storage::KnowledgeStore;

use crate::rrf;

/// Execute hybrid search combining BM25 and vector similarity via RRF.
///
/// Falls back to FTS-only when the embedder is missing or unavailable.
/// Search never touches `last_accessed`.
pub async fn hybrid_search(
    store: &KnowledgeStore,
    embedder: Option<&EmbeddingClient>,
    query: &SearchQuery,
) -> KbResult<Vec<SearchResult>> {
    let fetch_limit = query.limit * OVERFETCH_FACTOR;

    let fts_ids: Vec<String> = match store.fts_search(&query.query, &query.filters, fetch_limit) {
        Ok(hits) => hits.into_iter().map(|(id, _)| id).collect(),
        Err(e) => {
            warn!(error = %e, "FTS search failed");
            Vec::new()
        }
    };

    let mut vec_ids: Vec<String> = Vec::new();
    if let Some(embedder) = embedder {
        if let Some(embedding) = embedder.embed(&query.query).await {
            match store.vector_search(&embedding, fetch_limit) {
                Ok(hits) => vec_ids = hits.into_iter().map(|(id, _)| id).collect(),
                Err(e) => warn!(error = %e, "vector search failed"),
            }
        }
    }

    let match_source = if vec_ids.is_empty() {
        MatchSource::Fts
    } else {
        MatchSource::Hybrid
    };

    let fused = rrf::fuse(&[fts_ids, vec_ids]);

    let now = Utc::now();
    let mut results = Vec::new();
    for (entry_id, score) in fused.into_iter().take(query.limit) {
        let Some(entry) = store.get_entry(&entry_id)? else {
            continue;
        };
        if !entry.is_active {
            continue;
        }

        let effective = lore_decay::entry_confidence(&entry, now);
        if !query.include_stale && lore_decay::is_filtered(effective) {
            continue;
        }
        let staleness_warning = lore_decay::staleness_warning(effective, entry.entry_type);

        results.push(SearchResult {
            entry,
            score,
            effective_confidence: effective,
            staleness_warning,
            match_source,
        });
    }

    Ok(results)
}
