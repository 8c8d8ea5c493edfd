//! The `search` tool: hybrid retrieval plus sparse graph hints.

use lore_core::constants::SPARSE_HINT_THRESHOLD;
use lore_core::search::{SearchQuery, SearchResult};
use lore_core::{KbError, KbResult};
use lore_retrieval::{collect_graph_hints, hybrid_search};

use crate::context::ServerContext;

const MAX_SEARCH_LIMIT: usize = 50;

#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub results: Vec<SearchResult>,
    /// "See also" lines, present only when the result set is sparse.
    pub hints: Vec<String>,
    /// Degradation note when vector search is unavailable.
    pub note: Option<String>,
}

/// Hybrid semantic + keyword search with confidence decay. Never touches
/// `last_accessed`.
pub async fn search(ctx: &ServerContext, query: SearchQuery) -> KbResult<SearchOutcome> {
    if query.limit == 0 || query.limit > MAX_SEARCH_LIMIT {
        return Err(KbError::validation(format!(
            "limit must be between 1 and {MAX_SEARCH_LIMIT}, got {}",
            query.limit
        )));
    }

    let results = hybrid_search(&ctx.store, ctx.embedder.as_ref(), &query).await?;

    let note = match &ctx.embedder {
        Some(embedder) if embedder.is_available().await => None,
        _ => Some("Vector search unavailable. Results are FTS-only.".to_string()),
    };

    let hints = if results.len() < SPARSE_HINT_THRESHOLD {
        collect_graph_hints(&ctx.store, &results)?
    } else {
        Vec::new()
    };

    Ok(SearchOutcome {
        results,
        hints,
        note,
    })
}
