//! Tuning constants shared across the workspace.

/// RRF smoothing constant, the standard value from the literature.
pub const RRF_K: f64 = 60.0;

/// Hybrid search requests `limit * OVERFETCH_FACTOR` candidates from each
/// retrieval method before fusion.
pub const OVERFETCH_FACTOR: usize = 3;

/// Result sets smaller than this trigger graph-hint augmentation.
pub const SPARSE_HINT_THRESHOLD: usize = 3;

/// Maximum number of graph hints attached to a sparse result set.
pub const MAX_GRAPH_HINTS: usize = 3;

/// Effective confidence below this attaches a staleness warning.
pub const STALENESS_WARN_THRESHOLD: f64 = 0.5;

/// Effective confidence below this excludes an entry from search results
/// unless the caller opts into stale entries.
pub const STALENESS_FILTER_THRESHOLD: f64 = 0.3;

/// Per-hit neighbour budget for the auto strategy's one-hop expansion.
pub const AUTO_NEIGHBOR_CAP: usize = 10;

/// Default fan-out bound for neighbour lookups.
pub const NEIGHBOR_LIMIT: usize = 50;

/// Hard cap on entries per `store_batch` call.
pub const MAX_BATCH_ENTRIES: usize = 10;

/// Hard cap on ids per `get` call.
pub const MAX_GET_IDS: usize = 20;

/// Maximum relationships accepted from a single LLM extraction.
pub const MAX_EXTRACTED_RELATIONSHIPS: usize = 8;

/// Similarity ratio at or above which an extracted entity reuses an
/// existing graph node instead of creating a new one.
pub const ENTITY_SIMILARITY_THRESHOLD: f64 = 0.85;

/// Default embedding vector dimension.
pub const DEFAULT_EMBEDDING_DIM: usize = 1024;

/// Default base confidence for new entries.
pub const DEFAULT_CONFIDENCE: f64 = 0.9;
