//! Search request and result models.

use serde::{Deserialize, Serialize};

use crate::entry::{EntryType, KnowledgeEntry};

/// Optional narrowing filters shared by FTS and the hybrid ranker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchFilters {
    pub project_ref: Option<String>,
    pub entry_type: Option<EntryType>,
    /// All listed tags must match.
    pub tags: Option<Vec<String>>,
}

/// Parameters for a knowledge base search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchQuery {
    pub query: String,
    #[serde(default)]
    pub filters: SearchFilters,
    pub limit: usize,
    /// Include entries whose effective confidence fell below the filter
    /// threshold.
    pub include_stale: bool,
}

impl SearchQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            filters: SearchFilters::default(),
            limit: 10,
            include_stale: false,
        }
    }
}

/// Which retrieval methods contributed to a result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchSource {
    /// FTS and vector search both contributed.
    Hybrid,
    /// FTS only (embedder unavailable or no vector candidates).
    Fts,
}

impl MatchSource {
    pub fn as_str(self) -> &'static str {
        match self {
            MatchSource::Hybrid => "hybrid",
            MatchSource::Fts => "fts",
        }
    }
}

/// A single search result with scoring and staleness info.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub entry: KnowledgeEntry,
    /// Fused RRF score (higher = more relevant).
    pub score: f64,
    pub effective_confidence: f64,
    pub staleness_warning: Option<String>,
    pub match_source: MatchSource,
}
