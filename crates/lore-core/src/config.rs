//! Environment-variable-driven configuration.
//!
//! Every option has a `KB_*` variable and a default that works on a
//! developer machine with a local Ollama.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_EMBEDDING_DIM, ENTITY_SIMILARITY_THRESHOLD};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KbConfig {
    /// Location of the single-file store.
    pub db_path: PathBuf,
    /// Embedding vector dimension (also the vec0 column width).
    pub embedding_dim: usize,
    pub embedding_model: String,
    /// Ollama base URL for both the embedder and the ollama LLM backend.
    pub ollama_url: String,
    pub embed_timeout_secs: u64,
    pub llm_model: String,
    pub llm_timeout_secs: u64,
    pub anthropic_model: String,
    pub anthropic_timeout_secs: u64,
    /// LLM backend for graph enrichment: "anthropic", "ollama", or
    /// anything else to disable.
    pub extraction_provider: String,
    /// LLM backend for query planning and synthesis.
    pub query_provider: String,
    /// Gates the administrative tool surface.
    pub manager_mode: bool,
    /// Upper bound for the external ingestion pipeline, in bytes.
    pub ingest_max_file_size: u64,
    pub log_level: String,
    /// Similarity ratio at which enrichment reuses an existing graph node.
    pub entity_similarity_threshold: f64,
}

impl Default for KbConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            embedding_dim: DEFAULT_EMBEDDING_DIM,
            embedding_model: "qwen3-embedding:0.6b".to_string(),
            ollama_url: "http://localhost:11434".to_string(),
            embed_timeout_secs: 10,
            llm_model: "qwen3:4b".to_string(),
            llm_timeout_secs: 120,
            anthropic_model: "claude-haiku-4-5".to_string(),
            anthropic_timeout_secs: 30,
            extraction_provider: "anthropic".to_string(),
            query_provider: "anthropic".to_string(),
            manager_mode: false,
            ingest_max_file_size: 500 * 1024,
            log_level: "warning".to_string(),
            entity_similarity_threshold: ENTITY_SIMILARITY_THRESHOLD,
        }
    }
}

impl KbConfig {
    /// Build a config from `KB_*` environment variables, falling back to
    /// defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(path) = std::env::var("KB_DB_PATH") {
            cfg.db_path = PathBuf::from(path);
        }
        if let Some(dim) = env_parse("KB_EMBEDDING_DIM") {
            cfg.embedding_dim = dim;
        }
        if let Ok(model) = std::env::var("KB_EMBEDDING_MODEL") {
            cfg.embedding_model = model;
        }
        if let Ok(url) = std::env::var("KB_OLLAMA_URL") {
            cfg.ollama_url = url;
        }
        if let Some(secs) = env_parse("KB_OLLAMA_TIMEOUT") {
            cfg.embed_timeout_secs = secs;
        }
        if let Ok(model) = std::env::var("KB_OLLAMA_MODEL") {
            cfg.llm_model = model;
        }
        if let Some(secs) = env_parse("KB_OLLAMA_LLM_TIMEOUT") {
            cfg.llm_timeout_secs = secs;
        }
        if let Ok(model) = std::env::var("KB_ANTHROPIC_MODEL") {
            cfg.anthropic_model = model;
        }
        if let Some(secs) = env_parse("KB_ANTHROPIC_TIMEOUT") {
            cfg.anthropic_timeout_secs = secs;
        }
        if let Ok(provider) = std::env::var("KB_EXTRACTION_PROVIDER") {
            cfg.extraction_provider = provider;
        }
        if let Ok(provider) = std::env::var("KB_QUERY_PROVIDER") {
            cfg.query_provider = provider;
        }
        if let Ok(flag) = std::env::var("KB_MANAGER") {
            cfg.manager_mode = flag.eq_ignore_ascii_case("true");
        }
        if let Some(size) = env_parse("KB_INGEST_MAX_FILE_SIZE") {
            cfg.ingest_max_file_size = size;
        }
        if let Ok(level) = std::env::var("KB_LOG_LEVEL") {
            cfg.log_level = level;
        }
        if let Some(threshold) = env_parse("KB_ENTITY_SIMILARITY_THRESHOLD") {
            cfg.entity_similarity_threshold = threshold;
        }
        cfg
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("lore")
        .join("knowledge.db")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg = KbConfig::default();
        assert_eq!(cfg.embedding_dim, 1024);
        assert_eq!(cfg.embed_timeout_secs, 10);
        assert_eq!(cfg.extraction_provider, "anthropic");
        assert!(!cfg.manager_mode);
        assert!(cfg.db_path.ends_with("lore/knowledge.db"));
        assert!((cfg.entity_similarity_threshold - 0.85).abs() < f64::EPSILON);
    }
}
