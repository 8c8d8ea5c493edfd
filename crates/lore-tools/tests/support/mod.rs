//! Shared fixtures for the tool tests.

use lore_core::entry::{EntryType, NewEntry};
use lore_core::KbConfig;
use lore_storage::KnowledgeStore;
use lore_tools::ServerContext;

/// A context around an in-memory store whose network collaborators are
/// unreachable or disabled, so every tool runs on its degradation path.
pub fn test_ctx() -> ServerContext {
    let store = KnowledgeStore::open_in_memory(4).unwrap();
    let config = KbConfig {
        embedding_dim: 4,
        ollama_url: "http://127.0.0.1:1".to_string(),
        embed_timeout_secs: 1,
        extraction_provider: "disabled".to_string(),
        query_provider: "disabled".to_string(),
        ..KbConfig::default()
    };
    ServerContext::with_store(store, config)
}

pub fn fields(title: &str, details: &str) -> NewEntry {
    NewEntry {
        short_title: title.to_string(),
        long_title: format!("{title} long"),
        details: details.to_string(),
        entry_type: EntryType::FactualReference,
        ..NewEntry::default()
    }
}
