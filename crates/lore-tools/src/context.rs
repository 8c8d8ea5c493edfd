//! Server context: every shared collaborator as an explicit field,
//! passed to handlers. No ambient globals.

use tracing::{info, warn};

use lore_core::entry::KnowledgeEntry;
use lore_core::{KbConfig, KbResult};
use lore_embeddings::EmbeddingClient;
use lore_graph::{GraphBuilder, GraphEnricher};
use lore_llm::{create_provider, LlmProvider};
use lore_storage::KnowledgeStore;

/// Owns the store, the optional embedder, and the optional LLM
/// providers for extraction and query planning.
pub struct ServerContext {
    pub store: KnowledgeStore,
    pub embedder: Option<EmbeddingClient>,
    pub extraction_llm: Option<Box<dyn LlmProvider>>,
    pub query_llm: Option<Box<dyn LlmProvider>>,
    pub config: KbConfig,
}

impl ServerContext {
    /// Open the store and wire up the configured collaborators.
    pub fn initialize(config: KbConfig) -> KbResult<Self> {
        let store = KnowledgeStore::open(&config.db_path, config.embedding_dim)?;
        Ok(Self::with_store(store, config))
    }

    /// Build a context around an existing store (used by tests with
    /// in-memory stores).
    pub fn with_store(store: KnowledgeStore, config: KbConfig) -> Self {
        let embedder = Some(EmbeddingClient::new(&config));

        let extraction_llm = create_provider(&config.extraction_provider, &config);
        if extraction_llm.is_none() {
            warn!(
                provider = %config.extraction_provider,
                "extraction LLM not available, graph enrichment disabled"
            );
        }
        let query_llm = create_provider(&config.query_provider, &config);
        if query_llm.is_none() {
            warn!(
                provider = %config.query_provider,
                "query LLM not available, query planning disabled"
            );
        }

        info!(db = %config.db_path.display(), "server context initialized");
        Self {
            store,
            embedder,
            extraction_llm,
            query_llm,
            config,
        }
    }

    /// Release provider resources.
    pub async fn close(&self) {
        if let Some(llm) = &self.extraction_llm {
            llm.close().await;
        }
        if let Some(llm) = &self.query_llm {
            llm.close().await;
        }
    }

    /// Post-commit pipeline: embed, deterministic graph, LLM enrichment.
    /// The entry is already durable; each step is isolated and a failure
    /// in one never stops the next.
    pub(crate) async fn post_store_pipeline(&self, entry: &KnowledgeEntry, enrich: bool) {
        self.embed_entry(entry).await;
        self.build_graph(entry);
        if enrich {
            self.enrich_entry(entry).await;
        }
    }

    pub(crate) async fn embed_entry(&self, entry: &KnowledgeEntry) {
        let Some(embedder) = &self.embedder else {
            return;
        };
        if let Some(embedding) = embedder.embed(&entry.embedding_text()).await {
            if let Err(e) = self.store.store_embedding(&entry.id, &embedding) {
                warn!(entry_id = %entry.id, error = %e, "failed to store embedding");
            }
        }
    }

    pub(crate) fn build_graph(&self, entry: &KnowledgeEntry) {
        if let Err(e) = GraphBuilder::new(&self.store).build_for_entry(entry) {
            warn!(entry_id = %entry.id, error = %e, "failed to build graph");
        }
    }

    pub(crate) async fn enrich_entry(&self, entry: &KnowledgeEntry) {
        let Some(llm) = &self.extraction_llm else {
            return;
        };
        let enricher = GraphEnricher::new(
            &self.store,
            llm.as_ref(),
            self.config.entity_similarity_threshold,
        );
        if let Err(e) = enricher.enrich_entry(entry).await {
            warn!(entry_id = %entry.id, error = %e, "failed to enrich graph");
        }
    }

    pub(crate) async fn enrich_batch(&self, entries: &[KnowledgeEntry]) {
        let Some(llm) = &self.extraction_llm else {
            return;
        };
        let enricher = GraphEnricher::new(
            &self.store,
            llm.as_ref(),
            self.config.entity_similarity_threshold,
        );
        if let Err(e) = enricher.enrich_batch(entries).await {
            warn!(error = %e, "batch enrichment failed");
        }
    }
}
