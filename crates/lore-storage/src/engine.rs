//! KnowledgeStore: owns the connection pool and exposes every typed
//! data-access primitive the other components build on.

use std::path::Path;

use chrono::Utc;
use tracing::info;

use lore_core::entry::{EntryPatch, EntryType, KnowledgeEntry, NewEntry};
use lore_core::graph::{GraphEdge, GraphNode, Neighbor};
use lore_core::ingest::IngestedFile;
use lore_core::search::SearchFilters;
use lore_core::version::EntryVersion;
use lore_core::{KbError, KbResult};

use crate::pool::ConnectionPool;
use crate::queries::{entry_crud, entry_query, fts, graph_ops, ingest_ops, vector};
use crate::{schema, to_storage_err};

const READ_POOL_SIZE: usize = 4;

/// The main storage engine. All writes go through a single connection
/// inside one transaction per public operation; reads go through the
/// read pool.
pub struct KnowledgeStore {
    pool: ConnectionPool,
    embedding_dim: usize,
}

impl KnowledgeStore {
    /// Open a store backed by a file on disk. The writer opens first and
    /// applies the schema so the read-only pool attaches to a real
    /// database file.
    pub fn open(path: &Path, embedding_dim: usize) -> KbResult<Self> {
        crate::pool::register_vec_extension();
        let writer = crate::pool::WriteConnection::open(path)?;
        writer.with_conn(|conn| schema::apply_schema(conn, embedding_dim))?;
        let readers = crate::pool::ReadPool::open(path, READ_POOL_SIZE)?;
        Ok(Self {
            pool: ConnectionPool::from_parts(writer, readers, Some(path)),
            embedding_dim,
        })
    }

    /// Open an in-memory store (for testing).
    pub fn open_in_memory(embedding_dim: usize) -> KbResult<Self> {
        let pool = ConnectionPool::open_in_memory()?;
        pool.writer
            .with_conn(|conn| schema::apply_schema(conn, embedding_dim))?;
        Ok(Self {
            pool,
            embedding_dim,
        })
    }

    /// The connection pool, for advanced operations and tests.
    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    pub fn embedding_dim(&self) -> usize {
        self.embedding_dim
    }

    // --- Entry lifecycle ---

    /// Allocate an id and insert the entry plus its version-1 record in
    /// one transaction.
    pub fn create_entry(&self, new: NewEntry) -> KbResult<KnowledgeEntry> {
        validate_confidence(new.base_confidence)?;
        validate_tags(&new.tags)?;

        let entry = self.pool.writer.with_conn(|conn| {
            let tx = conn.unchecked_transaction().map_err(to_storage_err)?;
            let now = Utc::now();

            let id = entry_crud::next_entry_id(&tx)?;
            let entry = KnowledgeEntry {
                id: id.clone(),
                project_ref: new.project_ref.clone(),
                short_title: new.short_title.clone(),
                long_title: new.long_title.clone(),
                details: new.details.clone(),
                entry_type: new.entry_type,
                source_context: new.source_context.clone(),
                base_confidence: new.base_confidence,
                tags: new.tags.clone(),
                hints: new.hints.clone(),
                created_at: now,
                updated_at: now,
                last_accessed: None,
                superseded_by: None,
                is_active: true,
                has_embedding: false,
                version: 1,
            };
            entry_crud::insert_entry(&tx, &entry)?;
            entry_crud::insert_version(
                &tx,
                &EntryVersion {
                    entry_id: id,
                    version_number: 1,
                    details: entry.details.clone(),
                    change_reason: Some("Initial creation".to_string()),
                    confidence: entry.base_confidence,
                    created_at: now,
                },
            )?;

            tx.commit().map_err(to_storage_err)?;
            Ok(entry)
        })?;

        info!(entry_id = %entry.id, title = %entry.short_title, "created entry");
        Ok(entry)
    }

    /// Apply a patch, bump the version counter, and record the post-write
    /// state as a new version row. Rejects missing or inactive entries.
    pub fn update_entry(
        &self,
        entry_id: &str,
        patch: EntryPatch,
        change_reason: Option<String>,
    ) -> KbResult<KnowledgeEntry> {
        if let Some(confidence) = patch.base_confidence {
            validate_confidence(confidence)?;
        }
        if let Some(tags) = &patch.tags {
            validate_tags(tags)?;
        }

        let entry = self.pool.writer.with_conn(|conn| {
            let tx = conn.unchecked_transaction().map_err(to_storage_err)?;

            let existing = entry_crud::get_entry(&tx, entry_id)?
                .ok_or_else(|| KbError::not_found(entry_id))?;
            if !existing.is_active {
                return Err(KbError::not_found(entry_id));
            }

            let now = Utc::now();
            let details_changed = patch
                .details
                .as_ref()
                .is_some_and(|d| *d != existing.details);

            let mut updated = existing.clone();
            if let Some(details) = patch.details {
                updated.details = details;
            }
            if let Some(confidence) = patch.base_confidence {
                updated.base_confidence = confidence;
            }
            if let Some(tags) = patch.tags {
                updated.tags = tags;
            }
            if let Some(hints) = patch.hints {
                for (key, value) in hints {
                    updated.hints.insert(key, value);
                }
            }
            if let Some(superseded_by) = patch.superseded_by {
                updated.superseded_by = Some(superseded_by);
            }
            updated.version = existing.version + 1;
            updated.updated_at = now;
            if details_changed {
                // Needs re-embedding.
                updated.has_embedding = false;
            }

            entry_crud::update_entry_row(&tx, &updated)?;
            entry_crud::insert_version(
                &tx,
                &EntryVersion {
                    entry_id: entry_id.to_string(),
                    version_number: updated.version,
                    details: updated.details.clone(),
                    change_reason: change_reason.clone(),
                    confidence: updated.base_confidence,
                    created_at: now,
                },
            )?;

            tx.commit().map_err(to_storage_err)?;
            Ok(updated)
        })?;

        info!(entry_id = %entry.id, version = entry.version, "updated entry");
        Ok(entry)
    }

    pub fn get_entry(&self, entry_id: &str) -> KbResult<Option<KnowledgeEntry>> {
        self.pool.read(|conn| entry_crud::get_entry(conn, entry_id))
    }

    /// Fetch entries by id, input order preserved, inactive skipped
    /// unless flagged.
    pub fn get_entries(
        &self,
        ids: &[String],
        include_inactive: bool,
    ) -> KbResult<Vec<KnowledgeEntry>> {
        self.pool
            .read(|conn| entry_crud::get_entries(conn, ids, include_inactive))
    }

    /// Batch-set `last_accessed` to now. Invoked only on explicit
    /// retrieval, never on search.
    pub fn touch_accessed(&self, ids: &[String]) -> KbResult<()> {
        self.pool
            .writer
            .with_conn(|conn| entry_crud::touch_accessed(conn, ids, Utc::now()))
    }

    /// Soft-delete: the entry disappears from search and retrieval but
    /// the row (and its versions) remain.
    pub fn deactivate_entry(&self, entry_id: &str) -> KbResult<KnowledgeEntry> {
        let entry = self.pool.writer.with_conn(|conn| {
            let entry = entry_crud::get_entry(conn, entry_id)?
                .ok_or_else(|| KbError::not_found(entry_id))?;
            if !entry.is_active {
                return Err(KbError::not_found(entry_id));
            }
            entry_crud::set_active(conn, entry_id, false)?;
            Ok(entry)
        })?;
        info!(entry_id = %entry_id, "deactivated entry");
        Ok(entry)
    }

    pub fn mark_embedding(&self, entry_id: &str, has_embedding: bool) -> KbResult<()> {
        self.pool
            .writer
            .with_conn(|conn| entry_crud::mark_embedding(conn, entry_id, has_embedding))
    }

    pub fn entries_without_embeddings(&self, limit: usize) -> KbResult<Vec<String>> {
        self.pool
            .read(|conn| entry_query::entries_without_embeddings(conn, limit))
    }

    /// All version rows for an entry, oldest first.
    pub fn versions(&self, entry_id: &str) -> KbResult<Vec<EntryVersion>> {
        self.pool
            .read(|conn| entry_crud::versions_for_entry(conn, entry_id))
    }

    // --- Search primitives ---

    /// BM25 search over active entries. Scores are negative; more
    /// negative = stronger.
    pub fn fts_search(
        &self,
        query: &str,
        filters: &SearchFilters,
        limit: usize,
    ) -> KbResult<Vec<(String, f64)>> {
        self.pool
            .read(|conn| fts::fts_search(conn, query, filters, limit))
    }

    /// Store (or replace) the embedding for an entry and flag the entry,
    /// in one transaction.
    pub fn store_embedding(&self, entry_id: &str, embedding: &[f32]) -> KbResult<()> {
        self.pool.writer.with_conn(|conn| {
            let tx = conn.unchecked_transaction().map_err(to_storage_err)?;
            vector::store_embedding(&tx, entry_id, embedding, self.embedding_dim)?;
            entry_crud::mark_embedding(&tx, entry_id, true)?;
            tx.commit().map_err(to_storage_err)?;
            Ok(())
        })
    }

    /// KNN over stored vectors: `(entry_id, distance)` ascending.
    pub fn vector_search(&self, query: &[f32], limit: usize) -> KbResult<Vec<(String, f64)>> {
        if query.len() != self.embedding_dim {
            return Err(KbError::corruption(format!(
                "query vector has {} dimensions, expected {}",
                query.len(),
                self.embedding_dim
            )));
        }
        self.pool
            .writer
            .with_conn(|conn| vector::vector_search(conn, query, limit))
    }

    /// Vector rows for an entry (0 or 1); used by invariant checks.
    pub fn embedding_count(&self, entry_id: &str) -> KbResult<i64> {
        self.pool
            .writer
            .with_conn(|conn| vector::embedding_count(conn, entry_id))
    }

    // --- Graph primitives ---

    pub fn upsert_node(
        &self,
        node_id: &str,
        node_type: &str,
        properties: &serde_json::Value,
    ) -> KbResult<()> {
        self.pool
            .writer
            .with_conn(|conn| graph_ops::upsert_node(conn, node_id, node_type, properties, Utc::now()))
    }

    pub fn ensure_node(
        &self,
        node_id: &str,
        node_type: &str,
        properties: &serde_json::Value,
    ) -> KbResult<()> {
        self.pool
            .writer
            .with_conn(|conn| graph_ops::ensure_node(conn, node_id, node_type, properties, Utc::now()))
    }

    pub fn get_node(&self, node_id: &str) -> KbResult<Option<GraphNode>> {
        self.pool.read(|conn| graph_ops::get_node(conn, node_id))
    }

    /// Insert an edge; duplicate `(source, target, edge_type)` inserts
    /// are no-ops. Returns true if a row was added.
    pub fn insert_edge(
        &self,
        source: &str,
        target: &str,
        edge_type: &str,
        properties: &serde_json::Value,
    ) -> KbResult<bool> {
        self.pool.writer.with_conn(|conn| {
            graph_ops::insert_edge(conn, source, target, edge_type, properties, Utc::now())
        })
    }

    pub fn clear_non_llm_edges(&self, source: &str) -> KbResult<()> {
        self.pool
            .writer
            .with_conn(|conn| graph_ops::clear_non_llm_edges(conn, source))
    }

    pub fn clear_llm_edges(&self, source: &str) -> KbResult<()> {
        self.pool
            .writer
            .with_conn(|conn| graph_ops::clear_llm_edges(conn, source))
    }

    pub fn clear_outgoing_edges(&self, source: &str) -> KbResult<()> {
        self.pool
            .writer
            .with_conn(|conn| graph_ops::clear_outgoing_edges(conn, source))
    }

    pub fn neighbors(&self, node_id: &str, limit: usize) -> KbResult<Vec<Neighbor>> {
        self.pool
            .read(|conn| graph_ops::neighbors(conn, node_id, limit))
    }

    pub fn outgoing_edges(
        &self,
        source: &str,
        edge_type: Option<&str>,
    ) -> KbResult<Vec<GraphEdge>> {
        self.pool
            .read(|conn| graph_ops::outgoing_edges(conn, source, edge_type))
    }

    pub fn outgoing_llm_edges(&self, source: &str) -> KbResult<Vec<GraphEdge>> {
        self.pool
            .read(|conn| graph_ops::outgoing_llm_edges(conn, source))
    }

    pub fn sources_linking_to(
        &self,
        target: &str,
        edge_type: Option<&str>,
    ) -> KbResult<Vec<String>> {
        self.pool
            .read(|conn| graph_ops::sources_linking_to(conn, target, edge_type))
    }

    pub fn vocabulary_rows(&self, max_nodes: usize) -> KbResult<Vec<(String, String, i64)>> {
        self.pool
            .read(|conn| graph_ops::vocabulary_rows(conn, max_nodes))
    }

    pub fn node_counts_by_type(&self) -> KbResult<Vec<(String, i64)>> {
        self.pool.read(graph_ops::node_counts_by_type)
    }

    pub fn edge_counts_by_type(&self) -> KbResult<Vec<(String, i64)>> {
        self.pool.read(graph_ops::edge_counts_by_type)
    }

    // --- Scope queries ---

    pub fn entry_ids_by_project(&self, project_ref: &str) -> KbResult<Vec<String>> {
        self.pool
            .read(|conn| entry_query::entry_ids_by_project(conn, project_ref))
    }

    pub fn entry_ids_by_type(&self, entry_type: EntryType) -> KbResult<Vec<String>> {
        self.pool
            .read(|conn| entry_query::entry_ids_by_type(conn, entry_type))
    }

    pub fn order_ids_by_created(&self, ids: &[String]) -> KbResult<Vec<String>> {
        self.pool
            .read(|conn| entry_query::order_ids_by_created(conn, ids))
    }

    pub fn active_entry_count(&self) -> KbResult<i64> {
        self.pool.read(entry_query::active_entry_count)
    }

    // --- Ingested-file registry ---

    pub fn record_ingested_file(&self, file: &IngestedFile) -> KbResult<()> {
        self.pool
            .writer
            .with_conn(|conn| ingest_ops::upsert_ingested_file(conn, file))
    }

    pub fn ingested_file(&self, path: &str) -> KbResult<Option<IngestedFile>> {
        self.pool
            .read(|conn| ingest_ops::get_ingested_file(conn, path))
    }
}

fn validate_confidence(confidence: f64) -> KbResult<()> {
    if !(0.0..=1.0).contains(&confidence) || confidence.is_nan() {
        return Err(KbError::validation(format!(
            "confidence must be within [0.0, 1.0], got {confidence}"
        )));
    }
    Ok(())
}

fn validate_tags(tags: &[String]) -> KbResult<()> {
    for tag in tags {
        if tag.is_empty() || tag.chars().any(char::is_whitespace) {
            return Err(KbError::validation(format!(
                "tag '{tag}' must be a non-empty whitespace-free token"
            )));
        }
    }
    Ok(())
}
