//! # lore-storage
//!
//! Single-file SQLite store. Owns the physical schema (entries, versions,
//! FTS5 index, vec0 vector index, graph nodes/edges, id sequence,
//! ingested-file registry) and exposes the typed data-access primitives
//! every other component builds on.

pub mod engine;
pub mod pool;
pub mod queries;
pub mod schema;

pub use engine::KnowledgeStore;

use lore_core::KbError;

/// Map any displayable error into the storage variant.
pub(crate) fn to_storage_err(e: impl std::fmt::Display) -> KbError {
    KbError::storage(e.to_string())
}
