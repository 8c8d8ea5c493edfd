//! Scope and maintenance queries over the entries table.

use rusqlite::{params, Connection};

use lore_core::entry::EntryType;
use lore_core::KbResult;

use crate::to_storage_err;

/// Active entry ids for a project, created_at ascending.
pub fn entry_ids_by_project(conn: &Connection, project_ref: &str) -> KbResult<Vec<String>> {
    let mut stmt = conn
        .prepare(
            "SELECT id FROM knowledge_entries
             WHERE project_ref = ?1 AND is_active = 1
             ORDER BY created_at",
        )
        .map_err(to_storage_err)?;
    let rows = stmt
        .query_map(params![project_ref], |row| row.get::<_, String>(0))
        .map_err(to_storage_err)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(to_storage_err)
}

/// Active entry ids of a type, created_at ascending.
pub fn entry_ids_by_type(conn: &Connection, entry_type: EntryType) -> KbResult<Vec<String>> {
    let mut stmt = conn
        .prepare(
            "SELECT id FROM knowledge_entries
             WHERE entry_type = ?1 AND is_active = 1
             ORDER BY created_at",
        )
        .map_err(to_storage_err)?;
    let rows = stmt
        .query_map(params![entry_type.as_str()], |row| row.get::<_, String>(0))
        .map_err(to_storage_err)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(to_storage_err)
}

/// Reorder an id set by created_at ascending, dropping inactive entries.
pub fn order_ids_by_created(conn: &Connection, ids: &[String]) -> KbResult<Vec<String>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let placeholders = std::iter::repeat("?")
        .take(ids.len())
        .collect::<Vec<_>>()
        .join(",");
    let sql = format!(
        "SELECT id FROM knowledge_entries
         WHERE id IN ({placeholders}) AND is_active = 1
         ORDER BY created_at"
    );
    let values: Vec<&dyn rusqlite::types::ToSql> = ids
        .iter()
        .map(|id| id as &dyn rusqlite::types::ToSql)
        .collect();
    let mut stmt = conn.prepare(&sql).map_err(to_storage_err)?;
    let rows = stmt
        .query_map(values.as_slice(), |row| row.get::<_, String>(0))
        .map_err(to_storage_err)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(to_storage_err)
}

/// Active entry ids still waiting for an embedding.
pub fn entries_without_embeddings(conn: &Connection, limit: usize) -> KbResult<Vec<String>> {
    let mut stmt = conn
        .prepare(
            "SELECT id FROM knowledge_entries
             WHERE has_embedding = 0 AND is_active = 1
             LIMIT ?1",
        )
        .map_err(to_storage_err)?;
    let rows = stmt
        .query_map(params![limit as i64], |row| row.get::<_, String>(0))
        .map_err(to_storage_err)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(to_storage_err)
}

pub fn active_entry_count(conn: &Connection) -> KbResult<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM knowledge_entries WHERE is_active = 1",
        [],
        |row| row.get(0),
    )
    .map_err(to_storage_err)
}
