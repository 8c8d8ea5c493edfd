//! Insert, update, get, versioning, and lifecycle ops for entries.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use lore_core::entry::{format_entry_id, EntryType, KnowledgeEntry};
use lore_core::version::EntryVersion;
use lore_core::{KbError, KbResult};

use crate::to_storage_err;

/// Read and increment the single-row id sequence. Must run inside the
/// caller's write transaction so the allocation is atomic with the insert.
pub fn next_entry_id(conn: &Connection) -> KbResult<String> {
    let next: i64 = conn
        .query_row("SELECT next_id FROM entry_id_seq", [], |row| row.get(0))
        .map_err(to_storage_err)?;
    conn.execute("UPDATE entry_id_seq SET next_id = ?1", params![next + 1])
        .map_err(to_storage_err)?;
    Ok(format_entry_id(next))
}

/// Insert a new entry row. FTS is synced by triggers. Tags are stored
/// whitespace-joined so the FTS tokeniser and the tag filter both see
/// them directly.
pub fn insert_entry(conn: &Connection, entry: &KnowledgeEntry) -> KbResult<()> {
    let hints_json = serde_json::to_string(&entry.hints).map_err(to_storage_err)?;
    conn.execute(
        "INSERT INTO knowledge_entries
            (id, project_ref, short_title, long_title, details, entry_type,
             source_context, confidence, tags, hints, created_at, updated_at,
             last_accessed, superseded_by, is_active, has_embedding, version)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
        params![
            entry.id,
            entry.project_ref,
            entry.short_title,
            entry.long_title,
            entry.details,
            entry.entry_type.as_str(),
            entry.source_context,
            entry.base_confidence,
            entry.tags.join(" "),
            hints_json,
            entry.created_at.to_rfc3339(),
            entry.updated_at.to_rfc3339(),
            entry.last_accessed.map(|t| t.to_rfc3339()),
            entry.superseded_by,
            entry.is_active as i64,
            entry.has_embedding as i64,
            entry.version,
        ],
    )
    .map_err(to_storage_err)?;
    Ok(())
}

/// Overwrite an existing entry row.
pub fn update_entry_row(conn: &Connection, entry: &KnowledgeEntry) -> KbResult<()> {
    let hints_json = serde_json::to_string(&entry.hints).map_err(to_storage_err)?;
    let rows = conn
        .execute(
            "UPDATE knowledge_entries SET
                project_ref = ?2, short_title = ?3, long_title = ?4, details = ?5,
                entry_type = ?6, source_context = ?7, confidence = ?8, tags = ?9,
                hints = ?10, updated_at = ?11, last_accessed = ?12,
                superseded_by = ?13, is_active = ?14, has_embedding = ?15, version = ?16
             WHERE id = ?1",
            params![
                entry.id,
                entry.project_ref,
                entry.short_title,
                entry.long_title,
                entry.details,
                entry.entry_type.as_str(),
                entry.source_context,
                entry.base_confidence,
                entry.tags.join(" "),
                hints_json,
                entry.updated_at.to_rfc3339(),
                entry.last_accessed.map(|t| t.to_rfc3339()),
                entry.superseded_by,
                entry.is_active as i64,
                entry.has_embedding as i64,
                entry.version,
            ],
        )
        .map_err(to_storage_err)?;
    if rows == 0 {
        return Err(KbError::not_found(&entry.id));
    }
    Ok(())
}

const ENTRY_COLUMNS: &str = "id, project_ref, short_title, long_title, details, entry_type,
     source_context, confidence, tags, hints, created_at, updated_at,
     last_accessed, superseded_by, is_active, has_embedding, version";

/// Get a single entry by id, active or not.
pub fn get_entry(conn: &Connection, entry_id: &str) -> KbResult<Option<KnowledgeEntry>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {ENTRY_COLUMNS} FROM knowledge_entries WHERE id = ?1"
        ))
        .map_err(to_storage_err)?;
    let result = stmt
        .query_row(params![entry_id], |row| Ok(row_to_entry(row)))
        .optional()
        .map_err(to_storage_err)?;
    match result {
        Some(entry) => Ok(Some(entry?)),
        None => Ok(None),
    }
}

/// Get entries by id, preserving input order. Inactive entries are
/// skipped unless `include_inactive`.
pub fn get_entries(
    conn: &Connection,
    ids: &[String],
    include_inactive: bool,
) -> KbResult<Vec<KnowledgeEntry>> {
    let mut results = Vec::with_capacity(ids.len());
    for id in ids {
        if let Some(entry) = get_entry(conn, id)? {
            if entry.is_active || include_inactive {
                results.push(entry);
            }
        }
    }
    Ok(results)
}

/// Batch-set `last_accessed`. Invoked only on explicit retrieval, never
/// on search.
pub fn touch_accessed(conn: &Connection, ids: &[String], now: DateTime<Utc>) -> KbResult<()> {
    if ids.is_empty() {
        return Ok(());
    }
    let placeholders = std::iter::repeat("?")
        .take(ids.len())
        .collect::<Vec<_>>()
        .join(",");
    let sql =
        format!("UPDATE knowledge_entries SET last_accessed = ?1 WHERE id IN ({placeholders})");
    let mut values: Vec<Box<dyn rusqlite::types::ToSql>> = vec![Box::new(now.to_rfc3339())];
    for id in ids {
        values.push(Box::new(id.clone()));
    }
    let refs: Vec<&dyn rusqlite::types::ToSql> = values.iter().map(|v| v.as_ref()).collect();
    conn.execute(&sql, refs.as_slice()).map_err(to_storage_err)?;
    Ok(())
}

/// Flip the soft-delete flag. Returns the number of affected rows.
pub fn set_active(conn: &Connection, entry_id: &str, active: bool) -> KbResult<usize> {
    conn.execute(
        "UPDATE knowledge_entries SET is_active = ?2 WHERE id = ?1",
        params![entry_id, active as i64],
    )
    .map_err(to_storage_err)
}

/// Mark whether an entry currently has a vector row.
pub fn mark_embedding(conn: &Connection, entry_id: &str, has_embedding: bool) -> KbResult<()> {
    conn.execute(
        "UPDATE knowledge_entries SET has_embedding = ?2 WHERE id = ?1",
        params![entry_id, has_embedding as i64],
    )
    .map_err(to_storage_err)?;
    Ok(())
}

pub fn insert_version(conn: &Connection, version: &EntryVersion) -> KbResult<()> {
    conn.execute(
        "INSERT INTO entry_versions
            (entry_id, version_number, details, change_reason, confidence, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            version.entry_id,
            version.version_number,
            version.details,
            version.change_reason,
            version.confidence,
            version.created_at.to_rfc3339(),
        ],
    )
    .map_err(to_storage_err)?;
    Ok(())
}

/// All version rows for an entry, oldest first.
pub fn versions_for_entry(conn: &Connection, entry_id: &str) -> KbResult<Vec<EntryVersion>> {
    let mut stmt = conn
        .prepare(
            "SELECT entry_id, version_number, details, change_reason, confidence, created_at
             FROM entry_versions WHERE entry_id = ?1 ORDER BY version_number",
        )
        .map_err(to_storage_err)?;
    let rows = stmt
        .query_map(params![entry_id], |row| {
            let created_at: String = row.get(5)?;
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, f64>(4)?,
                created_at,
            ))
        })
        .map_err(to_storage_err)?;

    let mut versions = Vec::new();
    for row in rows {
        let (entry_id, version_number, details, change_reason, confidence, created_at) =
            row.map_err(to_storage_err)?;
        versions.push(EntryVersion {
            entry_id,
            version_number,
            details,
            change_reason,
            confidence,
            created_at: parse_dt(&created_at)?,
        });
    }
    Ok(versions)
}

pub(crate) fn parse_dt(s: &str) -> KbResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| KbError::corruption(format!("bad timestamp '{s}': {e}")))
}

/// Parse a `knowledge_entries` row into a [`KnowledgeEntry`].
pub(crate) fn row_to_entry(row: &rusqlite::Row<'_>) -> KbResult<KnowledgeEntry> {
    let entry_type_str: String = row.get(5).map_err(to_storage_err)?;
    let entry_type = EntryType::parse(&entry_type_str)
        .ok_or_else(|| KbError::corruption(format!("unknown entry type '{entry_type_str}'")))?;

    let tags_text: String = row.get(8).map_err(to_storage_err)?;
    let tags = tags_text.split_whitespace().map(str::to_string).collect();

    let hints_json: String = row.get(9).map_err(to_storage_err)?;
    let hints = serde_json::from_str(&hints_json)
        .map_err(|e| KbError::corruption(format!("bad hints JSON: {e}")))?;

    let created_at: String = row.get(10).map_err(to_storage_err)?;
    let updated_at: String = row.get(11).map_err(to_storage_err)?;
    let last_accessed: Option<String> = row.get(12).map_err(to_storage_err)?;

    Ok(KnowledgeEntry {
        id: row.get(0).map_err(to_storage_err)?,
        project_ref: row.get(1).map_err(to_storage_err)?,
        short_title: row.get(2).map_err(to_storage_err)?,
        long_title: row.get(3).map_err(to_storage_err)?,
        details: row.get(4).map_err(to_storage_err)?,
        entry_type,
        source_context: row.get(6).map_err(to_storage_err)?,
        base_confidence: row.get(7).map_err(to_storage_err)?,
        tags,
        hints,
        created_at: parse_dt(&created_at)?,
        updated_at: parse_dt(&updated_at)?,
        last_accessed: last_accessed.as_deref().map(parse_dt).transpose()?,
        superseded_by: row.get(13).map_err(to_storage_err)?,
        is_active: row.get::<_, i64>(14).map_err(to_storage_err)? != 0,
        has_embedding: row.get::<_, i64>(15).map_err(to_storage_err)? != 0,
        version: row.get(16).map_err(to_storage_err)?,
    })
}
