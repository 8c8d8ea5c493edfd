//! Ingested-file registry, unique by absolute path.

use rusqlite::{params, Connection, OptionalExtension};

use lore_core::ingest::IngestedFile;
use lore_core::{KbError, KbResult};

use super::entry_crud::parse_dt;
use crate::to_storage_err;

/// Insert or replace the registry row for a path.
pub fn upsert_ingested_file(conn: &Connection, file: &IngestedFile) -> KbResult<()> {
    conn.execute(
        "INSERT INTO ingested_files
            (path, sha256, note_node_id, entry_ids, summary, file_size,
             file_extension, project_ref, redactions, created_at, updated_at, is_active)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
         ON CONFLICT(path) DO UPDATE SET
            sha256 = excluded.sha256,
            note_node_id = excluded.note_node_id,
            entry_ids = excluded.entry_ids,
            summary = excluded.summary,
            file_size = excluded.file_size,
            file_extension = excluded.file_extension,
            project_ref = excluded.project_ref,
            redactions = excluded.redactions,
            updated_at = excluded.updated_at,
            is_active = excluded.is_active",
        params![
            file.path,
            file.sha256,
            file.note_node_id,
            serde_json::to_string(&file.entry_ids).map_err(to_storage_err)?,
            file.summary,
            file.file_size,
            file.file_extension,
            file.project_ref,
            serde_json::to_string(&file.redactions).map_err(to_storage_err)?,
            file.created_at.to_rfc3339(),
            file.updated_at.to_rfc3339(),
            file.is_active as i64,
        ],
    )
    .map_err(to_storage_err)?;
    Ok(())
}

pub fn get_ingested_file(conn: &Connection, path: &str) -> KbResult<Option<IngestedFile>> {
    let mut stmt = conn
        .prepare(
            "SELECT path, sha256, note_node_id, entry_ids, summary, file_size,
                    file_extension, project_ref, redactions, created_at, updated_at, is_active
             FROM ingested_files WHERE path = ?1",
        )
        .map_err(to_storage_err)?;
    let row = stmt
        .query_row(params![path], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, i64>(5)?,
                row.get::<_, String>(6)?,
                row.get::<_, Option<String>>(7)?,
                row.get::<_, String>(8)?,
                row.get::<_, String>(9)?,
                row.get::<_, String>(10)?,
                row.get::<_, i64>(11)?,
            ))
        })
        .optional()
        .map_err(to_storage_err)?;

    let Some((
        path,
        sha256,
        note_node_id,
        entry_ids,
        summary,
        file_size,
        file_extension,
        project_ref,
        redactions,
        created_at,
        updated_at,
        is_active,
    )) = row
    else {
        return Ok(None);
    };

    Ok(Some(IngestedFile {
        path,
        sha256,
        note_node_id,
        entry_ids: serde_json::from_str(&entry_ids)
            .map_err(|e| KbError::corruption(format!("bad entry_ids JSON: {e}")))?,
        summary,
        file_size,
        file_extension,
        project_ref,
        redactions: serde_json::from_str(&redactions)
            .map_err(|e| KbError::corruption(format!("bad redactions JSON: {e}")))?,
        created_at: parse_dt(&created_at)?,
        updated_at: parse_dt(&updated_at)?,
        is_active: is_active != 0,
    }))
}
