//! vec0 vector index: packed f32 serialization, delete-then-insert
//! upsert, KNN by distance.

use rusqlite::{params, Connection};

use lore_core::{KbError, KbResult};

use crate::to_storage_err;

/// Serialize a vector as packed little-endian f32 bytes, the layout vec0
/// expects for FLOAT[N] columns.
pub fn vec_to_bytes(v: &[f32]) -> Vec<u8> {
    v.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Store the embedding for an entry. vec0 has no conflict upsert, so the
/// existing row is deleted first.
pub fn store_embedding(
    conn: &Connection,
    entry_id: &str,
    embedding: &[f32],
    expected_dim: usize,
) -> KbResult<()> {
    if embedding.len() != expected_dim {
        return Err(KbError::corruption(format!(
            "embedding for {entry_id} has {} dimensions, expected {expected_dim}",
            embedding.len()
        )));
    }
    conn.execute(
        "DELETE FROM knowledge_vec WHERE entry_id = ?1",
        params![entry_id],
    )
    .map_err(to_storage_err)?;
    conn.execute(
        "INSERT INTO knowledge_vec (entry_id, embedding) VALUES (?1, ?2)",
        params![entry_id, vec_to_bytes(embedding)],
    )
    .map_err(to_storage_err)?;
    Ok(())
}

pub fn delete_embedding(conn: &Connection, entry_id: &str) -> KbResult<()> {
    conn.execute(
        "DELETE FROM knowledge_vec WHERE entry_id = ?1",
        params![entry_id],
    )
    .map_err(to_storage_err)?;
    Ok(())
}

/// KNN over the vec0 table. Returns `(entry_id, distance)` ascending by
/// distance (the extension's default metric). Results are consumed by
/// rank-based fusion, so the metric itself is opaque to callers.
pub fn vector_search(
    conn: &Connection,
    query: &[f32],
    limit: usize,
) -> KbResult<Vec<(String, f64)>> {
    let mut stmt = conn
        .prepare(
            "SELECT entry_id, distance
             FROM knowledge_vec
             WHERE embedding MATCH ?1 AND k = ?2
             ORDER BY distance",
        )
        .map_err(to_storage_err)?;
    let rows = stmt
        .query_map(params![vec_to_bytes(query), limit as i64], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
        })
        .map_err(to_storage_err)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(to_storage_err)
}

/// Row count for an entry id, used by invariant checks and tests.
pub fn embedding_count(conn: &Connection, entry_id: &str) -> KbResult<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM knowledge_vec WHERE entry_id = ?1",
        params![entry_id],
        |row| row.get(0),
    )
    .map_err(to_storage_err)
}
