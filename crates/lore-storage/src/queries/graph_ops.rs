//! Graph node and edge primitives.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use lore_core::graph::{Direction, GraphEdge, GraphNode, Neighbor, LLM_EDGE_SOURCE};
use lore_core::{KbError, KbResult};

use super::entry_crud::parse_dt;
use crate::to_storage_err;

/// Insert a node or update its properties if it already exists.
pub fn upsert_node(
    conn: &Connection,
    node_id: &str,
    node_type: &str,
    properties: &serde_json::Value,
    now: DateTime<Utc>,
) -> KbResult<()> {
    conn.execute(
        "INSERT INTO graph_nodes (node_id, node_type, properties, created_at)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(node_id) DO UPDATE SET properties = excluded.properties",
        params![
            node_id,
            node_type,
            serde_json::to_string(properties).map_err(to_storage_err)?,
            now.to_rfc3339(),
        ],
    )
    .map_err(to_storage_err)?;
    Ok(())
}

/// Insert a node only if absent, leaving existing properties untouched.
pub fn ensure_node(
    conn: &Connection,
    node_id: &str,
    node_type: &str,
    properties: &serde_json::Value,
    now: DateTime<Utc>,
) -> KbResult<()> {
    conn.execute(
        "INSERT INTO graph_nodes (node_id, node_type, properties, created_at)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(node_id) DO NOTHING",
        params![
            node_id,
            node_type,
            serde_json::to_string(properties).map_err(to_storage_err)?,
            now.to_rfc3339(),
        ],
    )
    .map_err(to_storage_err)?;
    Ok(())
}

pub fn get_node(conn: &Connection, node_id: &str) -> KbResult<Option<GraphNode>> {
    let mut stmt = conn
        .prepare(
            "SELECT node_id, node_type, properties, created_at
             FROM graph_nodes WHERE node_id = ?1",
        )
        .map_err(to_storage_err)?;
    let row = stmt
        .query_row(params![node_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })
        .optional()
        .map_err(to_storage_err)?;

    match row {
        None => Ok(None),
        Some((node_id, node_type, properties, created_at)) => Ok(Some(GraphNode {
            node_id,
            node_type,
            properties: serde_json::from_str(&properties)
                .map_err(|e| KbError::corruption(format!("bad node properties: {e}")))?,
            created_at: parse_dt(&created_at)?,
        })),
    }
}

/// Insert an edge, ignoring duplicates. Returns true if a row was added.
pub fn insert_edge(
    conn: &Connection,
    source: &str,
    target: &str,
    edge_type: &str,
    properties: &serde_json::Value,
    now: DateTime<Utc>,
) -> KbResult<bool> {
    let rows = conn
        .execute(
            "INSERT OR IGNORE INTO graph_edges (source, target, edge_type, properties, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                source,
                target,
                edge_type,
                serde_json::to_string(properties).map_err(to_storage_err)?,
                now.to_rfc3339(),
            ],
        )
        .map_err(to_storage_err)?;
    Ok(rows > 0)
}

/// Delete outgoing edges that are NOT marked `source=llm`. The builder
/// owns these; LLM edges are managed by the enricher.
pub fn clear_non_llm_edges(conn: &Connection, source: &str) -> KbResult<()> {
    conn.execute(
        "DELETE FROM graph_edges
         WHERE source = ?1
           AND COALESCE(json_extract(properties, '$.source'), '') != ?2",
        params![source, LLM_EDGE_SOURCE],
    )
    .map_err(to_storage_err)?;
    Ok(())
}

/// Delete outgoing edges marked `source=llm`, preserving deterministic
/// edges.
pub fn clear_llm_edges(conn: &Connection, source: &str) -> KbResult<()> {
    conn.execute(
        "DELETE FROM graph_edges
         WHERE source = ?1 AND json_extract(properties, '$.source') = ?2",
        params![source, LLM_EDGE_SOURCE],
    )
    .map_err(to_storage_err)?;
    Ok(())
}

/// Delete every outgoing edge for a source node (deactivation path).
pub fn clear_outgoing_edges(conn: &Connection, source: &str) -> KbResult<()> {
    conn.execute("DELETE FROM graph_edges WHERE source = ?1", params![source])
        .map_err(to_storage_err)?;
    Ok(())
}

/// Outgoing then incoming neighbours of a node, bounded by `limit`
/// overall.
pub fn neighbors(conn: &Connection, node_id: &str, limit: usize) -> KbResult<Vec<Neighbor>> {
    let mut results = Vec::new();

    let mut stmt = conn
        .prepare("SELECT target, edge_type FROM graph_edges WHERE source = ?1 LIMIT ?2")
        .map_err(to_storage_err)?;
    let rows = stmt
        .query_map(params![node_id, limit as i64], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })
        .map_err(to_storage_err)?;
    for row in rows {
        let (target, edge_type) = row.map_err(to_storage_err)?;
        results.push(Neighbor {
            node_id: target,
            edge_type,
            direction: Direction::Outgoing,
        });
    }

    let remaining = limit.saturating_sub(results.len());
    if remaining == 0 {
        return Ok(results);
    }

    let mut stmt = conn
        .prepare("SELECT source, edge_type FROM graph_edges WHERE target = ?1 LIMIT ?2")
        .map_err(to_storage_err)?;
    let rows = stmt
        .query_map(params![node_id, remaining as i64], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })
        .map_err(to_storage_err)?;
    for row in rows {
        let (source, edge_type) = row.map_err(to_storage_err)?;
        results.push(Neighbor {
            node_id: source,
            edge_type,
            direction: Direction::Incoming,
        });
    }

    Ok(results)
}

/// Outgoing edges of one type from a node. `edge_type = None` returns
/// all outgoing edges.
pub fn outgoing_edges(
    conn: &Connection,
    source: &str,
    edge_type: Option<&str>,
) -> KbResult<Vec<GraphEdge>> {
    let (sql, values): (&str, Vec<Box<dyn rusqlite::types::ToSql>>) = match edge_type {
        Some(et) => (
            "SELECT source, target, edge_type, properties FROM graph_edges
             WHERE source = ?1 AND edge_type = ?2",
            vec![Box::new(source.to_string()), Box::new(et.to_string())],
        ),
        None => (
            "SELECT source, target, edge_type, properties FROM graph_edges WHERE source = ?1",
            vec![Box::new(source.to_string())],
        ),
    };
    collect_edges(conn, sql, values)
}

/// Outgoing LLM-derived edges for an entry node.
pub fn outgoing_llm_edges(conn: &Connection, source: &str) -> KbResult<Vec<GraphEdge>> {
    collect_edges(
        conn,
        "SELECT source, target, edge_type, properties FROM graph_edges
         WHERE source = ?1 AND json_extract(properties, '$.source') = ?2",
        vec![
            Box::new(source.to_string()),
            Box::new(LLM_EDGE_SOURCE.to_string()),
        ],
    )
}

/// Source node ids of edges pointing at `target`, optionally filtered by
/// edge type.
pub fn sources_linking_to(
    conn: &Connection,
    target: &str,
    edge_type: Option<&str>,
) -> KbResult<Vec<String>> {
    let (sql, values): (&str, Vec<Box<dyn rusqlite::types::ToSql>>) = match edge_type {
        Some(et) => (
            "SELECT source FROM graph_edges WHERE target = ?1 AND edge_type = ?2",
            vec![Box::new(target.to_string()), Box::new(et.to_string())],
        ),
        None => (
            "SELECT source FROM graph_edges WHERE target = ?1",
            vec![Box::new(target.to_string())],
        ),
    };
    let refs: Vec<&dyn rusqlite::types::ToSql> = values.iter().map(|v| v.as_ref()).collect();
    let mut stmt = conn.prepare(sql).map_err(to_storage_err)?;
    let rows = stmt
        .query_map(refs.as_slice(), |row| row.get::<_, String>(0))
        .map_err(to_storage_err)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(to_storage_err)
}

/// Non-entry nodes with their connection counts, most connected first.
/// Feeds the planner and the enricher's vocabulary.
pub fn vocabulary_rows(
    conn: &Connection,
    max_nodes: usize,
) -> KbResult<Vec<(String, String, i64)>> {
    let mut stmt = conn
        .prepare(
            "SELECT n.node_id, n.node_type,
                    (SELECT COUNT(*) FROM graph_edges
                     WHERE source = n.node_id OR target = n.node_id) AS conn_count
             FROM graph_nodes n
             WHERE n.node_type != 'entry'
             ORDER BY conn_count DESC, n.node_id
             LIMIT ?1",
        )
        .map_err(to_storage_err)?;
    let rows = stmt
        .query_map(params![max_nodes as i64], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
            ))
        })
        .map_err(to_storage_err)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(to_storage_err)
}

/// Node counts grouped by type.
pub fn node_counts_by_type(conn: &Connection) -> KbResult<Vec<(String, i64)>> {
    counts(conn, "SELECT node_type, COUNT(*) FROM graph_nodes GROUP BY node_type")
}

/// Edge counts grouped by type.
pub fn edge_counts_by_type(conn: &Connection) -> KbResult<Vec<(String, i64)>> {
    counts(conn, "SELECT edge_type, COUNT(*) FROM graph_edges GROUP BY edge_type")
}

fn counts(conn: &Connection, sql: &str) -> KbResult<Vec<(String, i64)>> {
    let mut stmt = conn.prepare(sql).map_err(to_storage_err)?;
    let rows = stmt
        .query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })
        .map_err(to_storage_err)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(to_storage_err)
}

fn collect_edges(
    conn: &Connection,
    sql: &str,
    values: Vec<Box<dyn rusqlite::types::ToSql>>,
) -> KbResult<Vec<GraphEdge>> {
    let refs: Vec<&dyn rusqlite::types::ToSql> = values.iter().map(|v| v.as_ref()).collect();
    let mut stmt = conn.prepare(sql).map_err(to_storage_err)?;
    let rows = stmt
        .query_map(refs.as_slice(), |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })
        .map_err(to_storage_err)?;

    let mut edges = Vec::new();
    for row in rows {
        let (source, target, edge_type, properties) = row.map_err(to_storage_err)?;
        edges.push(GraphEdge {
            source,
            target,
            edge_type,
            properties: serde_json::from_str(&properties)
                .map_err(|e| KbError::corruption(format!("bad edge properties: {e}")))?,
        });
    }
    Ok(edges)
}
