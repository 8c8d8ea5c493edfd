//! DDL for the knowledge database. Applied idempotently at open.

use lore_core::KbResult;
use rusqlite::Connection;

use crate::to_storage_err;

pub const SCHEMA_VERSION: i64 = 1;

const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS entry_id_seq (
    next_id INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS knowledge_entries (
    id TEXT PRIMARY KEY,
    project_ref TEXT,
    short_title TEXT NOT NULL,
    long_title TEXT NOT NULL,
    details TEXT NOT NULL,
    entry_type TEXT NOT NULL,
    source_context TEXT,
    confidence REAL NOT NULL DEFAULT 0.9,
    tags TEXT NOT NULL DEFAULT '',
    hints TEXT NOT NULL DEFAULT '{}',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    last_accessed TEXT,
    superseded_by TEXT,
    is_active INTEGER NOT NULL DEFAULT 1,
    has_embedding INTEGER NOT NULL DEFAULT 0,
    version INTEGER NOT NULL DEFAULT 1
);

CREATE INDEX IF NOT EXISTS idx_entries_project ON knowledge_entries(project_ref);
CREATE INDEX IF NOT EXISTS idx_entries_type ON knowledge_entries(entry_type);
CREATE INDEX IF NOT EXISTS idx_entries_active ON knowledge_entries(is_active);

CREATE TABLE IF NOT EXISTS entry_versions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    entry_id TEXT NOT NULL REFERENCES knowledge_entries(id),
    version_number INTEGER NOT NULL,
    details TEXT NOT NULL,
    change_reason TEXT,
    confidence REAL NOT NULL,
    created_at TEXT NOT NULL,
    UNIQUE(entry_id, version_number)
);

CREATE VIRTUAL TABLE IF NOT EXISTS knowledge_fts USING fts5(
    short_title,
    long_title,
    details,
    tags,
    content='knowledge_entries',
    content_rowid='rowid',
    tokenize='porter unicode61'
);

-- Triggers keep the FTS index in sync with the content table.
CREATE TRIGGER IF NOT EXISTS knowledge_fts_ai AFTER INSERT ON knowledge_entries BEGIN
    INSERT INTO knowledge_fts(rowid, short_title, long_title, details, tags)
    VALUES (new.rowid, new.short_title, new.long_title, new.details, new.tags);
END;

CREATE TRIGGER IF NOT EXISTS knowledge_fts_ad AFTER DELETE ON knowledge_entries BEGIN
    INSERT INTO knowledge_fts(knowledge_fts, rowid, short_title, long_title, details, tags)
    VALUES ('delete', old.rowid, old.short_title, old.long_title, old.details, old.tags);
END;

CREATE TRIGGER IF NOT EXISTS knowledge_fts_au AFTER UPDATE ON knowledge_entries BEGIN
    INSERT INTO knowledge_fts(knowledge_fts, rowid, short_title, long_title, details, tags)
    VALUES ('delete', old.rowid, old.short_title, old.long_title, old.details, old.tags);
    INSERT INTO knowledge_fts(rowid, short_title, long_title, details, tags)
    VALUES (new.rowid, new.short_title, new.long_title, new.details, new.tags);
END;

CREATE TABLE IF NOT EXISTS graph_nodes (
    node_id TEXT PRIMARY KEY,
    node_type TEXT NOT NULL,
    properties TEXT NOT NULL DEFAULT '{}',
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_nodes_type ON graph_nodes(node_type);

CREATE TABLE IF NOT EXISTS graph_edges (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    source TEXT NOT NULL REFERENCES graph_nodes(node_id),
    target TEXT NOT NULL REFERENCES graph_nodes(node_id),
    edge_type TEXT NOT NULL,
    properties TEXT NOT NULL DEFAULT '{}',
    created_at TEXT NOT NULL,
    UNIQUE(source, target, edge_type)
);
CREATE INDEX IF NOT EXISTS idx_edges_source ON graph_edges(source);
CREATE INDEX IF NOT EXISTS idx_edges_target ON graph_edges(target);
CREATE INDEX IF NOT EXISTS idx_edges_type ON graph_edges(edge_type);

CREATE TABLE IF NOT EXISTS ingested_files (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    path TEXT NOT NULL UNIQUE,
    sha256 TEXT NOT NULL,
    note_node_id TEXT NOT NULL,
    entry_ids TEXT NOT NULL DEFAULT '[]',
    summary TEXT NOT NULL,
    file_size INTEGER NOT NULL,
    file_extension TEXT NOT NULL,
    project_ref TEXT,
    redactions TEXT NOT NULL DEFAULT '[]',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    is_active INTEGER NOT NULL DEFAULT 1
);
";

const INIT_SEQ_SQL: &str = "
INSERT INTO entry_id_seq (next_id)
SELECT 1 WHERE NOT EXISTS (SELECT 1 FROM entry_id_seq);
";

fn vec_table_sql(dim: usize) -> String {
    format!(
        "CREATE VIRTUAL TABLE IF NOT EXISTS knowledge_vec USING vec0(
    entry_id TEXT PRIMARY KEY,
    embedding FLOAT[{dim}]
);"
    )
}

/// Apply the full schema, seed the id sequence, and record the schema
/// version on first open.
pub fn apply_schema(conn: &Connection, embedding_dim: usize) -> KbResult<()> {
    conn.execute_batch(SCHEMA_SQL).map_err(to_storage_err)?;
    conn.execute_batch(&vec_table_sql(embedding_dim))
        .map_err(to_storage_err)?;
    conn.execute_batch(INIT_SEQ_SQL).map_err(to_storage_err)?;

    let recorded: Option<i64> = conn
        .query_row("SELECT version FROM schema_version", [], |row| row.get(0))
        .map(Some)
        .or_else(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => Ok(None),
            other => Err(other),
        })
        .map_err(to_storage_err)?;
    if recorded.is_none() {
        conn.execute(
            "INSERT INTO schema_version (version) VALUES (?1)",
            [SCHEMA_VERSION],
        )
        .map_err(to_storage_err)?;
    }
    Ok(())
}
