//! Ingested-file registry record.
//!
//! The ingestion pipeline itself (safety scans, redaction, summarisation)
//! lives outside this workspace; the store only owns the registry table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One ingested file, unique by absolute path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestedFile {
    pub path: String,
    pub sha256: String,
    pub note_node_id: String,
    pub entry_ids: Vec<String>,
    pub summary: String,
    pub file_size: i64,
    pub file_extension: String,
    pub project_ref: Option<String>,
    pub redactions: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_active: bool,
}
