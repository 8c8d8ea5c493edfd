//! Entry version records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A versioned snapshot of a knowledge entry, unique on
/// `(entry_id, version_number)`.
///
/// Version N records the entry state *after* the Nth write; version 1 is
/// the initial creation state with reason "Initial creation".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryVersion {
    pub entry_id: String,
    pub version_number: i64,
    pub details: String,
    pub change_reason: Option<String>,
    pub confidence: f64,
    pub created_at: DateTime<Utc>,
}
