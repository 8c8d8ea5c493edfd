//! Knowledge entry model and id helpers.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_CONFIDENCE;

/// Matches a full entry id: `kb-` followed by exactly five digits.
static ENTRY_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^kb-\d{5}$").expect("entry id regex"));

/// Returns true if `s` has the `kb-XXXXX` entry id shape.
pub fn is_entry_id(s: &str) -> bool {
    ENTRY_ID_RE.is_match(s)
}

/// Format a sequence number as a zero-padded entry id.
pub fn format_entry_id(seq: i64) -> String {
    format!("kb-{seq:05}")
}

/// Classification of knowledge entries. Closed set: the type governs the
/// confidence-decay half-life.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryType {
    FactualReference,
    Decision,
    PatternConvention,
    LessonLearned,
}

impl EntryType {
    pub const ALL: [EntryType; 4] = [
        EntryType::FactualReference,
        EntryType::Decision,
        EntryType::PatternConvention,
        EntryType::LessonLearned,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EntryType::FactualReference => "factual_reference",
            EntryType::Decision => "decision",
            EntryType::PatternConvention => "pattern_convention",
            EntryType::LessonLearned => "lesson_learned",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }
}

impl std::fmt::Display for EntryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single knowledge entry with metadata and versioning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    /// Zero-padded id of the form `kb-XXXXX`. Unique, never reused.
    pub id: String,
    pub project_ref: Option<String>,
    pub short_title: String,
    pub long_title: String,
    /// The entry body.
    pub details: String,
    pub entry_type: EntryType,
    /// Where this knowledge came from.
    pub source_context: Option<String>,
    /// Base confidence in [0.0, 1.0]; decays over time by entry type.
    pub base_confidence: f64,
    /// Whitespace-free tag tokens.
    pub tags: Vec<String>,
    /// Free-form hints consumed by the graph builder
    /// (`supersedes`, `related_entities`, `person`, `tool`).
    pub hints: serde_json::Map<String, serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set on explicit retrieval, never on search.
    pub last_accessed: Option<DateTime<Utc>>,
    pub superseded_by: Option<String>,
    pub is_active: bool,
    pub has_embedding: bool,
    /// Monotonic version counter; bumped on every write.
    pub version: i64,
}

impl KnowledgeEntry {
    /// Text used for generating embeddings.
    pub fn embedding_text(&self) -> String {
        format!("{} {} {}", self.short_title, self.long_title, self.details)
    }

    /// Coerce a hints value to a list: a bare value counts as a
    /// one-element list, a missing key as empty.
    pub fn hint_values(&self, key: &str) -> Vec<serde_json::Value> {
        match self.hints.get(key) {
            None => Vec::new(),
            Some(serde_json::Value::Array(items)) => items.clone(),
            Some(other) => vec![other.clone()],
        }
    }
}

/// Fields for creating a new entry.
#[derive(Debug, Clone)]
pub struct NewEntry {
    pub short_title: String,
    pub long_title: String,
    pub details: String,
    pub entry_type: EntryType,
    pub project_ref: Option<String>,
    pub source_context: Option<String>,
    pub base_confidence: f64,
    pub tags: Vec<String>,
    pub hints: serde_json::Map<String, serde_json::Value>,
}

impl Default for NewEntry {
    fn default() -> Self {
        Self {
            short_title: String::new(),
            long_title: String::new(),
            details: String::new(),
            entry_type: EntryType::FactualReference,
            project_ref: None,
            source_context: None,
            base_confidence: DEFAULT_CONFIDENCE,
            tags: Vec::new(),
            hints: serde_json::Map::new(),
        }
    }
}

/// Partial update applied by `update_entry`. `None` fields keep the
/// existing value; provided hints are merged key-by-key.
#[derive(Debug, Clone, Default)]
pub struct EntryPatch {
    pub details: Option<String>,
    pub base_confidence: Option<f64>,
    pub tags: Option<Vec<String>>,
    pub hints: Option<serde_json::Map<String, serde_json::Value>>,
    pub superseded_by: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_id_shape() {
        assert!(is_entry_id("kb-00042"));
        assert!(!is_entry_id("kb-0042"));
        assert!(!is_entry_id("kb-000421"));
        assert!(!is_entry_id("KB-00042"));
        assert!(!is_entry_id("see kb-00042"));
    }

    #[test]
    fn entry_id_formatting() {
        assert_eq!(format_entry_id(1), "kb-00001");
        assert_eq!(format_entry_id(99999), "kb-99999");
    }

    #[test]
    fn entry_type_round_trip() {
        for t in EntryType::ALL {
            assert_eq!(EntryType::parse(t.as_str()), Some(t));
        }
        assert_eq!(EntryType::parse("opinion"), None);
    }

    #[test]
    fn hint_values_coerces_scalars() {
        let mut hints = serde_json::Map::new();
        hints.insert("tool".into(), serde_json::json!("sqlite"));
        hints.insert("person".into(), serde_json::json!(["ana", "ben"]));
        let entry = KnowledgeEntry {
            id: "kb-00001".into(),
            project_ref: None,
            short_title: "t".into(),
            long_title: "t".into(),
            details: "d".into(),
            entry_type: EntryType::Decision,
            source_context: None,
            base_confidence: 0.9,
            tags: vec![],
            hints,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            last_accessed: None,
            superseded_by: None,
            is_active: true,
            has_embedding: false,
            version: 1,
        };
        assert_eq!(entry.hint_values("tool").len(), 1);
        assert_eq!(entry.hint_values("person").len(), 2);
        assert!(entry.hint_values("supersedes").is_empty());
    }
}
