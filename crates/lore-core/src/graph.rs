//! Graph node and edge models.
//!
//! Node ids are human-readable and type-prefixed (`tag:python`,
//! `person:ana`, `kb-00042` for entries). Edges are unique on
//! `(source, target, edge_type)`; LLM-derived edges carry
//! `{"source": "llm"}` in their properties.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Closed set of node types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Entry,
    Tag,
    Project,
    Person,
    Tool,
    Concept,
    Technology,
    Note,
}

impl NodeType {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeType::Entry => "entry",
            NodeType::Tag => "tag",
            NodeType::Project => "project",
            NodeType::Person => "person",
            NodeType::Tool => "tool",
            NodeType::Concept => "concept",
            NodeType::Technology => "technology",
            NodeType::Note => "note",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "entry" => Some(NodeType::Entry),
            "tag" => Some(NodeType::Tag),
            "project" => Some(NodeType::Project),
            "person" => Some(NodeType::Person),
            "tool" => Some(NodeType::Tool),
            "concept" => Some(NodeType::Concept),
            "technology" => Some(NodeType::Technology),
            "note" => Some(NodeType::Note),
            _ => None,
        }
    }

    /// The prefixed node id for a name of this type. Entry nodes use the
    /// entry id itself.
    pub fn node_id(self, name: &str) -> String {
        match self {
            NodeType::Entry => name.to_string(),
            other => format!("{}:{}", other.as_str(), name),
        }
    }
}

/// Deterministic edge types. LLM relationships are free-form strings and
/// bypass this list.
pub mod edge_types {
    pub const HAS_TAG: &str = "has_tag";
    pub const IN_PROJECT: &str = "in_project";
    pub const SUPERSEDES: &str = "supersedes";
    pub const SUPERSEDED_BY: &str = "superseded_by";
    pub const REFERENCES: &str = "references";
    pub const RELATED_TO: &str = "related_to";
    pub const MENTIONS_PERSON: &str = "mentions_person";
    pub const USES_TOOL: &str = "uses_tool";
    pub const EXTRACTED_FROM: &str = "extracted_from";
}

/// Property value marking an edge as LLM-derived.
pub const LLM_EDGE_SOURCE: &str = "llm";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub node_id: String,
    pub node_type: String,
    pub properties: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    pub edge_type: String,
    pub properties: serde_json::Value,
}

impl GraphEdge {
    /// True when the edge's properties mark it as LLM-derived.
    pub fn is_llm_edge(&self) -> bool {
        self.properties.get("source").and_then(|v| v.as_str()) == Some(LLM_EDGE_SOURCE)
    }
}

/// Edge direction relative to the queried node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Outgoing,
    Incoming,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Outgoing => "outgoing",
            Direction::Incoming => "incoming",
        }
    }
}

/// One neighbour of a node: the node on the other end of an edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub node_id: String,
    pub edge_type: String,
    pub direction: Direction,
}
