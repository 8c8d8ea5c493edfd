//! Deterministic graph builder: derives nodes and edges from entry data.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use lore_core::entry::KnowledgeEntry;
use lore_core::graph::{edge_types, NodeType};
use lore_core::KbResult;
use lore_storage::KnowledgeStore;

/// Matches entry-id tokens anywhere in free text.
static KB_REF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"kb-\d{5}").expect("entry reference regex"));

/// Rebuilds an entry's outgoing deterministic edges on every
/// create/update. LLM edges are owned by the enricher and survive the
/// rebuild untouched.
pub struct GraphBuilder<'a> {
    store: &'a KnowledgeStore,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(store: &'a KnowledgeStore) -> Self {
        Self { store }
    }

    /// Delete-and-rebuild: clear the entry's non-LLM outgoing edges, then
    /// re-derive everything from tags, project, hints, and body text.
    pub fn build_for_entry(&self, entry: &KnowledgeEntry) -> KbResult<()> {
        self.store.clear_non_llm_edges(&entry.id)?;

        let props = serde_json::json!({
            "short_title": entry.short_title,
            "entry_type": entry.entry_type.as_str(),
        });
        self.store
            .upsert_node(&entry.id, NodeType::Entry.as_str(), &props)?;

        let empty = serde_json::json!({});

        for tag in &entry.tags {
            let node_id = NodeType::Tag.node_id(tag);
            self.store
                .ensure_node(&node_id, NodeType::Tag.as_str(), &empty)?;
            self.store
                .insert_edge(&entry.id, &node_id, edge_types::HAS_TAG, &empty)?;
        }

        if let Some(project) = &entry.project_ref {
            let node_id = NodeType::Project.node_id(project);
            self.store
                .ensure_node(&node_id, NodeType::Project.as_str(), &empty)?;
            self.store
                .insert_edge(&entry.id, &node_id, edge_types::IN_PROJECT, &empty)?;
        }

        for value in entry.hint_values("supersedes") {
            if let Some(target) = value.as_str().filter(|s| !s.is_empty()) {
                self.store
                    .ensure_node(target, NodeType::Entry.as_str(), &empty)?;
                self.store
                    .insert_edge(&entry.id, target, edge_types::SUPERSEDES, &empty)?;
            }
        }

        // Reversed: the superseder points at this entry.
        if let Some(superseder) = &entry.superseded_by {
            self.store
                .ensure_node(superseder, NodeType::Entry.as_str(), &empty)?;
            self.store
                .insert_edge(superseder, &entry.id, edge_types::SUPERSEDES, &empty)?;
        }

        let mut seen_refs: HashSet<&str> = HashSet::new();
        for reference in KB_REF_RE.find_iter(&entry.details) {
            let ref_id = reference.as_str();
            if ref_id != entry.id && seen_refs.insert(ref_id) {
                self.store
                    .ensure_node(ref_id, NodeType::Entry.as_str(), &empty)?;
                self.store
                    .insert_edge(&entry.id, ref_id, edge_types::REFERENCES, &empty)?;
            }
        }

        for value in entry.hint_values("related_entities") {
            match value {
                serde_json::Value::Object(map) => {
                    let target = map
                        .get("id")
                        .or_else(|| map.get("target"))
                        .and_then(|v| v.as_str());
                    let edge_type = map
                        .get("edge_type")
                        .or_else(|| map.get("type"))
                        .and_then(|v| v.as_str())
                        .unwrap_or(edge_types::RELATED_TO);
                    if let Some(target) = target.filter(|s| !s.is_empty()) {
                        self.store
                            .ensure_node(target, NodeType::Entry.as_str(), &empty)?;
                        self.store
                            .insert_edge(&entry.id, target, edge_type, &empty)?;
                    }
                }
                serde_json::Value::String(target) if !target.is_empty() => {
                    self.store
                        .ensure_node(&target, NodeType::Entry.as_str(), &empty)?;
                    self.store
                        .insert_edge(&entry.id, &target, edge_types::RELATED_TO, &empty)?;
                }
                _ => {}
            }
        }

        for value in entry.hint_values("person") {
            if let Some(person) = value.as_str().filter(|s| !s.is_empty()) {
                let node_id = NodeType::Person.node_id(&person.to_lowercase());
                self.store
                    .ensure_node(&node_id, NodeType::Person.as_str(), &empty)?;
                self.store
                    .insert_edge(&entry.id, &node_id, edge_types::MENTIONS_PERSON, &empty)?;
            }
        }

        for value in entry.hint_values("tool") {
            if let Some(tool) = value.as_str().filter(|s| !s.is_empty()) {
                let node_id = NodeType::Tool.node_id(&tool.to_lowercase());
                self.store
                    .ensure_node(&node_id, NodeType::Tool.as_str(), &empty)?;
                self.store
                    .insert_edge(&entry.id, &node_id, edge_types::USES_TOOL, &empty)?;
            }
        }

        Ok(())
    }
}
