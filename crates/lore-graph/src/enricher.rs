//! LLM-based graph enrichment: extracts entity relationships from
//! entries and adds them as `source=llm` edges.
//!
//! Extracted entity names are resolved against the existing graph
//! vocabulary before any node is created, so `concept:asyncio` proposed
//! by the model reuses an existing `technology:asyncio` node instead of
//! splitting the graph.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use lore_core::constants::MAX_EXTRACTED_RELATIONSHIPS;
use lore_core::entry::KnowledgeEntry;
use lore_core::graph::{NodeType, LLM_EDGE_SOURCE};
use lore_core::KbResult;
use lore_llm::LlmProvider;
use lore_storage::KnowledgeStore;

use crate::similarity::sequence_ratio;

static FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:json)?\s*(.*?)\s*```").expect("fence regex"));
static JSON_ARRAY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\[.*\]").expect("array regex"));
static JSON_OBJECT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*\}").expect("object regex"));

const VALID_ENTITY_TYPES: [NodeType; 4] = [
    NodeType::Person,
    NodeType::Tool,
    NodeType::Concept,
    NodeType::Technology,
];

const MAX_BATCH_CONTENT: usize = 500;

/// Upper bound on vocabulary nodes loaded per enrichment call.
const VOCAB_LOAD_LIMIT: usize = 10_000;

const SYSTEM_PROMPT: &str = "\
You are a knowledge graph builder. Given a knowledge entry, extract entities \
and their relationships to this entry.

Return ONLY a JSON array. Each object has:
- \"entity\": entity name (lowercase, hyphens for spaces)
- \"entity_type\": one of: person, tool, concept, technology
- \"relationship\": how the entry relates to the entity

Good entities are SPECIFIC enough to connect related entries:
- \"thread-safety\", \"connection-pooling\", \"dependency-injection\" (good concepts)
- \"error\", \"problem\", \"pattern\" (too vague, avoid these)
- \"postgresql\", \"redis\", \"rusqlite\" (good tools/technologies)

Good relationships describe HOW, not just that a link exists:
- uses, depends_on, implements, solves, replaces, configures, learned_from, caused_by

Rules:
- Extract 2-6 entities. Return [] if the entry is too generic.
- Skip tags and project references (already captured separately).
- entity_type MUST be one of: person, tool, concept, technology.";

const BATCH_SYSTEM_PROMPT: &str = "\
You are a knowledge graph builder. Given multiple knowledge entries, extract \
entities and their relationships for EACH entry.

Return ONLY a JSON object keyed by entry ID. Each value is an array of \
relationship objects with:
- \"entity\": entity name (lowercase, hyphens for spaces)
- \"entity_type\": one of: person, tool, concept, technology
- \"relationship\": how the entry relates to the entity

Rules:
- Extract 2-6 entities per entry. Use [] for entries that are too generic.
- Skip tags and project references (already captured separately).
- entity_type MUST be one of: person, tool, concept, technology.";

/// One validated relationship extracted by the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedRelation {
    pub entity: String,
    pub entity_type: NodeType,
    pub relationship: String,
}

/// A known non-entry node the resolver can match against.
struct VocabNode {
    node_id: String,
    node_type: String,
    name: String,
}

/// Uses an LLM to extract entity relationships and add them as graph
/// edges. Failures are logged and swallowed by callers; the entry is
/// already stored and searchable.
pub struct GraphEnricher<'a> {
    store: &'a KnowledgeStore,
    llm: &'a dyn LlmProvider,
    similarity_threshold: f64,
}

impl<'a> GraphEnricher<'a> {
    pub fn new(
        store: &'a KnowledgeStore,
        llm: &'a dyn LlmProvider,
        similarity_threshold: f64,
    ) -> Self {
        Self {
            store,
            llm,
            similarity_threshold,
        }
    }

    /// Extract relationships for one entry and write them as LLM edges.
    /// Returns the number of edges added.
    pub async fn enrich_entry(&self, entry: &KnowledgeEntry) -> KbResult<usize> {
        if !self.llm.is_available().await {
            return Ok(0);
        }

        let prompt = build_prompt(entry);
        let Some(raw) = self.llm.generate(&prompt, Some(SYSTEM_PROMPT)).await else {
            return Ok(0);
        };

        let relations = parse_relationships(&raw);
        let mut vocab = self.load_vocabulary()?;
        self.apply_relations(entry, &relations, &mut vocab)
    }

    /// Enrich multiple entries with a single LLM call, falling back to
    /// per-entry enrichment when the batch response cannot be parsed.
    pub async fn enrich_batch(&self, entries: &[KnowledgeEntry]) -> KbResult<usize> {
        if entries.is_empty() || !self.llm.is_available().await {
            return Ok(0);
        }

        let prompt = build_batch_prompt(entries);
        let Some(raw) = self.llm.generate(&prompt, Some(BATCH_SYSTEM_PROMPT)).await else {
            return Ok(0);
        };

        let ids: Vec<&str> = entries.iter().map(|e| e.id.as_str()).collect();
        let Some(by_entry) = parse_batch_relationships(&raw, &ids) else {
            warn!("batch parse failed, falling back to per-entry enrichment");
            let mut total = 0;
            for entry in entries {
                match self.enrich_entry(entry).await {
                    Ok(added) => total += added,
                    Err(e) => warn!(entry_id = %entry.id, error = %e, "fallback enrich failed"),
                }
            }
            return Ok(total);
        };

        // One vocabulary load shared across the whole batch.
        let mut vocab = self.load_vocabulary()?;
        let mut total = 0;
        for entry in entries {
            let relations = by_entry.get(entry.id.as_str()).cloned().unwrap_or_default();
            total += self.apply_relations(entry, &relations, &mut vocab)?;
        }
        Ok(total)
    }

    /// Re-derive the LLM edge layer for one entry: ensure the entry node
    /// exists, drop the previous LLM edges (deterministic edges are
    /// preserved), then insert the resolved relations.
    fn apply_relations(
        &self,
        entry: &KnowledgeEntry,
        relations: &[ExtractedRelation],
        vocab: &mut Vec<VocabNode>,
    ) -> KbResult<usize> {
        let props = serde_json::json!({
            "short_title": entry.short_title,
            "entry_type": entry.entry_type.as_str(),
        });
        self.store
            .ensure_node(&entry.id, NodeType::Entry.as_str(), &props)?;
        self.store.clear_llm_edges(&entry.id)?;

        let marker = serde_json::json!({ "source": LLM_EDGE_SOURCE });
        let mut added = 0;
        for relation in relations {
            let (node_id, node_type) = self.resolve_entity(vocab, relation);
            self.store
                .ensure_node(&node_id, &node_type, &serde_json::json!({}))?;
            if self
                .store
                .insert_edge(&entry.id, &node_id, &relation.relationship, &marker)?
            {
                added += 1;
            }
        }
        debug!(entry_id = %entry.id, added, "graph enrichment applied");
        Ok(added)
    }

    /// Match an extracted entity against every known name across all
    /// types. At or above the threshold the existing node is reused
    /// (cross-type resolution allowed); otherwise a new node id is
    /// created and registered for later items in the same call.
    fn resolve_entity(
        &self,
        vocab: &mut Vec<VocabNode>,
        relation: &ExtractedRelation,
    ) -> (String, String) {
        let name = normalize_name(&relation.entity);

        let mut best: Option<(&VocabNode, f64)> = None;
        for node in vocab.iter() {
            let ratio = sequence_ratio(&name, &node.name);
            if best.map_or(true, |(_, score)| ratio > score) {
                best = Some((node, ratio));
            }
        }
        if let Some((node, score)) = best {
            if score >= self.similarity_threshold {
                return (node.node_id.clone(), node.node_type.clone());
            }
        }

        let node_id = relation.entity_type.node_id(&name);
        let node_type = relation.entity_type.as_str().to_string();
        vocab.push(VocabNode {
            node_id: node_id.clone(),
            node_type: node_type.clone(),
            name,
        });
        (node_id, node_type)
    }

    fn load_vocabulary(&self) -> KbResult<Vec<VocabNode>> {
        let rows = self.store.vocabulary_rows(VOCAB_LOAD_LIMIT)?;
        Ok(rows
            .into_iter()
            .map(|(node_id, node_type, _)| {
                let prefix = format!("{node_type}:");
                let name = node_id
                    .strip_prefix(&prefix)
                    .unwrap_or(&node_id)
                    .to_string();
                VocabNode {
                    node_id,
                    node_type,
                    name,
                }
            })
            .collect())
    }
}

fn normalize_name(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

fn build_prompt(entry: &KnowledgeEntry) -> String {
    let mut parts = vec![
        format!("Title: {}", entry.short_title),
        format!("Full title: {}", entry.long_title),
        format!("Type: {}", entry.entry_type.as_str()),
    ];
    if !entry.tags.is_empty() {
        parts.push(format!("Tags: {}", entry.tags.join(", ")));
    }
    if let Some(project) = &entry.project_ref {
        parts.push(format!("Project: {project}"));
    }
    parts.push(format!("\nContent:\n{}", entry.details));
    parts.join("\n")
}

fn build_batch_prompt(entries: &[KnowledgeEntry]) -> String {
    entries
        .iter()
        .map(|entry| {
            let content: String = entry.details.chars().take(MAX_BATCH_CONTENT).collect();
            format!(
                "[{}] {} ({}): {content}",
                entry.id,
                entry.short_title,
                entry.entry_type.as_str()
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Strip code fences if present, returning the inner text.
fn strip_fences(raw: &str) -> &str {
    match FENCE_RE.captures(raw) {
        Some(captures) => captures.get(1).map_or(raw, |m| m.as_str()),
        None => raw,
    }
}

/// Parse an LLM response into validated relationships. Invalid items are
/// discarded; at most eight are kept.
pub fn parse_relationships(raw: &str) -> Vec<ExtractedRelation> {
    let raw = strip_fences(raw);

    let Some(array_text) = JSON_ARRAY_RE.find(raw) else {
        warn!("no JSON array found in enrichment response");
        return Vec::new();
    };
    let Ok(data) = serde_json::from_str::<serde_json::Value>(array_text.as_str()) else {
        warn!("malformed JSON in enrichment response");
        return Vec::new();
    };
    let Some(items) = data.as_array() else {
        return Vec::new();
    };

    let mut results = Vec::new();
    for item in items {
        let Some(entity) = item.get("entity").and_then(|v| v.as_str()) else {
            continue;
        };
        let Some(relationship) = item.get("relationship").and_then(|v| v.as_str()) else {
            continue;
        };
        let entity_type = item
            .get("entity_type")
            .and_then(|v| v.as_str())
            .and_then(NodeType::parse);
        let Some(entity_type) = entity_type.filter(|t| VALID_ENTITY_TYPES.contains(t)) else {
            continue;
        };
        if entity.is_empty() || relationship.is_empty() {
            continue;
        }
        results.push(ExtractedRelation {
            entity: entity.to_string(),
            entity_type,
            relationship: relationship.to_string(),
        });
        if results.len() >= MAX_EXTRACTED_RELATIONSHIPS {
            break;
        }
    }
    results
}

/// Parse a batch response (JSON object keyed by entry id). `None` means
/// the object could not be located or parsed, which triggers the
/// per-entry fallback.
pub fn parse_batch_relationships(
    raw: &str,
    valid_ids: &[&str],
) -> Option<HashMap<String, Vec<ExtractedRelation>>> {
    let raw = strip_fences(raw);

    let object_text = JSON_OBJECT_RE.find(raw)?;
    let data: serde_json::Value = serde_json::from_str(object_text.as_str()).ok()?;
    let object = data.as_object()?;

    let mut result = HashMap::new();
    for (entry_id, relations) in object {
        if !valid_ids.contains(&entry_id.as_str()) {
            continue;
        }
        let Some(items) = relations.as_array() else {
            continue;
        };
        let rendered = serde_json::to_string(items).ok()?;
        result.insert(entry_id.clone(), parse_relationships(&rendered));
    }
    Some(result)
}
