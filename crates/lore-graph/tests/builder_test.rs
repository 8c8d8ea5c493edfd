//! Deterministic edge derivation.

use lore_core::entry::{EntryType, NewEntry};
use lore_core::graph::LLM_EDGE_SOURCE;
use lore_graph::GraphBuilder;
use lore_storage::KnowledgeStore;

fn open_store() -> KnowledgeStore {
    KnowledgeStore::open_in_memory(4).unwrap()
}

fn create(store: &KnowledgeStore, new: NewEntry) -> lore_core::entry::KnowledgeEntry {
    store.create_entry(new).unwrap()
}

#[test]
fn derives_tag_project_and_hint_edges() {
    let store = open_store();
    let mut hints = serde_json::Map::new();
    hints.insert("person".into(), serde_json::json!("Ana"));
    hints.insert("tool".into(), serde_json::json!(["SQLite", "redis"]));
    hints.insert("supersedes".into(), serde_json::json!("kb-00099"));

    let entry = create(
        &store,
        NewEntry {
            short_title: "rich".into(),
            long_title: "rich entry".into(),
            details: "no references here".into(),
            entry_type: EntryType::Decision,
            project_ref: Some("lore".into()),
            tags: vec!["storage".into()],
            hints,
            ..NewEntry::default()
        },
    );

    GraphBuilder::new(&store).build_for_entry(&entry).unwrap();

    let edges = store.outgoing_edges(&entry.id, None).unwrap();
    let mut pairs: Vec<(String, String)> = edges
        .iter()
        .map(|e| (e.edge_type.clone(), e.target.clone()))
        .collect();
    pairs.sort();
    assert_eq!(
        pairs,
        vec![
            ("has_tag".into(), "tag:storage".into()),
            ("in_project".into(), "project:lore".into()),
            ("mentions_person".into(), "person:ana".into()),
            ("supersedes".into(), "kb-00099".into()),
            ("uses_tool".into(), "tool:redis".into()),
            ("uses_tool".into(), "tool:sqlite".into()),
        ]
    );

    let node = store.get_node(&entry.id).unwrap().unwrap();
    assert_eq!(node.properties["short_title"], "rich");
    assert_eq!(node.properties["entry_type"], "decision");
}

#[test]
fn body_references_are_deduplicated() {
    let store = open_store();
    let entry = create(
        &store,
        NewEntry {
            short_title: "refs".into(),
            long_title: "refs".into(),
            details: "See kb-00042 and also kb-00042, and kb-00007.".into(),
            entry_type: EntryType::FactualReference,
            ..NewEntry::default()
        },
    );

    GraphBuilder::new(&store).build_for_entry(&entry).unwrap();

    let refs = store.outgoing_edges(&entry.id, Some("references")).unwrap();
    let mut targets: Vec<&str> = refs.iter().map(|e| e.target.as_str()).collect();
    targets.sort();
    assert_eq!(targets, vec!["kb-00007", "kb-00042"]);
}

#[test]
fn self_references_are_skipped() {
    let store = open_store();
    let entry = create(
        &store,
        NewEntry {
            short_title: "selfref".into(),
            long_title: "selfref".into(),
            details: "this is kb-00001 referring to itself and kb-00002".into(),
            entry_type: EntryType::FactualReference,
            ..NewEntry::default()
        },
    );
    assert_eq!(entry.id, "kb-00001");

    GraphBuilder::new(&store).build_for_entry(&entry).unwrap();

    let refs = store.outgoing_edges(&entry.id, Some("references")).unwrap();
    assert_eq!(refs.len(), 1);
    assert_eq!(refs[0].target, "kb-00002");
}

#[test]
fn related_entities_accept_dicts_and_strings() {
    let store = open_store();
    let mut hints = serde_json::Map::new();
    hints.insert(
        "related_entities".into(),
        serde_json::json!([
            {"id": "kb-00010", "edge_type": "depends_on"},
            "kb-00011",
        ]),
    );
    let entry = create(
        &store,
        NewEntry {
            short_title: "related".into(),
            long_title: "related".into(),
            details: "body".into(),
            entry_type: EntryType::PatternConvention,
            hints,
            ..NewEntry::default()
        },
    );

    GraphBuilder::new(&store).build_for_entry(&entry).unwrap();

    let depends = store.outgoing_edges(&entry.id, Some("depends_on")).unwrap();
    assert_eq!(depends[0].target, "kb-00010");
    let related = store.outgoing_edges(&entry.id, Some("related_to")).unwrap();
    assert_eq!(related[0].target, "kb-00011");
}

#[test]
fn rebuild_is_idempotent_and_preserves_llm_edges() {
    let store = open_store();
    let entry = create(
        &store,
        NewEntry {
            short_title: "stable".into(),
            long_title: "stable".into(),
            details: "body".into(),
            entry_type: EntryType::FactualReference,
            tags: vec!["keep".into()],
            ..NewEntry::default()
        },
    );

    let builder = GraphBuilder::new(&store);
    builder.build_for_entry(&entry).unwrap();

    // An enrichment edge added between rebuilds must survive.
    store
        .ensure_node("concept:durability", "concept", &serde_json::json!({}))
        .unwrap();
    store
        .insert_edge(
            &entry.id,
            "concept:durability",
            "implements",
            &serde_json::json!({"source": LLM_EDGE_SOURCE}),
        )
        .unwrap();

    builder.build_for_entry(&entry).unwrap();
    builder.build_for_entry(&entry).unwrap();

    let edges = store.outgoing_edges(&entry.id, None).unwrap();
    assert_eq!(edges.len(), 2);
    assert!(edges.iter().any(|e| e.edge_type == "has_tag"));
    assert!(edges.iter().any(|e| e.is_llm_edge()));
}

#[test]
fn superseded_by_creates_reverse_edge() {
    let store = open_store();
    let old = create(
        &store,
        NewEntry {
            short_title: "old".into(),
            long_title: "old".into(),
            details: "body".into(),
            entry_type: EntryType::Decision,
            ..NewEntry::default()
        },
    );

    let patched = store
        .update_entry(
            &old.id,
            lore_core::entry::EntryPatch {
                superseded_by: Some("kb-00050".into()),
                ..Default::default()
            },
            None,
        )
        .unwrap();

    GraphBuilder::new(&store).build_for_entry(&patched).unwrap();

    let edges = store.outgoing_edges("kb-00050", Some("supersedes")).unwrap();
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].target, old.id);
}
