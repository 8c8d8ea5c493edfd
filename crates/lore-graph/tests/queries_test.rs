//! Traversal queries: BFS, paths, chains, scopes, vocabulary, stats.

use lore_core::entry::{EntryType, NewEntry};
use lore_graph::queries::{
    bfs_entries, entries_for_scope, find_path, get_graph_vocabulary, graph_stats,
    supersedes_chain,
};
use lore_graph::GraphBuilder;
use lore_storage::KnowledgeStore;

fn open_store() -> KnowledgeStore {
    KnowledgeStore::open_in_memory(4).unwrap()
}

fn create(store: &KnowledgeStore, title: &str, new: NewEntry) -> String {
    let entry = store
        .create_entry(NewEntry {
            short_title: title.to_string(),
            long_title: title.to_string(),
            ..new
        })
        .unwrap();
    GraphBuilder::new(store).build_for_entry(&entry).unwrap();
    entry.id
}

fn simple(details: &str) -> NewEntry {
    NewEntry {
        details: details.to_string(),
        entry_type: EntryType::FactualReference,
        ..NewEntry::default()
    }
}

#[test]
fn bfs_reaches_entries_through_intermediates() {
    let store = open_store();
    let a = create(
        &store,
        "a",
        NewEntry {
            tags: vec!["shared".into()],
            ..simple("a body")
        },
    );
    let b = create(
        &store,
        "b",
        NewEntry {
            tags: vec!["shared".into()],
            ..simple("b body")
        },
    );

    let hits = bfs_entries(&store, &a, 2, 20).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].entry_id, b);
    assert_eq!(hits[0].depth, 2);
    assert_eq!(hits[0].path, vec![a, "tag:shared".to_string(), b.clone()]);
}

#[test]
fn bfs_respects_depth_bound() {
    let store = open_store();
    // a -> b -> c via references; depth 1 only sees direct entry links.
    let a = create(&store, "a", simple("points at kb-00002"));
    let b = create(&store, "b", simple("points at kb-00003"));
    let c = create(&store, "c", simple("leaf"));
    assert_eq!((a.as_str(), b.as_str(), c.as_str()), ("kb-00001", "kb-00002", "kb-00003"));

    let shallow = bfs_entries(&store, &a, 1, 20).unwrap();
    let ids: Vec<&str> = shallow.iter().map(|h| h.entry_id.as_str()).collect();
    assert_eq!(ids, vec!["kb-00002"]);

    let deep = bfs_entries(&store, &a, 2, 20).unwrap();
    let ids: Vec<&str> = deep.iter().map(|h| h.entry_id.as_str()).collect();
    assert_eq!(ids, vec!["kb-00002", "kb-00003"]);
}

#[test]
fn find_path_returns_triples() {
    let store = open_store();
    let a = create(
        &store,
        "a",
        NewEntry {
            tags: vec!["link".into()],
            ..simple("a")
        },
    );
    let b = create(
        &store,
        "b",
        NewEntry {
            tags: vec!["link".into()],
            ..simple("b")
        },
    );

    let path = find_path(&store, &a, &b, 4).unwrap().expect("path exists");
    assert_eq!(path.len(), 2);
    assert_eq!(path[0], (a.clone(), "has_tag".to_string(), "tag:link".to_string()));
    assert_eq!(path[1], (b.clone(), "has_tag".to_string(), "tag:link".to_string()));
}

#[test]
fn find_path_same_node_is_empty_and_unreachable_is_none() {
    let store = open_store();
    let a = create(&store, "a", simple("isolated"));
    let b = create(&store, "b", simple("also isolated"));

    assert_eq!(find_path(&store, &a, &a, 4).unwrap(), Some(vec![]));
    assert_eq!(find_path(&store, &a, &b, 4).unwrap(), None);
}

#[test]
fn supersedes_chain_is_chronological_with_labels() {
    let store = open_store();
    let original = create(&store, "v1", simple("first take"));

    let mut hints = serde_json::Map::new();
    hints.insert("supersedes".into(), serde_json::json!(original.clone()));
    let middle = create(
        &store,
        "v2",
        NewEntry {
            hints,
            ..simple("second take")
        },
    );

    let mut hints = serde_json::Map::new();
    hints.insert("supersedes".into(), serde_json::json!(middle.clone()));
    let current = create(
        &store,
        "v3",
        NewEntry {
            hints,
            ..simple("third take")
        },
    );

    // The chain is identical from any starting point.
    for start in [&original, &middle, &current] {
        let chain = supersedes_chain(&store, start).unwrap();
        let ids: Vec<&str> = chain.iter().map(|c| c.entry_id.as_str()).collect();
        assert_eq!(ids, vec![original.as_str(), middle.as_str(), current.as_str()]);
        assert_eq!(chain[0].label, "original");
        assert_eq!(chain[1].label, format!("supersedes {original}"));
        assert_eq!(chain[2].label, "current");
    }
}

#[test]
fn single_entry_chain_is_current() {
    let store = open_store();
    let only = create(&store, "solo", simple("no chain"));
    let chain = supersedes_chain(&store, &only).unwrap();
    assert_eq!(chain.len(), 1);
    assert_eq!(chain[0].label, "current");
}

#[test]
fn scope_dispatch_covers_all_prefixes() {
    let store = open_store();
    let in_project = create(
        &store,
        "proj",
        NewEntry {
            project_ref: Some("lore".into()),
            ..simple("project entry")
        },
    );
    let tagged = create(
        &store,
        "tagged",
        NewEntry {
            tags: vec!["python".into()],
            ..simple("tagged entry")
        },
    );
    let mut hints = serde_json::Map::new();
    hints.insert("person".into(), serde_json::json!("ana"));
    let person_entry = create(
        &store,
        "person",
        NewEntry {
            entry_type: EntryType::Decision,
            hints,
            ..simple("personal entry")
        },
    );

    assert_eq!(entries_for_scope(&store, "project:lore").unwrap(), vec![in_project]);
    assert_eq!(entries_for_scope(&store, "tag:python").unwrap(), vec![tagged.clone()]);
    assert_eq!(
        entries_for_scope(&store, "person:ana").unwrap(),
        vec![person_entry.clone()]
    );
    assert_eq!(
        entries_for_scope(&store, "decision").unwrap(),
        vec![person_entry]
    );
    assert_eq!(
        entries_for_scope(&store, &tagged).unwrap(),
        vec![tagged.clone()]
    );
    assert!(entries_for_scope(&store, "tag:unknown").unwrap().is_empty());
}

#[test]
fn scope_excludes_inactive_entries() {
    let store = open_store();
    let id = create(
        &store,
        "gone",
        NewEntry {
            tags: vec!["ghost".into()],
            ..simple("to be removed")
        },
    );
    store.deactivate_entry(&id).unwrap();
    assert!(entries_for_scope(&store, "tag:ghost").unwrap().is_empty());
}

#[test]
fn vocabulary_and_stats_reflect_graph() {
    let store = open_store();
    create(
        &store,
        "stats",
        NewEntry {
            project_ref: Some("lore".into()),
            tags: vec!["alpha".into(), "beta".into()],
            ..simple("stats body")
        },
    );

    let vocab = get_graph_vocabulary(&store, 200).unwrap();
    assert_eq!(vocab["tag"].len(), 2);
    assert_eq!(vocab["project"], vec!["lore"]);
    assert!(!vocab.contains_key("entry"));

    let stats = graph_stats(&store).unwrap();
    assert_eq!(stats.active_entries, 1);
    assert_eq!(stats.nodes_by_type["entry"], 1);
    assert_eq!(stats.nodes_by_type["tag"], 2);
    assert_eq!(stats.edges_by_type["has_tag"], 2);
    assert_eq!(stats.edges_by_type["in_project"], 1);
}
