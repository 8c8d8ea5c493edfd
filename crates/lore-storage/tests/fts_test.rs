//! FTS5 trigger sync, query sanitization, and filter behaviour.

use lore_core::entry::{EntryPatch, EntryType, NewEntry};
use lore_core::search::SearchFilters;
use lore_storage::KnowledgeStore;

fn open_store() -> KnowledgeStore {
    KnowledgeStore::open_in_memory(4).unwrap()
}

fn entry_with(title: &str, details: &str, tags: &[&str]) -> NewEntry {
    NewEntry {
        short_title: title.to_string(),
        long_title: title.to_string(),
        details: details.to_string(),
        entry_type: EntryType::FactualReference,
        tags: tags.iter().map(|t| t.to_string()).collect(),
        ..NewEntry::default()
    }
}

#[test]
fn finds_entries_by_body_text() {
    let store = open_store();
    let entry = store
        .create_entry(entry_with("wal", "sqlite uses write ahead logging", &[]))
        .unwrap();
    store
        .create_entry(entry_with("other", "completely unrelated topic", &[]))
        .unwrap();

    let hits = store
        .fts_search("write ahead logging", &SearchFilters::default(), 10)
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].0, entry.id);
    assert!(hits[0].1 <= 0.0, "bm25 scores are negative, best first");
}

#[test]
fn update_keeps_index_in_sync() {
    let store = open_store();
    let entry = store
        .create_entry(entry_with("sync", "original phrasing here", &[]))
        .unwrap();

    store
        .update_entry(
            &entry.id,
            EntryPatch {
                details: Some("replacement wording instead".to_string()),
                ..EntryPatch::default()
            },
            None,
        )
        .unwrap();

    let old = store
        .fts_search("original phrasing", &SearchFilters::default(), 10)
        .unwrap();
    assert!(old.is_empty());

    let new = store
        .fts_search("replacement wording", &SearchFilters::default(), 10)
        .unwrap();
    assert_eq!(new.len(), 1);
}

#[test]
fn deactivated_entries_never_match() {
    let store = open_store();
    let entry = store
        .create_entry(entry_with("gone", "searchable content", &[]))
        .unwrap();
    store.deactivate_entry(&entry.id).unwrap();

    let hits = store
        .fts_search("searchable content", &SearchFilters::default(), 10)
        .unwrap();
    assert!(hits.is_empty());
}

#[test]
fn special_characters_do_not_error() {
    let store = open_store();
    store
        .create_entry(entry_with("ops", "notes on build:release and (flags)", &[]))
        .unwrap();

    for query in ["build:release", "-flag", "(flags)", "a AND b", "\"quoted\""] {
        let result = store.fts_search(query, &SearchFilters::default(), 10);
        assert!(result.is_ok(), "query {query:?} errored: {result:?}");
    }
}

#[test]
fn tag_filter_is_boundary_safe() {
    let store = open_store();
    let tagged = store
        .create_entry(entry_with("tagged", "tag filter target", &["foo", "bar"]))
        .unwrap();
    store
        .create_entry(entry_with("lookalike", "tag filter target", &["foobar"]))
        .unwrap();

    let filters = SearchFilters {
        tags: Some(vec!["foo".to_string()]),
        ..SearchFilters::default()
    };
    let hits = store.fts_search("tag filter target", &filters, 10).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].0, tagged.id);
}

#[test]
fn project_and_type_filters_narrow_results() {
    let store = open_store();
    let mut in_project = entry_with("a", "shared keyword corpus", &[]);
    in_project.project_ref = Some("lore".to_string());
    in_project.entry_type = EntryType::Decision;
    let a = store.create_entry(in_project).unwrap();

    let mut other = entry_with("b", "shared keyword corpus", &[]);
    other.project_ref = Some("elsewhere".to_string());
    store.create_entry(other).unwrap();

    let filters = SearchFilters {
        project_ref: Some("lore".to_string()),
        entry_type: Some(EntryType::Decision),
        tags: None,
    };
    let hits = store.fts_search("shared keyword", &filters, 10).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].0, a.id);
}

#[test]
fn empty_query_returns_nothing() {
    let store = open_store();
    store
        .create_entry(entry_with("x", "content", &[]))
        .unwrap();
    let hits = store.fts_search("   ", &SearchFilters::default(), 10).unwrap();
    assert!(hits.is_empty());
}
