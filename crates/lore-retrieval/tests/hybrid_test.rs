//! Hybrid search end to end against an in-memory store, FTS-only mode.

use chrono::{Duration, Utc};
use rusqlite::params;

use lore_core::entry::{EntryType, NewEntry};
use lore_core::search::{MatchSource, SearchQuery};
use lore_retrieval::hybrid_search;
use lore_storage::KnowledgeStore;

fn open_store() -> KnowledgeStore {
    KnowledgeStore::open_in_memory(4).unwrap()
}

fn create(store: &KnowledgeStore, title: &str, details: &str, entry_type: EntryType) -> String {
    store
        .create_entry(NewEntry {
            short_title: title.to_string(),
            long_title: format!("{title} long"),
            details: details.to_string(),
            entry_type,
            ..NewEntry::default()
        })
        .unwrap()
        .id
}

/// Rewrite an entry's timestamps so decay tests can age it.
fn backdate(store: &KnowledgeStore, entry_id: &str, days: i64) {
    let past = (Utc::now() - Duration::days(days)).to_rfc3339();
    store
        .pool()
        .writer
        .with_conn(|conn| {
            conn.execute(
                "UPDATE knowledge_entries
                 SET created_at = ?1, updated_at = ?1, last_accessed = NULL
                 WHERE id = ?2",
                params![past, entry_id],
            )
            .map_err(|e| lore_core::KbError::storage(e.to_string()))?;
            Ok(())
        })
        .unwrap();
}

#[tokio::test]
async fn fts_only_results_are_tagged_fts() {
    let store = open_store();
    create(&store, "wal", "sqlite write ahead logging", EntryType::FactualReference);

    let results = hybrid_search(&store, None, &SearchQuery::new("write ahead logging"))
        .await
        .unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].match_source, MatchSource::Fts);
    assert!(results[0].score > 0.0);
}

#[tokio::test]
async fn stale_entries_are_filtered_unless_requested() {
    let store = open_store();
    let stale = create(
        &store,
        "stale-fact",
        "decayed knowledge about caching",
        EntryType::FactualReference,
    );
    backdate(&store, &stale, 400); // 0.9 * 2^(-400/90) ≈ 0.04

    let fresh = create(
        &store,
        "fresh-fact",
        "current knowledge about caching",
        EntryType::FactualReference,
    );

    let results = hybrid_search(&store, None, &SearchQuery::new("knowledge caching"))
        .await
        .unwrap();
    let ids: Vec<&str> = results.iter().map(|r| r.entry.id.as_str()).collect();
    assert_eq!(ids, vec![fresh.as_str()]);

    let mut with_stale = SearchQuery::new("knowledge caching");
    with_stale.include_stale = true;
    let results = hybrid_search(&store, None, &with_stale).await.unwrap();
    assert_eq!(results.len(), 2);
    let stale_result = results.iter().find(|r| r.entry.id == stale).unwrap();
    assert!(stale_result.effective_confidence < 0.3);
    assert!(stale_result.staleness_warning.is_some());
}

#[tokio::test]
async fn aging_decision_gets_warning_but_stays() {
    let store = open_store();
    let id = create(
        &store,
        "aging-decision",
        "we chose sqlite for persistence",
        EntryType::Decision,
    );
    backdate(&store, &id, 400); // 0.9 * 2^(-400/365) ≈ 0.42

    let results = hybrid_search(&store, None, &SearchQuery::new("sqlite persistence"))
        .await
        .unwrap();
    assert_eq!(results.len(), 1);
    let result = &results[0];
    assert!((result.effective_confidence - 0.42).abs() < 0.01);
    assert!(result.staleness_warning.is_some());
}

#[tokio::test]
async fn inactive_entries_never_surface() {
    let store = open_store();
    let id = create(&store, "hidden", "soft deleted content", EntryType::FactualReference);
    store.deactivate_entry(&id).unwrap();

    let results = hybrid_search(&store, None, &SearchQuery::new("soft deleted content"))
        .await
        .unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn search_does_not_touch_last_accessed() {
    let store = open_store();
    let id = create(&store, "untouched", "accessed only explicitly", EntryType::Decision);

    hybrid_search(&store, None, &SearchQuery::new("accessed explicitly"))
        .await
        .unwrap();

    let entry = store.get_entry(&id).unwrap().unwrap();
    assert!(entry.last_accessed.is_none());
}

#[tokio::test]
async fn limit_caps_result_count() {
    let store = open_store();
    for i in 0..6 {
        create(
            &store,
            &format!("bulk-{i}"),
            "repeated corpus text for limits",
            EntryType::FactualReference,
        );
    }
    let mut query = SearchQuery::new("repeated corpus text");
    query.limit = 3;
    let results = hybrid_search(&store, None, &query).await.unwrap();
    assert_eq!(results.len(), 3);
}
