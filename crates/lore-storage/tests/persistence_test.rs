//! File-backed persistence: data survives reopening the store.

use lore_core::entry::{EntryType, NewEntry};
use lore_storage::KnowledgeStore;

#[test]
fn entries_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("knowledge.db");

    let id = {
        let store = KnowledgeStore::open(&path, 4).unwrap();
        let entry = store
            .create_entry(NewEntry {
                short_title: "durable".into(),
                long_title: "durable entry".into(),
                details: "survives a reopen".into(),
                entry_type: EntryType::LessonLearned,
                ..NewEntry::default()
            })
            .unwrap();
        store.store_embedding(&entry.id, &[0.5, 0.5, 0.0, 0.0]).unwrap();
        entry.id
    };

    let store = KnowledgeStore::open(&path, 4).unwrap();
    let entry = store.get_entry(&id).unwrap().expect("entry persisted");
    assert_eq!(entry.short_title, "durable");
    assert!(entry.has_embedding);
    assert_eq!(store.embedding_count(&id).unwrap(), 1);
    assert_eq!(store.versions(&id).unwrap().len(), 1);

    // The id sequence also persisted: the next entry continues the run.
    let next = store
        .create_entry(NewEntry {
            short_title: "next".into(),
            long_title: "next".into(),
            details: "next".into(),
            entry_type: EntryType::FactualReference,
            ..NewEntry::default()
        })
        .unwrap();
    assert_eq!(next.id, "kb-00002");
}
