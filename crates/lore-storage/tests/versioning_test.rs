//! Version rows snapshot the state after each write; version 1 is the
//! creation state.

use lore_core::entry::{EntryPatch, EntryType, NewEntry};
use lore_storage::KnowledgeStore;

fn open_store() -> KnowledgeStore {
    KnowledgeStore::open_in_memory(4).unwrap()
}

#[test]
fn creation_writes_version_one() {
    let store = open_store();
    let entry = store
        .create_entry(NewEntry {
            short_title: "v1".into(),
            long_title: "version one".into(),
            details: "original details".into(),
            entry_type: EntryType::Decision,
            base_confidence: 0.8,
            ..NewEntry::default()
        })
        .unwrap();

    let versions = store.versions(&entry.id).unwrap();
    assert_eq!(versions.len(), 1);
    assert_eq!(versions[0].version_number, 1);
    assert_eq!(versions[0].details, "original details");
    assert_eq!(versions[0].change_reason.as_deref(), Some("Initial creation"));
    assert_eq!(versions[0].confidence, 0.8);
}

#[test]
fn n_updates_yield_n_plus_one_monotone_versions() {
    let store = open_store();
    let entry = store
        .create_entry(NewEntry {
            short_title: "history".into(),
            long_title: "history".into(),
            details: "v1".into(),
            entry_type: EntryType::FactualReference,
            ..NewEntry::default()
        })
        .unwrap();

    for n in 2..=4 {
        store
            .update_entry(
                &entry.id,
                EntryPatch {
                    details: Some(format!("v{n}")),
                    ..EntryPatch::default()
                },
                Some(format!("edit {n}")),
            )
            .unwrap();
    }

    let versions = store.versions(&entry.id).unwrap();
    assert_eq!(versions.len(), 4);
    let numbers: Vec<i64> = versions.iter().map(|v| v.version_number).collect();
    assert_eq!(numbers, vec![1, 2, 3, 4]);

    // Each row captures the state the write produced, not the prior one.
    for (i, version) in versions.iter().enumerate() {
        assert_eq!(version.details, format!("v{}", i + 1));
    }
    assert_eq!(versions[3].change_reason.as_deref(), Some("edit 4"));

    let current = store.get_entry(&entry.id).unwrap().unwrap();
    assert_eq!(current.version, 4);
}
