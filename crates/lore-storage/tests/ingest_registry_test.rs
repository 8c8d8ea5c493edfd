//! Ingested-file registry: path uniqueness and round-trip.

use chrono::Utc;

use lore_core::ingest::IngestedFile;
use lore_storage::KnowledgeStore;

fn sample(path: &str, sha256: &str) -> IngestedFile {
    let now = Utc::now();
    IngestedFile {
        path: path.to_string(),
        sha256: sha256.to_string(),
        note_node_id: "note:docs/setup.md".to_string(),
        entry_ids: vec!["kb-00001".to_string(), "kb-00002".to_string()],
        summary: "setup instructions".to_string(),
        file_size: 1024,
        file_extension: "md".to_string(),
        project_ref: Some("lore".to_string()),
        redactions: serde_json::json!([]),
        created_at: now,
        updated_at: now,
        is_active: true,
    }
}

#[test]
fn round_trips_a_registry_row() {
    let store = KnowledgeStore::open_in_memory(4).unwrap();
    let file = sample("/notes/setup.md", "abc123");
    store.record_ingested_file(&file).unwrap();

    let fetched = store.ingested_file("/notes/setup.md").unwrap().unwrap();
    assert_eq!(fetched.sha256, "abc123");
    assert_eq!(fetched.entry_ids, vec!["kb-00001", "kb-00002"]);
    assert_eq!(fetched.project_ref.as_deref(), Some("lore"));
    assert!(fetched.is_active);

    assert!(store.ingested_file("/notes/other.md").unwrap().is_none());
}

#[test]
fn re_recording_a_path_replaces_the_row() {
    let store = KnowledgeStore::open_in_memory(4).unwrap();
    store.record_ingested_file(&sample("/notes/setup.md", "v1")).unwrap();
    store.record_ingested_file(&sample("/notes/setup.md", "v2")).unwrap();

    let fetched = store.ingested_file("/notes/setup.md").unwrap().unwrap();
    assert_eq!(fetched.sha256, "v2");
}
