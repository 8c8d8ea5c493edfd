//! Decay behaviour against known reference points.

use chrono::{Duration, Utc};

use lore_core::entry::EntryType;
use lore_decay::{decay_anchor, effective_confidence, half_life_days, staleness_warning};

#[test]
fn half_lives_by_type() {
    assert_eq!(half_life_days(EntryType::FactualReference), 90.0);
    assert_eq!(half_life_days(EntryType::Decision), 365.0);
    assert_eq!(half_life_days(EntryType::PatternConvention), 730.0);
    assert_eq!(half_life_days(EntryType::LessonLearned), 1825.0);
}

#[test]
fn decision_at_400_days_is_warned_but_kept() {
    let now = Utc::now();
    let anchor = now - Duration::days(400);
    let eff = effective_confidence(0.9, EntryType::Decision, anchor, now);

    // 0.9 * 2^(-400/365) ≈ 0.420
    assert!((eff - 0.420).abs() < 0.005, "got {eff}");
    assert!(eff >= 0.3, "still above the filter threshold");
    assert!(staleness_warning(eff, EntryType::Decision).is_some());
}

#[test]
fn factual_reference_at_400_days_is_filtered() {
    let now = Utc::now();
    let anchor = now - Duration::days(400);
    let eff = effective_confidence(0.9, EntryType::FactualReference, anchor, now);

    // 0.9 * 2^(-400/90) ≈ 0.042
    assert!((eff - 0.042).abs() < 0.005, "got {eff}");
    assert!(lore_decay::is_filtered(eff));
}

#[test]
fn monotonically_decreasing_over_time() {
    let now = Utc::now();
    let mut prev = 1.0;
    for days in [0, 1, 7, 30, 90, 180, 365, 730] {
        let anchor = now - Duration::days(days);
        let eff = effective_confidence(1.0, EntryType::FactualReference, anchor, now);
        assert!(
            eff <= prev + f64::EPSILON,
            "not monotone at day {days}: {eff} > {prev}"
        );
        prev = eff;
    }
}

#[test]
fn anchor_is_max_of_updated_and_accessed() {
    let now = Utc::now();
    let mut entry = sample_entry(now - Duration::days(400));

    // No access yet: anchored to updated_at.
    assert_eq!(decay_anchor(&entry), entry.updated_at);

    // A recent retrieval resets the clock.
    entry.last_accessed = Some(now - Duration::days(1));
    assert_eq!(decay_anchor(&entry), now - Duration::days(1));

    // A stale access older than the last edit does not.
    entry.last_accessed = Some(now - Duration::days(500));
    assert_eq!(decay_anchor(&entry), entry.updated_at);
}

#[test]
fn access_resets_effective_confidence() {
    let now = Utc::now();
    let mut entry = sample_entry(now - Duration::days(400));
    let stale = lore_decay::entry_confidence(&entry, now);

    entry.last_accessed = Some(now);
    let fresh = lore_decay::entry_confidence(&entry, now);

    assert!(stale < 0.5);
    assert_eq!(fresh, 0.9);
}

fn sample_entry(updated_at: chrono::DateTime<Utc>) -> lore_core::entry::KnowledgeEntry {
    lore_core::entry::KnowledgeEntry {
        id: "kb-00001".into(),
        project_ref: None,
        short_title: "sample".into(),
        long_title: "sample entry".into(),
        details: "details".into(),
        entry_type: EntryType::Decision,
        source_context: None,
        base_confidence: 0.9,
        tags: vec![],
        hints: serde_json::Map::new(),
        created_at: updated_at,
        updated_at,
        last_accessed: None,
        superseded_by: None,
        is_active: true,
        has_embedding: false,
        version: 1,
    }
}
