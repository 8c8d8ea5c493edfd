//! Confidence decay by entry type.
//!
//! ```text
//! effective = base * 2^(-age_days / half_life(type))
//! ```
//!
//! Age is anchored to `max(updated_at, last_accessed)`: editing an entry
//! and retrieving it both reset the clock.

use chrono::{DateTime, Utc};

use lore_core::constants::{STALENESS_FILTER_THRESHOLD, STALENESS_WARN_THRESHOLD};
use lore_core::entry::{EntryType, KnowledgeEntry};

/// Decay half-life in days per entry type.
pub fn half_life_days(entry_type: EntryType) -> f64 {
    match entry_type {
        EntryType::FactualReference => 90.0, // facts go stale fast
        EntryType::Decision => 365.0,        // decisions persist but context shifts
        EntryType::PatternConvention => 730.0, // conventions are durable
        EntryType::LessonLearned => 1825.0,  // hard-won lessons stick
    }
}

/// The timestamp the decay clock runs from.
pub fn decay_anchor(entry: &KnowledgeEntry) -> DateTime<Utc> {
    match entry.last_accessed {
        Some(accessed) if accessed > entry.updated_at => accessed,
        _ => entry.updated_at,
    }
}

/// Compute confidence after time-based decay, rounded to four decimal
/// places. Ages at or below zero return the base unchanged.
pub fn effective_confidence(
    base_confidence: f64,
    entry_type: EntryType,
    anchor: DateTime<Utc>,
    now: DateTime<Utc>,
) -> f64 {
    let age_days = (now - anchor).num_seconds() as f64 / 86_400.0;
    if age_days <= 0.0 {
        return base_confidence;
    }
    let factor = 2f64.powf(-age_days / half_life_days(entry_type));
    round4(base_confidence * factor)
}

/// Effective confidence for an entry at `now`, anchored per
/// [`decay_anchor`].
pub fn entry_confidence(entry: &KnowledgeEntry, now: DateTime<Utc>) -> f64 {
    effective_confidence(entry.base_confidence, entry.entry_type, decay_anchor(entry), now)
}

/// Warning string for entries below the staleness threshold, else `None`.
pub fn staleness_warning(effective_confidence: f64, entry_type: EntryType) -> Option<String> {
    if effective_confidence >= STALENESS_WARN_THRESHOLD {
        return None;
    }
    Some(format!(
        "Stale {} entry (confidence: {:.0}%). Consider verifying this information is still current.",
        entry_type.as_str(),
        effective_confidence * 100.0,
    ))
}

/// True when an entry has decayed past the search-filter threshold.
pub fn is_filtered(effective_confidence: f64) -> bool {
    effective_confidence < STALENESS_FILTER_THRESHOLD
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn zero_age_returns_base() {
        let now = Utc::now();
        assert_eq!(
            effective_confidence(0.9, EntryType::Decision, now, now),
            0.9
        );
    }

    #[test]
    fn future_anchor_returns_base() {
        let now = Utc::now();
        let anchor = now + Duration::days(1);
        assert_eq!(
            effective_confidence(0.9, EntryType::Decision, anchor, now),
            0.9
        );
    }

    #[test]
    fn one_half_life_halves() {
        let now = Utc::now();
        let anchor = now - Duration::days(365);
        let eff = effective_confidence(0.8, EntryType::Decision, anchor, now);
        assert!((eff - 0.4).abs() < 0.001, "got {eff}");
    }

    #[test]
    fn warning_fires_below_threshold() {
        assert!(staleness_warning(0.49, EntryType::Decision).is_some());
        assert!(staleness_warning(0.5, EntryType::Decision).is_none());
        let warning = staleness_warning(0.42, EntryType::FactualReference).unwrap();
        assert!(warning.contains("factual_reference"));
        assert!(warning.contains("42%"));
    }
}
