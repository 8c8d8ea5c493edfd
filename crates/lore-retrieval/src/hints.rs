//! Graph hints for sparse result sets.
//!
//! When search returns fewer than three hits, each result's graph
//! neighbourhood is scanned for other active entries worth mentioning.

use std::collections::HashSet;

use lore_core::constants::{AUTO_NEIGHBOR_CAP, MAX_GRAPH_HINTS};
use lore_core::entry::{is_entry_id, KnowledgeEntry};
use lore_core::search::SearchResult;
use lore_core::KbResult;
use lore_storage::KnowledgeStore;

/// One-liner hint: `See also: [kb-00042] Title (via concept:async-io)`.
pub fn format_graph_hint(entry: &KnowledgeEntry, via: &str) -> String {
    format!("See also: [{}] {} (via {})", entry.id, entry.long_title, via)
}

/// Collect graph-connected entries as hints.
///
/// For each result: up to 10 direct neighbours; non-entry intermediates
/// (tags, concepts, ...) get a second hop to the entries connected
/// through them. Hints never repeat an id already in the results or in a
/// previous hint, only name active entries, and stop at three.
pub fn collect_graph_hints(
    store: &KnowledgeStore,
    results: &[SearchResult],
) -> KbResult<Vec<String>> {
    let mut seen: HashSet<String> = results.iter().map(|r| r.entry.id.clone()).collect();
    let mut hints = Vec::new();

    for result in results {
        for neighbor in store.neighbors(&result.entry.id, AUTO_NEIGHBOR_CAP)? {
            if is_entry_id(&neighbor.node_id) {
                if seen.contains(&neighbor.node_id) {
                    continue;
                }
                if let Some(entry) = store.get_entry(&neighbor.node_id)? {
                    if entry.is_active {
                        seen.insert(entry.id.clone());
                        let via = format!("{} from {}", neighbor.edge_type, result.entry.id);
                        hints.push(format_graph_hint(&entry, &via));
                        if hints.len() >= MAX_GRAPH_HINTS {
                            return Ok(hints);
                        }
                    }
                }
            } else {
                // Intermediate node: look one more hop for entries
                // connected through it.
                let via = neighbor.node_id.clone();
                for second in store.neighbors(&neighbor.node_id, AUTO_NEIGHBOR_CAP)? {
                    if !is_entry_id(&second.node_id) || seen.contains(&second.node_id) {
                        continue;
                    }
                    if let Some(entry) = store.get_entry(&second.node_id)? {
                        if entry.is_active {
                            seen.insert(entry.id.clone());
                            hints.push(format_graph_hint(&entry, &via));
                            if hints.len() >= MAX_GRAPH_HINTS {
                                return Ok(hints);
                            }
                        }
                    }
                }
            }
        }
    }

    Ok(hints)
}
