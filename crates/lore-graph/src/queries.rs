//! Graph traversal queries: BFS, paths, supersedes chains, scopes,
//! vocabulary, stats.
//!
//! The graph is cyclic, so every traversal carries a visited set and a
//! depth bound. Node and edge rows are fetched lazily; the whole graph
//! is never materialised.

use std::collections::{BTreeMap, HashSet, VecDeque};

use lore_core::entry::{is_entry_id, EntryType};
use lore_core::graph::{edge_types, Direction, Neighbor, NodeType};
use lore_core::KbResult;
use lore_storage::KnowledgeStore;

/// Default bound for BFS result collection.
const BFS_RESULT_LIMIT: usize = 20;

/// An entry reached by [`bfs_entries`].
#[derive(Debug, Clone, PartialEq)]
pub struct BfsHit {
    pub entry_id: String,
    pub depth: usize,
    /// Node ids from the start to the entry, inclusive.
    pub path: Vec<String>,
}

/// One link in a supersedes chain.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainItem {
    pub entry_id: String,
    /// "original", "supersedes kb-XXXXX", or "current".
    pub label: String,
}

/// Counts consumed by the query planner.
#[derive(Debug, Clone, Default)]
pub struct GraphStats {
    pub nodes_by_type: BTreeMap<String, i64>,
    pub edges_by_type: BTreeMap<String, i64>,
    pub active_entries: i64,
}

/// BFS from `start`, collecting entry nodes reached, nearest first.
pub fn bfs_entries(
    store: &KnowledgeStore,
    start: &str,
    max_depth: usize,
    limit: usize,
) -> KbResult<Vec<BfsHit>> {
    let mut visited: HashSet<String> = HashSet::from([start.to_string()]);
    let mut queue: VecDeque<(String, usize, Vec<String>)> =
        VecDeque::from([(start.to_string(), 0, vec![start.to_string()])]);
    let mut results = Vec::new();

    while let Some((node, depth, path)) = queue.pop_front() {
        if results.len() >= limit {
            break;
        }

        if depth > 0 && is_entry_id(&node) {
            results.push(BfsHit {
                entry_id: node.clone(),
                depth,
                path: path.clone(),
            });
            if results.len() >= limit {
                break;
            }
        }

        if depth >= max_depth {
            continue;
        }

        for neighbor in store.neighbors(&node, lore_core::constants::NEIGHBOR_LIMIT)? {
            if visited.insert(neighbor.node_id.clone()) {
                let mut next_path = path.clone();
                next_path.push(neighbor.node_id.clone());
                queue.push_back((neighbor.node_id, depth + 1, next_path));
            }
        }
    }

    Ok(results)
}

/// BFS shortest path between two nodes. Returns the `(source, edge_type,
/// target)` triples forming the path, an empty list when the endpoints
/// coincide, or `None` when no path exists within `max_depth`.
pub fn find_path(
    store: &KnowledgeStore,
    source: &str,
    target: &str,
    max_depth: usize,
) -> KbResult<Option<Vec<(String, String, String)>>> {
    if source == target {
        return Ok(Some(Vec::new()));
    }

    let mut visited: HashSet<String> = HashSet::from([source.to_string()]);
    let mut queue: VecDeque<(String, Vec<(String, String, String)>)> =
        VecDeque::from([(source.to_string(), Vec::new())]);

    while let Some((node, path)) = queue.pop_front() {
        if path.len() >= max_depth {
            continue;
        }

        for neighbor in store.neighbors(&node, lore_core::constants::NEIGHBOR_LIMIT)? {
            if !visited.insert(neighbor.node_id.clone()) {
                continue;
            }

            let step = step_triple(&node, &neighbor);
            let mut next_path = path.clone();
            next_path.push(step);

            if neighbor.node_id == target {
                return Ok(Some(next_path));
            }
            queue.push_back((neighbor.node_id, next_path));
        }
    }

    Ok(None)
}

fn step_triple(node: &str, neighbor: &Neighbor) -> (String, String, String) {
    match neighbor.direction {
        Direction::Outgoing => (
            node.to_string(),
            neighbor.edge_type.clone(),
            neighbor.node_id.clone(),
        ),
        Direction::Incoming => (
            neighbor.node_id.clone(),
            neighbor.edge_type.clone(),
            node.to_string(),
        ),
    }
}

/// Walk `supersedes` edges both backward and forward from `entry_id`,
/// dedupe, and sort the chain chronologically by `created_at`. The
/// oldest item is labelled "original", the newest "current", and each
/// one in between names the entry it supersedes.
pub fn supersedes_chain(store: &KnowledgeStore, entry_id: &str) -> KbResult<Vec<ChainItem>> {
    let mut chain: HashSet<String> = HashSet::from([entry_id.to_string()]);

    // Backward: what this chain's entries supersede.
    let mut frontier = vec![entry_id.to_string()];
    while let Some(current) = frontier.pop() {
        for edge in store.outgoing_edges(&current, Some(edge_types::SUPERSEDES))? {
            if chain.insert(edge.target.clone()) {
                frontier.push(edge.target);
            }
        }
    }

    // Forward: what supersedes them.
    let mut frontier: Vec<String> = chain.iter().cloned().collect();
    while let Some(current) = frontier.pop() {
        for source in store.sources_linking_to(&current, Some(edge_types::SUPERSEDES))? {
            if chain.insert(source.clone()) {
                frontier.push(source);
            }
        }
    }

    // Chronological order comes from the entries table.
    let ids: Vec<String> = chain.into_iter().collect();
    let mut entries = store.get_entries(&ids, true)?;
    entries.sort_by(|a, b| a.created_at.cmp(&b.created_at));

    let count = entries.len();
    let items = entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let label = if count == 1 || i + 1 == count {
                "current".to_string()
            } else if i == 0 {
                "original".to_string()
            } else {
                format!("supersedes {}", entries[i - 1].id)
            };
            ChainItem {
                entry_id: entry.id.clone(),
                label,
            }
        })
        .collect();
    Ok(items)
}

/// Resolve a scope string to active entry ids, created_at ascending.
///
/// Dispatch by prefix: `project:X` and entry-type names query the
/// entries table; `tag:X`, `person:X`, `tool:X` and bare node ids walk
/// the graph; a literal entry id passes through.
pub fn entries_for_scope(store: &KnowledgeStore, scope: &str) -> KbResult<Vec<String>> {
    if is_entry_id(scope) {
        return Ok(vec![scope.to_string()]);
    }

    if let Some(project) = scope.strip_prefix("project:") {
        return store.entry_ids_by_project(project);
    }
    if let Some(entry_type) = EntryType::parse(scope) {
        return store.entry_ids_by_type(entry_type);
    }

    let (node_id, edge_type) = if let Some(tag) = scope.strip_prefix("tag:") {
        (NodeType::Tag.node_id(tag), Some(edge_types::HAS_TAG))
    } else if let Some(person) = scope.strip_prefix("person:") {
        (
            NodeType::Person.node_id(person),
            Some(edge_types::MENTIONS_PERSON),
        )
    } else if let Some(tool) = scope.strip_prefix("tool:") {
        (NodeType::Tool.node_id(tool), Some(edge_types::USES_TOOL))
    } else {
        // Generic node id: any connected entries count.
        (scope.to_string(), None)
    };

    let sources = store.sources_linking_to(&node_id, edge_type)?;
    let entry_ids: Vec<String> = sources.into_iter().filter(|id| is_entry_id(id)).collect();
    store.order_ids_by_created(&entry_ids)
}

/// Non-entry node names grouped by type, each list ordered by degree
/// descending. Used by the planner and the enricher.
pub fn get_graph_vocabulary(
    store: &KnowledgeStore,
    max_nodes: usize,
) -> KbResult<BTreeMap<String, Vec<String>>> {
    let rows = store.vocabulary_rows(max_nodes)?;
    let mut vocab: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (node_id, node_type, _) in rows {
        let prefix = format!("{node_type}:");
        let name = node_id.strip_prefix(&prefix).unwrap_or(&node_id).to_string();
        vocab.entry(node_type).or_default().push(name);
    }
    Ok(vocab)
}

/// Node and edge counts by type plus the active entry count.
pub fn graph_stats(store: &KnowledgeStore) -> KbResult<GraphStats> {
    Ok(GraphStats {
        nodes_by_type: store.node_counts_by_type()?.into_iter().collect(),
        edges_by_type: store.edge_counts_by_type()?.into_iter().collect(),
        active_entries: store.active_entry_count()?,
    })
}

/// BFS with the default result bound.
pub fn bfs_entries_default(
    store: &KnowledgeStore,
    start: &str,
    max_depth: usize,
) -> KbResult<Vec<BfsHit>> {
    bfs_entries(store, start, max_depth, BFS_RESULT_LIMIT)
}
