//! The `ask` tool: strategy-driven graph traversal combined with search.

use lore_core::constants::AUTO_NEIGHBOR_CAP;
use lore_core::entry::{is_entry_id, KnowledgeEntry};
use lore_core::graph::Direction;
use lore_core::search::SearchQuery;
use lore_core::{KbError, KbResult};
use lore_graph::queries::{
    bfs_entries_default, entries_for_scope, find_path, supersedes_chain,
};
use lore_graph::{QueryPlan, QueryPlanner, Strategy};
use lore_retrieval::hybrid_search;
use tracing::debug;

use crate::context::ServerContext;

#[derive(Debug, Clone)]
pub struct AskRequest {
    pub question: String,
    pub strategy: Strategy,
    /// Filter: `project:X`, `tag:Y`, an entry id, or a node id.
    pub scope: Option<String>,
    /// Second node, for the connection strategy.
    pub target: Option<String>,
    pub limit: usize,
}

impl AskRequest {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            strategy: Strategy::Auto,
            scope: None,
            target: None,
            limit: 20,
        }
    }
}

/// One entry in an answer, with a line of context explaining how it was
/// reached.
#[derive(Debug, Clone)]
pub struct AskItem {
    pub entry: KnowledgeEntry,
    pub context: String,
}

#[derive(Debug, Clone)]
pub struct AskOutcome {
    /// The strategy that actually ran (the planner may redirect auto).
    pub strategy: Strategy,
    /// Planner note when a plan redirected the question.
    pub planned: Option<String>,
    pub items: Vec<AskItem>,
    /// Edge triples for the connection strategy; empty when the two
    /// nodes coincide.
    pub path: Option<Vec<(String, String, String)>>,
}

/// Answer a question by traversing the knowledge graph and combining
/// with hybrid search.
pub async fn ask(ctx: &ServerContext, req: AskRequest) -> KbResult<AskOutcome> {
    // The planner is consulted only for auto questions with a query LLM
    // configured; anything it gets wrong falls back to plain auto.
    if req.strategy == Strategy::Auto {
        if let Some(llm) = &ctx.query_llm {
            let planner = QueryPlanner::new(&ctx.store, llm.as_ref());
            if let Some(plan) = planner.plan(&req.question).await? {
                debug!(strategy = plan.strategy.as_str(), "query plan");
                return dispatch_planned(ctx, &req, plan).await;
            }
        }
    }

    dispatch(ctx, &req, req.strategy, None).await
}

async fn dispatch_planned(
    ctx: &ServerContext,
    req: &AskRequest,
    plan: QueryPlan,
) -> KbResult<AskOutcome> {
    let planned = (plan.strategy != Strategy::Auto).then(|| {
        let mut note = format!("[Planned: {}]", plan.strategy.as_str());
        if let Some(reasoning) = &plan.reasoning {
            note.push(' ');
            note.push_str(reasoning);
        }
        note
    });

    let merged = AskRequest {
        question: plan.search_query.clone().unwrap_or_else(|| req.question.clone()),
        strategy: plan.strategy,
        scope: plan.scope.or_else(|| req.scope.clone()),
        target: plan.target.or_else(|| req.target.clone()),
        limit: req.limit,
    };
    dispatch(ctx, &merged, merged.strategy, planned).await
}

async fn dispatch(
    ctx: &ServerContext,
    req: &AskRequest,
    strategy: Strategy,
    planned: Option<String>,
) -> KbResult<AskOutcome> {
    let mut outcome = match strategy {
        Strategy::Auto => strategy_auto(ctx, req).await?,
        Strategy::DecisionTrace => strategy_decision_trace(ctx, req).await?,
        Strategy::Timeline => strategy_timeline(ctx, req)?,
        Strategy::Related => strategy_related(ctx, req)?,
        Strategy::Connection => strategy_connection(ctx, req)?,
    };
    outcome.planned = planned;
    Ok(outcome)
}

/// Hybrid search, then one-hop neighbour expansion with a per-hit cap,
/// appending previously-unseen active entries until the limit.
/// Also the retrieval path for `summarize`, which bypasses the planner.
pub(crate) async fn strategy_auto(ctx: &ServerContext, req: &AskRequest) -> KbResult<AskOutcome> {
    let mut query = SearchQuery::new(req.question.clone());
    query.limit = req.limit;
    let results = hybrid_search(&ctx.store, ctx.embedder.as_ref(), &query).await?;

    let mut seen: std::collections::HashSet<String> =
        results.iter().map(|r| r.entry.id.clone()).collect();
    let mut items: Vec<AskItem> = results
        .iter()
        .map(|r| AskItem {
            entry: r.entry.clone(),
            context: format!("search match (score: {:.4})", r.score),
        })
        .collect();

    'expansion: for result in &results {
        for neighbor in ctx.store.neighbors(&result.entry.id, AUTO_NEIGHBOR_CAP)? {
            if !is_entry_id(&neighbor.node_id) || seen.contains(&neighbor.node_id) {
                continue;
            }
            let Some(entry) = ctx.store.get_entry(&neighbor.node_id)? else {
                continue;
            };
            if !entry.is_active {
                continue;
            }
            seen.insert(entry.id.clone());
            let context = match neighbor.direction {
                Direction::Outgoing => {
                    format!("linked from {} via {}", result.entry.id, neighbor.edge_type)
                }
                Direction::Incoming => {
                    format!("links to {} via {}", result.entry.id, neighbor.edge_type)
                }
            };
            items.push(AskItem { entry, context });
            if items.len() >= req.limit {
                break 'expansion;
            }
        }
    }

    Ok(plain(Strategy::Auto, items))
}

/// FTS for decision entries matching the question, then walk each hit's
/// supersedes chain.
async fn strategy_decision_trace(ctx: &ServerContext, req: &AskRequest) -> KbResult<AskOutcome> {
    let filters = lore_core::search::SearchFilters {
        entry_type: Some(lore_core::entry::EntryType::Decision),
        ..Default::default()
    };
    let mut hits: Vec<String> = ctx
        .store
        .fts_search(&req.question, &filters, req.limit)?
        .into_iter()
        .map(|(id, _)| id)
        .collect();

    if hits.is_empty() {
        if let Some(scope) = &req.scope {
            let scoped = entries_for_scope(&ctx.store, scope)?;
            let entries = ctx.store.get_entries(&scoped, false)?;
            hits = entries
                .into_iter()
                .filter(|e| e.entry_type == lore_core::entry::EntryType::Decision)
                .map(|e| e.id)
                .take(req.limit)
                .collect();
        }
    }

    let mut in_a_chain: std::collections::HashSet<String> = std::collections::HashSet::new();
    let mut items = Vec::new();
    'chains: for entry_id in hits {
        if in_a_chain.contains(&entry_id) {
            continue;
        }
        let chain = supersedes_chain(&ctx.store, &entry_id)?;
        for link in &chain {
            in_a_chain.insert(link.entry_id.clone());
        }
        for link in chain {
            let Some(entry) = ctx.store.get_entry(&link.entry_id)? else {
                continue;
            };
            items.push(AskItem {
                entry,
                context: link.label,
            });
            if items.len() >= req.limit {
                break 'chains;
            }
        }
    }

    Ok(plain(Strategy::DecisionTrace, items))
}

/// Chronological entries for a scope.
fn strategy_timeline(ctx: &ServerContext, req: &AskRequest) -> KbResult<AskOutcome> {
    let scope = req.scope.as_deref().ok_or_else(|| {
        KbError::validation("timeline strategy requires a scope (e.g. project:X, tag:Y, decision)")
    })?;

    let ids = entries_for_scope(&ctx.store, scope)?;
    let mut items = Vec::new();
    for id in ids.into_iter().take(req.limit) {
        let Some(entry) = ctx.store.get_entry(&id)? else {
            continue;
        };
        if !entry.is_active {
            continue;
        }
        let context = format!("created {}", entry.created_at.format("%Y-%m-%d"));
        items.push(AskItem { entry, context });
    }

    Ok(plain(Strategy::Timeline, items))
}

/// BFS outward from a starting node, two hops deep.
fn strategy_related(ctx: &ServerContext, req: &AskRequest) -> KbResult<AskOutcome> {
    let start = req
        .target
        .as_deref()
        .or(req.scope.as_deref())
        .ok_or_else(|| {
            KbError::validation(
                "related strategy requires a starting node (entry id or node id like tag:python)",
            )
        })?;

    let hits = bfs_entries_default(&ctx.store, start, 2)?;
    let mut items = Vec::new();
    for hit in hits.into_iter().take(req.limit) {
        let Some(entry) = ctx.store.get_entry(&hit.entry_id)? else {
            continue;
        };
        if !entry.is_active {
            continue;
        }
        let context = if hit.depth == 1 {
            "directly connected".to_string()
        } else {
            let intermediates: Vec<&str> = hit.path[1..hit.path.len() - 1]
                .iter()
                .filter(|n| !is_entry_id(n))
                .map(String::as_str)
                .collect();
            if intermediates.is_empty() {
                format!("connected (depth {})", hit.depth)
            } else {
                format!("connected via {}", intermediates.join(", "))
            }
        };
        items.push(AskItem { entry, context });
    }

    Ok(plain(Strategy::Related, items))
}

/// Shortest path between two nodes, with the entries along it.
fn strategy_connection(ctx: &ServerContext, req: &AskRequest) -> KbResult<AskOutcome> {
    let (Some(scope), Some(target)) = (req.scope.as_deref(), req.target.as_deref()) else {
        return Err(KbError::validation(
            "connection strategy requires both scope and target",
        ));
    };

    let Some(path) = find_path(&ctx.store, scope, target, 4)? else {
        return Ok(AskOutcome {
            strategy: Strategy::Connection,
            planned: None,
            items: Vec::new(),
            path: None,
        });
    };

    let mut entry_ids: Vec<String> = Vec::new();
    for (source, _, step_target) in &path {
        for node in [source, step_target] {
            if is_entry_id(node) && !entry_ids.contains(node) {
                entry_ids.push(node.clone());
            }
        }
    }
    entry_ids.sort();

    let mut items = Vec::new();
    for id in entry_ids {
        if let Some(entry) = ctx.store.get_entry(&id)? {
            items.push(AskItem {
                entry,
                context: "on the path".to_string(),
            });
        }
    }

    Ok(AskOutcome {
        strategy: Strategy::Connection,
        planned: None,
        items,
        path: Some(path),
    })
}

fn plain(strategy: Strategy, items: Vec<AskItem>) -> AskOutcome {
    AskOutcome {
        strategy,
        planned: None,
        items,
        path: None,
    }
}
