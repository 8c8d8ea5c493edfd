//! LLM query planner: maps a natural-language question to a strategy,
//! scope, and target using the graph vocabulary for disambiguation.

use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

use lore_core::KbResult;
use lore_llm::LlmProvider;
use lore_storage::KnowledgeStore;

use crate::queries::{get_graph_vocabulary, graph_stats};

static FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:json)?\s*(.*?)\s*```").expect("fence regex"));
static JSON_OBJECT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*\}").expect("object regex"));

/// Vocabulary size shown to the planner.
const PLANNER_VOCAB_LIMIT: usize = 200;

const SYSTEM_PROMPT: &str = "\
You are a knowledge graph query planner. Given a natural language question and \
a graph vocabulary, choose the best query strategy and resolve entity references.

Available strategies:
- auto: Hybrid search + graph expansion. Best for general questions or when unsure.
- decision_trace: Follow supersedes chains for decision history. Use when the \
question asks WHY something was decided or how a decision evolved.
- timeline: Chronological entries for a scope. Use when the question asks about \
history or progression in a specific area.
- related: BFS from a starting node. Use when the question asks \"what relates to X\".
- connection: Find paths between two nodes. Use when the question asks how two \
things are connected.

Node ID formats: tag:X, project:X, person:X, tool:X, concept:X, technology:X, \
kb-XXXXX (entry IDs).

Output a single JSON object:
{
  \"strategy\": \"auto|decision_trace|timeline|related|connection\",
  \"scope\": \"resolved node ID or null\",
  \"target\": \"second node ID (connection only) or null\",
  \"search_query\": \"refined search terms or null\",
  \"reasoning\": \"brief explanation of your choice\"
}

Rules:
- Choose ONE strategy. When in doubt, use \"auto\".
- Resolve mentions to exact node IDs from the vocabulary provided.
- For \"related\" and \"timeline\", scope is required.
- For \"connection\", both scope and target are required.
- If you can't resolve a mention to a known node, use \"auto\" instead.";

/// Public strategy set for `ask`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Auto,
    DecisionTrace,
    Timeline,
    Related,
    Connection,
}

impl Strategy {
    pub const ALL: [Strategy; 5] = [
        Strategy::Auto,
        Strategy::DecisionTrace,
        Strategy::Timeline,
        Strategy::Related,
        Strategy::Connection,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::Auto => "auto",
            Strategy::DecisionTrace => "decision_trace",
            Strategy::Timeline => "timeline",
            Strategy::Related => "related",
            Strategy::Connection => "connection",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.as_str() == s)
    }
}

/// Result of query planning: a structured graph query.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    pub strategy: Strategy,
    pub scope: Option<String>,
    pub target: Option<String>,
    pub search_query: Option<String>,
    pub reasoning: Option<String>,
}

/// Translates natural-language questions into structured query plans.
pub struct QueryPlanner<'a> {
    store: &'a KnowledgeStore,
    llm: &'a dyn LlmProvider,
}

impl<'a> QueryPlanner<'a> {
    pub fn new(store: &'a KnowledgeStore, llm: &'a dyn LlmProvider) -> Self {
        Self { store, llm }
    }

    /// Generate a plan for a question. `None` means the caller should
    /// fall back to the auto strategy with the raw question.
    pub async fn plan(&self, question: &str) -> KbResult<Option<QueryPlan>> {
        let context = self.build_context(question)?;
        let Some(raw) = self.llm.generate(&context, Some(SYSTEM_PROMPT)).await else {
            return Ok(None);
        };
        Ok(parse_plan(&raw))
    }

    /// Per-request context: graph stats, vocabulary, and the question.
    fn build_context(&self, question: &str) -> KbResult<String> {
        let stats = graph_stats(self.store)?;
        let mut parts = vec![
            "Graph stats:".to_string(),
            format!(
                "  Nodes by type: {}",
                serde_json::to_string(&stats.nodes_by_type).unwrap_or_default()
            ),
            format!(
                "  Edges by type: {}",
                serde_json::to_string(&stats.edges_by_type).unwrap_or_default()
            ),
            format!("  Active entries: {}", stats.active_entries),
        ];

        let vocab = get_graph_vocabulary(self.store, PLANNER_VOCAB_LIMIT)?;
        if !vocab.is_empty() {
            parts.push("\nGraph vocabulary (available node names by type):".to_string());
            for (node_type, names) in &vocab {
                parts.push(format!("  {node_type}: {}", names.join(", ")));
            }
        }

        parts.push(format!("\nQuestion: {question}"));
        Ok(parts.join("\n"))
    }
}

/// Parse the planner response. An unknown strategy is downgraded to
/// auto; unparsable JSON yields `None`.
pub fn parse_plan(raw: &str) -> Option<QueryPlan> {
    let raw = match FENCE_RE.captures(raw) {
        Some(captures) => captures.get(1).map_or(raw, |m| m.as_str()),
        None => raw,
    };

    let object_text = JSON_OBJECT_RE.find(raw).or_else(|| {
        warn!("no JSON object found in planner response");
        None
    })?;
    let data: serde_json::Value = match serde_json::from_str(object_text.as_str()) {
        Ok(value) => value,
        Err(_) => {
            warn!("malformed JSON in planner response");
            return None;
        }
    };
    let object = data.as_object()?;

    let strategy_raw = object.get("strategy").and_then(|v| v.as_str()).unwrap_or("auto");
    let strategy = Strategy::parse(strategy_raw).unwrap_or_else(|| {
        warn!(strategy = strategy_raw, "invalid strategy from planner, using auto");
        Strategy::Auto
    });

    let field = |key: &str| {
        object
            .get(key)
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    Some(QueryPlan {
        strategy,
        scope: field("scope"),
        target: field("target"),
        search_query: field("search_query"),
        reasoning: field("reasoning"),
    })
}
