//! Query planner: plan parsing and validation.

use async_trait::async_trait;

use lore_core::entry::{EntryType, NewEntry};
use lore_graph::planner::parse_plan;
use lore_graph::{GraphBuilder, QueryPlanner, Strategy};
use lore_llm::LlmProvider;
use lore_storage::KnowledgeStore;

struct StaticLlm {
    response: Option<String>,
}

#[async_trait]
impl LlmProvider for StaticLlm {
    async fn is_available(&self) -> bool {
        self.response.is_some()
    }

    async fn generate(&self, prompt: &str, _system: Option<&str>) -> Option<String> {
        // The planner context must carry the vocabulary and the question.
        assert!(prompt.contains("Question:"));
        self.response.clone()
    }
}

#[test]
fn parses_a_full_plan() {
    let plan = parse_plan(
        r#"{"strategy": "connection", "scope": "tag:python", "target": "kb-00042",
            "search_query": null, "reasoning": "asks how two things link"}"#,
    )
    .unwrap();
    assert_eq!(plan.strategy, Strategy::Connection);
    assert_eq!(plan.scope.as_deref(), Some("tag:python"));
    assert_eq!(plan.target.as_deref(), Some("kb-00042"));
    assert_eq!(plan.search_query, None);
    assert!(plan.reasoning.is_some());
}

#[test]
fn fenced_json_is_accepted() {
    let plan = parse_plan("```json\n{\"strategy\": \"timeline\", \"scope\": \"project:lore\"}\n```")
        .unwrap();
    assert_eq!(plan.strategy, Strategy::Timeline);
    assert_eq!(plan.scope.as_deref(), Some("project:lore"));
}

#[test]
fn unknown_strategy_downgrades_to_auto() {
    let plan = parse_plan(r#"{"strategy": "teleport", "scope": "tag:python"}"#).unwrap();
    assert_eq!(plan.strategy, Strategy::Auto);
}

#[test]
fn garbage_yields_none() {
    assert!(parse_plan("I would suggest searching for python").is_none());
    assert!(parse_plan("{not valid json").is_none());
}

#[test]
fn strategy_round_trip() {
    for strategy in Strategy::ALL {
        assert_eq!(Strategy::parse(strategy.as_str()), Some(strategy));
    }
    assert_eq!(Strategy::parse("unknown"), None);
}

#[tokio::test]
async fn planner_builds_context_and_returns_plan() {
    let store = KnowledgeStore::open_in_memory(4).unwrap();
    let entry = store
        .create_entry(NewEntry {
            short_title: "seed".into(),
            long_title: "seed".into(),
            details: "seed".into(),
            entry_type: EntryType::Decision,
            tags: vec!["python".into()],
            ..NewEntry::default()
        })
        .unwrap();
    GraphBuilder::new(&store).build_for_entry(&entry).unwrap();

    let llm = StaticLlm {
        response: Some(r#"{"strategy": "related", "scope": "tag:python"}"#.to_string()),
    };
    let planner = QueryPlanner::new(&store, &llm);
    let plan = planner.plan("what connects to python?").await.unwrap().unwrap();
    assert_eq!(plan.strategy, Strategy::Related);
    assert_eq!(plan.scope.as_deref(), Some("tag:python"));
}

#[tokio::test]
async fn llm_failure_yields_no_plan() {
    let store = KnowledgeStore::open_in_memory(4).unwrap();
    let llm = StaticLlm { response: None };
    let planner = QueryPlanner::new(&store, &llm);
    assert!(planner.plan("anything").await.unwrap().is_none());
}
