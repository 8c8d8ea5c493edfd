//! # lore-graph
//!
//! The two-tier knowledge graph. Deterministic edges are derived from
//! entry fields on every write; LLM-extracted entity edges are layered
//! on top with idempotent re-enrichment. Traversal queries and the
//! natural-language query planner live here too.

pub mod builder;
pub mod enricher;
pub mod planner;
pub mod queries;
pub mod similarity;

pub use builder::GraphBuilder;
pub use enricher::GraphEnricher;
pub use planner::{QueryPlan, QueryPlanner, Strategy};
