//! The `summarize` tool: retrieval plus LLM synthesis with citations.

use lore_core::KbResult;
use lore_graph::Strategy;

use crate::ask::{strategy_auto, AskRequest};
use crate::context::ServerContext;
use crate::format;

const SYNTHESIS_SYSTEM_PROMPT: &str = "\
You are a knowledge base assistant. Given a question and a set of retrieved \
knowledge entries, synthesize a clear, concise answer.

Rules:
- Answer ONLY from the provided entries. Do not use outside knowledge.
- Cite entry IDs in [kb-XXXXX] format when referencing specific entries.
- If entries contain conflicting information, note the conflict and cite both.
- If no entries are relevant to the question, say so clearly.
- Be concise. Prefer bullet points for multi-part answers.
- Do not repeat the question back.";

/// Answer a question with a synthesized natural-language response,
/// falling back to formatted raw results when the LLM is missing or
/// fails.
pub async fn summarize(
    ctx: &ServerContext,
    question: &str,
    scope: Option<&str>,
    limit: usize,
) -> KbResult<String> {
    let mut request = AskRequest::new(question);
    request.strategy = Strategy::Auto;
    request.scope = scope.map(str::to_string);
    request.limit = limit;
    let outcome = strategy_auto(ctx, &request).await?;

    if outcome.items.is_empty() {
        return Ok("No entries found matching your question.".to_string());
    }

    let raw = format::format_ask(&outcome);

    if let Some(llm) = &ctx.query_llm {
        let prompt = format!("Question: {question}\n\nRetrieved entries:\n{raw}");
        match llm.generate(&prompt, Some(SYNTHESIS_SYSTEM_PROMPT)).await {
            Some(synthesis) => return Ok(synthesis),
            None => return Ok(format!("(LLM synthesis failed, showing raw results)\n\n{raw}")),
        }
    }

    Ok(format!("(LLM unavailable, showing raw results)\n\n{raw}"))
}
