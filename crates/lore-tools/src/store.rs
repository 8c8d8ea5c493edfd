//! The `store` and `store_batch` tools: create, update, deactivate.

use chrono::Utc;

use lore_core::constants::MAX_BATCH_ENTRIES;
use lore_core::entry::{EntryPatch, KnowledgeEntry, NewEntry};
use lore_core::{KbError, KbResult};

use crate::context::ServerContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreAction {
    Created,
    Updated,
    Deactivated,
}

#[derive(Debug, Clone)]
pub struct StoreOutcome {
    pub action: StoreAction,
    pub entry: KnowledgeEntry,
    pub effective_confidence: f64,
}

/// Inputs for a single `store` call. Exactly one of the three paths
/// runs: deactivate (`deactivate_entry_id`), update (`update_entry_id`),
/// or create (the default).
#[derive(Debug, Clone, Default)]
pub struct StoreRequest {
    pub fields: NewEntry,
    pub update_entry_id: Option<String>,
    pub deactivate_entry_id: Option<String>,
    pub change_reason: Option<String>,
}

/// Store or update a knowledge entry. The entry is durable after the
/// commit; embedding, graph building and enrichment run afterwards and
/// their failures never surface.
pub async fn store(ctx: &ServerContext, req: StoreRequest) -> KbResult<StoreOutcome> {
    if let Some(entry_id) = &req.deactivate_entry_id {
        let entry = ctx.store.deactivate_entry(entry_id)?;
        // A deactivated entry leaves the graph entirely.
        ctx.store.clear_outgoing_edges(entry_id)?;
        return Ok(outcome(StoreAction::Deactivated, entry));
    }

    if let Some(entry_id) = &req.update_entry_id {
        if req.fields.details.is_empty() {
            return Err(KbError::validation(
                "details are required when updating an entry",
            ));
        }
        let patch = EntryPatch {
            details: Some(req.fields.details.clone()),
            base_confidence: Some(req.fields.base_confidence),
            tags: (!req.fields.tags.is_empty()).then(|| req.fields.tags.clone()),
            hints: (!req.fields.hints.is_empty()).then(|| req.fields.hints.clone()),
            superseded_by: None,
        };
        let entry = ctx.store.update_entry(entry_id, patch, req.change_reason)?;
        ctx.post_store_pipeline(&entry, true).await;
        let entry = ctx.store.get_entry(&entry.id)?.unwrap_or(entry);
        return Ok(outcome(StoreAction::Updated, entry));
    }

    if req.fields.short_title.is_empty()
        || req.fields.long_title.is_empty()
        || req.fields.details.is_empty()
    {
        return Err(KbError::validation(
            "short_title, long_title, and details are required when creating an entry",
        ));
    }

    let entry = ctx.store.create_entry(req.fields)?;
    ctx.post_store_pipeline(&entry, true).await;
    let entry = ctx.store.get_entry(&entry.id)?.unwrap_or(entry);
    Ok(outcome(StoreAction::Created, entry))
}

/// Store up to ten entries in one call, sharing a single LLM call for
/// graph enrichment across the batch.
pub async fn store_batch(
    ctx: &ServerContext,
    entries: Vec<NewEntry>,
) -> KbResult<Vec<StoreOutcome>> {
    if entries.is_empty() {
        return Err(KbError::validation("entries list is empty"));
    }
    if entries.len() > MAX_BATCH_ENTRIES {
        return Err(KbError::validation(format!(
            "maximum {MAX_BATCH_ENTRIES} entries per batch (got {})",
            entries.len()
        )));
    }
    for (i, fields) in entries.iter().enumerate() {
        if fields.short_title.is_empty() || fields.long_title.is_empty() || fields.details.is_empty()
        {
            return Err(KbError::validation(format!(
                "entry {i} is missing short_title, long_title, or details"
            )));
        }
    }

    let mut created = Vec::with_capacity(entries.len());
    for fields in entries {
        let entry = ctx.store.create_entry(fields)?;
        ctx.embed_entry(&entry).await;
        ctx.build_graph(&entry);
        created.push(entry);
    }

    ctx.enrich_batch(&created).await;

    // Refetch for the embedding flags set by the pipeline.
    let mut outcomes = Vec::with_capacity(created.len());
    for entry in created {
        let entry = ctx.store.get_entry(&entry.id)?.unwrap_or(entry);
        outcomes.push(outcome(StoreAction::Created, entry));
    }
    Ok(outcomes)
}

fn outcome(action: StoreAction, entry: KnowledgeEntry) -> StoreOutcome {
    let effective_confidence = lore_decay::entry_confidence(&entry, Utc::now());
    StoreOutcome {
        action,
        entry,
        effective_confidence,
    }
}
