//! The `get` tool: full entry retrieval by id.
//!
//! This is the one read path that updates `last_accessed`, resetting the
//! decay clock for the retrieved entries.

use lore_core::constants::MAX_GET_IDS;
use lore_core::entry::KnowledgeEntry;
use lore_core::{KbError, KbResult};

use crate::context::ServerContext;

#[derive(Debug, Clone)]
pub struct GetOutcome {
    pub found: Vec<KnowledgeEntry>,
    /// Ids that were unknown or inactive.
    pub missing: Vec<String>,
}

/// Retrieve full entries by id (hard cap 20). Inactive entries are
/// reported as missing.
pub fn get(ctx: &ServerContext, ids: &[String]) -> KbResult<GetOutcome> {
    if ids.len() > MAX_GET_IDS {
        return Err(KbError::validation(format!(
            "maximum {MAX_GET_IDS} ids per request (got {})",
            ids.len()
        )));
    }

    let mut found = Vec::new();
    let mut missing = Vec::new();
    for id in ids {
        match ctx.store.get_entry(id)? {
            Some(entry) if entry.is_active => found.push(entry),
            _ => missing.push(id.clone()),
        }
    }

    let accessed: Vec<String> = found.iter().map(|e| e.id.clone()).collect();
    if !accessed.is_empty() {
        ctx.store.touch_accessed(&accessed)?;
    }

    Ok(GetOutcome { found, missing })
}
