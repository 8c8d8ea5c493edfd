//! Compact text rendering for tool responses.

use chrono::Utc;

use lore_core::entry::KnowledgeEntry;

use crate::ask::AskOutcome;
use crate::get::GetOutcome;
use crate::search::SearchOutcome;
use crate::store::{StoreAction, StoreOutcome};

/// `[kb-00082] lesson_learned | Title (90%)`.
pub fn format_entry_header(entry: &KnowledgeEntry, effective_confidence: f64) -> String {
    format!(
        "[{}] {} | {} ({:.0}%)",
        entry.id,
        entry.entry_type.as_str(),
        entry.short_title,
        effective_confidence * 100.0,
    )
}

/// `#tag1 #tag2 | project  [STALE]`.
pub fn format_entry_meta(entry: &KnowledgeEntry, stale: bool) -> String {
    let mut parts: Vec<String> = Vec::new();
    if !entry.tags.is_empty() {
        parts.push(
            entry
                .tags
                .iter()
                .map(|t| format!("#{t}"))
                .collect::<Vec<_>>()
                .join(" "),
        );
    }
    if let Some(project) = &entry.project_ref {
        parts.push(project.clone());
    }
    let line = parts.join(" | ");
    if stale {
        if line.is_empty() {
            "[STALE]".to_string()
        } else {
            format!("{line}  [STALE]")
        }
    } else {
        line
    }
}

/// Header + long title + meta, no details. For search and store output.
pub fn format_entry_compact(
    entry: &KnowledgeEntry,
    effective_confidence: f64,
    stale: bool,
) -> String {
    let mut lines = vec![format_entry_header(entry, effective_confidence)];
    if !entry.long_title.is_empty() && entry.long_title != entry.short_title {
        lines.push(format!("  {}", entry.long_title));
    }
    let meta = format_entry_meta(entry, stale);
    if !meta.is_empty() {
        lines.push(format!("  {meta}"));
    }
    lines.join("\n")
}

/// Header + meta + optional context + details. For get and ask output.
pub fn format_entry_full(entry: &KnowledgeEntry, context: Option<&str>) -> String {
    let now = Utc::now();
    let effective = lore_decay::entry_confidence(entry, now);
    let warning = lore_decay::staleness_warning(effective, entry.entry_type);

    let mut lines = vec![format_entry_header(entry, effective)];
    let meta = format_entry_meta(entry, warning.is_some());
    if !meta.is_empty() {
        lines.push(format!("  {meta}"));
    }
    if let Some(context) = context {
        lines.push(format!("  -> {context}"));
    }
    if let Some(warning) = warning {
        lines.push(format!("  WARNING: {warning}"));
    }
    lines.push(format!("  {}", entry.details));
    lines.join("\n")
}

/// Count + note + blocks joined by blank lines + optional hints.
pub fn format_result_list(
    blocks: &[String],
    note: Option<&str>,
    hints: &[String],
) -> String {
    if blocks.is_empty() && hints.is_empty() {
        return "No results found.".to_string();
    }

    let mut lines = vec![format!("{} result(s)", blocks.len())];
    if let Some(note) = note {
        lines.push(format!("Note: {note}"));
    }
    lines.push(String::new());
    lines.push(blocks.join("\n\n"));
    if !hints.is_empty() {
        lines.push(String::new());
        lines.push("Related entries via graph:".to_string());
        for hint in hints {
            lines.push(format!("  {hint}"));
        }
    }
    lines.join("\n")
}

pub fn format_search(outcome: &SearchOutcome) -> String {
    let blocks: Vec<String> = outcome
        .results
        .iter()
        .map(|r| {
            format_entry_compact(
                &r.entry,
                r.effective_confidence,
                r.staleness_warning.is_some(),
            )
        })
        .collect();
    format_result_list(&blocks, outcome.note.as_deref(), &outcome.hints)
}

pub fn format_store(outcome: &StoreOutcome) -> String {
    let action = match outcome.action {
        StoreAction::Created => "Created",
        StoreAction::Updated => "Updated",
        StoreAction::Deactivated => "Deactivated",
    };
    let mut text = format!(
        "{action} {} (v{})\n{}",
        outcome.entry.id,
        outcome.entry.version,
        format_entry_compact(&outcome.entry, outcome.effective_confidence, false),
    );
    if outcome.action != StoreAction::Deactivated && !outcome.entry.has_embedding {
        text.push_str("\n  Note: entry will be embedded when the embedder is available");
    }
    text
}

pub fn format_get(outcome: &GetOutcome) -> String {
    let mut blocks: Vec<String> = outcome
        .found
        .iter()
        .map(|entry| format_entry_full(entry, None))
        .collect();
    for id in &outcome.missing {
        blocks.push(format!("[{id}] not found"));
    }
    format_result_list(&blocks, None, &[])
}

pub fn format_ask(outcome: &AskOutcome) -> String {
    let mut sections = Vec::new();
    if let Some(planned) = &outcome.planned {
        sections.push(planned.clone());
        sections.push(String::new());
    }

    if let Some(path) = &outcome.path {
        if path.is_empty() {
            sections.push("The two nodes are the same.".to_string());
        } else {
            sections.push("Path:".to_string());
            for (i, (source, edge_type, target)) in path.iter().enumerate() {
                sections.push(format!("  {}. {source} --[{edge_type}]--> {target}", i + 1));
            }
            sections.push(String::new());
        }
    }

    let blocks: Vec<String> = outcome
        .items
        .iter()
        .map(|item| format_entry_full(&item.entry, Some(&item.context)))
        .collect();
    sections.push(format_result_list(&blocks, None, &[]));
    sections.join("\n")
}
