//! FTS5/BM25 full-text search.
//!
//! BM25 scores are negative; more negative = stronger match, so results
//! are ordered ascending by score.

use rusqlite::Connection;

use lore_core::search::SearchFilters;
use lore_core::KbResult;

use crate::to_storage_err;

/// Quote every whitespace-separated token so FTS5 operators (`:`, `-`,
/// `(`, NEAR, ...) are treated as literal text. Tokens are joined with
/// spaces, which FTS5 treats as implicit AND.
pub fn sanitize_match_query(raw: &str) -> String {
    raw.split_whitespace()
        .map(|token| format!("\"{}\"", token.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Search the FTS index, returning `(entry_id, bm25_score)` pairs for
/// active entries matching the filters.
pub fn fts_search(
    conn: &Connection,
    query: &str,
    filters: &SearchFilters,
    limit: usize,
) -> KbResult<Vec<(String, f64)>> {
    if query.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut sql = String::from(
        "SELECT m.id, bm25(knowledge_fts) AS score
         FROM knowledge_fts
         JOIN knowledge_entries m ON m.rowid = knowledge_fts.rowid
         WHERE knowledge_fts MATCH ?1 AND m.is_active = 1",
    );
    let mut values: Vec<Box<dyn rusqlite::types::ToSql>> =
        vec![Box::new(sanitize_match_query(query))];

    if let Some(project) = &filters.project_ref {
        values.push(Box::new(project.clone()));
        sql.push_str(&format!(" AND m.project_ref = ?{}", values.len()));
    }
    if let Some(entry_type) = filters.entry_type {
        values.push(Box::new(entry_type.as_str().to_string()));
        sql.push_str(&format!(" AND m.entry_type = ?{}", values.len()));
    }
    if let Some(tags) = &filters.tags {
        // Boundary-safe membership: pad both the stored value and the
        // probe with spaces so "foo" matches "foo bar" but not "foobar".
        for tag in tags {
            values.push(Box::new(format!(" {tag} ")));
            sql.push_str(&format!(
                " AND instr(' ' || m.tags || ' ', ?{}) > 0",
                values.len()
            ));
        }
    }

    values.push(Box::new(limit as i64));
    sql.push_str(&format!(" ORDER BY score LIMIT ?{}", values.len()));

    let refs: Vec<&dyn rusqlite::types::ToSql> = values.iter().map(|v| v.as_ref()).collect();
    let mut stmt = conn.prepare(&sql).map_err(to_storage_err)?;
    let rows = stmt
        .query_map(refs.as_slice(), |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
        })
        .map_err(to_storage_err)?;

    rows.collect::<Result<Vec<_>, _>>().map_err(to_storage_err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_quotes_every_token() {
        assert_eq!(sanitize_match_query("hello world"), "\"hello\" \"world\"");
        assert_eq!(sanitize_match_query("a:b (c) -d"), "\"a:b\" \"(c)\" \"-d\"");
        assert_eq!(sanitize_match_query("say \"hi\""), "\"say\" \"\"\"hi\"\"\"");
        assert_eq!(sanitize_match_query("   "), "");
    }
}
