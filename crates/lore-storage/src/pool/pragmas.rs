//! PRAGMA configuration applied to every SQLite connection.
//!
//! WAL mode, NORMAL sync, 5s busy_timeout, foreign_keys ON.

use lore_core::KbResult;
use rusqlite::Connection;

use crate::to_storage_err;

/// Apply write-connection pragmas.
pub fn apply_pragmas(conn: &Connection) -> KbResult<()> {
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA busy_timeout = 5000;
        PRAGMA foreign_keys = ON;
        ",
    )
    .map_err(to_storage_err)?;
    Ok(())
}

/// Apply read-connection pragmas. Journal mode is a property of the
/// database file and is configured by the writer.
pub fn apply_read_pragmas(conn: &Connection) -> KbResult<()> {
    conn.execute_batch(
        "
        PRAGMA busy_timeout = 5000;
        PRAGMA foreign_keys = ON;
        ",
    )
    .map_err(to_storage_err)?;
    Ok(())
}
