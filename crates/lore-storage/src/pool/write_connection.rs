//! The single write connection. SQLite serialises writers anyway, so one
//! mutex-guarded connection is the whole write path.

use std::path::Path;
use std::sync::Mutex;

use lore_core::KbResult;
use rusqlite::Connection;

use super::pragmas::apply_pragmas;
use crate::to_storage_err;

pub struct WriteConnection {
    conn: Mutex<Connection>,
}

impl WriteConnection {
    pub fn open(path: &Path) -> KbResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(to_storage_err)?;
            }
        }
        let conn = Connection::open(path).map_err(to_storage_err)?;
        apply_pragmas(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> KbResult<Self> {
        let conn = Connection::open_in_memory().map_err(to_storage_err)?;
        apply_pragmas(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Execute a closure with exclusive access to the write connection.
    pub fn with_conn<F, T>(&self, f: F) -> KbResult<T>
    where
        F: FnOnce(&Connection) -> KbResult<T>,
    {
        let guard = self
            .conn
            .lock()
            .map_err(|e| to_storage_err(format!("write connection lock poisoned: {e}")))?;
        f(&guard)
    }
}
