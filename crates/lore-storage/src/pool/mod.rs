//! Connection handling: one write connection, a small read pool.

pub mod pragmas;
pub mod read_pool;
pub mod write_connection;

use std::path::{Path, PathBuf};
use std::sync::Once;

use lore_core::KbResult;
use rusqlite::Connection;

pub use read_pool::ReadPool;
pub use write_connection::WriteConnection;

static VEC_EXTENSION: Once = Once::new();

/// Register sqlite-vec as an auto extension so every subsequently opened
/// connection gets the vec0 module. Safe to call repeatedly.
pub fn register_vec_extension() {
    VEC_EXTENSION.call_once(|| unsafe {
        type InitFn = unsafe extern "C" fn(
            *mut rusqlite::ffi::sqlite3,
            *mut *mut std::os::raw::c_char,
            *const rusqlite::ffi::sqlite3_api_routines,
        ) -> std::os::raw::c_int;
        rusqlite::ffi::sqlite3_auto_extension(Some(std::mem::transmute::<*const (), InitFn>(
            sqlite_vec::sqlite3_vec_init as *const (),
        )));
    });
}

/// Manages the single write connection and the read connection pool.
pub struct ConnectionPool {
    pub writer: WriteConnection,
    pub readers: ReadPool,
    db_path: Option<PathBuf>,
}

impl ConnectionPool {
    /// Assemble a pool from already-opened connections. The writer must
    /// be opened (and the schema applied) before read-only connections
    /// can attach to the file.
    pub fn from_parts(writer: WriteConnection, readers: ReadPool, db_path: Option<&Path>) -> Self {
        Self {
            writer,
            readers,
            db_path: db_path.map(Path::to_path_buf),
        }
    }

    /// Open an in-memory pool (for testing). Reads are routed through the
    /// writer since in-memory readers would see a separate database.
    pub fn open_in_memory() -> KbResult<Self> {
        register_vec_extension();
        let writer = WriteConnection::open_in_memory()?;
        Ok(Self {
            writer,
            readers: ReadPool::empty(),
            db_path: None,
        })
    }

    /// Execute a closure on a read connection, falling back to the writer
    /// for in-memory databases.
    pub fn read<F, T>(&self, f: F) -> KbResult<T>
    where
        F: FnOnce(&Connection) -> KbResult<T>,
    {
        if self.db_path.is_some() && self.readers.size() > 0 {
            self.readers.with_conn(f)
        } else {
            self.writer.with_conn(f)
        }
    }

    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }
}
