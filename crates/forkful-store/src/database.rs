//! Database connection management.
//!
//! The [`Database`] struct owns a [`rusqlite::Connection`] and guarantees that
//! migrations are run before any other operation.

use std::path::{Path, PathBuf};

use rusqlite::Connection;

use crate::error::Result;
use crate::migrations;

/// Wrapper around a [`rusqlite::Connection`].
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) a database at an explicit path, creating the parent
    /// directory when needed.
    pub fn open_at(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        tracing::info!(path = %path.display(), "opening database");

        let conn = Connection::open(path)?;

        // Recommended SQLite settings.
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::init(conn)
    }

    /// A private in-memory database, gone when the handle is dropped.
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;

        // Run schema migrations.
        migrations::run_migrations(&conn)?;

        Ok(Self { conn })
    }

    /// Return a reference to the underlying `rusqlite::Connection`.
    ///
    /// Callers should prefer the typed CRUD helpers, but direct access is
    /// occasionally needed for ad-hoc queries.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Return the filesystem path of the open database (if any).
    pub fn path(&self) -> Option<PathBuf> {
        self.conn.path().map(PathBuf::from)
    }
}
