//! SQLite storage for clips and users.
//!
//! Submodules:
//! - clips: clip metadata, keyed by the provider's clip id
//! - users: app users

pub mod clips;
pub mod users;

use rusqlite::{Connection, ErrorCode};
use std::path::Path;
use std::sync::{Arc, Mutex};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("{0} already exists")]
    Conflict(String),

    #[error("database connection lock poisoned")]
    Poisoned,
}

impl DbError {
    /// Turns UNIQUE violations into `Conflict`, passes everything else through.
    pub(crate) fn from_insert(e: rusqlite::Error, what: &str) -> Self {
        if let rusqlite::Error::SqliteFailure(err, _) = &e {
            if err.code == ErrorCode::ConstraintViolation {
                return DbError::Conflict(what.to_string());
            }
        }
        DbError::Sqlite(e)
    }
}

/// One shared connection; never hold the guard across an `.await`.
#[derive(Debug, Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, DbError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, DbError> {
        init_tables(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, DbError>,
    ) -> Result<T, DbError> {
        let conn = self.conn.lock().map_err(|_| DbError::Poisoned)?;
        f(&conn)
    }

    pub fn ping(&self) -> Result<(), DbError> {
        self.with_conn(|conn| {
            conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
            Ok(())
        })
    }
}

fn init_tables(conn: &Connection) -> Result<(), DbError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL UNIQUE,
            email TEXT NOT NULL UNIQUE
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS clips (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            external_id TEXT NOT NULL UNIQUE,
            source TEXT NOT NULL DEFAULT 'twitch',
            url TEXT NOT NULL,
            embed_url TEXT,
            edit_url TEXT,
            broadcaster_login TEXT NOT NULL,
            creator_login TEXT,
            created_by_user_id TEXT,
            title TEXT,
            duration INTEGER,
            view_count INTEGER NOT NULL DEFAULT 0,
            thumbnail_url TEXT,
            extra TEXT NOT NULL DEFAULT '{}',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_clips_broadcaster ON clips(broadcaster_login)",
        [],
    )?;

    Ok(())
}
