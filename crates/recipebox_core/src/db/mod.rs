//! SQLite storage bootstrap, schema migrations and change tracking.
//!
//! # Responsibility
//! - Open and configure SQLite connections for RecipeBox core.
//! - Apply schema migrations in deterministic order.
//! - Publish committed table changes to observers.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - Core code must not read/write application data before migrations succeed.

use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod invalidation;
pub mod migrations;
mod open;

pub use invalidation::{ChangeObserver, InvalidationTracker, Table};
pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than supported {latest_supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

/// An open connection paired with its change tracker.
///
/// Repositories borrow a `Database` instead of a bare connection so that
/// every write they perform is visible to [`ChangeObserver`]s.
pub struct Database {
    conn: Connection,
    tracker: InvalidationTracker,
}

impl Database {
    /// Wraps an existing connection and installs change-tracking hooks.
    ///
    /// Does not run migrations. Use [`open_db`] for a ready-to-use database.
    pub fn attach(conn: Connection) -> Self {
        let tracker = InvalidationTracker::install(&conn);
        Self { conn, tracker }
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Subscribes to committed changes on the given tables.
    pub fn observe(&self, tables: &[Table]) -> ChangeObserver {
        self.tracker.observe(tables)
    }
}
