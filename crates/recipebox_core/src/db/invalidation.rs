//! Table-level change tracking for reactive reads.
//!
//! # Responsibility
//! - Record which application tables a transaction touched.
//! - Publish per-table version counters once the transaction commits.
//! - Hand out owned [`ChangeObserver`] subscriptions to read layers.
//!
//! # Invariants
//! - Rolled-back writes are never published.
//! - Versions only grow; every commit that touches a table assigns it the
//!   next commit sequence number.
//! - Tables outside [`Table`] (FTS shadow tables, `sqlite_*`) are ignored.

use log::debug;
use rusqlite::hooks::Action;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio::sync::watch::error::RecvError;

const TABLE_COUNT: usize = 5;

/// Application tables whose changes are observable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Table {
    Recipes,
    Ingredients,
    Steps,
    Collections,
    RecipeCollections,
}

impl Table {
    pub const ALL: [Table; TABLE_COUNT] = [
        Table::Recipes,
        Table::Ingredients,
        Table::Steps,
        Table::Collections,
        Table::RecipeCollections,
    ];

    /// SQL table name backing this variant.
    pub fn name(self) -> &'static str {
        match self {
            Self::Recipes => "recipes",
            Self::Ingredients => "ingredients",
            Self::Steps => "steps",
            Self::Collections => "collections",
            Self::RecipeCollections => "recipe_collection_cross_ref",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|table| table.name() == name)
    }

    fn bit(self) -> u8 {
        1 << self.index()
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Snapshot of the last commit sequence that touched each table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableVersions {
    sequence: u64,
    versions: [u64; TABLE_COUNT],
}

impl TableVersions {
    /// Highest version among the tables selected by `mask`.
    fn latest(&self, mask: u8) -> u64 {
        Table::ALL
            .into_iter()
            .filter(|table| mask & table.bit() != 0)
            .map(|table| self.versions[table.index()])
            .max()
            .unwrap_or(0)
    }

    fn bump(&mut self, mask: u8) {
        self.sequence += 1;
        for table in Table::ALL {
            if mask & table.bit() != 0 {
                self.versions[table.index()] = self.sequence;
            }
        }
    }

    pub fn version_of(&self, table: Table) -> u64 {
        self.versions[table.index()]
    }
}

struct Shared {
    pending: Mutex<u8>,
    versions: watch::Sender<TableVersions>,
}

impl Shared {
    fn mark(&self, table_name: &str) {
        if let Some(table) = Table::from_name(table_name) {
            if let Ok(mut pending) = self.pending.lock() {
                *pending |= table.bit();
            }
        }
    }

    fn publish(&self) {
        let mask = match self.pending.lock() {
            Ok(mut pending) => std::mem::take(&mut *pending),
            Err(_) => return,
        };
        if mask == 0 {
            return;
        }
        self.versions.send_modify(|versions| versions.bump(mask));
        debug!("event=db_invalidate module=db status=ok table_mask={mask:#07b}");
    }

    fn discard(&self) {
        if let Ok(mut pending) = self.pending.lock() {
            *pending = 0;
        }
    }
}

/// Connection-scoped publisher of committed table changes.
#[derive(Clone)]
pub struct InvalidationTracker {
    shared: Arc<Shared>,
}

impl InvalidationTracker {
    /// Installs update/commit/rollback hooks on `conn`.
    ///
    /// Replaces any hooks previously installed on the same connection.
    pub fn install(conn: &Connection) -> Self {
        let (versions, _) = watch::channel(TableVersions::default());
        let shared = Arc::new(Shared {
            pending: Mutex::new(0),
            versions,
        });

        let on_update = Arc::clone(&shared);
        conn.update_hook(Some(
            move |_action: Action, _db: &str, table: &str, _rowid: i64| {
                on_update.mark(table);
            },
        ));

        let on_commit = Arc::clone(&shared);
        conn.commit_hook(Some(move || {
            on_commit.publish();
            // Returning true would turn the commit into a rollback.
            false
        }));

        let on_rollback = Arc::clone(&shared);
        conn.rollback_hook(Some(move || on_rollback.discard()));

        Self { shared }
    }

    /// Subscribes to committed changes on `tables`.
    pub fn observe(&self, tables: &[Table]) -> ChangeObserver {
        let mask = tables.iter().fold(0u8, |mask, table| mask | table.bit());
        ChangeObserver {
            receiver: self.shared.versions.subscribe(),
            mask,
            seen: None,
        }
    }

    /// Current published versions.
    pub fn versions(&self) -> TableVersions {
        *self.shared.versions.borrow()
    }
}

/// Owned subscription to committed changes of a fixed table set.
///
/// The first poll always reports a change so that a freshly created reader
/// performs its initial load.
#[derive(Debug, Clone)]
pub struct ChangeObserver {
    receiver: watch::Receiver<TableVersions>,
    mask: u8,
    seen: Option<u64>,
}

impl ChangeObserver {
    /// Returns whether an observed table changed since the previous poll.
    pub fn poll_changed(&mut self) -> bool {
        let current = self.receiver.borrow_and_update().latest(self.mask);
        self.advance_to(current)
    }

    /// Waits until an observed table changes.
    ///
    /// # Errors
    /// - Returns [`RecvError`] once the owning database has been dropped.
    pub async fn changed(&mut self) -> Result<(), RecvError> {
        loop {
            let current = self.receiver.borrow_and_update().latest(self.mask);
            if self.advance_to(current) {
                return Ok(());
            }
            self.receiver.changed().await?;
        }
    }

    fn advance_to(&mut self, current: u64) -> bool {
        let changed = self.seen.map_or(true, |seen| current > seen);
        self.seen = Some(current);
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::{Table, TableVersions};

    #[test]
    fn table_names_roundtrip() {
        for table in Table::ALL {
            assert_eq!(Table::from_name(table.name()), Some(table));
        }
        assert_eq!(Table::from_name("recipes_fts_data"), None);
    }

    #[test]
    fn bump_assigns_same_sequence_to_all_touched_tables() {
        let mut versions = TableVersions::default();
        versions.bump(Table::Recipes.bit() | Table::Steps.bit());
        versions.bump(Table::Collections.bit());

        assert_eq!(versions.version_of(Table::Recipes), 1);
        assert_eq!(versions.version_of(Table::Steps), 1);
        assert_eq!(versions.version_of(Table::Collections), 2);
        assert_eq!(versions.version_of(Table::Ingredients), 0);
        assert_eq!(versions.latest(Table::Recipes.bit() | Table::Collections.bit()), 2);
    }
}
