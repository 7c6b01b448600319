//! Store handle and connection management.
//!
//! [`Store`] owns a [`rusqlite::Connection`] behind a mutex plus the
//! broadcast bus that drives live watchers.  Cloning the handle is cheap;
//! all clones share the same connection and bus.  Migrations run before any
//! other operation.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use directories::ProjectDirs;
use rusqlite::Connection;
use tokio::sync::broadcast;

use trouvaille_shared::ChatId;

use crate::error::{Result, StoreError};
use crate::migrations;

/// Change notification published after every successful write.
///
/// Watchers re-run their query when a relevant event arrives; the events
/// carry no row data, so a lagging subscriber only ever misses wake-ups it
/// can recover from by re-querying.
#[derive(Debug, Clone)]
pub enum StoreEvent {
    /// An item was created.
    ItemsChanged,
    /// A chat was created, its summary merged, or its seen markers changed.
    ChatChanged(ChatId),
    /// A message was appended to the chat.
    MessageAppended(ChatId),
}

/// Shared handle to the document store.
#[derive(Clone)]
pub struct Store {
    inner: Arc<Inner>,
}

struct Inner {
    conn: Mutex<Connection>,
    events: broadcast::Sender<StoreEvent>,
}

const EVENT_BUS_CAPACITY: usize = 256;

impl Store {
    /// Open (or create) the default application database.
    ///
    /// The database file is placed in the platform-appropriate data
    /// directory:
    /// - Linux:   `~/.local/share/trouvaille/trouvaille.db`
    /// - macOS:   `~/Library/Application Support/com.trouvaille.trouvaille/trouvaille.db`
    /// - Windows: `{FOLDERID_RoamingAppData}\trouvaille\trouvaille\data\trouvaille.db`
    pub fn open() -> Result<Self> {
        let project_dirs =
            ProjectDirs::from("com", "trouvaille", "trouvaille").ok_or(StoreError::NoDataDir)?;

        let data_dir = project_dirs.data_dir();
        std::fs::create_dir_all(data_dir)?;

        let db_path = data_dir.join("trouvaille.db");

        tracing::info!(path = %db_path.display(), "opening database");

        Self::open_at(&db_path)
    }

    /// Open (or create) a database at an explicit path.
    ///
    /// Useful for tests and for embedding the store inside custom directory
    /// layouts.
    pub fn open_at(path: &Path) -> Result<Self> {
        Self::from_connection(Connection::open(path)?)
    }

    /// Open an in-memory database. Every call yields an independent store.
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        // Recommended SQLite settings.
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        // Run schema migrations.
        migrations::run_migrations(&conn)?;

        let (events, _) = broadcast::channel(EVENT_BUS_CAPACITY);

        Ok(Self {
            inner: Arc::new(Inner {
                conn: Mutex::new(conn),
                events,
            }),
        })
    }

    /// Run a closure against the locked connection.
    pub(crate) fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let guard = self.inner.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
        f(&guard)
    }

    /// Like [`Store::with_conn`] but with a mutable borrow, for
    /// transactions.
    pub(crate) fn with_conn_mut<T>(
        &self,
        f: impl FnOnce(&mut Connection) -> Result<T>,
    ) -> Result<T> {
        let mut guard = self.inner.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
        f(&mut guard)
    }

    /// Publish a change notification. A send error only means no watcher is
    /// currently subscribed.
    pub(crate) fn emit(&self, event: StoreEvent) {
        let _ = self.inner.events.send(event);
    }

    /// Subscribe to the raw change feed. Most callers want the typed
    /// watchers in [`crate::watch`] instead.
    pub fn subscribe_events(&self) -> broadcast::Receiver<StoreEvent> {
        self.inner.events.subscribe()
    }

    /// Return the filesystem path of the open database (if any).
    pub fn path(&self) -> Option<PathBuf> {
        let guard = self.inner.conn.lock().ok()?;
        guard.path().map(PathBuf::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");

        let store = Store::open_at(&path).expect("should open");
        assert!(store.path().is_some());
    }

    #[test]
    fn in_memory_open_succeeds() {
        Store::open_in_memory().expect("should open");
    }
}
