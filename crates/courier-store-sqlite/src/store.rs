//! [`SqliteStore`], the SQLite implementation of the `courier-core` store
//! traits. The trait impls live in sibling modules, one per table group.

use std::path::Path;

use courier_core::{change::DatabaseChange, ids::RecipientId, store::Store};
use rusqlite::OptionalExtension as _;
use tokio::sync::broadcast;

use crate::{Error, Result, schema::SCHEMA};

/// Capacity of the change channel. Slow listeners that fall further behind
/// see a lag notice and should re-read.
const CHANGE_CHANNEL_CAPACITY: usize = 256;

/// Receives [`DatabaseChange`]s after writes commit. Dropping it unregisters.
pub type ChangeListener = broadcast::Receiver<DatabaseChange>;

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Courier store backed by a single SQLite file.
///
/// Clones share the connection and change channel.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
  changes:         broadcast::Sender<DatabaseChange>,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    tracing::info!(path = %path.as_ref().display(), "opening store");
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::init(conn).await
  }

  /// Open an in-memory store, mostly for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::init(conn).await
  }

  async fn init(conn: tokio_rusqlite::Connection) -> Result<Self> {
    let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
    let store = Self { conn, changes };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    let version: u32 = self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(conn.pragma_query_value(None, "user_version", |row| row.get(0))?)
      })
      .await?;
    tracing::debug!(version, "schema ready");
    Ok(())
  }

  // ── Change notification ───────────────────────────────────────────────────

  /// Register a listener for subsequent changes.
  pub fn changes(&self) -> ChangeListener { self.changes.subscribe() }

  /// Number of registered listeners.
  pub fn listener_count(&self) -> usize { self.changes.receiver_count() }

  pub(crate) fn notify(&self, change: DatabaseChange) {
    // No listeners is the common case, not an error.
    self.changes.send(change).ok();
  }

  // ── Shared lookups ────────────────────────────────────────────────────────

  /// The recipient marked as the local account.
  pub(crate) async fn self_recipient_id(&self) -> Result<RecipientId> {
    let id: Option<i64> = self
      .conn
      .call(|conn| {
        Ok(conn
          .query_row("SELECT id FROM recipients WHERE is_self = 1", [], |r| r.get(0))
          .optional()?)
      })
      .await?;

    id.map(RecipientId::from_raw).ok_or(Error::NoSelfRecipient)
  }
}

impl Store for SqliteStore {
  type Error = Error;
}
