//! Live queries over the store.
//!
//! An [`Observation`] owns a background task that re-reads its query
//! whenever a matching [`DatabaseChange`] is published and forwards the
//! result. Cancelling (or dropping) the observation stops the task and
//! unregisters its change listener.

use courier_core::{
  change::DatabaseChange,
  distribution::DistributionListRecord,
  ids::DistributionListId,
  store::DistributionListStore,
};
use tokio::{
  sync::{broadcast::error::RecvError, mpsc},
  task::JoinHandle,
};

use crate::SqliteStore;

/// Pending updates buffered per observation before the task waits.
const UPDATE_BUFFER: usize = 16;

/// A stream of values produced by a live query.
pub struct Observation<T> {
  updates: mpsc::Receiver<T>,
  task:    JoinHandle<()>,
}

impl<T> Observation<T> {
  /// The next value. The first call yields the current state.
  ///
  /// Returns `None` once the observation has stopped.
  pub async fn next(&mut self) -> Option<T> { self.updates.recv().await }

  /// Stop observing and wait for the background task to exit.
  pub async fn cancel(mut self) {
    self.task.abort();
    // The task only ever ends by finishing or being aborted.
    let _ = (&mut self.task).await;
  }
}

impl<T> Drop for Observation<T> {
  fn drop(&mut self) { self.task.abort(); }
}

impl SqliteStore {
  /// Observe a single distribution list. Yields `None` while the list is
  /// missing or deleted.
  pub fn observe_list(
    &self,
    id: DistributionListId,
  ) -> Observation<Option<DistributionListRecord>> {
    let (tx, updates) = mpsc::channel(UPDATE_BUFFER);
    // Subscribe before the first read so no change slips between the two.
    let mut changes = self.changes();
    let store = self.clone();

    let task = tokio::spawn(async move {
      let mut dirty = true;
      loop {
        if dirty {
          match store.get_list(id).await {
            Ok(record) => {
              if tx.send(record).await.is_err() {
                break;
              }
            }
            Err(err) => tracing::warn!(list = %id, %err, "failed to read observed list"),
          }
        }

        dirty = match changes.recv().await {
          Ok(DatabaseChange::DistributionList(changed)) => changed == id,
          // Membership resolution depends on recipient rows.
          Ok(DatabaseChange::Recipient(_)) => true,
          Ok(_) => false,
          Err(RecvError::Lagged(skipped)) => {
            tracing::debug!(list = %id, skipped, "observer lagged; re-reading");
            true
          }
          Err(RecvError::Closed) => break,
        };
      }
    });

    Observation { updates, task }
  }
}
