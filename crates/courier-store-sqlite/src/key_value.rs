//! [`KeyValueStore`] impl over the `key_value` table.

use courier_core::{change::DatabaseChange, store::KeyValueStore};
use rusqlite::OptionalExtension as _;

use crate::{Result, SqliteStore};

impl KeyValueStore for SqliteStore {
  async fn get_value(&self, key: String) -> Result<Option<String>> {
    let value: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT value FROM key_value WHERE key = ?1",
            rusqlite::params![key],
            |r| r.get(0),
          )
          .optional()?)
      })
      .await?;
    Ok(value)
  }

  async fn put_value(&self, key: String, value: String) -> Result<()> {
    let key_for_db = key.clone();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO key_value (key, value) VALUES (?1, ?2)
           ON CONFLICT (key) DO UPDATE SET value = excluded.value",
          rusqlite::params![key_for_db, value],
        )?;
        Ok(())
      })
      .await?;

    self.notify(DatabaseChange::KeyValue(key));
    Ok(())
  }

  async fn remove_value(&self, key: String) -> Result<()> {
    let key_for_db = key.clone();
    self
      .conn
      .call(move |conn| {
        conn.execute("DELETE FROM key_value WHERE key = ?1", rusqlite::params![key_for_db])?;
        Ok(())
      })
      .await?;

    self.notify(DatabaseChange::KeyValue(key));
    Ok(())
  }
}
