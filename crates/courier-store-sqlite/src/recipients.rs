//! [`RecipientStore`] impl over the `recipients` table.

use courier_core::{
  change::DatabaseChange,
  ids::{DistributionListId, GroupId, RecipientId, ServiceId},
  recipient::{Recipient, RecipientKind},
  store::RecipientStore,
};
use rusqlite::OptionalExtension as _;

use crate::{
  Result, SqliteStore,
  encode::{RECIPIENT_COLUMNS, RawRecipient, encode_recipient_kind, encode_uuid},
};

/// Individuals that count towards "everyone" audiences, ascending by id.
pub(crate) fn story_eligible_contacts(conn: &rusqlite::Connection) -> rusqlite::Result<Vec<i64>> {
  let mut stmt = conn.prepare(
    "SELECT id FROM recipients
     WHERE kind = 'individual'
       AND service_id IS NOT NULL
       AND story_eligible = 1
       AND blocked = 0
       AND is_self = 0
     ORDER BY id",
  )?;
  stmt
    .query_map([], |r| r.get(0))?
    .collect::<rusqlite::Result<Vec<_>>>()
}

impl SqliteStore {
  /// Insert a recipient keyed on one unique column, or return the existing
  /// row's id.
  async fn get_or_insert_by(
    &self,
    kind: RecipientKind,
    column: &'static str,
    value: rusqlite::types::Value,
  ) -> Result<RecipientId> {
    let kind_str = encode_recipient_kind(kind);
    let (id, inserted): (i64, bool) = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let inserted = tx.execute(
          &format!("INSERT OR IGNORE INTO recipients (kind, {column}) VALUES (?1, ?2)"),
          rusqlite::params![kind_str, value],
        )?;
        let id = tx.query_row(
          &format!("SELECT id FROM recipients WHERE {column} = ?1"),
          rusqlite::params![value],
          |r| r.get(0),
        )?;
        tx.commit()?;
        Ok((id, inserted > 0))
      })
      .await?;

    let id = RecipientId::from_raw(id);
    if inserted {
      tracing::debug!(recipient = %id, %kind, "inserted recipient");
      self.notify(DatabaseChange::Recipient(id));
    }
    Ok(id)
  }

  /// Update a single column on a recipient row and notify on change.
  async fn update_recipient(
    &self,
    id: RecipientId,
    column: &'static str,
    value: rusqlite::types::Value,
  ) -> Result<()> {
    let raw_id = id.to_raw();
    let updated = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          &format!("UPDATE recipients SET {column} = ?2 WHERE id = ?1"),
          rusqlite::params![raw_id, value],
        )?)
      })
      .await?;

    if updated > 0 {
      self.notify(DatabaseChange::Recipient(id));
    }
    Ok(())
  }
}

impl RecipientStore for SqliteStore {
  async fn get_or_insert_from_service_id(&self, service_id: ServiceId) -> Result<RecipientId> {
    let value = encode_uuid(service_id.as_uuid()).into();
    self
      .get_or_insert_by(RecipientKind::Individual, "service_id", value)
      .await
  }

  async fn get_or_insert_from_group_id(&self, group_id: GroupId) -> Result<RecipientId> {
    let value = group_id.as_str().to_owned().into();
    self.get_or_insert_by(RecipientKind::Group, "group_id", value).await
  }

  async fn get_or_insert_from_distribution_list_id(
    &self,
    id: DistributionListId,
  ) -> Result<RecipientId> {
    let value = id.to_raw().into();
    self
      .get_or_insert_by(RecipientKind::DistributionList, "distribution_list_id", value)
      .await
  }

  async fn get_recipient(&self, id: RecipientId) -> Result<Option<Recipient>> {
    let raw_id = id.to_raw();
    let raw: Option<RawRecipient> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {RECIPIENT_COLUMNS} FROM recipients WHERE id = ?1"),
            rusqlite::params![raw_id],
            RawRecipient::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawRecipient::into_recipient).transpose()
  }

  async fn set_expire_messages(&self, id: RecipientId, seconds: u32) -> Result<()> {
    self
      .update_recipient(id, "expire_messages", i64::from(seconds).into())
      .await
  }

  async fn set_blocked(&self, id: RecipientId, blocked: bool) -> Result<()> {
    self.update_recipient(id, "blocked", i64::from(blocked).into()).await
  }

  async fn set_story_eligible(&self, id: RecipientId, eligible: bool) -> Result<()> {
    self
      .update_recipient(id, "story_eligible", i64::from(eligible).into())
      .await
  }

  async fn mark_self(&self, id: RecipientId) -> Result<()> {
    let raw_id = id.to_raw();
    let previous: Option<i64> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let previous = tx
          .query_row(
            "SELECT id FROM recipients WHERE is_self = 1 AND id != ?1",
            rusqlite::params![raw_id],
            |r| r.get(0),
          )
          .optional()?;
        tx.execute("UPDATE recipients SET is_self = 0 WHERE is_self = 1", [])?;
        tx.execute(
          "UPDATE recipients SET is_self = 1 WHERE id = ?1",
          rusqlite::params![raw_id],
        )?;
        tx.commit()?;
        Ok(previous)
      })
      .await?;

    if let Some(previous) = previous {
      tracing::info!(from = previous, to = %id, "self recipient changed");
      self.notify(DatabaseChange::Recipient(RecipientId::from_raw(previous)));
    }
    self.notify(DatabaseChange::Recipient(id));
    Ok(())
  }

  async fn get_story_eligible_contacts(&self) -> Result<Vec<RecipientId>> {
    let ids = self.conn.call(|conn| Ok(story_eligible_contacts(conn)?)).await?;
    Ok(ids.into_iter().map(RecipientId::from_raw).collect())
  }
}
