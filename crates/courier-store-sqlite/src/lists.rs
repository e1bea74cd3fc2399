//! [`DistributionListStore`] impl over `distribution_lists` and
//! `distribution_list_members`.

use chrono::Utc;
use courier_core::{
  change::DatabaseChange,
  distribution::{
    DistributionListPrivacyMode, DistributionListRecord, NewDistributionList, StoryType,
  },
  ids::{DistributionId, DistributionListId, RecipientId},
  store::DistributionListStore,
};
use rusqlite::OptionalExtension as _;

use crate::{
  Error, Result, SqliteStore,
  encode::{LIST_COLUMNS, RawList, encode_privacy_mode, encode_uuid},
  recipients::story_eligible_contacts,
};

/// Which live lists to load.
enum ListFilter {
  Id(i64),
  DistributionId(String),
  All,
}

/// A list row together with the rows its audience is resolved from, all
/// read in one transaction.
struct ListSnapshot {
  raw:         RawList,
  raw_members: Vec<i64>,
  /// Story-eligible contacts; left empty for `ONLY_WITH` lists.
  eligible:    Vec<i64>,
}

impl ListSnapshot {
  fn read(conn: &rusqlite::Connection, raw: RawList) -> rusqlite::Result<Self> {
    let raw_members = {
      let mut stmt = conn.prepare(
        "SELECT recipient_id FROM distribution_list_members
         WHERE list_id = ?1 AND privacy_mode = ?2
         ORDER BY id",
      )?;
      stmt
        .query_map(rusqlite::params![raw.id, raw.privacy_mode], |r| r.get(0))?
        .collect::<rusqlite::Result<Vec<i64>>>()?
    };

    let eligible = if raw.privacy_mode == DistributionListPrivacyMode::OnlyWith.as_ref() {
      Vec::new()
    } else {
      story_eligible_contacts(conn)?
    };

    Ok(Self { raw, raw_members, eligible })
  }

  /// Resolve the audience against the privacy mode.
  ///
  /// `OnlyWith` is exactly the stored rows; `All` and `AllExcept` start from
  /// every story-eligible contact.
  fn into_record(self) -> Result<DistributionListRecord> {
    let privacy_mode = self.raw.privacy_mode()?;
    let raw_members: Vec<RecipientId> =
      self.raw_members.into_iter().map(RecipientId::from_raw).collect();
    let eligible = self.eligible.into_iter().map(RecipientId::from_raw);

    let members = match privacy_mode {
      DistributionListPrivacyMode::OnlyWith => raw_members.clone(),
      DistributionListPrivacyMode::AllExcept => {
        eligible.filter(|id| !raw_members.contains(id)).collect()
      }
      DistributionListPrivacyMode::All => eligible.collect(),
    };
    self.raw.into_record(raw_members, members)
  }
}

impl SqliteStore {
  async fn read_lists(&self, filter: ListFilter) -> Result<Vec<ListSnapshot>> {
    let snapshots = self
      .conn
      .call(move |conn| {
        let (clause, params): (&str, Vec<rusqlite::types::Value>) = match filter {
          ListFilter::Id(id) => ("AND id = ?1", vec![id.into()]),
          ListFilter::DistributionId(distribution_id) => {
            ("AND distribution_id = ?1", vec![distribution_id.into()])
          }
          ListFilter::All => ("", Vec::new()),
        };

        let tx = conn.transaction()?;
        let raws = {
          let mut stmt = tx.prepare(&format!(
            "SELECT {LIST_COLUMNS} FROM distribution_lists
             WHERE deletion_timestamp = 0 {clause} ORDER BY id"
          ))?;
          stmt
            .query_map(rusqlite::params_from_iter(params), RawList::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };
        let snapshots = raws
          .into_iter()
          .map(|raw| ListSnapshot::read(&tx, raw))
          .collect::<rusqlite::Result<Vec<_>>>()?;
        tx.commit()?;
        Ok(snapshots)
      })
      .await?;
    Ok(snapshots)
  }

  async fn read_list(&self, filter: ListFilter) -> Result<Option<DistributionListRecord>> {
    self
      .read_lists(filter)
      .await?
      .into_iter()
      .next()
      .map(ListSnapshot::into_record)
      .transpose()
  }
}

impl DistributionListStore for SqliteStore {
  async fn create_list(
    &self,
    name: String,
    members: Vec<RecipientId>,
  ) -> Result<Option<DistributionListId>> {
    self.create_list_with(NewDistributionList::new(name, members)).await
  }

  async fn create_list_with(
    &self,
    list: NewDistributionList,
  ) -> Result<Option<DistributionListId>> {
    let name_str     = list.name.clone();
    let dist_id_str  = encode_uuid(list.distribution_id.as_uuid());
    let mode_str     = encode_privacy_mode(list.privacy_mode);
    let allows       = list.allows_replies;
    let is_unknown   = list.is_unknown;
    let member_ids: Vec<i64> = list.members.iter().map(|m| m.to_raw()).collect();

    let created: Option<i64> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        // The partial unique index on live names turns a conflict into a
        // no-op insert.
        let inserted = tx.execute(
          "INSERT OR IGNORE INTO distribution_lists
             (name, distribution_id, allows_replies, is_unknown, privacy_mode)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![
            name_str,
            dist_id_str,
            allows,
            is_unknown,
            mode_str,
          ],
        )?;
        if inserted == 0 {
          return Ok(None);
        }
        let list_id = tx.last_insert_rowid();

        tx.execute(
          "INSERT OR IGNORE INTO recipients (kind, distribution_list_id)
           VALUES ('distribution_list', ?1)",
          rusqlite::params![list_id],
        )?;
        tx.execute(
          "UPDATE distribution_lists
           SET recipient_id = (SELECT id FROM recipients WHERE distribution_list_id = ?1)
           WHERE id = ?1",
          rusqlite::params![list_id],
        )?;

        {
          let mut stmt = tx.prepare(
            "INSERT OR IGNORE INTO distribution_list_members (list_id, recipient_id, privacy_mode)
             VALUES (?1, ?2, ?3)",
          )?;
          for member in &member_ids {
            stmt.execute(rusqlite::params![list_id, member, mode_str])?;
          }
        }

        tx.commit()?;
        Ok(Some(list_id))
      })
      .await?;

    match created {
      Some(raw_id) => {
        let id = DistributionListId::from_raw(raw_id);
        tracing::info!(list = %id, members = list.members.len(), "created distribution list");
        self.notify(DatabaseChange::DistributionList(id));
        Ok(Some(id))
      }
      None => {
        tracing::warn!(name = %list.name, "distribution list name already in use");
        Ok(None)
      }
    }
  }

  async fn get_list(&self, id: DistributionListId) -> Result<Option<DistributionListRecord>> {
    self.read_list(ListFilter::Id(id.to_raw())).await
  }

  async fn get_list_by_distribution_id(
    &self,
    distribution_id: DistributionId,
  ) -> Result<Option<DistributionListRecord>> {
    let filter = ListFilter::DistributionId(encode_uuid(distribution_id.as_uuid()));
    self.read_list(filter).await
  }

  async fn get_all_lists(&self) -> Result<Vec<DistributionListRecord>> {
    self
      .read_lists(ListFilter::All)
      .await?
      .into_iter()
      .map(ListSnapshot::into_record)
      .collect()
  }

  async fn get_members(&self, id: DistributionListId) -> Result<Vec<RecipientId>> {
    Ok(
      self
        .read_list(ListFilter::Id(id.to_raw()))
        .await?
        .map(|record| record.members)
        .unwrap_or_default(),
    )
  }

  async fn get_raw_members(
    &self,
    id: DistributionListId,
    privacy_mode: DistributionListPrivacyMode,
  ) -> Result<Vec<RecipientId>> {
    let list_id  = id.to_raw();
    let mode_str = encode_privacy_mode(privacy_mode);

    let ids: Vec<i64> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT recipient_id FROM distribution_list_members
           WHERE list_id = ?1 AND privacy_mode = ?2
           ORDER BY id",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![list_id, mode_str], |r| r.get(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(ids.into_iter().map(RecipientId::from_raw).collect())
  }

  async fn get_story_type(&self, id: DistributionListId) -> Result<StoryType> {
    let list_id = id.to_raw();
    let allows_replies: Option<bool> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT allows_replies FROM distribution_lists
             WHERE id = ?1 AND deletion_timestamp = 0",
            rusqlite::params![list_id],
            |r| r.get(0),
          )
          .optional()?)
      })
      .await?;

    allows_replies
      .map(StoryType::for_replies)
      .ok_or(Error::StoryTypeMissing(id))
  }

  async fn set_allows_replies(&self, id: DistributionListId, allows_replies: bool) -> Result<()> {
    let list_id = id.to_raw();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE distribution_lists SET allows_replies = ?2 WHERE id = ?1",
          rusqlite::params![list_id, allows_replies],
        )?;
        Ok(())
      })
      .await?;

    self.notify(DatabaseChange::DistributionList(id));
    Ok(())
  }

  async fn set_name(&self, id: DistributionListId, name: String) -> Result<bool> {
    let list_id = id.to_raw();
    let updated = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE OR IGNORE distribution_lists SET name = ?2
           WHERE id = ?1 AND deletion_timestamp = 0",
          rusqlite::params![list_id, name],
        )?)
      })
      .await?;

    if updated > 0 {
      self.notify(DatabaseChange::DistributionList(id));
    }
    Ok(updated > 0)
  }

  async fn set_privacy_mode(
    &self,
    id: DistributionListId,
    privacy_mode: DistributionListPrivacyMode,
  ) -> Result<()> {
    let list_id  = id.to_raw();
    let mode_str = encode_privacy_mode(privacy_mode);
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE distribution_lists SET privacy_mode = ?2 WHERE id = ?1",
          rusqlite::params![list_id, mode_str],
        )?;
        Ok(())
      })
      .await?;

    self.notify(DatabaseChange::DistributionList(id));
    Ok(())
  }

  async fn add_member_to_list(
    &self,
    id: DistributionListId,
    privacy_mode: DistributionListPrivacyMode,
    member: RecipientId,
  ) -> Result<()> {
    let list_id   = id.to_raw();
    let mode_str  = encode_privacy_mode(privacy_mode);
    let member_id = member.to_raw();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT OR IGNORE INTO distribution_list_members (list_id, recipient_id, privacy_mode)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![list_id, member_id, mode_str],
        )?;
        Ok(())
      })
      .await?;

    self.notify(DatabaseChange::DistributionList(id));
    Ok(())
  }

  async fn remove_member_from_list(
    &self,
    id: DistributionListId,
    privacy_mode: DistributionListPrivacyMode,
    member: RecipientId,
  ) -> Result<()> {
    if privacy_mode == DistributionListPrivacyMode::AllExcept {
      return self.add_member_to_list(id, privacy_mode, member).await;
    }

    let list_id   = id.to_raw();
    let mode_str  = encode_privacy_mode(privacy_mode);
    let member_id = member.to_raw();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "DELETE FROM distribution_list_members
           WHERE list_id = ?1 AND recipient_id = ?2 AND privacy_mode = ?3",
          rusqlite::params![list_id, member_id, mode_str],
        )?;
        Ok(())
      })
      .await?;

    self.notify(DatabaseChange::DistributionList(id));
    Ok(())
  }

  async fn set_members(
    &self,
    id: DistributionListId,
    privacy_mode: DistributionListPrivacyMode,
    members: Vec<RecipientId>,
  ) -> Result<()> {
    let list_id    = id.to_raw();
    let mode_str   = encode_privacy_mode(privacy_mode);
    let member_ids: Vec<i64> = members.iter().map(|m| m.to_raw()).collect();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "DELETE FROM distribution_list_members WHERE list_id = ?1 AND privacy_mode = ?2",
          rusqlite::params![list_id, mode_str],
        )?;
        {
          let mut stmt = tx.prepare(
            "INSERT OR IGNORE INTO distribution_list_members (list_id, recipient_id, privacy_mode)
             VALUES (?1, ?2, ?3)",
          )?;
          for member in &member_ids {
            stmt.execute(rusqlite::params![list_id, member, mode_str])?;
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await?;

    self.notify(DatabaseChange::DistributionList(id));
    Ok(())
  }

  async fn delete_list(&self, id: DistributionListId) -> Result<()> {
    if id == DistributionListId::MY_STORY {
      return Err(Error::CannotDeleteMyStory);
    }

    let list_id = id.to_raw();
    let now     = Utc::now().timestamp_millis();

    let deleted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let deleted = tx.execute(
          "UPDATE distribution_lists SET deletion_timestamp = ?2
           WHERE id = ?1 AND deletion_timestamp = 0",
          rusqlite::params![list_id, now],
        )?;
        tx.execute(
          "DELETE FROM distribution_list_members WHERE list_id = ?1",
          rusqlite::params![list_id],
        )?;
        tx.commit()?;
        Ok(deleted)
      })
      .await?;

    if deleted > 0 {
      tracing::info!(list = %id, "deleted distribution list");
      self.notify(DatabaseChange::DistributionList(id));
    }
    Ok(())
  }

  async fn remap_recipient(&self, from: RecipientId, to: RecipientId) -> Result<()> {
    let from_id = from.to_raw();
    let to_id   = to.to_raw();

    let touched: Vec<i64> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let lists = {
          let mut stmt = tx.prepare(
            "SELECT DISTINCT list_id FROM distribution_list_members WHERE recipient_id = ?1",
          )?;
          stmt
            .query_map(rusqlite::params![from_id], |r| r.get(0))?
            .collect::<rusqlite::Result<Vec<i64>>>()?
        };
        // Rows that would duplicate an existing `to` row are skipped by the
        // update and then dropped.
        tx.execute(
          "UPDATE OR IGNORE distribution_list_members SET recipient_id = ?2
           WHERE recipient_id = ?1",
          rusqlite::params![from_id, to_id],
        )?;
        tx.execute(
          "DELETE FROM distribution_list_members WHERE recipient_id = ?1",
          rusqlite::params![from_id],
        )?;
        tx.commit()?;
        Ok(lists)
      })
      .await?;

    for list_id in touched {
      self.notify(DatabaseChange::DistributionList(DistributionListId::from_raw(list_id)));
    }
    Ok(())
  }
}
