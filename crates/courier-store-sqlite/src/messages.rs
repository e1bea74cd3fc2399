//! [`MessageStore`] impl over `threads`, `messages` and `attachments`.

use chrono::Utc;
use courier_core::{
  change::DatabaseChange,
  ids::{MessageId, RecipientId, ThreadId},
  message::{AttachmentRecord, MessageRecord, OutgoingMessage, types},
  store::MessageStore,
};
use rusqlite::OptionalExtension as _;

use crate::{
  Error, Result, SqliteStore,
  encode::{
    ATTACHMENT_COLUMNS, MESSAGE_COLUMNS, RawAttachment, RawMessage, encode_body_ranges,
  },
};

/// Longest thread snippet kept, in chars.
const SNIPPET_LENGTH: usize = 128;

/// The row an edit is stacked onto.
struct EditTarget {
  id:                  i64,
  original_message_id: Option<i64>,
  revision_number:     u32,
}

fn insert_attachments(
  tx: &rusqlite::Transaction<'_>,
  message_id: i64,
  attachments: &[RawAttachment],
) -> rusqlite::Result<()> {
  let mut stmt = tx.prepare(
    "INSERT INTO attachments
       (message_id, content_type, remote_key, remote_location, remote_digest, size,
        file_name, width, height, caption, transfer_state, unique_id, transfer_file)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
  )?;
  for a in attachments {
    stmt.execute(rusqlite::params![
      message_id,
      a.content_type,
      a.remote_key,
      a.remote_location,
      a.remote_digest,
      a.size,
      a.file_name,
      a.width,
      a.height,
      a.caption,
      a.transfer_state,
      a.unique_id,
      a.transfer_file,
    ])?;
  }
  Ok(())
}

impl SqliteStore {
  async fn query_message(
    &self,
    sql: String,
    params: Vec<i64>,
  ) -> Result<Option<MessageRecord>> {
    let raw: Option<RawMessage> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(&sql, rusqlite::params_from_iter(params), RawMessage::from_row)
          .optional()?)
      })
      .await?;

    raw.map(RawMessage::into_message).transpose()
  }
}

impl MessageStore for SqliteStore {
  async fn get_or_create_thread_id_for(&self, recipient: RecipientId) -> Result<ThreadId> {
    let recipient_id = recipient.to_raw();
    let (id, created): (i64, bool) = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let created = tx.execute(
          "INSERT OR IGNORE INTO threads (recipient_id) VALUES (?1)",
          rusqlite::params![recipient_id],
        )?;
        let id = tx.query_row(
          "SELECT id FROM threads WHERE recipient_id = ?1",
          rusqlite::params![recipient_id],
          |r| r.get(0),
        )?;
        tx.commit()?;
        Ok((id, created > 0))
      })
      .await?;

    let id = ThreadId::from_raw(id);
    if created {
      tracing::debug!(thread = %id, %recipient, "created thread");
      self.notify(DatabaseChange::Thread(id));
    }
    Ok(id)
  }

  async fn get_thread_id_for(&self, recipient: RecipientId) -> Result<Option<ThreadId>> {
    let recipient_id = recipient.to_raw();
    let id: Option<i64> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT id FROM threads WHERE recipient_id = ?1",
            rusqlite::params![recipient_id],
            |r| r.get(0),
          )
          .optional()?)
      })
      .await?;
    Ok(id.map(ThreadId::from_raw))
  }

  async fn insert_message_outbox(
    &self,
    message: OutgoingMessage,
    thread_id: ThreadId,
  ) -> Result<MessageId> {
    let author       = self.self_recipient_id().await?.to_raw();
    let received     = Utc::now().timestamp_millis();
    let body_ranges  = encode_body_ranges(&message.body_ranges)?;
    let attachments: Vec<RawAttachment> =
      message.attachments.iter().map(RawAttachment::for_insert).collect();
    let message_type = message.outbox_type();
    let raw_thread   = thread_id.to_raw();
    let edit_of      = message.message_to_edit.map(MessageId::to_raw);
    let snippet: String = message.body.chars().take(SNIPPET_LENGTH).collect();

    let row = message.clone();
    let inserted: std::result::Result<i64, i64> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let target = match edit_of {
          Some(target_id) => {
            let target = tx
              .query_row(
                "SELECT id, original_message_id, revision_number FROM messages WHERE id = ?1",
                rusqlite::params![target_id],
                |r| {
                  Ok(EditTarget {
                    id:                  r.get(0)?,
                    original_message_id: r.get(1)?,
                    revision_number:     r.get(2)?,
                  })
                },
              )
              .optional()?;
            match target {
              Some(target) => Some(target),
              None => return Ok(Err(target_id)),
            }
          }
          None => None,
        };

        let (original_message_id, revision_number) = match &target {
          Some(t) => (Some(t.original_message_id.unwrap_or(t.id)), t.revision_number + 1),
          None => (None, 0),
        };

        tx.execute(
          "INSERT INTO messages
             (date_sent, date_received, thread_id, from_recipient_id, to_recipient_id, type,
              body, body_ranges, read, expires_in, story_type, original_message_id,
              revision_number)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 1, ?9, ?10, ?11, ?12)",
          rusqlite::params![
            row.sent_time_millis,
            received,
            raw_thread,
            author,
            row.thread_recipient.to_raw(),
            message_type,
            row.body,
            body_ranges,
            row.expires_in,
            row.story_type.code(),
            original_message_id,
            revision_number,
          ],
        )?;
        let message_id = tx.last_insert_rowid();

        insert_attachments(&tx, message_id, &attachments)?;

        if let Some(target) = &target {
          // An edit without its own attachments keeps the target's.
          if attachments.is_empty() {
            tx.execute(
              "INSERT INTO attachments
                 (message_id, content_type, remote_key, remote_location, remote_digest, size,
                  file_name, width, height, caption, transfer_state, unique_id, transfer_file)
               SELECT ?1, content_type, remote_key, remote_location, remote_digest, size,
                      file_name, width, height, caption, transfer_state,
                      lower(hex(randomblob(16))), NULL
               FROM attachments WHERE message_id = ?2 ORDER BY id",
              rusqlite::params![message_id, target.id],
            )?;
          }

          let original = original_message_id.unwrap_or(target.id);
          tx.execute(
            "UPDATE messages SET latest_revision_id = ?1
             WHERE (id = ?2 OR original_message_id = ?2) AND id != ?1",
            rusqlite::params![message_id, original],
          )?;
        }

        tx.execute(
          "UPDATE threads
           SET date = ?2, snippet = ?3, message_count = message_count + ?4
           WHERE id = ?1",
          rusqlite::params![
            raw_thread,
            row.sent_time_millis,
            snippet,
            i64::from(target.is_none()),
          ],
        )?;

        tx.commit()?;
        Ok(Ok(message_id))
      })
      .await?;

    let message_id = inserted
      .map(MessageId::from_raw)
      .map_err(|target_id| Error::MessageNotFound(MessageId::from_raw(target_id)))?;
    tracing::debug!(
      %message_id,
      %thread_id,
      message_type = %types::describe(message_type),
      edit = message.message_to_edit.is_some(),
      "inserted outgoing message"
    );
    self.notify(DatabaseChange::Message { thread_id, message_id });
    Ok(message_id)
  }

  async fn mark_as_sent(&self, id: MessageId, secure: bool) -> Result<()> {
    let raw_id = id.to_raw();
    let mut sent_type = types::BASE_SENT_TYPE;
    if secure {
      sent_type |= types::SECURE_MESSAGE_BIT | types::PUSH_MESSAGE_BIT;
    }

    let thread: Option<i64> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "UPDATE messages SET type = (type & ?2) | ?3 WHERE id = ?1 RETURNING thread_id",
            rusqlite::params![raw_id, !types::BASE_TYPE_MASK, sent_type],
            |r| r.get(0),
          )
          .optional()?)
      })
      .await?;

    let thread_id = thread.map(ThreadId::from_raw).ok_or(Error::MessageNotFound(id))?;
    self.notify(DatabaseChange::Message { thread_id, message_id: id });
    Ok(())
  }

  async fn mark_expire_started(&self, id: MessageId, started_at: i64) -> Result<()> {
    let raw_id = id.to_raw();
    // Only ever moves the start earlier.
    let thread: Option<i64> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "UPDATE messages SET expire_started = ?2
             WHERE id = ?1 AND (expire_started = 0 OR expire_started > ?2)
             RETURNING thread_id",
            rusqlite::params![raw_id, started_at],
            |r| r.get(0),
          )
          .optional()?)
      })
      .await?;

    if let Some(thread_id) = thread {
      let thread_id = ThreadId::from_raw(thread_id);
      self.notify(DatabaseChange::Message { thread_id, message_id: id });
    }
    Ok(())
  }

  async fn get_message(&self, id: MessageId) -> Result<Option<MessageRecord>> {
    self
      .query_message(
        format!("SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = ?1"),
        vec![id.to_raw()],
      )
      .await
  }

  async fn get_message_for(
    &self,
    sent_timestamp: i64,
    author: RecipientId,
  ) -> Result<Option<MessageRecord>> {
    self
      .query_message(
        format!(
          "SELECT {MESSAGE_COLUMNS} FROM messages
           WHERE date_sent = ?1 AND from_recipient_id = ?2
           ORDER BY id LIMIT 1"
        ),
        vec![sent_timestamp, author.to_raw()],
      )
      .await
  }

  async fn get_attachments(&self, id: MessageId) -> Result<Vec<AttachmentRecord>> {
    let raw_id = id.to_raw();
    let raws: Vec<RawAttachment> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {ATTACHMENT_COLUMNS} FROM attachments WHERE message_id = ?1 ORDER BY id"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![raw_id], RawAttachment::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAttachment::into_attachment).collect()
  }

  async fn get_all_stories_for(&self, recipient: RecipientId) -> Result<Vec<MessageRecord>> {
    let recipient_id = recipient.to_raw();
    let raws: Vec<RawMessage> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {MESSAGE_COLUMNS} FROM messages
           WHERE to_recipient_id = ?1 AND story_type > 0
           ORDER BY date_sent DESC, id DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![recipient_id], RawMessage::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawMessage::into_message).collect()
  }

  async fn delete_all_conversations(&self) -> Result<()> {
    let threads = self
      .conn
      .call(|conn| {
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM attachments", [])?;
        tx.execute("DELETE FROM messages", [])?;
        let threads = tx.execute("DELETE FROM threads", [])?;
        tx.commit()?;
        Ok(threads)
      })
      .await?;

    tracing::info!(threads, "deleted all conversations");
    self.notify(DatabaseChange::AllConversations);
    Ok(())
  }
}
