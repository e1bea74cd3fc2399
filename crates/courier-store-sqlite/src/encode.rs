//! Encoding and decoding helpers between Rust domain types and the plain
//! representations stored in SQLite columns.
//!
//! Ids are stored as integers, UUIDs as hyphenated lowercase strings, enums as
//! their `strum` names, body ranges as compact JSON.

use courier_core::{
  distribution::{DistributionListPrivacyMode, DistributionListRecord, StoryType},
  ids::{
    AttachmentId, DistributionId, DistributionListId, GroupId, MessageId, RecipientId,
    ServiceId, ThreadId,
  },
  message::{Attachment, AttachmentRecord, BodyRange, MessageRecord, TransferState},
  recipient::{Recipient, RecipientKind},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid-backed ids ─────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── Enums ───────────────────────────────────────────────────────────────────

pub fn encode_privacy_mode(mode: DistributionListPrivacyMode) -> String { mode.to_string() }

pub fn decode_privacy_mode(s: &str) -> Result<DistributionListPrivacyMode> {
  s.parse()
    .map_err(|_| Error::Decode(format!("unknown privacy mode: {s:?}")))
}

pub fn encode_recipient_kind(kind: RecipientKind) -> String { kind.to_string() }

pub fn decode_recipient_kind(s: &str) -> Result<RecipientKind> {
  s.parse()
    .map_err(|_| Error::Decode(format!("unknown recipient kind: {s:?}")))
}

pub fn encode_transfer_state(state: TransferState) -> String { state.to_string() }

pub fn decode_transfer_state(s: &str) -> Result<TransferState> {
  s.parse()
    .map_err(|_| Error::Decode(format!("unknown transfer state: {s:?}")))
}

// ─── Body ranges ─────────────────────────────────────────────────────────────

/// Empty range lists are stored as NULL.
pub fn encode_body_ranges(ranges: &[BodyRange]) -> Result<Option<String>> {
  if ranges.is_empty() {
    Ok(None)
  } else {
    Ok(Some(serde_json::to_string(ranges)?))
  }
}

pub fn decode_body_ranges(s: Option<&str>) -> Result<Vec<BodyRange>> {
  match s {
    Some(json) => Ok(serde_json::from_str(json)?),
    None => Ok(Vec::new()),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const LIST_COLUMNS: &str = "id, name, distribution_id, allows_replies, \
                                deletion_timestamp, is_unknown, privacy_mode";

/// Raw values read directly from a `distribution_lists` row.
pub struct RawList {
  pub id:                 i64,
  pub name:               String,
  pub distribution_id:    String,
  pub allows_replies:     bool,
  pub deletion_timestamp: i64,
  pub is_unknown:         bool,
  pub privacy_mode:       String,
}

impl RawList {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                 row.get(0)?,
      name:               row.get(1)?,
      distribution_id:    row.get(2)?,
      allows_replies:     row.get(3)?,
      deletion_timestamp: row.get(4)?,
      is_unknown:         row.get(5)?,
      privacy_mode:       row.get(6)?,
    })
  }

  pub fn privacy_mode(&self) -> Result<DistributionListPrivacyMode> {
    decode_privacy_mode(&self.privacy_mode)
  }

  /// Assemble the record once membership has been resolved.
  pub fn into_record(
    self,
    raw_members: Vec<RecipientId>,
    members: Vec<RecipientId>,
  ) -> Result<DistributionListRecord> {
    Ok(DistributionListRecord {
      id: DistributionListId::from_raw(self.id),
      privacy_mode: decode_privacy_mode(&self.privacy_mode)?,
      name: self.name,
      distribution_id: DistributionId::from_uuid(decode_uuid(&self.distribution_id)?),
      allows_replies: self.allows_replies,
      raw_members,
      members,
      deleted_at_timestamp: self.deletion_timestamp,
      is_unknown: self.is_unknown,
    })
  }
}

pub const RECIPIENT_COLUMNS: &str = "id, kind, service_id, group_id, distribution_list_id, \
                                     expire_messages, blocked, story_eligible, is_self";

/// Raw values read directly from a `recipients` row.
pub struct RawRecipient {
  pub id:                   i64,
  pub kind:                 String,
  pub service_id:           Option<String>,
  pub group_id:             Option<String>,
  pub distribution_list_id: Option<i64>,
  pub expire_messages:      u32,
  pub blocked:              bool,
  pub story_eligible:       bool,
  pub is_self:              bool,
}

impl RawRecipient {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                   row.get(0)?,
      kind:                 row.get(1)?,
      service_id:           row.get(2)?,
      group_id:             row.get(3)?,
      distribution_list_id: row.get(4)?,
      expire_messages:      row.get(5)?,
      blocked:              row.get(6)?,
      story_eligible:       row.get(7)?,
      is_self:              row.get(8)?,
    })
  }

  pub fn into_recipient(self) -> Result<Recipient> {
    Ok(Recipient {
      id:                   RecipientId::from_raw(self.id),
      kind:                 decode_recipient_kind(&self.kind)?,
      service_id:           self
        .service_id
        .as_deref()
        .map(decode_uuid)
        .transpose()?
        .map(ServiceId::from_uuid),
      group_id:             self.group_id.map(GroupId::new),
      distribution_list_id: self.distribution_list_id.map(DistributionListId::from_raw),
      expire_messages:      self.expire_messages,
      blocked:              self.blocked,
      story_eligible:       self.story_eligible,
      is_self:              self.is_self,
    })
  }
}

pub const MESSAGE_COLUMNS: &str = "id, thread_id, date_sent, date_received, date_server, \
                                   from_recipient_id, to_recipient_id, type, body, \
                                   body_ranges, read, expires_in, expire_started, \
                                   story_type, remote_deleted, original_message_id, \
                                   latest_revision_id, revision_number";

/// Raw values read directly from a `messages` row.
pub struct RawMessage {
  pub id:                  i64,
  pub thread_id:           i64,
  pub date_sent:           i64,
  pub date_received:       i64,
  pub date_server:         i64,
  pub from_recipient_id:   i64,
  pub to_recipient_id:     i64,
  pub message_type:        i64,
  pub body:                Option<String>,
  pub body_ranges:         Option<String>,
  pub read:                bool,
  pub expires_in:          i64,
  pub expire_started:      i64,
  pub story_type:          i64,
  pub remote_deleted:      bool,
  pub original_message_id: Option<i64>,
  pub latest_revision_id:  Option<i64>,
  pub revision_number:     u32,
}

impl RawMessage {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                  row.get(0)?,
      thread_id:           row.get(1)?,
      date_sent:           row.get(2)?,
      date_received:       row.get(3)?,
      date_server:         row.get(4)?,
      from_recipient_id:   row.get(5)?,
      to_recipient_id:     row.get(6)?,
      message_type:        row.get(7)?,
      body:                row.get(8)?,
      body_ranges:         row.get(9)?,
      read:                row.get(10)?,
      expires_in:          row.get(11)?,
      expire_started:      row.get(12)?,
      story_type:          row.get(13)?,
      remote_deleted:      row.get(14)?,
      original_message_id: row.get(15)?,
      latest_revision_id:  row.get(16)?,
      revision_number:     row.get(17)?,
    })
  }

  pub fn into_message(self) -> Result<MessageRecord> {
    Ok(MessageRecord {
      id:                  MessageId::from_raw(self.id),
      thread_id:           ThreadId::from_raw(self.thread_id),
      date_sent:           self.date_sent,
      date_received:       self.date_received,
      date_server:         self.date_server,
      from_recipient_id:   RecipientId::from_raw(self.from_recipient_id),
      to_recipient_id:     RecipientId::from_raw(self.to_recipient_id),
      message_type:        self.message_type,
      body_ranges:         decode_body_ranges(self.body_ranges.as_deref())?,
      body:                self.body.unwrap_or_default(),
      read:                self.read,
      expires_in:          self.expires_in,
      expire_started:      self.expire_started,
      story_type:          StoryType::from_code(self.story_type)?,
      remote_deleted:      self.remote_deleted,
      original_message_id: self.original_message_id.map(MessageId::from_raw),
      latest_revision_id:  self.latest_revision_id.map(MessageId::from_raw),
      revision_number:     self.revision_number,
    })
  }
}

pub const ATTACHMENT_COLUMNS: &str = "id, message_id, content_type, remote_key, \
                                      remote_location, remote_digest, size, file_name, \
                                      width, height, caption, transfer_state, unique_id, \
                                      transfer_file";

/// Raw values read from (or written to) an `attachments` row.
pub struct RawAttachment {
  pub id:              i64,
  pub message_id:      i64,
  pub content_type:    String,
  pub remote_key:      Option<Vec<u8>>,
  pub remote_location: Option<String>,
  pub remote_digest:   Option<Vec<u8>>,
  pub size:            i64,
  pub file_name:       Option<String>,
  pub width:           u32,
  pub height:          u32,
  pub caption:         Option<String>,
  pub transfer_state:  String,
  pub unique_id:       String,
  pub transfer_file:   Option<String>,
}

impl RawAttachment {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:              row.get(0)?,
      message_id:      row.get(1)?,
      content_type:    row.get(2)?,
      remote_key:      row.get(3)?,
      remote_location: row.get(4)?,
      remote_digest:   row.get(5)?,
      size:            row.get(6)?,
      file_name:       row.get(7)?,
      width:           row.get(8)?,
      height:          row.get(9)?,
      caption:         row.get(10)?,
      transfer_state:  row.get(11)?,
      unique_id:       row.get(12)?,
      transfer_file:   row.get(13)?,
    })
  }

  /// A row ready for insertion; `id` and `message_id` are assigned on insert.
  pub fn for_insert(attachment: &Attachment) -> Self {
    Self {
      id:              0,
      message_id:      0,
      content_type:    attachment.content_type.clone(),
      remote_key:      attachment.remote_key.clone(),
      remote_location: attachment.remote_location.clone(),
      remote_digest:   attachment.remote_digest.clone(),
      size:            i64::try_from(attachment.size).unwrap_or(i64::MAX),
      file_name:       attachment.file_name.clone(),
      width:           attachment.width,
      height:          attachment.height,
      caption:         attachment.caption.clone(),
      transfer_state:  encode_transfer_state(attachment.transfer_state),
      unique_id:       Uuid::new_v4().simple().to_string(),
      transfer_file:   None,
    }
  }

  pub fn into_attachment(self) -> Result<AttachmentRecord> {
    Ok(AttachmentRecord {
      id:            AttachmentId::from_raw(self.id),
      message_id:    MessageId::from_raw(self.message_id),
      attachment:    Attachment {
        content_type:    self.content_type,
        remote_key:      self.remote_key,
        remote_location: self.remote_location,
        remote_digest:   self.remote_digest,
        size:            u64::try_from(self.size).unwrap_or_default(),
        file_name:       self.file_name,
        width:           self.width,
        height:          self.height,
        caption:         self.caption,
        transfer_state:  decode_transfer_state(&self.transfer_state)?,
      },
      unique_id:     self.unique_id,
      transfer_file: self.transfer_file,
    })
  }
}
