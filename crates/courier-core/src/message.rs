//! Messages, attachments, and the bitmask stored in the message `type`
//! column.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::{
  distribution::StoryType,
  ids::{AttachmentId, MessageId, RecipientId, ThreadId},
  wire::AttachmentPointer,
};

// ─── Type bitmask ────────────────────────────────────────────────────────────

/// Constants and predicates for the message `type` column.
///
/// The low five bits hold the mailbox base type; higher bits are flags.
pub mod types {
  pub const BASE_TYPE_MASK: i64 = 0x1F;

  pub const BASE_INBOX_TYPE: i64 = 20;
  pub const BASE_OUTBOX_TYPE: i64 = 21;
  pub const BASE_SENDING_TYPE: i64 = 22;
  pub const BASE_SENT_TYPE: i64 = 23;
  pub const BASE_SENT_FAILED_TYPE: i64 = 24;
  pub const BASE_DRAFT_TYPE: i64 = 27;

  pub const OUTGOING_MESSAGE_TYPES: [i64; 5] = [
    BASE_OUTBOX_TYPE,
    BASE_SENT_TYPE,
    BASE_SENDING_TYPE,
    BASE_SENT_FAILED_TYPE,
    BASE_DRAFT_TYPE,
  ];

  pub const GROUP_UPDATE_BIT: i64 = 0x10000;
  pub const EXPIRATION_TIMER_UPDATE_BIT: i64 = 0x40000;
  pub const PUSH_MESSAGE_BIT: i64 = 0x200000;
  pub const SECURE_MESSAGE_BIT: i64 = 0x800000;

  const FLAGS: [(i64, &str); 4] = [
    (GROUP_UPDATE_BIT, "GROUP_UPDATE"),
    (EXPIRATION_TIMER_UPDATE_BIT, "EXPIRATION_TIMER_UPDATE"),
    (PUSH_MESSAGE_BIT, "PUSH"),
    (SECURE_MESSAGE_BIT, "SECURE"),
  ];

  pub fn base(t: i64) -> i64 { t & BASE_TYPE_MASK }

  pub fn is_outgoing(t: i64) -> bool { OUTGOING_MESSAGE_TYPES.contains(&base(t)) }

  pub fn is_sent(t: i64) -> bool { base(t) == BASE_SENT_TYPE }

  pub fn is_pending(t: i64) -> bool {
    matches!(base(t), BASE_OUTBOX_TYPE | BASE_SENDING_TYPE)
  }

  pub fn is_secure(t: i64) -> bool { t & SECURE_MESSAGE_BIT != 0 }

  pub fn is_push(t: i64) -> bool { t & PUSH_MESSAGE_BIT != 0 }

  pub fn is_expiration_timer_update(t: i64) -> bool {
    t & EXPIRATION_TIMER_UPDATE_BIT != 0
  }

  /// Render a type value as `BASE|FLAG|FLAG`, for logs and table dumps.
  pub fn describe(t: i64) -> String {
    let base_name = match base(t) {
      BASE_INBOX_TYPE => "INBOX".to_owned(),
      BASE_OUTBOX_TYPE => "OUTBOX".to_owned(),
      BASE_SENDING_TYPE => "SENDING".to_owned(),
      BASE_SENT_TYPE => "SENT".to_owned(),
      BASE_SENT_FAILED_TYPE => "SENT_FAILED".to_owned(),
      BASE_DRAFT_TYPE => "DRAFT".to_owned(),
      other => format!("BASE({other})"),
    };

    let mut parts = vec![base_name];
    parts.extend(
      FLAGS
        .iter()
        .filter(|(bit, _)| t & bit != 0)
        .map(|(_, name)| (*name).to_owned()),
    );
    parts.join("|")
  }
}

// ─── Body ranges ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyStyle {
  Bold,
  Italic,
  Strikethrough,
  Monospace,
  Spoiler,
}

/// A styled span of a message body, in UTF-16 code units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BodyRange {
  pub start:  u32,
  pub length: u32,
  pub style:  BodyStyle,
}

// ─── Attachments ─────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TransferState {
  /// Uploaded or downloaded; the local file is authoritative.
  Done,
  /// Known remotely, not yet fetched.
  Pending,
  Failed,
}

/// An attachment about to be written alongside a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
  pub content_type:    String,
  pub remote_key:      Option<Vec<u8>>,
  pub remote_location: Option<String>,
  pub remote_digest:   Option<Vec<u8>>,
  pub size:            u64,
  pub file_name:       Option<String>,
  pub width:           u32,
  pub height:          u32,
  pub caption:         Option<String>,
  pub transfer_state:  TransferState,
}

impl Attachment {
  /// An attachment described by a wire pointer; its content is still remote.
  pub fn from_pointer(pointer: &AttachmentPointer) -> Self {
    Self {
      content_type:    pointer.content_type.clone(),
      remote_key:      pointer.key.clone(),
      remote_location: pointer.cdn_key.clone(),
      remote_digest:   pointer.digest.clone(),
      size:            pointer.size,
      file_name:       pointer.file_name.clone(),
      width:           pointer.width,
      height:          pointer.height,
      caption:         pointer.caption.clone(),
      transfer_state:  TransferState::Pending,
    }
  }
}

/// A persisted attachment row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentRecord {
  pub id:            AttachmentId,
  pub message_id:    MessageId,
  pub attachment:    Attachment,
  /// Per-row identity used for local file bookkeeping.
  pub unique_id:     String,
  pub transfer_file: Option<String>,
}

// ─── Outgoing messages ───────────────────────────────────────────────────────

/// A message composed on this device (or replayed from a linked device's
/// sent transcript) that is about to be written to the outbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
  pub thread_recipient:     RecipientId,
  /// Milliseconds since the epoch; also the wire timestamp.
  pub sent_time_millis:     i64,
  pub body:                 String,
  /// Disappearing-message timer in milliseconds.
  pub expires_in:           i64,
  pub is_secure:            bool,
  pub body_ranges:          Vec<BodyRange>,
  pub attachments:          Vec<Attachment>,
  pub story_type:           StoryType,
  pub is_expiration_update: bool,
  /// The message this one replaces, when it is an edit.
  pub message_to_edit:      Option<MessageId>,
}

impl OutgoingMessage {
  pub fn text(
    thread_recipient: RecipientId,
    body: impl Into<String>,
    expires_in: i64,
    sent_time_millis: i64,
    body_ranges: Vec<BodyRange>,
  ) -> Self {
    Self {
      thread_recipient,
      sent_time_millis,
      body: body.into(),
      expires_in,
      is_secure: true,
      body_ranges,
      attachments: Vec::new(),
      story_type: StoryType::None,
      is_expiration_update: false,
      message_to_edit: None,
    }
  }

  /// Announces a new disappearing-message timer for the thread.
  pub fn expiration_update(
    thread_recipient: RecipientId,
    sent_time_millis: i64,
    expires_in: i64,
  ) -> Self {
    Self {
      is_expiration_update: true,
      ..Self::text(thread_recipient, "", expires_in, sent_time_millis, Vec::new())
    }
  }

  pub fn with_attachments(mut self, attachments: Vec<Attachment>) -> Self {
    self.attachments = attachments;
    self
  }

  pub fn editing(mut self, message_id: MessageId) -> Self {
    self.message_to_edit = Some(message_id);
    self
  }

  /// The initial `type` column value, before the message is marked sent.
  pub fn outbox_type(&self) -> i64 {
    let mut t = types::BASE_SENDING_TYPE;
    if self.is_secure {
      t |= types::SECURE_MESSAGE_BIT | types::PUSH_MESSAGE_BIT;
    }
    if self.is_expiration_update {
      t |= types::EXPIRATION_TIMER_UPDATE_BIT;
    }
    t
  }
}

// ─── Persisted messages ──────────────────────────────────────────────────────

/// A persisted message row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
  pub id:                  MessageId,
  pub thread_id:           ThreadId,
  pub date_sent:           i64,
  pub date_received:       i64,
  pub date_server:         i64,
  pub from_recipient_id:   RecipientId,
  pub to_recipient_id:     RecipientId,
  pub message_type:        i64,
  pub body:                String,
  pub body_ranges:         Vec<BodyRange>,
  pub read:                bool,
  /// Milliseconds.
  pub expires_in:          i64,
  /// Milliseconds since the epoch; zero when the timer has not started.
  pub expire_started:      i64,
  pub story_type:          StoryType,
  pub remote_deleted:      bool,
  /// The first revision of this message, when it is an edit.
  pub original_message_id: Option<MessageId>,
  /// The newest revision, when this row has been edited.
  pub latest_revision_id:  Option<MessageId>,
  pub revision_number:     u32,
}

impl MessageRecord {
  pub fn is_outgoing(&self) -> bool { types::is_outgoing(self.message_type) }

  pub fn is_edit(&self) -> bool { self.original_message_id.is_some() }

  pub fn is_latest_revision(&self) -> bool { self.latest_revision_id.is_none() }
}
