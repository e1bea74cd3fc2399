//! Decrypted envelope content as handed to the message processor.
//!
//! Only the parts needed to replay a linked device's sent transcripts are
//! modelled. Timer values on the wire are seconds; local rows use
//! milliseconds.

use serde::{Deserialize, Serialize};

use crate::{
  ids::{GroupId, ServiceId},
  message::BodyRange,
};

/// Outer envelope metadata as delivered by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
  /// Sender-assigned timestamp, milliseconds since the epoch.
  pub timestamp:         i64,
  pub source_service_id: ServiceId,
  pub source_device:     u32,
  pub server_timestamp:  i64,
}

/// Sender and destination after decryption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvelopeMetadata {
  pub source_service_id:      ServiceId,
  pub source_device_id:       u32,
  pub destination_service_id: ServiceId,
  pub sealed_sender:          bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
  #[serde(default)]
  pub data_message: Option<DataMessage>,
  #[serde(default)]
  pub sync_message: Option<SyncMessage>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncMessage {
  #[serde(default)]
  pub sent: Option<Sent>,
}

/// Transcript of a message another of our devices sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sent {
  #[serde(default)]
  pub destination_service_id:     Option<ServiceId>,
  pub timestamp:                  i64,
  #[serde(default)]
  pub expiration_start_timestamp: i64,
  #[serde(default)]
  pub message:                    Option<DataMessage>,
  #[serde(default)]
  pub edit_message:               Option<EditMessage>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataMessage {
  #[serde(default)]
  pub body:          Option<String>,
  #[serde(default)]
  pub body_ranges:   Vec<BodyRange>,
  /// Disappearing-message timer in seconds.
  #[serde(default)]
  pub expire_timer:  u32,
  pub timestamp:     i64,
  #[serde(default)]
  pub attachments:   Vec<AttachmentPointer>,
  #[serde(default)]
  pub group_context: Option<GroupContext>,
}

impl DataMessage {
  pub fn is_media_message(&self) -> bool { !self.attachments.is_empty() }

  /// The timer converted to the millisecond unit stored on messages.
  pub fn expires_in_millis(&self) -> i64 { i64::from(self.expire_timer) * 1000 }
}

/// A replacement for a previously sent message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditMessage {
  /// The `timestamp` of the message being edited.
  pub target_sent_timestamp: i64,
  pub data_message:          DataMessage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupContext {
  pub group_id: GroupId,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentPointer {
  pub content_type: String,
  #[serde(default)]
  pub cdn_key:      Option<String>,
  #[serde(default)]
  pub key:          Option<Vec<u8>>,
  #[serde(default)]
  pub digest:       Option<Vec<u8>>,
  #[serde(default)]
  pub size:         u64,
  #[serde(default)]
  pub file_name:    Option<String>,
  #[serde(default)]
  pub width:        u32,
  #[serde(default)]
  pub height:       u32,
  #[serde(default)]
  pub caption:      Option<String>,
}
