//! Error type for `courier-store-sqlite`.

use courier_core::ids::{DistributionListId, MessageId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] courier_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("decode error: {0}")]
  Decode(String),

  /// `get_story_type` was asked about a list that has no live record.
  #[error("no story type for {0}: list does not exist")]
  StoryTypeMissing(DistributionListId),

  #[error("the My Story list cannot be deleted")]
  CannotDeleteMyStory,

  #[error("message not found: {0}")]
  MessageNotFound(MessageId),

  /// Outgoing messages need an author; no recipient is marked as self.
  #[error("no recipient is marked as the local account")]
  NoSelfRecipient,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
