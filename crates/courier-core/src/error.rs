//! Error types for `courier-core`.

use thiserror::Error;

use crate::ids::{DistributionListId, RecipientId};

#[derive(Debug, Error)]
pub enum Error {
  #[error("distribution list not found: {0}")]
  ListNotFound(DistributionListId),

  #[error("recipient {0} is neither a group nor a distribution list")]
  NotAStoryTarget(RecipientId),

  #[error("unknown {kind} code: {value:?}")]
  UnknownCode { kind: &'static str, value: String },

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Wrap a backend error.
  pub fn store<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(err))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
