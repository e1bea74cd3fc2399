//! Identifier newtypes.
//!
//! Row ids are integer-backed and allocated by the store. Identifiers that
//! travel over the wire (`DistributionId`, `ServiceId`) are UUIDs.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! row_id {
  ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
    $(#[$meta])*
    #[derive(
      Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
    )]
    #[serde(transparent)]
    pub struct $name(i64);

    impl $name {
      pub const fn from_raw(id: i64) -> Self { Self(id) }

      pub const fn to_raw(self) -> i64 { self.0 }
    }

    impl fmt::Display for $name {
      fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, concat!($prefix, "::{}"), self.0)
      }
    }
  };
}

row_id!(
  /// A row in the recipients table.
  RecipientId,
  "RecipientId"
);
row_id!(
  /// A distribution list ("story" audience).
  DistributionListId,
  "DistributionListId"
);
row_id!(ThreadId, "ThreadId");
row_id!(MessageId, "MessageId");
row_id!(AttachmentId, "AttachmentId");

impl DistributionListId {
  /// The built-in "My Story" list, present in every store.
  pub const MY_STORY: Self = Self(1);
}

/// Externally visible identifier of a distribution list, used when
/// addressing sender-key distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DistributionId(Uuid);

impl DistributionId {
  /// The distribution id reserved for "My Story".
  pub const MY_STORY: Self = Self(Uuid::nil());

  pub fn random() -> Self { Self(Uuid::new_v4()) }

  pub fn from_uuid(uuid: Uuid) -> Self { Self(uuid) }

  pub fn as_uuid(&self) -> Uuid { self.0 }
}

impl fmt::Display for DistributionId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

/// An account identifier as it appears in envelopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceId(Uuid);

impl ServiceId {
  pub fn from_uuid(uuid: Uuid) -> Self { Self(uuid) }

  pub fn random() -> Self { Self(Uuid::new_v4()) }

  pub fn as_uuid(&self) -> Uuid { self.0 }
}

impl fmt::Display for ServiceId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

/// Opaque group identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(String);

impl GroupId {
  pub fn new(id: impl Into<String>) -> Self { Self(id.into()) }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for GroupId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}
