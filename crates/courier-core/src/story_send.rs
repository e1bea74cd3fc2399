//! Bookkeeping for recently sent stories.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  ids::{DistributionListId, GroupId},
  recipient::Recipient,
};

/// A story send to one logical target at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorySend {
  /// Milliseconds since the epoch.
  pub timestamp:  i64,
  pub identifier: Identifier,
}

/// The target a story was sent to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Identifier {
  Group(GroupId),
  DistributionList(DistributionListId),
}

impl Identifier {
  /// Whether `recipient` is the group or list this identifier names.
  pub fn matches(&self, recipient: &Recipient) -> bool {
    match self {
      Self::Group(group_id) => recipient.group_id.as_ref() == Some(group_id),
      Self::DistributionList(list_id) => recipient.distribution_list_id == Some(*list_id),
    }
  }
}

impl StorySend {
  /// Record a send to `recipient` at `timestamp`.
  ///
  /// Only groups and distribution lists can receive stories.
  pub fn new_send(recipient: &Recipient, timestamp: i64) -> Result<Self> {
    let identifier = if recipient.is_group() {
      recipient.group_id.clone().map(Identifier::Group)
    } else {
      recipient.distribution_list_id.map(Identifier::DistributionList)
    };

    identifier
      .map(|identifier| Self { timestamp, identifier })
      .ok_or(Error::NotAStoryTarget(recipient.id))
  }

  /// [`StorySend::new_send`] stamped with the current wall-clock time.
  pub fn new_send_now(recipient: &Recipient) -> Result<Self> {
    Self::new_send(recipient, Utc::now().timestamp_millis())
  }
}
