//! Recipients: anything a message can be addressed to.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::ids::{DistributionListId, GroupId, RecipientId, ServiceId};

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RecipientKind {
  Individual,
  Group,
  DistributionList,
}

/// A resolved recipient row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
  pub id:                   RecipientId,
  pub kind:                 RecipientKind,
  pub service_id:           Option<ServiceId>,
  pub group_id:             Option<GroupId>,
  pub distribution_list_id: Option<DistributionListId>,
  /// Disappearing-message timer, in seconds as it travels on the wire.
  pub expire_messages:      u32,
  pub blocked:              bool,
  /// Counts towards "everyone" for `All` / `AllExcept` lists.
  pub story_eligible:       bool,
  pub is_self:              bool,
}

impl Recipient {
  pub fn is_group(&self) -> bool { self.kind == RecipientKind::Group }

  pub fn is_distribution_list(&self) -> bool {
    self.kind == RecipientKind::DistributionList
  }

  /// The disappearing-message timer in milliseconds, as stored on messages.
  pub fn expires_in_millis(&self) -> i64 { i64::from(self.expire_messages) * 1000 }
}
