//! Distribution lists, the audiences that stories are sent to.
//!
//! A [`DistributionListRecord`] is a read-only snapshot assembled by the store
//! on every query. Mutations go through
//! [`DistributionListStore`](crate::store::DistributionListStore) and rewrite
//! rows; records are never modified in place.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::{
  ids::{DistributionId, DistributionListId, RecipientId},
  selection::SelectionState,
};

// ─── Privacy mode ────────────────────────────────────────────────────────────

/// How a list's stored member rows are interpreted.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum DistributionListPrivacyMode {
  /// Stored rows are the complete audience (opt-in).
  #[default]
  OnlyWith,
  /// Every eligible contact except the stored rows (opt-out).
  AllExcept,
  /// Every eligible contact; stored rows are ignored.
  All,
}

impl DistributionListPrivacyMode {
  /// Whether stored rows name recipients to leave out.
  pub fn is_exclusionary(self) -> bool { matches!(self, Self::AllExcept | Self::All) }
}

// ─── Story type ──────────────────────────────────────────────────────────────

/// The story attribute of a message, persisted as an integer code.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum StoryType {
  /// Not a story.
  #[default]
  None,
  StoryWithReplies,
  StoryWithoutReplies,
  TextStoryWithReplies,
  TextStoryWithoutReplies,
}

impl StoryType {
  pub fn code(self) -> i64 {
    match self {
      Self::None => 0,
      Self::StoryWithReplies => 1,
      Self::StoryWithoutReplies => 2,
      Self::TextStoryWithReplies => 3,
      Self::TextStoryWithoutReplies => 4,
    }
  }

  pub fn from_code(code: i64) -> crate::Result<Self> {
    match code {
      0 => Ok(Self::None),
      1 => Ok(Self::StoryWithReplies),
      2 => Ok(Self::StoryWithoutReplies),
      3 => Ok(Self::TextStoryWithReplies),
      4 => Ok(Self::TextStoryWithoutReplies),
      other => Err(crate::Error::UnknownCode {
        kind:  "story type",
        value: other.to_string(),
      }),
    }
  }

  /// The story type a list with the given replies setting produces.
  pub fn for_replies(allows_replies: bool) -> Self {
    if allows_replies { Self::StoryWithReplies } else { Self::StoryWithoutReplies }
  }

  pub fn is_story(self) -> bool { self != Self::None }

  pub fn is_story_with_replies(self) -> bool {
    matches!(self, Self::StoryWithReplies | Self::TextStoryWithReplies)
  }

  pub fn is_text_story(self) -> bool {
    matches!(self, Self::TextStoryWithReplies | Self::TextStoryWithoutReplies)
  }

  /// The text-post variant of this type. `None` stays `None`.
  pub fn to_text_story_type(self) -> Self {
    match self {
      Self::StoryWithReplies | Self::TextStoryWithReplies => Self::TextStoryWithReplies,
      Self::StoryWithoutReplies | Self::TextStoryWithoutReplies => {
        Self::TextStoryWithoutReplies
      }
      Self::None => Self::None,
    }
  }
}

// ─── Record ──────────────────────────────────────────────────────────────────

/// One distribution list, as read from the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionListRecord {
  pub id:                   DistributionListId,
  pub name:                 String,
  pub distribution_id:      DistributionId,
  pub allows_replies:       bool,
  /// Member rows stored under the current privacy mode, in insertion order.
  pub raw_members:          Vec<RecipientId>,
  /// The audience after resolving `raw_members` against the privacy mode.
  pub members:              Vec<RecipientId>,
  /// Milliseconds since the epoch; zero while the list is live.
  pub deleted_at_timestamp: i64,
  /// Placeholder created for a list we learned about but could not resolve.
  pub is_unknown:           bool,
  pub privacy_mode:         DistributionListPrivacyMode,
}

impl DistributionListRecord {
  /// The members a linked device needs to reproduce this list.
  ///
  /// `All` has nothing to enumerate; the other modes sync their stored rows.
  pub fn members_to_sync(&self) -> &[RecipientId] {
    match self.privacy_mode {
      DistributionListPrivacyMode::All => &[],
      DistributionListPrivacyMode::OnlyWith | DistributionListPrivacyMode::AllExcept => {
        &self.raw_members
      }
    }
  }

  pub fn is_my_story(&self) -> bool { self.id == DistributionListId::MY_STORY }

  pub fn is_deleted(&self) -> bool { self.deleted_at_timestamp != 0 }

  pub fn story_type(&self) -> StoryType { StoryType::for_replies(self.allows_replies) }

  /// Membership as an opt-in or opt-out selection.
  pub fn selection(&self) -> SelectionState<RecipientId> {
    match self.privacy_mode {
      DistributionListPrivacyMode::OnlyWith => {
        SelectionState::Includes(self.raw_members.iter().copied().collect())
      }
      DistributionListPrivacyMode::AllExcept => {
        SelectionState::Excludes(self.raw_members.iter().copied().collect())
      }
      DistributionListPrivacyMode::All => SelectionState::select_all(),
    }
  }
}

// ─── Creation input ──────────────────────────────────────────────────────────

/// Input for creating a list with explicit attributes.
///
/// [`NewDistributionList::new`] gives the defaults used for lists created in
/// the app: opt-in membership, a fresh distribution id, replies allowed.
#[derive(Debug, Clone)]
pub struct NewDistributionList {
  pub name:            String,
  pub members:         Vec<RecipientId>,
  pub distribution_id: DistributionId,
  pub allows_replies:  bool,
  pub privacy_mode:    DistributionListPrivacyMode,
  pub is_unknown:      bool,
}

impl NewDistributionList {
  pub fn new(name: impl Into<String>, members: Vec<RecipientId>) -> Self {
    Self {
      name: name.into(),
      members,
      distribution_id: DistributionId::random(),
      allows_replies: true,
      privacy_mode: DistributionListPrivacyMode::OnlyWith,
      is_unknown: false,
    }
  }
}
