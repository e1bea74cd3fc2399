//! Store traits implemented by storage backends (e.g. `courier-store-sqlite`).
//!
//! Higher layers ([`SyncMessageProcessor`](crate::sync::SyncMessageProcessor),
//! [`StorySettings`](crate::repository::StorySettings)) depend on these
//! abstractions, not on any concrete backend.
//!
//! All methods return `Send` futures so the traits can be used from
//! multi-threaded async runtimes.

use std::future::Future;

use crate::{
  distribution::{
    DistributionListPrivacyMode, DistributionListRecord, NewDistributionList, StoryType,
  },
  ids::{
    DistributionId, DistributionListId, GroupId, MessageId, RecipientId, ServiceId, ThreadId,
  },
  message::{AttachmentRecord, MessageRecord, OutgoingMessage},
  recipient::Recipient,
};

/// The error type shared by every trait a backend implements.
pub trait Store: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;
}

// ─── Distribution lists ──────────────────────────────────────────────────────

/// Durable storage for distribution lists and their membership rows.
pub trait DistributionListStore: Store {
  /// Create an opt-in list holding `members`, in order.
  ///
  /// Returns `None` when a live list already uses `name`.
  fn create_list(
    &self,
    name: String,
    members: Vec<RecipientId>,
  ) -> impl Future<Output = Result<Option<DistributionListId>, Self::Error>> + Send + '_;

  /// Create a list with caller-chosen attributes. Same conflict rule as
  /// [`create_list`](Self::create_list).
  fn create_list_with(
    &self,
    list: NewDistributionList,
  ) -> impl Future<Output = Result<Option<DistributionListId>, Self::Error>> + Send + '_;

  /// Returns `None` if the list does not exist or has been deleted.
  fn get_list(
    &self,
    id: DistributionListId,
  ) -> impl Future<Output = Result<Option<DistributionListRecord>, Self::Error>> + Send + '_;

  fn get_list_by_distribution_id(
    &self,
    distribution_id: DistributionId,
  ) -> impl Future<Output = Result<Option<DistributionListRecord>, Self::Error>> + Send + '_;

  /// Every live list, ascending by id.
  fn get_all_lists(
    &self,
  ) -> impl Future<Output = Result<Vec<DistributionListRecord>, Self::Error>> + Send + '_;

  /// The resolved audience of a list. Empty for a missing or deleted list.
  fn get_members(
    &self,
    id: DistributionListId,
  ) -> impl Future<Output = Result<Vec<RecipientId>, Self::Error>> + Send + '_;

  /// Member rows stored under `privacy_mode`, in insertion order.
  fn get_raw_members(
    &self,
    id: DistributionListId,
    privacy_mode: DistributionListPrivacyMode,
  ) -> impl Future<Output = Result<Vec<RecipientId>, Self::Error>> + Send + '_;

  /// The story type posts to this list get.
  ///
  /// Unlike [`get_list`](Self::get_list), a missing list is an error: callers
  /// only ask for lists they already know exist.
  fn get_story_type(
    &self,
    id: DistributionListId,
  ) -> impl Future<Output = Result<StoryType, Self::Error>> + Send + '_;

  fn set_allows_replies(
    &self,
    id: DistributionListId,
    allows_replies: bool,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Rename a list. Returns `false` when another live list has the name.
  fn set_name(
    &self,
    id: DistributionListId,
    name: String,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Switch how member rows are interpreted. Rows stored under other modes
  /// are kept.
  fn set_privacy_mode(
    &self,
    id: DistributionListId,
    privacy_mode: DistributionListPrivacyMode,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn add_member_to_list(
    &self,
    id: DistributionListId,
    privacy_mode: DistributionListPrivacyMode,
    member: RecipientId,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Take `member` out of the audience.
  ///
  /// For `AllExcept` that means adding an exclusion row; otherwise the
  /// member's row is deleted.
  fn remove_member_from_list(
    &self,
    id: DistributionListId,
    privacy_mode: DistributionListPrivacyMode,
    member: RecipientId,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Replace every row stored under `privacy_mode`.
  fn set_members(
    &self,
    id: DistributionListId,
    privacy_mode: DistributionListPrivacyMode,
    members: Vec<RecipientId>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Soft-delete a list and drop its member rows.
  ///
  /// The recipient row that points at the list is kept so stories already
  /// sent to it can still be found (e.g. to fan out remote deletes).
  fn delete_list(
    &self,
    id: DistributionListId,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Point membership rows for `from` at `to` after two recipients merge.
  fn remap_recipient(
    &self,
    from: RecipientId,
    to: RecipientId,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}

// ─── Recipients ──────────────────────────────────────────────────────────────

pub trait RecipientStore: Store {
  fn get_or_insert_from_service_id(
    &self,
    service_id: ServiceId,
  ) -> impl Future<Output = Result<RecipientId, Self::Error>> + Send + '_;

  fn get_or_insert_from_group_id(
    &self,
    group_id: GroupId,
  ) -> impl Future<Output = Result<RecipientId, Self::Error>> + Send + '_;

  fn get_or_insert_from_distribution_list_id(
    &self,
    id: DistributionListId,
  ) -> impl Future<Output = Result<RecipientId, Self::Error>> + Send + '_;

  fn get_recipient(
    &self,
    id: RecipientId,
  ) -> impl Future<Output = Result<Option<Recipient>, Self::Error>> + Send + '_;

  /// Store the disappearing-message timer, in seconds.
  fn set_expire_messages(
    &self,
    id: RecipientId,
    seconds: u32,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn set_blocked(
    &self,
    id: RecipientId,
    blocked: bool,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn set_story_eligible(
    &self,
    id: RecipientId,
    eligible: bool,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Mark `id` as the local account. Any previous self row is cleared.
  fn mark_self(&self, id: RecipientId)
  -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Individuals that count as "everyone" for story audiences: eligible,
  /// registered, not blocked and not self. Ascending by id.
  fn get_story_eligible_contacts(
    &self,
  ) -> impl Future<Output = Result<Vec<RecipientId>, Self::Error>> + Send + '_;
}

// ─── Threads, messages, attachments ──────────────────────────────────────────

pub trait MessageStore: RecipientStore {
  fn get_or_create_thread_id_for(
    &self,
    recipient: RecipientId,
  ) -> impl Future<Output = Result<ThreadId, Self::Error>> + Send + '_;

  fn get_thread_id_for(
    &self,
    recipient: RecipientId,
  ) -> impl Future<Output = Result<Option<ThreadId>, Self::Error>> + Send + '_;

  /// Write an outgoing message (and its attachments) in the sending state.
  ///
  /// When `message.message_to_edit` is set the new row becomes the latest
  /// revision of that message: it links to the first revision, inherits the
  /// target's attachments, and every earlier revision is pointed at it.
  fn insert_message_outbox(
    &self,
    message: OutgoingMessage,
    thread_id: ThreadId,
  ) -> impl Future<Output = Result<MessageId, Self::Error>> + Send + '_;

  fn mark_as_sent(
    &self,
    id: MessageId,
    secure: bool,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Start the disappearing-message countdown at `started_at` (epoch ms).
  fn mark_expire_started(
    &self,
    id: MessageId,
    started_at: i64,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn get_message(
    &self,
    id: MessageId,
  ) -> impl Future<Output = Result<Option<MessageRecord>, Self::Error>> + Send + '_;

  /// The message `author` sent at `sent_timestamp`, if any.
  fn get_message_for(
    &self,
    sent_timestamp: i64,
    author: RecipientId,
  ) -> impl Future<Output = Result<Option<MessageRecord>, Self::Error>> + Send + '_;

  fn get_attachments(
    &self,
    id: MessageId,
  ) -> impl Future<Output = Result<Vec<AttachmentRecord>, Self::Error>> + Send + '_;

  /// Stories addressed to `recipient`, newest first.
  fn get_all_stories_for(
    &self,
    recipient: RecipientId,
  ) -> impl Future<Output = Result<Vec<MessageRecord>, Self::Error>> + Send + '_;

  /// Remove every thread with its messages and attachments.
  fn delete_all_conversations(
    &self,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}

// ─── Settings ────────────────────────────────────────────────────────────────

/// String-keyed settings storage. Typed access lives in
/// [`settings`](crate::settings).
pub trait KeyValueStore: Store {
  fn get_value(
    &self,
    key: String,
  ) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send + '_;

  fn put_value(
    &self,
    key: String,
    value: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn remove_value(
    &self,
    key: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
