//! Story settings screen operations for a single private story.

use std::future::Future;

use tracing::info;

use crate::{
  Error, Result,
  distribution::DistributionListRecord,
  ids::{DistributionListId, MessageId, RecipientId},
  store::{DistributionListStore, MessageStore},
};

/// Sends a remote delete for one of our messages. Implemented by the
/// outgoing job layer.
pub trait RemoteDeleteSender: Send + Sync {
  fn send_remote_delete(&self, message_id: MessageId) -> impl Future<Output = ()> + Send + '_;
}

pub struct StorySettings<S, D> {
  store:  S,
  sender: D,
}

impl<S, D> StorySettings<S, D>
where
  S: DistributionListStore + MessageStore,
  D: RemoteDeleteSender,
{
  pub fn new(store: S, sender: D) -> Self { Self { store, sender } }

  /// The list's record. A missing list is an error here: the screen is only
  /// reachable from an existing list.
  pub async fn get_record(&self, id: DistributionListId) -> Result<DistributionListRecord> {
    self
      .store
      .get_list(id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::ListNotFound(id))
  }

  pub async fn remove_member(
    &self,
    record: &DistributionListRecord,
    member: RecipientId,
  ) -> Result<()> {
    self
      .store
      .remove_member_from_list(record.id, record.privacy_mode, member)
      .await
      .map_err(Error::store)
  }

  /// Delete the list, then remote-delete every story already sent to it.
  /// Returns the stories a delete was sent for.
  pub async fn delete(&self, id: DistributionListId) -> Result<Vec<MessageId>> {
    self.store.delete_list(id).await.map_err(Error::store)?;

    let recipient = self
      .store
      .get_or_insert_from_distribution_list_id(id)
      .await
      .map_err(Error::store)?;
    let stories = self
      .store
      .get_all_stories_for(recipient)
      .await
      .map_err(Error::store)?;

    let mut deleted = Vec::with_capacity(stories.len());
    for story in stories {
      self.sender.send_remote_delete(story.id).await;
      deleted.push(story.id);
    }

    info!(list = %id, stories = deleted.len(), "deleted private story");
    Ok(deleted)
  }

  pub async fn get_replies_and_reactions_enabled(&self, id: DistributionListId) -> Result<bool> {
    let story_type = self.store.get_story_type(id).await.map_err(Error::store)?;
    Ok(story_type.is_story_with_replies())
  }

  pub async fn set_replies_and_reactions_enabled(
    &self,
    id: DistributionListId,
    enabled: bool,
  ) -> Result<()> {
    self
      .store
      .set_allows_replies(id, enabled)
      .await
      .map_err(Error::store)
  }
}
