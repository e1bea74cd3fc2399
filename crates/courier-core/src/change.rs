//! Change notifications published by stores after a write commits.

use crate::ids::{DistributionListId, MessageId, RecipientId, ThreadId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseChange {
  DistributionList(DistributionListId),
  Recipient(RecipientId),
  Thread(ThreadId),
  Message { thread_id: ThreadId, message_id: MessageId },
  /// A settings key was written or removed.
  KeyValue(String),
  /// Every conversation was cleared.
  AllConversations,
}
