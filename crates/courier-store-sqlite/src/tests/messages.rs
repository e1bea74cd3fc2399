use courier_core::{
  distribution::StoryType,
  ids::{MessageId, ServiceId},
  message::{Attachment, OutgoingMessage, TransferState, types},
  store::{DistributionListStore, MessageStore, RecipientStore},
};

use super::{contact, local_account, store};
use crate::Error;

fn photo() -> Attachment {
  Attachment {
    content_type:    "image/jpeg".into(),
    remote_key:      Some(vec![1, 2, 3]),
    remote_location: Some("cdn/abc".into()),
    remote_digest:   Some(vec![9, 9]),
    size:            2048,
    file_name:       Some("cat.jpg".into()),
    width:           640,
    height:          480,
    caption:         None,
    transfer_state:  TransferState::Pending,
  }
}

#[tokio::test]
async fn outbox_insert_requires_self() {
  let s = store().await;
  let to = contact(&s).await;
  let thread = s.get_or_create_thread_id_for(to).await.unwrap();

  let err = s
    .insert_message_outbox(OutgoingMessage::text(to, "hi", 0, 1_000, vec![]), thread)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::NoSelfRecipient));
}

#[tokio::test]
async fn thread_per_recipient() {
  let s = store().await;
  let to = contact(&s).await;
  assert!(s.get_thread_id_for(to).await.unwrap().is_none());

  let a = s.get_or_create_thread_id_for(to).await.unwrap();
  let b = s.get_or_create_thread_id_for(to).await.unwrap();
  assert_eq!(a, b);
  assert_eq!(s.get_thread_id_for(to).await.unwrap(), Some(a));
}

#[tokio::test]
async fn insert_then_mark_sent() {
  let s = store().await;
  let (_, me) = local_account(&s).await;
  let to = contact(&s).await;
  let thread = s.get_or_create_thread_id_for(to).await.unwrap();

  let id = s
    .insert_message_outbox(OutgoingMessage::text(to, "hello", 30_000, 1_000, vec![]), thread)
    .await
    .unwrap();

  let pending = s.get_message(id).await.unwrap().unwrap();
  assert_eq!(pending.body, "hello");
  assert_eq!(pending.from_recipient_id, me);
  assert_eq!(pending.to_recipient_id, to);
  assert_eq!(pending.thread_id, thread);
  assert_eq!(pending.expires_in, 30_000);
  assert!(types::is_pending(pending.message_type));
  assert!(pending.is_outgoing());

  s.mark_as_sent(id, true).await.unwrap();
  let sent = s.get_message(id).await.unwrap().unwrap();
  assert_eq!(types::describe(sent.message_type), "SENT|PUSH|SECURE");

  assert_eq!(s.get_message_for(1_000, me).await.unwrap().map(|m| m.id), Some(id));
  assert!(s.get_message_for(1_000, to).await.unwrap().is_none());
}

#[tokio::test]
async fn mark_sent_on_missing_message_errors() {
  let s = store().await;
  let missing = MessageId::from_raw(77);
  let err = s.mark_as_sent(missing, true).await.unwrap_err();
  assert!(matches!(err, Error::MessageNotFound(id) if id == missing));
}

#[tokio::test]
async fn expire_start_only_moves_earlier() {
  let s = store().await;
  local_account(&s).await;
  let to = contact(&s).await;
  let thread = s.get_or_create_thread_id_for(to).await.unwrap();
  let id = s
    .insert_message_outbox(OutgoingMessage::text(to, "tick", 5_000, 1_000, vec![]), thread)
    .await
    .unwrap();

  s.mark_expire_started(id, 2_000).await.unwrap();
  s.mark_expire_started(id, 3_000).await.unwrap();
  assert_eq!(s.get_message(id).await.unwrap().unwrap().expire_started, 2_000);

  s.mark_expire_started(id, 1_500).await.unwrap();
  assert_eq!(s.get_message(id).await.unwrap().unwrap().expire_started, 1_500);
}

#[tokio::test]
async fn edits_chain_to_the_original() {
  let s = store().await;
  local_account(&s).await;
  let to = contact(&s).await;
  let thread = s.get_or_create_thread_id_for(to).await.unwrap();

  let original = s
    .insert_message_outbox(
      OutgoingMessage::text(to, "frist", 0, 1_000, vec![]).with_attachments(vec![photo()]),
      thread,
    )
    .await
    .unwrap();
  let first_edit = s
    .insert_message_outbox(
      OutgoingMessage::text(to, "first", 0, 2_000, vec![]).editing(original),
      thread,
    )
    .await
    .unwrap();
  let second_edit = s
    .insert_message_outbox(
      OutgoingMessage::text(to, "first!", 0, 3_000, vec![]).editing(first_edit),
      thread,
    )
    .await
    .unwrap();

  let original_row = s.get_message(original).await.unwrap().unwrap();
  let first_row = s.get_message(first_edit).await.unwrap().unwrap();
  let second_row = s.get_message(second_edit).await.unwrap().unwrap();

  assert_eq!(original_row.revision_number, 0);
  assert_eq!(first_row.revision_number, 1);
  assert_eq!(second_row.revision_number, 2);

  assert_eq!(first_row.original_message_id, Some(original));
  assert_eq!(second_row.original_message_id, Some(original));

  assert_eq!(original_row.latest_revision_id, Some(second_edit));
  assert_eq!(first_row.latest_revision_id, Some(second_edit));
  assert!(second_row.is_latest_revision());
  assert!(second_row.is_edit());

  // Attachments follow each revision, with fresh per-row identity.
  let before = s.get_attachments(original).await.unwrap();
  let after = s.get_attachments(second_edit).await.unwrap();
  assert_eq!(before.len(), 1);
  assert_eq!(after.len(), 1);
  assert_eq!(before[0].attachment, after[0].attachment);
  assert_ne!(before[0].unique_id, after[0].unique_id);
}

#[tokio::test]
async fn edit_of_missing_message_errors() {
  let s = store().await;
  let (_, me) = local_account(&s).await;
  let to = contact(&s).await;
  let thread = s.get_or_create_thread_id_for(to).await.unwrap();

  let missing = MessageId::from_raw(12);
  let err = s
    .insert_message_outbox(
      OutgoingMessage::text(to, "edit", 0, 1_000, vec![]).editing(missing),
      thread,
    )
    .await
    .unwrap_err();
  assert!(matches!(err, Error::MessageNotFound(id) if id == missing));
  // The aborted transaction leaves no row behind.
  assert!(s.get_message_for(1_000, me).await.unwrap().is_none());
}

#[tokio::test]
async fn stories_for_a_list_recipient_newest_first() {
  let s = store().await;
  local_account(&s).await;
  let list = s.create_list("Stories".into(), vec![]).await.unwrap().unwrap();
  let list_recipient = s.get_or_insert_from_distribution_list_id(list).await.unwrap();
  let thread = s.get_or_create_thread_id_for(list_recipient).await.unwrap();

  let mut ids = Vec::new();
  for sent in [1_000, 2_000] {
    let story = OutgoingMessage {
      story_type: StoryType::StoryWithReplies,
      ..OutgoingMessage::text(list_recipient, "story", 0, sent, vec![])
    };
    ids.push(s.insert_message_outbox(story, thread).await.unwrap());
  }
  // A plain message in the same thread is not a story.
  s.insert_message_outbox(
    OutgoingMessage::text(list_recipient, "not a story", 0, 3_000, vec![]),
    thread,
  )
  .await
  .unwrap();

  let stories: Vec<_> = s
    .get_all_stories_for(list_recipient)
    .await
    .unwrap()
    .into_iter()
    .map(|m| m.id)
    .collect();
  assert_eq!(stories, vec![ids[1], ids[0]]);
}

#[tokio::test]
async fn delete_all_conversations_clears_messages() {
  let s = store().await;
  local_account(&s).await;
  let to = s
    .get_or_insert_from_service_id(ServiceId::random())
    .await
    .unwrap();
  let thread = s.get_or_create_thread_id_for(to).await.unwrap();
  let id = s
    .insert_message_outbox(
      OutgoingMessage::text(to, "bye", 0, 1_000, vec![]).with_attachments(vec![photo()]),
      thread,
    )
    .await
    .unwrap();

  s.delete_all_conversations().await.unwrap();

  assert!(s.get_message(id).await.unwrap().is_none());
  assert!(s.get_attachments(id).await.unwrap().is_empty());
  assert!(s.get_thread_id_for(to).await.unwrap().is_none());
}
