//! Integration tests for `SqliteStore` against an in-memory database.

use courier_core::{
  ids::{RecipientId, ServiceId},
  store::RecipientStore,
};

use crate::SqliteStore;

mod lists;
mod messages;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

/// An individual who counts towards "everyone" audiences.
async fn contact(s: &SqliteStore) -> RecipientId {
  let id = s
    .get_or_insert_from_service_id(ServiceId::random())
    .await
    .unwrap();
  s.set_story_eligible(id, true).await.unwrap();
  id
}

/// Insert and mark the local account.
async fn local_account(s: &SqliteStore) -> (ServiceId, RecipientId) {
  let service_id = ServiceId::random();
  let id = s.get_or_insert_from_service_id(service_id).await.unwrap();
  s.mark_self(id).await.unwrap();
  (service_id, id)
}

#[tokio::test]
async fn open_on_disk_and_reopen() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("courier.sqlite");

  let id = {
    let s = SqliteStore::open(&path).await.unwrap();
    contact(&s).await
  };

  let s = SqliteStore::open(&path).await.unwrap();
  let recipient = s.get_recipient(id).await.unwrap().unwrap();
  assert!(recipient.story_eligible);
}

#[tokio::test]
async fn get_or_insert_is_idempotent() {
  let s = store().await;
  let service_id = ServiceId::random();
  let a = s.get_or_insert_from_service_id(service_id).await.unwrap();
  let b = s.get_or_insert_from_service_id(service_id).await.unwrap();
  assert_eq!(a, b);

  let recipient = s.get_recipient(a).await.unwrap().unwrap();
  assert_eq!(recipient.service_id, Some(service_id));
  assert_eq!(recipient.kind, courier_core::recipient::RecipientKind::Individual);
}

#[tokio::test]
async fn mark_self_moves_the_flag() {
  let s = store().await;
  let (_, first) = local_account(&s).await;
  let (_, second) = local_account(&s).await;

  assert!(!s.get_recipient(first).await.unwrap().unwrap().is_self);
  assert!(s.get_recipient(second).await.unwrap().unwrap().is_self);
}

#[tokio::test]
async fn story_eligible_contacts_skip_blocked_and_self() {
  let s = store().await;
  let (_, me) = local_account(&s).await;
  s.set_story_eligible(me, true).await.unwrap();

  let alice = contact(&s).await;
  let bob = contact(&s).await;
  let carol = contact(&s).await;
  s.set_blocked(bob, true).await.unwrap();
  let _not_eligible = s
    .get_or_insert_from_service_id(ServiceId::random())
    .await
    .unwrap();

  let eligible = s.get_story_eligible_contacts().await.unwrap();
  assert_eq!(eligible, vec![alice, carol]);
}

#[tokio::test]
async fn expire_timer_is_stored_in_seconds() {
  let s = store().await;
  let id = contact(&s).await;
  s.set_expire_messages(id, 30).await.unwrap();

  let recipient = s.get_recipient(id).await.unwrap().unwrap();
  assert_eq!(recipient.expire_messages, 30);
  assert_eq!(recipient.expires_in_millis(), 30_000);
}
