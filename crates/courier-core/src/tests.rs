//! Unit tests for the pure types and the typed settings accessors.

use std::{collections::HashMap, convert::Infallible, sync::Mutex};

use uuid::Uuid;

use crate::{
  distribution::{
    DistributionListPrivacyMode, DistributionListRecord, NewDistributionList, StoryType,
  },
  ids::{DistributionId, DistributionListId, GroupId, RecipientId, ServiceId},
  message::types,
  recipient::{Recipient, RecipientKind},
  selection::SelectionState,
  settings::{MAX_STORY_SENDS, NotificationProfileValues, StoryValues},
  store::{KeyValueStore, Store},
  story_send::{Identifier, StorySend},
};

fn rid(id: i64) -> RecipientId { RecipientId::from_raw(id) }

fn record(mode: DistributionListPrivacyMode, raw: &[i64]) -> DistributionListRecord {
  DistributionListRecord {
    id:                   DistributionListId::from_raw(7),
    name:                 "Close friends".into(),
    distribution_id:      DistributionId::random(),
    allows_replies:       true,
    raw_members:          raw.iter().copied().map(rid).collect(),
    members:              raw.iter().copied().map(rid).collect(),
    deleted_at_timestamp: 0,
    is_unknown:           false,
    privacy_mode:         mode,
  }
}

fn recipient(kind: RecipientKind) -> Recipient {
  Recipient {
    id: rid(9),
    kind,
    service_id: None,
    group_id: None,
    distribution_list_id: None,
    expire_messages: 0,
    blocked: false,
    story_eligible: false,
    is_self: false,
  }
}

// ─── Distribution list record ────────────────────────────────────────────────

#[test]
fn members_to_sync_is_empty_for_all() {
  let r = record(DistributionListPrivacyMode::All, &[1, 2]);
  assert!(r.members_to_sync().is_empty());
}

#[test]
fn members_to_sync_is_raw_members_otherwise() {
  let only = record(DistributionListPrivacyMode::OnlyWith, &[3, 1]);
  assert_eq!(only.members_to_sync(), &[rid(3), rid(1)]);

  let except = record(DistributionListPrivacyMode::AllExcept, &[5]);
  assert_eq!(except.members_to_sync(), &[rid(5)]);
}

#[test]
fn record_selection_follows_privacy_mode() {
  let only = record(DistributionListPrivacyMode::OnlyWith, &[1]);
  assert!(only.selection().contains(&rid(1)));
  assert!(!only.selection().contains(&rid(2)));

  let except = record(DistributionListPrivacyMode::AllExcept, &[1]);
  assert!(!except.selection().contains(&rid(1)));
  assert!(except.selection().contains(&rid(2)));

  let all = record(DistributionListPrivacyMode::All, &[1]);
  assert!(all.selection().contains(&rid(1)));
}

#[test]
fn new_list_defaults() {
  let list = NewDistributionList::new("Family", vec![rid(1)]);
  assert_eq!(list.privacy_mode, DistributionListPrivacyMode::OnlyWith);
  assert!(list.allows_replies);
  assert!(!list.is_unknown);
  assert_ne!(list.distribution_id, DistributionId::MY_STORY);
}

#[test]
fn privacy_mode_string_roundtrip() {
  for mode in [
    DistributionListPrivacyMode::OnlyWith,
    DistributionListPrivacyMode::AllExcept,
    DistributionListPrivacyMode::All,
  ] {
    let parsed: DistributionListPrivacyMode = mode.as_ref().parse().unwrap();
    assert_eq!(parsed, mode);
  }
  assert_eq!(DistributionListPrivacyMode::AllExcept.to_string(), "ALL_EXCEPT");
}

// ─── Story type ──────────────────────────────────────────────────────────────

#[test]
fn story_type_codes() {
  for code in 0..=4 {
    assert_eq!(StoryType::from_code(code).unwrap().code(), code);
  }
  assert!(StoryType::from_code(9).is_err());
}

#[test]
fn story_type_predicates() {
  assert_eq!(StoryType::for_replies(true), StoryType::StoryWithReplies);
  assert_eq!(StoryType::for_replies(false), StoryType::StoryWithoutReplies);
  assert!(!StoryType::None.is_story());
  assert!(StoryType::TextStoryWithReplies.is_story_with_replies());
  assert_eq!(
    StoryType::StoryWithoutReplies.to_text_story_type(),
    StoryType::TextStoryWithoutReplies
  );
  assert!(StoryType::StoryWithReplies.to_text_story_type().is_text_story());
  assert_eq!(StoryType::None.to_text_story_type(), StoryType::None);
}

// ─── Selection state ─────────────────────────────────────────────────────────

#[test]
fn includes_toggle_and_count() {
  let s = SelectionState::<i64>::empty();
  assert!(!s.is_not_empty(10));

  let s = s.toggle(4).toggle(5);
  assert!(s.contains(&4));
  assert_eq!(s.count(10), 2);

  let s = s.toggle(4);
  assert!(!s.contains(&4));
  assert_eq!(s.count(10), 1);
  assert!(!s.is_exclusionary());
}

#[test]
fn excludes_toggle_and_count() {
  let s = SelectionState::<i64>::select_all();
  assert!(s.contains(&1));
  assert_eq!(s.count(3), 3);

  let s = s.toggle(1);
  assert!(!s.contains(&1));
  assert_eq!(s.count(3), 2);
  assert!(s.selected().contains(&1));
  assert!(s.is_exclusionary());

  let s = s.toggle(2).toggle(3);
  assert!(!s.is_not_empty(3));
}

// ─── Story sends ─────────────────────────────────────────────────────────────

#[test]
fn story_send_for_group_and_list() {
  let mut group = recipient(RecipientKind::Group);
  group.group_id = Some(GroupId::new("g1"));
  let send = StorySend::new_send(&group, 100).unwrap();
  assert_eq!(send.identifier, Identifier::Group(GroupId::new("g1")));
  assert!(send.identifier.matches(&group));

  let mut list = recipient(RecipientKind::DistributionList);
  list.distribution_list_id = Some(DistributionListId::from_raw(4));
  let send = StorySend::new_send(&list, 100).unwrap();
  assert!(send.identifier.matches(&list));
  assert!(!send.identifier.matches(&group));
}

#[test]
fn story_send_to_individual_fails() {
  let mut person = recipient(RecipientKind::Individual);
  person.service_id = Some(ServiceId::from_uuid(Uuid::new_v4()));
  assert!(matches!(
    StorySend::new_send(&person, 1),
    Err(crate::Error::NotAStoryTarget(_))
  ));
}

// ─── Message types ───────────────────────────────────────────────────────────

#[test]
fn describe_message_type() {
  let t = types::BASE_SENT_TYPE | types::SECURE_MESSAGE_BIT | types::PUSH_MESSAGE_BIT;
  assert_eq!(types::describe(t), "SENT|PUSH|SECURE");
  assert!(types::is_outgoing(t));
  assert!(types::is_sent(t));
  assert!(!types::is_outgoing(types::BASE_INBOX_TYPE));
  assert!(types::is_pending(types::BASE_SENDING_TYPE));
}

// ─── Settings ────────────────────────────────────────────────────────────────

#[derive(Default)]
struct MemoryKv(Mutex<HashMap<String, String>>);

impl Store for MemoryKv {
  type Error = Infallible;
}

impl KeyValueStore for MemoryKv {
  async fn get_value(&self, key: String) -> Result<Option<String>, Infallible> {
    Ok(self.0.lock().unwrap().get(&key).cloned())
  }

  async fn put_value(&self, key: String, value: String) -> Result<(), Infallible> {
    self.0.lock().unwrap().insert(key, value);
    Ok(())
  }

  async fn remove_value(&self, key: String) -> Result<(), Infallible> {
    self.0.lock().unwrap().remove(&key);
    Ok(())
  }
}

fn list_send(ts: i64) -> StorySend {
  StorySend {
    timestamp:  ts,
    identifier: Identifier::DistributionList(DistributionListId::MY_STORY),
  }
}

#[tokio::test]
async fn story_sends_filtered_by_cutoff() {
  let kv = MemoryKv::default();
  let stories = StoryValues::new(&kv);

  stories.record_story_send(list_send(300)).await.unwrap();
  stories.record_story_send(list_send(100)).await.unwrap();
  stories.record_story_send(list_send(200)).await.unwrap();

  let active = stories.latest_active_story_sends(200).await.unwrap();
  let stamps: Vec<_> = active.iter().map(|s| s.timestamp).collect();
  assert_eq!(stamps, [200, 300]);
}

#[tokio::test]
async fn story_sends_are_capped() {
  let kv = MemoryKv::default();
  let stories = StoryValues::new(&kv);

  for ts in 0..(MAX_STORY_SENDS as i64 + 5) {
    stories.record_story_send(list_send(ts)).await.unwrap();
  }

  let all = stories.latest_active_story_sends(0).await.unwrap();
  assert_eq!(all.len(), MAX_STORY_SENDS);
  assert_eq!(all[0].timestamp, 5);
}

#[tokio::test]
async fn notification_profile_override() {
  let kv = MemoryKv::default();
  let profiles = NotificationProfileValues::new(&kv);

  assert_eq!(profiles.manually_enabled_profile().await.unwrap(), 0);
  assert!(!profiles.is_manually_enabled(1_000).await.unwrap());

  profiles.set_manually_enabled_profile(3).await.unwrap();
  profiles.set_manually_enabled_until(2_000).await.unwrap();
  assert!(profiles.is_manually_enabled(1_000).await.unwrap());
  assert!(!profiles.is_manually_enabled(2_000).await.unwrap());

  profiles.set_manually_disabled_at(1_500).await.unwrap();
  assert_eq!(profiles.manually_disabled_at().await.unwrap(), 1_500);
}
