use courier_core::{
  distribution::{DistributionListPrivacyMode, NewDistributionList, StoryType},
  ids::{DistributionId, DistributionListId, RecipientId},
  store::{DistributionListStore, RecipientStore},
};

use super::{contact, store};
use crate::Error;

fn rid(id: i64) -> RecipientId { RecipientId::from_raw(id) }

// ─── Creation ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_list_and_get_it_back() {
  let s = store().await;
  let members = vec![rid(12), rid(3), rid(7)];

  let id = s
    .create_list("Close friends".into(), members.clone())
    .await
    .unwrap()
    .expect("list created");

  let record = s.get_list(id).await.unwrap().expect("list exists");
  assert_eq!(record.name, "Close friends");
  assert_eq!(record.members, members);
  assert_eq!(record.raw_members, members);
  assert_eq!(record.privacy_mode, DistributionListPrivacyMode::OnlyWith);
  assert!(record.allows_replies);
  assert!(!record.is_deleted());
}

#[tokio::test]
async fn duplicate_name_is_rejected() {
  let s = store().await;
  let first = s.create_list("Family".into(), vec![rid(1)]).await.unwrap();
  assert!(first.is_some());

  let second = s.create_list("Family".into(), vec![rid(2)]).await.unwrap();
  assert!(second.is_none());

  let lists = s.get_all_lists().await.unwrap();
  assert_eq!(lists.iter().filter(|l| l.name == "Family").count(), 1);
}

#[tokio::test]
async fn concurrent_creates_with_one_name_yield_one_list() {
  let s = store().await;
  let (a, b) = tokio::join!(
    s.create_list("Race".into(), vec![rid(1)]),
    s.create_list("Race".into(), vec![rid(2)]),
  );

  let created = [a.unwrap(), b.unwrap()];
  assert_eq!(created.iter().filter(|c| c.is_some()).count(), 1);
}

#[tokio::test]
async fn duplicate_distribution_id_is_rejected() {
  let s = store().await;
  let mut first = NewDistributionList::new("One", vec![]);
  first.distribution_id = DistributionId::random();
  let mut second = NewDistributionList::new("Two", vec![]);
  second.distribution_id = first.distribution_id;

  assert!(s.create_list_with(first).await.unwrap().is_some());
  assert!(s.create_list_with(second).await.unwrap().is_none());
}

#[tokio::test]
async fn get_members_matches_creation_order() {
  let s = store().await;
  let members = vec![rid(9), rid(4), rid(6), rid(2)];
  let id = s
    .create_list("Ordered".into(), members.clone())
    .await
    .unwrap()
    .unwrap();

  assert_eq!(s.get_members(id).await.unwrap(), members);
}

#[tokio::test]
async fn get_list_by_distribution_id() {
  let s = store().await;
  let new = NewDistributionList::new("Lookup", vec![rid(5)]);
  let distribution_id = new.distribution_id;
  let id = s.create_list_with(new).await.unwrap().unwrap();

  let record = s
    .get_list_by_distribution_id(distribution_id)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(record.id, id);
}

#[tokio::test]
async fn missing_list_reads_as_absent() {
  let s = store().await;
  let missing = DistributionListId::from_raw(404);
  assert!(s.get_list(missing).await.unwrap().is_none());
  assert!(s.get_members(missing).await.unwrap().is_empty());
}

// ─── Story type ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn story_type_follows_allows_replies() {
  let s = store().await;
  let id = s.create_list("Replies".into(), vec![]).await.unwrap().unwrap();
  assert_eq!(s.get_story_type(id).await.unwrap(), StoryType::StoryWithReplies);

  s.set_allows_replies(id, false).await.unwrap();
  assert_eq!(s.get_story_type(id).await.unwrap(), StoryType::StoryWithoutReplies);
  assert!(!s.get_list(id).await.unwrap().unwrap().allows_replies);
}

#[tokio::test]
async fn story_type_of_unknown_list_is_an_error() {
  let s = store().await;
  let missing = DistributionListId::from_raw(404);
  let err = s.get_story_type(missing).await.unwrap_err();
  assert!(matches!(err, Error::StoryTypeMissing(id) if id == missing));
}

// ─── Membership ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn remove_member_only_with_deletes_row() {
  let s = store().await;
  let id = s
    .create_list("Trim".into(), vec![rid(1), rid(2), rid(3)])
    .await
    .unwrap()
    .unwrap();

  s.remove_member_from_list(id, DistributionListPrivacyMode::OnlyWith, rid(2))
    .await
    .unwrap();
  assert_eq!(s.get_members(id).await.unwrap(), vec![rid(1), rid(3)]);
}

#[tokio::test]
async fn remove_member_all_except_adds_exclusion() {
  let s = store().await;
  let alice = contact(&s).await;
  let bob = contact(&s).await;
  let carol = contact(&s).await;

  let mut new = NewDistributionList::new("Almost everyone", vec![]);
  new.privacy_mode = DistributionListPrivacyMode::AllExcept;
  let id = s.create_list_with(new).await.unwrap().unwrap();
  assert_eq!(s.get_members(id).await.unwrap(), vec![alice, bob, carol]);

  s.remove_member_from_list(id, DistributionListPrivacyMode::AllExcept, bob)
    .await
    .unwrap();

  let record = s.get_list(id).await.unwrap().unwrap();
  assert_eq!(record.raw_members, vec![bob]);
  assert_eq!(record.members, vec![alice, carol]);
  assert_eq!(record.members_to_sync(), &[bob]);
}

#[tokio::test]
async fn all_mode_ignores_stored_rows() {
  let s = store().await;
  let alice = contact(&s).await;
  let bob = contact(&s).await;

  let id = s.create_list("Everyone".into(), vec![alice]).await.unwrap().unwrap();
  s.set_privacy_mode(id, DistributionListPrivacyMode::All).await.unwrap();

  let record = s.get_list(id).await.unwrap().unwrap();
  assert_eq!(record.members, vec![alice, bob]);
  assert!(record.raw_members.is_empty());
  assert!(record.members_to_sync().is_empty());

  // Switching back restores the opt-in rows.
  s.set_privacy_mode(id, DistributionListPrivacyMode::OnlyWith).await.unwrap();
  assert_eq!(s.get_members(id).await.unwrap(), vec![alice]);
}

#[tokio::test]
async fn reads_interleaved_with_mode_flips_stay_consistent() {
  let s = store().await;
  let alice = contact(&s).await;
  let bob = contact(&s).await;
  let carol = contact(&s).await;

  let id = s.create_list("Flip".into(), vec![alice]).await.unwrap().unwrap();
  s.add_member_to_list(id, DistributionListPrivacyMode::AllExcept, bob)
    .await
    .unwrap();

  let flips = async {
    for mode in [
      DistributionListPrivacyMode::AllExcept,
      DistributionListPrivacyMode::All,
      DistributionListPrivacyMode::OnlyWith,
    ]
    .into_iter()
    .cycle()
    .take(30)
    {
      s.set_privacy_mode(id, mode).await.unwrap();
    }
  };
  let reads = async {
    let mut records = Vec::new();
    for _ in 0..30 {
      records.push(s.get_list(id).await.unwrap().unwrap());
    }
    records
  };
  let ((), records) = tokio::join!(flips, reads);

  for record in records {
    match record.privacy_mode {
      DistributionListPrivacyMode::OnlyWith => {
        assert_eq!(record.raw_members, vec![alice]);
        assert_eq!(record.members, vec![alice]);
      }
      DistributionListPrivacyMode::AllExcept => {
        assert_eq!(record.raw_members, vec![bob]);
        assert_eq!(record.members, vec![alice, carol]);
      }
      DistributionListPrivacyMode::All => {
        assert!(record.raw_members.is_empty());
        assert_eq!(record.members, vec![alice, bob, carol]);
      }
    }
  }
}

#[tokio::test]
async fn set_members_replaces_rows_for_one_mode() {
  let s = store().await;
  let id = s
    .create_list("Swap".into(), vec![rid(1), rid(2)])
    .await
    .unwrap()
    .unwrap();
  s.add_member_to_list(id, DistributionListPrivacyMode::AllExcept, rid(8))
    .await
    .unwrap();

  s.set_members(id, DistributionListPrivacyMode::OnlyWith, vec![rid(5), rid(4)])
    .await
    .unwrap();

  assert_eq!(s.get_members(id).await.unwrap(), vec![rid(5), rid(4)]);
  assert_eq!(
    s.get_raw_members(id, DistributionListPrivacyMode::AllExcept)
      .await
      .unwrap(),
    vec![rid(8)]
  );
}

#[tokio::test]
async fn remap_recipient_merges_rows() {
  let s = store().await;
  let a = s
    .create_list("A".into(), vec![rid(1), rid(2)])
    .await
    .unwrap()
    .unwrap();
  let b = s.create_list("B".into(), vec![rid(1)]).await.unwrap().unwrap();

  s.remap_recipient(rid(1), rid(2)).await.unwrap();

  assert_eq!(s.get_members(a).await.unwrap(), vec![rid(2)]);
  assert_eq!(s.get_members(b).await.unwrap(), vec![rid(2)]);
}

// ─── Renaming and deletion ───────────────────────────────────────────────────

#[tokio::test]
async fn rename_respects_live_name_uniqueness() {
  let s = store().await;
  let a = s.create_list("A".into(), vec![]).await.unwrap().unwrap();
  let _b = s.create_list("B".into(), vec![]).await.unwrap().unwrap();

  assert!(!s.set_name(a, "B".into()).await.unwrap());
  assert!(s.set_name(a, "C".into()).await.unwrap());
  assert_eq!(s.get_list(a).await.unwrap().unwrap().name, "C");
}

#[tokio::test]
async fn delete_list_soft_deletes_and_frees_name() {
  let s = store().await;
  let id = s
    .create_list("Old".into(), vec![rid(1), rid(2)])
    .await
    .unwrap()
    .unwrap();
  let recipient = s.get_or_insert_from_distribution_list_id(id).await.unwrap();

  s.delete_list(id).await.unwrap();

  assert!(s.get_list(id).await.unwrap().is_none());
  assert!(s.get_members(id).await.unwrap().is_empty());
  assert!(
    s.get_raw_members(id, DistributionListPrivacyMode::OnlyWith)
      .await
      .unwrap()
      .is_empty()
  );
  assert!(matches!(
    s.get_story_type(id).await,
    Err(Error::StoryTypeMissing(_))
  ));

  // The recipient that addressed the list survives.
  let kept = s.get_recipient(recipient).await.unwrap().unwrap();
  assert_eq!(kept.distribution_list_id, Some(id));
  assert_eq!(s.get_or_insert_from_distribution_list_id(id).await.unwrap(), recipient);

  let reused = s.create_list("Old".into(), vec![]).await.unwrap();
  assert!(reused.is_some_and(|new_id| new_id != id));
}

// ─── My Story ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn my_story_is_seeded() {
  let s = store().await;
  let record = s
    .get_list(DistributionListId::MY_STORY)
    .await
    .unwrap()
    .expect("my story");

  assert!(record.is_my_story());
  assert_eq!(record.distribution_id, DistributionId::MY_STORY);
  assert_eq!(record.privacy_mode, DistributionListPrivacyMode::All);
  assert_eq!(
    s.get_story_type(DistributionListId::MY_STORY).await.unwrap(),
    StoryType::StoryWithReplies
  );
}

#[tokio::test]
async fn my_story_cannot_be_deleted() {
  let s = store().await;
  let err = s.delete_list(DistributionListId::MY_STORY).await.unwrap_err();
  assert!(matches!(err, Error::CannotDeleteMyStory));
  assert!(s.get_list(DistributionListId::MY_STORY).await.unwrap().is_some());
}
