//! Typed settings over a [`KeyValueStore`].
//!
//! Values are stored as JSON under dotted keys. Each accessor borrows the
//! store it is given; there is no global settings instance.

use serde::{Serialize, de::DeserializeOwned};

use crate::{Error, Result, store::KeyValueStore, story_send::StorySend};

async fn read<S, T>(store: &S, key: &str) -> Result<Option<T>>
where
  S: KeyValueStore,
  T: DeserializeOwned,
{
  let raw = store
    .get_value(key.to_owned())
    .await
    .map_err(Error::store)?;
  raw.map(|s| serde_json::from_str(&s)).transpose().map_err(Error::from)
}

async fn write<S, T>(store: &S, key: &str, value: &T) -> Result<()>
where
  S: KeyValueStore,
  T: Serialize,
{
  let raw = serde_json::to_string(value)?;
  store
    .put_value(key.to_owned(), raw)
    .await
    .map_err(Error::store)
}

// ─── Stories ─────────────────────────────────────────────────────────────────

const LATEST_STORY_SENDS: &str = "stories.latest_story_sends";

/// How many story sends are remembered.
pub const MAX_STORY_SENDS: usize = 32;

pub struct StoryValues<'a, S> {
  store: &'a S,
}

impl<'a, S: KeyValueStore> StoryValues<'a, S> {
  pub fn new(store: &'a S) -> Self { Self { store } }

  async fn sends(&self) -> Result<Vec<StorySend>> {
    Ok(read(self.store, LATEST_STORY_SENDS).await?.unwrap_or_default())
  }

  /// Remember a send, dropping the oldest beyond [`MAX_STORY_SENDS`].
  pub async fn record_story_send(&self, send: StorySend) -> Result<()> {
    let mut sends = self.sends().await?;
    sends.push(send);
    sends.sort_by_key(|s| s.timestamp);
    let overflow = sends.len().saturating_sub(MAX_STORY_SENDS);
    sends.drain(..overflow);
    write(self.store, LATEST_STORY_SENDS, &sends).await
  }

  /// Sends at or after `cutoff` (epoch ms), oldest first.
  pub async fn latest_active_story_sends(&self, cutoff: i64) -> Result<Vec<StorySend>> {
    let mut sends = self.sends().await?;
    sends.retain(|s| s.timestamp >= cutoff);
    Ok(sends)
  }
}

// ─── Notification profiles ───────────────────────────────────────────────────

const MANUALLY_ENABLED_PROFILE: &str = "notification_profile.manually_enabled_profile";
const MANUALLY_ENABLED_UNTIL: &str = "notification_profile.manually_enabled_until";
const MANUALLY_DISABLED_AT: &str = "notification_profile.manually_disabled_at";

/// Manual overrides of the notification-profile schedule. All values are
/// zero when unset.
pub struct NotificationProfileValues<'a, S> {
  store: &'a S,
}

impl<'a, S: KeyValueStore> NotificationProfileValues<'a, S> {
  pub fn new(store: &'a S) -> Self { Self { store } }

  /// Id of the profile the user switched on by hand.
  pub async fn manually_enabled_profile(&self) -> Result<i64> {
    Ok(read(self.store, MANUALLY_ENABLED_PROFILE).await?.unwrap_or(0))
  }

  pub async fn set_manually_enabled_profile(&self, profile_id: i64) -> Result<()> {
    write(self.store, MANUALLY_ENABLED_PROFILE, &profile_id).await
  }

  /// Epoch ms at which the manual override ends; `i64::MAX` for "until I turn
  /// it off".
  pub async fn manually_enabled_until(&self) -> Result<i64> {
    Ok(read(self.store, MANUALLY_ENABLED_UNTIL).await?.unwrap_or(0))
  }

  pub async fn set_manually_enabled_until(&self, until: i64) -> Result<()> {
    write(self.store, MANUALLY_ENABLED_UNTIL, &until).await
  }

  pub async fn manually_disabled_at(&self) -> Result<i64> {
    Ok(read(self.store, MANUALLY_DISABLED_AT).await?.unwrap_or(0))
  }

  pub async fn set_manually_disabled_at(&self, at: i64) -> Result<()> {
    write(self.store, MANUALLY_DISABLED_AT, &at).await
  }

  /// Whether a manual override is in force at `now` (epoch ms).
  pub async fn is_manually_enabled(&self, now: i64) -> Result<bool> {
    let profile = self.manually_enabled_profile().await?;
    let until = self.manually_enabled_until().await?;
    Ok(profile != 0 && now < until)
  }
}
