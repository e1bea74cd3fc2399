//! Replays sent transcripts from linked devices.
//!
//! When another of our devices sends a message (or edits one), it sends us a
//! sync copy. Applying that copy must leave the same message and attachment
//! rows as composing the message here would: both paths go through
//! [`MessageStore::insert_message_outbox`], and the transcript's timer is
//! converted from wire seconds to stored milliseconds exactly once.

use tracing::{debug, info, warn};

use crate::{
  ids::{MessageId, RecipientId, ServiceId},
  message::{Attachment, OutgoingMessage},
  recipient::Recipient,
  store::MessageStore,
  wire::{Content, DataMessage, EditMessage, Envelope, EnvelopeMetadata, Sent},
};

/// Applies sync messages from the local account's other devices.
pub struct SyncMessageProcessor<S> {
  store:           S,
  self_service_id: ServiceId,
}

impl<S: MessageStore> SyncMessageProcessor<S> {
  pub fn new(store: S, self_service_id: ServiceId) -> Self { Self { store, self_service_id } }

  pub fn store(&self) -> &S { &self.store }

  /// Process one decrypted envelope and return the ids of inserted messages.
  ///
  /// Content that cannot be applied (foreign source, missing edit target,
  /// unresolvable destination) is logged and yields an empty result.
  pub async fn process(
    &self,
    envelope: &Envelope,
    content: &Content,
    metadata: &EnvelopeMetadata,
    server_delivered_timestamp: i64,
  ) -> Result<Vec<MessageId>, S::Error> {
    debug!(
      timestamp = envelope.timestamp,
      source_device = metadata.source_device_id,
      server_delivered_timestamp,
      "processing envelope"
    );

    if metadata.source_service_id != self.self_service_id {
      warn!(source = %metadata.source_service_id, "ignoring sync message from another account");
      return Ok(Vec::new());
    }

    let Some(sent) = content.sync_message.as_ref().and_then(|sync| sync.sent.as_ref()) else {
      debug!(timestamp = envelope.timestamp, "no sent transcript; nothing to do");
      return Ok(Vec::new());
    };

    if let Some(edit) = &sent.edit_message {
      self.handle_synchronize_sent_edit(sent, edit).await
    } else if let Some(message) = &sent.message {
      self.handle_synchronize_sent_data(sent, message).await
    } else {
      warn!(timestamp = sent.timestamp, "sent transcript carries no message");
      Ok(Vec::new())
    }
  }

  async fn self_recipient(&self) -> Result<RecipientId, S::Error> {
    self.store.get_or_insert_from_service_id(self.self_service_id).await
  }

  /// Resolve where a transcript was sent: the group, if the message has a
  /// group context, otherwise the individual destination.
  async fn resolve_destination(
    &self,
    sent: &Sent,
    message: &DataMessage,
  ) -> Result<Option<Recipient>, S::Error> {
    let id = if let Some(group) = &message.group_context {
      self.store.get_or_insert_from_group_id(group.group_id.clone()).await?
    } else if let Some(service_id) = sent.destination_service_id {
      self.store.get_or_insert_from_service_id(service_id).await?
    } else {
      return Ok(None);
    };
    self.store.get_recipient(id).await
  }

  // ── Sent data messages ────────────────────────────────────────────────────

  async fn handle_synchronize_sent_data(
    &self,
    sent: &Sent,
    message: &DataMessage,
  ) -> Result<Vec<MessageId>, S::Error> {
    let Some(recipient) = self.resolve_destination(sent, message).await? else {
      warn!(timestamp = sent.timestamp, "sent transcript has no destination");
      return Ok(Vec::new());
    };

    let author = self.self_recipient().await?;
    if self.store.get_message_for(sent.timestamp, author).await?.is_some() {
      warn!(timestamp = sent.timestamp, "duplicate sent transcript");
      return Ok(Vec::new());
    }

    let mut inserted = Vec::new();
    if recipient.expire_messages != message.expire_timer {
      inserted.push(
        self
          .handle_synchronize_sent_expiration_update(sent, &recipient, message.expire_timer)
          .await?,
      );
    }

    let expires_in = message.expires_in_millis();
    let thread_id = self.store.get_or_create_thread_id_for(recipient.id).await?;
    let attachments = message.attachments.iter().map(Attachment::from_pointer).collect();
    let outgoing = OutgoingMessage::text(
      recipient.id,
      message.body.clone().unwrap_or_default(),
      expires_in,
      sent.timestamp,
      message.body_ranges.clone(),
    )
    .with_attachments(attachments);

    let message_id = self.store.insert_message_outbox(outgoing, thread_id).await?;
    self.store.mark_as_sent(message_id, true).await?;

    if expires_in > 0 {
      self
        .store
        .mark_expire_started(message_id, sent.expiration_start_timestamp)
        .await?;
    }

    info!(
      %message_id,
      timestamp = sent.timestamp,
      media = message.is_media_message(),
      "applied sent transcript"
    );
    inserted.push(message_id);
    Ok(inserted)
  }

  /// The timer changed along with this message; record the change just
  /// before it so the thread reads in order.
  async fn handle_synchronize_sent_expiration_update(
    &self,
    sent: &Sent,
    recipient: &Recipient,
    expire_timer: u32,
  ) -> Result<MessageId, S::Error> {
    let thread_id = self.store.get_or_create_thread_id_for(recipient.id).await?;
    let update = OutgoingMessage::expiration_update(
      recipient.id,
      sent.timestamp - 1,
      i64::from(expire_timer) * 1000,
    );

    let message_id = self.store.insert_message_outbox(update, thread_id).await?;
    self.store.mark_as_sent(message_id, true).await?;
    self.store.set_expire_messages(recipient.id, expire_timer).await?;

    info!(recipient = %recipient.id, expire_timer, "applied expiration timer update");
    Ok(message_id)
  }

  // ── Sent edits ────────────────────────────────────────────────────────────

  async fn handle_synchronize_sent_edit(
    &self,
    sent: &Sent,
    edit: &EditMessage,
  ) -> Result<Vec<MessageId>, S::Error> {
    let author = self.self_recipient().await?;
    if self.store.get_message_for(sent.timestamp, author).await?.is_some() {
      warn!(timestamp = sent.timestamp, "duplicate edit transcript");
      return Ok(Vec::new());
    }

    let Some(target) = self
      .store
      .get_message_for(edit.target_sent_timestamp, author)
      .await?
    else {
      warn!(
        target_sent_timestamp = edit.target_sent_timestamp,
        "unable to find target message for edit"
      );
      return Ok(Vec::new());
    };

    if target.remote_deleted {
      warn!(target = %target.id, "ignoring edit of a remotely deleted message");
      return Ok(Vec::new());
    }

    let message = &edit.data_message;
    let Some(recipient) = self.resolve_destination(sent, message).await? else {
      warn!(timestamp = sent.timestamp, "edit transcript has no destination");
      return Ok(Vec::new());
    };

    // Later edits still name the original's timestamp but apply on top of
    // the newest revision.
    let latest = match target.latest_revision_id {
      Some(latest_id) => match self.store.get_message(latest_id).await? {
        Some(latest) => latest,
        None => {
          warn!(target = %target.id, latest = %latest_id, "latest revision is missing");
          target.clone()
        }
      },
      None => target.clone(),
    };

    let body = message.body.clone().unwrap_or_default();
    if latest.body == body && latest.body_ranges == message.body_ranges {
      warn!(target = %latest.id, "edit does not change the message");
      return Ok(Vec::new());
    }

    // The edit keeps the target's timer: `target.expires_in` is already in
    // milliseconds and the countdown continues from the original start.
    let thread_id = self.store.get_or_create_thread_id_for(recipient.id).await?;
    let outgoing = OutgoingMessage::text(
      recipient.id,
      body,
      target.expires_in,
      sent.timestamp,
      message.body_ranges.clone(),
    )
    .editing(latest.id);

    let message_id = self.store.insert_message_outbox(outgoing, thread_id).await?;
    self.store.mark_as_sent(message_id, true).await?;

    if target.expire_started > 0 {
      self
        .store
        .mark_expire_started(message_id, target.expire_started)
        .await?;
    }

    info!(%message_id, target = %latest.id, original = %target.id, "applied edit transcript");
    Ok(vec![message_id])
  }
}
