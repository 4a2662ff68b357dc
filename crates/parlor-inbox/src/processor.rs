use std::sync::Arc;

use parlor_graph::GraphApi;
use parlor_store::{clip_preview, Account, InboxStore, Message, MessageInsert};
use serde_json::Value;

use crate::error::Result;
use crate::events::{
    event_timestamp, normalize_attachments, EventPayload, MessagePayload, MessagingEvent,
    WebhookEnvelope,
};
use crate::resolver::AccountResolver;

/// Fixed acknowledgement body for webhook deliveries. The platform
/// retries on anything else, so processing failures are logged and this
/// is returned regardless.
pub const EVENT_ACK: &str = "EVENT_RECEIVED";

const SUBSCRIBE_MODE: &str = "subscribe";

/// Receives webhook deliveries and folds them into the store.
pub struct WebhookProcessor {
    store: Arc<dyn InboxStore>,
    graph: Arc<dyn GraphApi>,
    resolver: AccountResolver,
    verify_token: String,
}

impl WebhookProcessor {
    pub fn new(
        store: Arc<dyn InboxStore>,
        graph: Arc<dyn GraphApi>,
        verify_token: impl Into<String>,
    ) -> Self {
        let resolver = AccountResolver::new(store.clone());
        Self {
            store,
            graph,
            resolver,
            verify_token: verify_token.into(),
        }
    }

    pub fn resolver(&self) -> &AccountResolver {
        &self.resolver
    }

    /// Subscription handshake. Echoes the challenge when the mode is
    /// `subscribe` and the token matches the shared verify token.
    pub fn verify(&self, mode: &str, token: &str, challenge: &str) -> Option<String> {
        if mode == SUBSCRIBE_MODE && token == self.verify_token {
            tracing::info!("Webhook verified successfully");
            return Some(challenge.to_string());
        }
        tracing::warn!(
            mode,
            token_match = token == self.verify_token,
            "Webhook verification failed"
        );
        None
    }

    /// Processes one delivery. Every sub-event is handled independently;
    /// a failure is logged and its siblings still run. Always returns the
    /// fixed acknowledgement.
    pub async fn ingest(&self, delivery: Value) -> &'static str {
        let envelope: WebhookEnvelope = match serde_json::from_value(delivery) {
            Ok(envelope) => envelope,
            Err(error) => {
                tracing::warn!("Undecodable webhook delivery: {error}");
                return EVENT_ACK;
            }
        };
        if envelope.entry.is_empty() {
            tracing::warn!("Empty webhook entry");
            return EVENT_ACK;
        }

        for entry in &envelope.entry {
            for raw_event in &entry.messaging {
                let event: MessagingEvent = match serde_json::from_value(raw_event.clone()) {
                    Ok(event) => event,
                    Err(error) => {
                        tracing::warn!("Skipping undecodable messaging event: {error}");
                        continue;
                    }
                };
                if let Err(error) = self.process_event(&event).await {
                    tracing::error!("Error processing webhook event: {error}");
                }
            }
        }

        EVENT_ACK
    }

    async fn process_event(&self, event: &MessagingEvent) -> Result<()> {
        let (sender_id, recipient_id) = match (event.sender_id(), event.recipient_id()) {
            (Some(sender_id), Some(recipient_id)) => (sender_id, recipient_id),
            _ => {
                tracing::warn!("Missing sender or recipient ID in webhook event");
                return Ok(());
            }
        };

        let account = match self.resolver.resolve_recipient(recipient_id).await? {
            Some(account) => account,
            None => {
                tracing::warn!(recipient_id, "No account registered for recipient");
                return Ok(());
            }
        };

        match event.payload() {
            EventPayload::Message(payload) => {
                self.process_message(&account, sender_id, event.timestamp, payload)
                    .await
            }
            EventPayload::Reaction(reaction) => {
                tracing::info!(sender_id, "Reaction event received: {reaction}");
                Ok(())
            }
            EventPayload::Read(read) => {
                tracing::info!(sender_id, "Read receipt received: {read}");
                Ok(())
            }
            EventPayload::Unknown => Ok(()),
        }
    }

    async fn process_message(
        &self,
        account: &Account,
        sender_id: &str,
        timestamp: Option<i64>,
        payload: &MessagePayload,
    ) -> Result<()> {
        let message_id = match payload.mid.as_deref() {
            Some(mid) if !mid.is_empty() => mid,
            _ => {
                tracing::warn!("Message ID missing in webhook event");
                return Ok(());
            }
        };

        // At-least-once delivery: the platform redelivers identical
        // events, sometimes hours apart. The message id is the sole
        // deduplication key.
        if self.store.message_exists(message_id).await? {
            tracing::info!(message_id, "Duplicate message ignored");
            return Ok(());
        }

        let ig_username = self
            .enrich_username(sender_id, &account.page_access_token)
            .await;

        let conversation = self
            .store
            .find_or_create_conversation(account.id, sender_id, ig_username.as_deref())
            .await?;

        let attachments = normalize_attachments(&payload.attachments);
        let sent_at = event_timestamp(timestamp);
        let message = Message::inbound(
            conversation.id,
            account.id,
            message_id,
            sender_id,
            payload.text.clone(),
            attachments,
            sent_at,
        );

        // A concurrent delivery of the same event may have won the insert
        // between the lookup above and here; the unique index settles it.
        if let MessageInsert::Duplicate = self.store.insert_message(&message).await? {
            tracing::info!(message_id, "Duplicate message ignored");
            return Ok(());
        }

        let preview_source = match payload.text.as_deref() {
            Some(text) if !text.is_empty() => text.to_string(),
            _ => format!("[{} attachment(s)]", payload.attachments.len()),
        };
        // Insert and preview update are two writes, not a transaction. A
        // crash between them leaves this message behind a stale preview
        // until the next message overwrites it.
        self.store
            .record_inbound(conversation.id, &clip_preview(&preview_source), sent_at)
            .await?;

        tracing::info!(
            message_id,
            sender_id,
            conversation_id = %conversation.id,
            "Message processed"
        );
        Ok(())
    }

    /// Best-effort username lookup. Failure is logged and reported as an
    /// absent value; it never blocks persistence.
    async fn enrich_username(&self, sender_id: &str, access_token: &str) -> Option<String> {
        match self.graph.user_profile(sender_id, access_token).await {
            Ok(profile) => profile.usable_username().map(str::to_string),
            Err(error) => {
                tracing::warn!(sender_id, "Failed to fetch username: {error}");
                None
            }
        }
    }
}
