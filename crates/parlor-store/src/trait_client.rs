use async_trait::async_trait;
use bson::oid::ObjectId;
use chrono::{DateTime, Utc};

use crate::client::StoreClient;
use crate::error::Result;
use crate::models::{Account, Conversation, Message};
use crate::repositories::MessageInsert;

/// Storage operations the ingestion and messaging flows depend on.
///
/// The processing crates hold an `Arc<dyn InboxStore>` rather than the
/// concrete client so tests can substitute an in-memory double.
#[async_trait]
pub trait InboxStore: Send + Sync {
    async fn account_by_business_id(&self, ig_business_id: &str) -> Result<Option<Account>>;

    async fn account_by_page_id(&self, page_id: &str) -> Result<Option<Account>>;

    async fn account_by_id(&self, id: ObjectId) -> Result<Option<Account>>;

    async fn account_owned_by(&self, id: ObjectId, user_id: ObjectId)
        -> Result<Option<Account>>;

    async fn conversation_by_id(&self, id: ObjectId) -> Result<Option<Conversation>>;

    async fn find_or_create_conversation(
        &self,
        account_id: ObjectId,
        ig_user_id: &str,
        ig_username: Option<&str>,
    ) -> Result<Conversation>;

    async fn message_exists(&self, message_id: &str) -> Result<bool>;

    async fn insert_message(&self, message: &Message) -> Result<MessageInsert>;

    async fn record_inbound(
        &self,
        conversation_id: ObjectId,
        preview: &str,
        at: DateTime<Utc>,
    ) -> Result<()>;

    async fn record_outbound(
        &self,
        conversation_id: ObjectId,
        preview: &str,
        at: DateTime<Utc>,
    ) -> Result<()>;

    /// Marks every unread inbound message read, zeroes the conversation
    /// counter, and returns how many messages flipped.
    async fn mark_conversation_read(&self, conversation_id: ObjectId) -> Result<u64>;
}

#[async_trait]
impl InboxStore for StoreClient {
    async fn account_by_business_id(&self, ig_business_id: &str) -> Result<Option<Account>> {
        self.accounts().find_active_by_business_id(ig_business_id).await
    }

    async fn account_by_page_id(&self, page_id: &str) -> Result<Option<Account>> {
        self.accounts().find_active_by_page_id(page_id).await
    }

    async fn account_by_id(&self, id: ObjectId) -> Result<Option<Account>> {
        self.accounts().find_active_by_id(id).await
    }

    async fn account_owned_by(
        &self,
        id: ObjectId,
        user_id: ObjectId,
    ) -> Result<Option<Account>> {
        self.accounts().find_active_owned(id, user_id).await
    }

    async fn conversation_by_id(&self, id: ObjectId) -> Result<Option<Conversation>> {
        self.conversations().find_active_by_id(id).await
    }

    async fn find_or_create_conversation(
        &self,
        account_id: ObjectId,
        ig_user_id: &str,
        ig_username: Option<&str>,
    ) -> Result<Conversation> {
        self.conversations()
            .find_or_create(account_id, ig_user_id, ig_username)
            .await
    }

    async fn message_exists(&self, message_id: &str) -> Result<bool> {
        self.messages().exists_by_message_id(message_id).await
    }

    async fn insert_message(&self, message: &Message) -> Result<MessageInsert> {
        self.messages().insert(message).await
    }

    async fn record_inbound(
        &self,
        conversation_id: ObjectId,
        preview: &str,
        at: DateTime<Utc>,
    ) -> Result<()> {
        self.conversations().record_inbound(conversation_id, preview, at).await
    }

    async fn record_outbound(
        &self,
        conversation_id: ObjectId,
        preview: &str,
        at: DateTime<Utc>,
    ) -> Result<()> {
        self.conversations().record_outbound(conversation_id, preview, at).await
    }

    async fn mark_conversation_read(&self, conversation_id: ObjectId) -> Result<u64> {
        let flipped = self.messages().mark_inbound_read(conversation_id).await?;
        self.conversations().reset_unread(conversation_id).await?;
        Ok(flipped)
    }
}
