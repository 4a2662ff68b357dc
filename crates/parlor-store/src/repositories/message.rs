use bson::doc;
use bson::oid::ObjectId;
use futures::TryStreamExt;
use mongodb::options::IndexOptions;
use mongodb::{Client, Collection, IndexModel};

use crate::error::{is_duplicate_key, Result};
use crate::models::Message;

/// Outcome of an idempotent insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageInsert {
    Inserted(ObjectId),
    /// The platform message id already exists; nothing was written.
    Duplicate,
}

#[derive(Clone)]
pub struct MessageRepository {
    collection: Collection<Message>,
}

impl MessageRepository {
    pub fn new(client: &Client, db_name: &str) -> Self {
        let collection = client.database(db_name).collection("messages");
        Self { collection }
    }

    pub async fn ensure_indexes(&self) -> Result<()> {
        // Sparse because only inbound messages carry a platform id;
        // documents without the field stay out of the index entirely.
        let unique_message_id = IndexModel::builder()
            .keys(doc! { "message_id": 1 })
            .options(IndexOptions::builder().unique(true).sparse(true).build())
            .build();
        let by_recency = IndexModel::builder()
            .keys(doc! { "conversation_id": 1, "sent_at": -1 })
            .build();
        let unread_scan = IndexModel::builder()
            .keys(doc! { "conversation_id": 1, "direction": 1, "is_read": 1 })
            .build();

        self.collection
            .create_indexes([unique_message_id, by_recency, unread_scan])
            .await?;
        Ok(())
    }

    /// Inserts a message, treating a duplicate-key rejection on the
    /// platform message id as a successful no-op. Redelivered webhook
    /// events funnel through here, so the unique index is the authority
    /// on whether an event was already processed.
    pub async fn insert(&self, message: &Message) -> Result<MessageInsert> {
        match self.collection.insert_one(message).await {
            Ok(_) => Ok(MessageInsert::Inserted(message.id)),
            Err(error) if is_duplicate_key(&error) => Ok(MessageInsert::Duplicate),
            Err(error) => Err(error.into()),
        }
    }

    pub async fn exists_by_message_id(&self, message_id: &str) -> Result<bool> {
        let filter = doc! { "message_id": message_id };
        Ok(self.collection.find_one(filter).await?.is_some())
    }

    pub async fn list_for_conversation(
        &self,
        conversation_id: ObjectId,
        skip: u64,
        limit: i64,
    ) -> Result<Vec<Message>> {
        let filter = doc! { "conversation_id": conversation_id };
        let messages = self
            .collection
            .find(filter)
            .sort(doc! { "sent_at": -1 })
            .skip(skip)
            .limit(limit)
            .await?
            .try_collect()
            .await?;
        Ok(messages)
    }

    pub async fn count_for_conversation(&self, conversation_id: ObjectId) -> Result<u64> {
        let filter = doc! { "conversation_id": conversation_id };
        Ok(self.collection.count_documents(filter).await?)
    }

    /// Flips every unread inbound message in the conversation to read and
    /// returns how many documents changed.
    pub async fn mark_inbound_read(&self, conversation_id: ObjectId) -> Result<u64> {
        let filter = doc! {
            "conversation_id": conversation_id,
            "direction": "inbound",
            "is_read": false,
        };
        let update = doc! {
            "$set": { "is_read": true, "updated_at": bson::DateTime::now() }
        };
        let result = self.collection.update_many(filter, update).await?;
        Ok(result.modified_count)
    }
}
