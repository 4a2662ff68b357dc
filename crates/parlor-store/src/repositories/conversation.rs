use bson::doc;
use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::options::{IndexOptions, ReturnDocument};
use mongodb::{Client, Collection, IndexModel};

use crate::error::{is_duplicate_key, Result, StoreError};
use crate::models::Conversation;

#[derive(Clone)]
pub struct ConversationRepository {
    collection: Collection<Conversation>,
}

impl ConversationRepository {
    pub fn new(client: &Client, db_name: &str) -> Self {
        let collection = client.database(db_name).collection("conversations");
        Self { collection }
    }

    pub async fn ensure_indexes(&self) -> Result<()> {
        // Partial rather than plain unique: a soft-deleted thread must not
        // block a fresh one for the same counterparty.
        let unique_counterparty = IndexModel::builder()
            .keys(doc! { "account_id": 1, "ig_user_id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .partial_filter_expression(doc! { "is_active": true })
                    .build(),
            )
            .build();
        let by_recency = IndexModel::builder()
            .keys(doc! { "account_id": 1, "last_message_at": -1 })
            .build();

        self.collection
            .create_indexes([unique_counterparty, by_recency])
            .await?;
        Ok(())
    }

    /// Atomic find-or-create for the `(account, counterparty)` thread.
    ///
    /// Runs as an upsert so concurrent first-contact events materialize
    /// exactly one document; the loser of an upsert race hits the unique
    /// index and the single retry then finds the winner. A provided
    /// non-empty username that differs from the stored one is written
    /// back, mirroring how enrichment refreshes stale display names.
    pub async fn find_or_create(
        &self,
        account_id: ObjectId,
        ig_user_id: &str,
        ig_username: Option<&str>,
    ) -> Result<Conversation> {
        let filter = doc! {
            "account_id": account_id,
            "ig_user_id": ig_user_id,
            "is_active": true,
        };
        let now = bson::DateTime::now();
        let mut set_on_insert = doc! { "unread_count": 0_i64, "created_at": now };
        if let Some(name) = ig_username {
            if !name.is_empty() {
                set_on_insert.insert("ig_username", name);
            }
        }
        let update = doc! {
            "$setOnInsert": set_on_insert,
            "$set": { "updated_at": now },
        };

        let mut conversation = None;
        for attempt in 0..2 {
            match self
                .collection
                .find_one_and_update(filter.clone(), update.clone())
                .upsert(true)
                .return_document(ReturnDocument::After)
                .await
            {
                Ok(Some(found)) => {
                    conversation = Some(found);
                    break;
                }
                Ok(None) => {
                    return Err(StoreError::Internal(
                        "conversation upsert returned no document".to_string(),
                    ))
                }
                Err(error) if attempt == 0 && is_duplicate_key(&error) => continue,
                Err(error) => return Err(error.into()),
            }
        }
        let mut conversation = conversation.ok_or_else(|| {
            StoreError::Internal("conversation upsert retry exhausted".to_string())
        })?;

        if let Some(name) = ig_username {
            if !name.is_empty() && conversation.ig_username.as_deref() != Some(name) {
                self.update_username(conversation.id, name).await?;
                conversation.ig_username = Some(name.to_string());
            }
        }

        Ok(conversation)
    }

    pub async fn update_username(&self, id: ObjectId, ig_username: &str) -> Result<()> {
        let update = doc! {
            "$set": { "ig_username": ig_username, "updated_at": bson::DateTime::now() }
        };
        self.collection.update_one(doc! { "_id": id }, update).await?;
        Ok(())
    }

    /// Fold an inbound message into the rolling summary: preview,
    /// timestamp, and one unread increment.
    pub async fn record_inbound(
        &self,
        id: ObjectId,
        preview: &str,
        at: DateTime<Utc>,
    ) -> Result<()> {
        let update = doc! {
            "$set": {
                "last_message": preview,
                "last_message_at": bson::DateTime::from_chrono(at),
                "updated_at": bson::DateTime::now(),
            },
            "$inc": { "unread_count": 1_i64 },
        };
        self.collection.update_one(doc! { "_id": id }, update).await?;
        Ok(())
    }

    /// Fold an outbound message into the rolling summary. Outbound content
    /// is definitionally seen by its author, so the unread count is left
    /// alone.
    pub async fn record_outbound(
        &self,
        id: ObjectId,
        preview: &str,
        at: DateTime<Utc>,
    ) -> Result<()> {
        let update = doc! {
            "$set": {
                "last_message": preview,
                "last_message_at": bson::DateTime::from_chrono(at),
                "updated_at": bson::DateTime::now(),
            },
        };
        self.collection.update_one(doc! { "_id": id }, update).await?;
        Ok(())
    }

    pub async fn reset_unread(&self, id: ObjectId) -> Result<()> {
        let update = doc! {
            "$set": { "unread_count": 0_i64, "updated_at": bson::DateTime::now() }
        };
        self.collection.update_one(doc! { "_id": id }, update).await?;
        Ok(())
    }

    pub async fn find_active_by_id(&self, id: ObjectId) -> Result<Option<Conversation>> {
        let filter = doc! { "_id": id, "is_active": true };
        Ok(self.collection.find_one(filter).await?)
    }

    pub async fn list_active_for_account(
        &self,
        account_id: ObjectId,
        skip: u64,
        limit: i64,
    ) -> Result<Vec<Conversation>> {
        let filter = doc! { "account_id": account_id, "is_active": true };
        let conversations = self
            .collection
            .find(filter)
            .sort(doc! { "last_message_at": -1 })
            .skip(skip)
            .limit(limit)
            .await?
            .try_collect()
            .await?;
        Ok(conversations)
    }

    pub async fn count_active_for_account(&self, account_id: ObjectId) -> Result<u64> {
        let filter = doc! { "account_id": account_id, "is_active": true };
        Ok(self.collection.count_documents(filter).await?)
    }

    pub async fn soft_delete(&self, id: ObjectId) -> Result<()> {
        let update = doc! {
            "$set": { "is_active": false, "updated_at": bson::DateTime::now() }
        };
        self.collection.update_one(doc! { "_id": id }, update).await?;
        Ok(())
    }
}
