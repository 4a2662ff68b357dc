use bson::doc;
use bson::oid::ObjectId;
use futures::TryStreamExt;
use mongodb::options::IndexOptions;
use mongodb::{Client, Collection, IndexModel};

use crate::error::Result;
use crate::models::{Account, AccountUpdate};

#[derive(Clone)]
pub struct AccountRepository {
    collection: Collection<Account>,
}

impl AccountRepository {
    pub fn new(client: &Client, db_name: &str) -> Self {
        let collection = client.database(db_name).collection("accounts");
        Self { collection }
    }

    pub async fn ensure_indexes(&self) -> Result<()> {
        let unique_business_id = IndexModel::builder()
            .keys(doc! { "ig_business_id": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        let by_page_id = IndexModel::builder().keys(doc! { "page_id": 1 }).build();
        let by_user = IndexModel::builder().keys(doc! { "user_id": 1 }).build();

        self.collection
            .create_indexes([unique_business_id, by_page_id, by_user])
            .await?;
        Ok(())
    }

    pub async fn insert(&self, account: &Account) -> Result<ObjectId> {
        self.collection.insert_one(account).await?;
        Ok(account.id)
    }

    pub async fn find_active_by_id(&self, id: ObjectId) -> Result<Option<Account>> {
        let filter = doc! { "_id": id, "is_active": true };
        Ok(self.collection.find_one(filter).await?)
    }

    /// Active account with the given id that is owned by `user_id`.
    pub async fn find_active_owned(
        &self,
        id: ObjectId,
        user_id: ObjectId,
    ) -> Result<Option<Account>> {
        let filter = doc! { "_id": id, "user_id": user_id, "is_active": true };
        Ok(self.collection.find_one(filter).await?)
    }

    pub async fn find_active_by_business_id(&self, ig_business_id: &str) -> Result<Option<Account>> {
        let filter = doc! { "ig_business_id": ig_business_id, "is_active": true };
        Ok(self.collection.find_one(filter).await?)
    }

    pub async fn find_active_by_page_id(&self, page_id: &str) -> Result<Option<Account>> {
        let filter = doc! { "page_id": page_id, "is_active": true };
        Ok(self.collection.find_one(filter).await?)
    }

    pub async fn list_active_for_user(
        &self,
        user_id: ObjectId,
        skip: u64,
        limit: i64,
    ) -> Result<Vec<Account>> {
        let filter = doc! { "user_id": user_id, "is_active": true };
        let accounts = self
            .collection
            .find(filter)
            .sort(doc! { "created_at": -1 })
            .skip(skip)
            .limit(limit)
            .await?
            .try_collect()
            .await?;
        Ok(accounts)
    }

    /// Admin view across all owners.
    pub async fn list_active(&self, skip: u64, limit: i64) -> Result<Vec<Account>> {
        let filter = doc! { "is_active": true };
        let accounts = self
            .collection
            .find(filter)
            .sort(doc! { "created_at": -1 })
            .skip(skip)
            .limit(limit)
            .await?
            .try_collect()
            .await?;
        Ok(accounts)
    }

    /// Whether any account (active or not) already claims this business id.
    pub async fn business_id_taken(&self, ig_business_id: &str) -> Result<bool> {
        let filter = doc! { "ig_business_id": ig_business_id };
        Ok(self.collection.find_one(filter).await?.is_some())
    }

    pub async fn update_profile(&self, id: ObjectId, update: &AccountUpdate) -> Result<()> {
        let mut set = doc! { "updated_at": bson::DateTime::now() };
        if let Some(ref username) = update.username {
            set.insert("username", username.trim());
        }
        if let Some(ref url) = update.profile_picture_url {
            set.insert("profile_picture_url", url);
        }
        if let Some(count) = update.followers_count {
            set.insert("followers_count", count);
        }
        if let Some(ref token) = update.page_access_token {
            set.insert("page_access_token", token);
        }

        self.collection
            .update_one(doc! { "_id": id }, doc! { "$set": set })
            .await?;
        Ok(())
    }

    pub async fn soft_delete(&self, id: ObjectId) -> Result<()> {
        let update = doc! {
            "$set": { "is_active": false, "updated_at": bson::DateTime::now() }
        };
        self.collection.update_one(doc! { "_id": id }, update).await?;
        Ok(())
    }
}
