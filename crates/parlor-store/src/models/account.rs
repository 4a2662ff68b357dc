use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One connected Instagram professional account.
///
/// `page_access_token` is the long-lived credential used for every Graph
/// API call on behalf of this account; it must never be serialized into an
/// API response (the HTTP layer maps accounts to token-free DTOs).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    /// Owning user in the surrounding auth system.
    pub user_id: ObjectId,
    /// Facebook page backing the Instagram account.
    pub page_id: String,
    /// Instagram business account id, globally unique.
    pub ig_business_id: String,
    pub page_access_token: String,
    pub username: Option<String>,
    pub profile_picture_url: Option<String>,
    pub followers_count: i64,
    pub is_active: bool,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Account {
    pub fn new(
        user_id: ObjectId,
        page_id: impl Into<String>,
        ig_business_id: impl Into<String>,
        page_access_token: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: ObjectId::new(),
            user_id,
            page_id: page_id.into(),
            ig_business_id: ig_business_id.into(),
            page_access_token: page_access_token.into(),
            username: None,
            profile_picture_url: None,
            followers_count: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Node id the messaging endpoint is scoped to. The page id routes
    /// sends when set; accounts registered without one fall back to the
    /// business id.
    pub fn send_scope(&self) -> &str {
        if self.page_id.is_empty() {
            &self.ig_business_id
        } else {
            &self.page_id
        }
    }
}

/// Partial update applied to an account; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct AccountUpdate {
    pub username: Option<String>,
    pub profile_picture_url: Option<String>,
    pub followers_count: Option<i64>,
    pub page_access_token: Option<String>,
}

impl AccountUpdate {
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.profile_picture_url.is_none()
            && self.followers_count.is_none()
            && self.page_access_token.is_none()
    }
}
