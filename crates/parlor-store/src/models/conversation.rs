use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Upper bound on the denormalized last-message preview.
pub const PREVIEW_MAX_CHARS: usize = 500;

/// One thread between an account and a single counterparty.
///
/// `last_message` / `last_message_at` / `unread_count` are denormalized
/// from the message log; they are advisory (last-writer-wins) while the
/// log itself is the source of truth.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub account_id: ObjectId,
    /// Platform-assigned counterparty id, stable per account.
    pub ig_user_id: String,
    /// Best-effort display name; may be stale or absent.
    pub ig_username: Option<String>,
    pub last_message: Option<String>,
    #[serde(default, with = "crate::models::bson_datetime_opt")]
    pub last_message_at: Option<DateTime<Utc>>,
    pub unread_count: i64,
    pub is_active: bool,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    pub fn new(
        account_id: ObjectId,
        ig_user_id: impl Into<String>,
        ig_username: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: ObjectId::new(),
            account_id,
            ig_user_id: ig_user_id.into(),
            ig_username,
            last_message: None,
            last_message_at: None,
            unread_count: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Clip text to the preview bound without splitting a character.
pub fn clip_preview(text: &str) -> String {
    text.chars().take(PREVIEW_MAX_CHARS).collect()
}
