mod account;
mod conversation;
mod message;

pub use account::{Account, AccountUpdate};
pub use conversation::{clip_preview, Conversation, PREVIEW_MAX_CHARS};
pub use message::{Attachment, AttachmentKind, Direction, Message};

/// Serde adapter for optional datetimes stored as BSON datetimes.
///
/// `bson::serde_helpers::chrono_datetime_as_bson_datetime` only covers the
/// non-optional case; this wraps it for `Option<DateTime<Utc>>` fields so
/// they stay comparable/sortable server-side instead of degrading to
/// RFC 3339 strings.
pub(crate) mod bson_datetime_opt {
    use bson::DateTime as BsonDateTime;
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(datetime) => BsonDateTime::from_chrono(*datetime).serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<BsonDateTime>::deserialize(deserializer)?;
        Ok(value.map(BsonDateTime::to_chrono))
    }
}
