use bson::oid::ObjectId;
use bson::Document;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One message in a conversation, immutable after creation except for the
/// read flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub conversation_id: ObjectId,
    pub account_id: ObjectId,
    /// Upstream platform message id. Present for inbound messages and for
    /// outbound messages the platform acknowledged. Must be omitted (not
    /// null) when absent: the backing unique index is sparse, and sparse
    /// indexes skip missing fields but still index nulls.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    pub direction: Direction,
    pub sender_id: String,
    pub text: Option<String>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    /// Platform-supplied event time for inbound, generation time for
    /// outbound.
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub sent_at: DateTime<Utc>,
    pub is_read: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Document>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Message {
    /// A counterparty-authored message received through the webhook.
    /// Starts unread.
    pub fn inbound(
        conversation_id: ObjectId,
        account_id: ObjectId,
        message_id: impl Into<String>,
        sender_id: impl Into<String>,
        text: Option<String>,
        attachments: Vec<Attachment>,
        sent_at: DateTime<Utc>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: ObjectId::new(),
            conversation_id,
            account_id,
            message_id: Some(message_id.into()),
            direction: Direction::Inbound,
            sender_id: sender_id.into(),
            text,
            attachments,
            sent_at,
            is_read: false,
            metadata: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// An account-authored message the platform already accepted.
    /// Outbound content is read by definition.
    pub fn outbound(
        conversation_id: ObjectId,
        account_id: ObjectId,
        message_id: Option<String>,
        sender_id: impl Into<String>,
        text: Option<String>,
        attachments: Vec<Attachment>,
        sent_at: DateTime<Utc>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: ObjectId::new(),
            conversation_id,
            account_id,
            message_id,
            direction: Direction::Outbound,
            sender_id: sender_id.into(),
            text,
            attachments,
            sent_at,
            is_read: true,
            metadata: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Counterparty-authored, received through the webhook.
    Inbound,
    /// Account-authored, sent through the outbound path.
    Outbound,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(rename = "type")]
    pub kind: AttachmentKind,
    pub url: String,
}

/// Closed attachment type set shared with the platform wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    Image,
    Video,
    Audio,
    File,
}

impl AttachmentKind {
    /// Normalize an upstream type string; anything unrecognized becomes
    /// the generic `file`.
    pub fn from_platform(raw: &str) -> Self {
        match raw {
            "image" => Self::Image,
            "video" => Self::Video,
            "audio" => Self::Audio,
            _ => Self::File,
        }
    }

    /// Parse a caller-supplied type string, rejecting unknown values.
    pub fn from_strict(raw: &str) -> Option<Self> {
        match raw {
            "image" => Some(Self::Image),
            "video" => Some(Self::Video),
            "audio" => Some(Self::Audio),
            "file" => Some(Self::File),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::File => "file",
        }
    }
}
