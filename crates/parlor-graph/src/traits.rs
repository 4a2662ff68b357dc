use async_trait::async_trait;

use crate::error::Result;
use crate::types::{BusinessProfile, SendReceipt, UserProfile};

/// What an outbound message carries. Exactly one variant per send; the
/// messaging endpoint does not accept text and attachment together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundContent {
    Text(String),
    Attachment { kind: String, url: String },
}

/// One send against the messaging endpoint.
///
/// `scope_id` is the node the message is posted under, the Facebook Page
/// id when the account has one and the Instagram business id otherwise.
#[derive(Debug, Clone)]
pub struct SendRequest {
    pub scope_id: String,
    pub recipient_id: String,
    pub access_token: String,
    pub content: OutboundContent,
}

impl SendRequest {
    pub fn text(
        scope_id: impl Into<String>,
        recipient_id: impl Into<String>,
        access_token: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            scope_id: scope_id.into(),
            recipient_id: recipient_id.into(),
            access_token: access_token.into(),
            content: OutboundContent::Text(text.into()),
        }
    }

    pub fn attachment(
        scope_id: impl Into<String>,
        recipient_id: impl Into<String>,
        access_token: impl Into<String>,
        kind: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            scope_id: scope_id.into(),
            recipient_id: recipient_id.into(),
            access_token: access_token.into(),
            content: OutboundContent::Attachment {
                kind: kind.into(),
                url: url.into(),
            },
        }
    }
}

/// Graph API surface the inbox depends on.
///
/// Held as `Arc<dyn GraphApi>` by the processing layer so tests can
/// substitute a scripted double for the live endpoint.
#[async_trait]
pub trait GraphApi: Send + Sync {
    /// Delivers one message to an Instagram user.
    async fn send_message(&self, request: SendRequest) -> Result<SendReceipt>;

    /// Fetches the minimal profile for a platform user id.
    async fn user_profile(&self, ig_user_id: &str, access_token: &str) -> Result<UserProfile>;

    /// Resolves a business profile by username via business discovery,
    /// queried through the caller's own business account node.
    async fn business_profile(
        &self,
        ig_business_id: &str,
        username: &str,
        access_token: &str,
    ) -> Result<BusinessProfile>;
}
