use serde::{Deserialize, Serialize};

/// Acknowledgement returned by the messaging endpoint after a send.
///
/// Meta omits fields in some delivery modes, so both are optional and the
/// caller decides whether a missing id matters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendReceipt {
    #[serde(default)]
    pub message_id: Option<String>,
    #[serde(default)]
    pub recipient_id: Option<String>,
}

/// Minimal profile for an Instagram user, fetched by platform user id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserProfile {
    pub username: Option<String>,
    pub name: Option<String>,
}

impl UserProfile {
    /// The username when present and non-empty.
    pub fn usable_username(&self) -> Option<&str> {
        match self.username.as_deref() {
            Some(name) if !name.is_empty() => Some(name),
            _ => None,
        }
    }
}

/// Public business profile resolved through business discovery.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BusinessProfile {
    pub username: Option<String>,
    pub name: Option<String>,
    pub biography: Option<String>,
    pub website: Option<String>,
    pub profile_picture_url: Option<String>,
    pub followers_count: i64,
    pub media_count: i64,
    pub media: Vec<MediaItem>,
}

/// One recent media entry on a business profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaItem {
    pub id: String,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(default)]
    pub permalink: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}
