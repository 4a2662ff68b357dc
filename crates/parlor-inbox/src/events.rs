use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use parlor_store::{Attachment, AttachmentKind};

/// Top-level webhook delivery body: `{ "entry": [ { "messaging": [...] } ] }`.
///
/// Everything is optional at this level; the platform has shipped partial
/// envelopes and a decode failure here would drop the whole delivery.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookEnvelope {
    #[serde(default)]
    pub object: Option<String>,
    #[serde(default)]
    pub entry: Vec<WebhookEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookEntry {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub time: Option<i64>,
    /// Sub-events stay raw JSON here and are decoded one at a time, so a
    /// malformed sub-event never takes its siblings down with it.
    #[serde(default)]
    pub messaging: Vec<Value>,
}

/// One messaging sub-event, decoded leniently.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessagingEvent {
    #[serde(default)]
    pub sender: Option<EventParty>,
    #[serde(default)]
    pub recipient: Option<EventParty>,
    /// Milliseconds since epoch, platform clock.
    #[serde(default)]
    pub timestamp: Option<i64>,
    #[serde(default)]
    message: Option<MessagePayload>,
    #[serde(default)]
    reaction: Option<Value>,
    #[serde(default)]
    read: Option<Value>,
}

impl MessagingEvent {
    pub fn sender_id(&self) -> Option<&str> {
        party_id(self.sender.as_ref())
    }

    pub fn recipient_id(&self) -> Option<&str> {
        party_id(self.recipient.as_ref())
    }

    /// Classifies the event into the closed payload set. The shapes are
    /// mutually exclusive upstream; if several are present anyway, the
    /// message payload wins, then reaction, then read.
    pub fn payload(&self) -> EventPayload<'_> {
        if let Some(message) = &self.message {
            EventPayload::Message(message)
        } else if let Some(reaction) = &self.reaction {
            EventPayload::Reaction(reaction)
        } else if let Some(read) = &self.read {
            EventPayload::Read(read)
        } else {
            EventPayload::Unknown
        }
    }
}

fn party_id(party: Option<&EventParty>) -> Option<&str> {
    match party.and_then(|p| p.id.as_deref()) {
        Some(id) if !id.is_empty() => Some(id),
        _ => None,
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventParty {
    #[serde(default)]
    pub id: Option<String>,
}

/// The three payload shapes the platform delivers, plus an explicit
/// variant for anything else so new upstream event kinds are ignored
/// deliberately rather than by accident.
#[derive(Debug, Clone)]
pub enum EventPayload<'a> {
    Message(&'a MessagePayload),
    Reaction(&'a Value),
    Read(&'a Value),
    Unknown,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessagePayload {
    /// Upstream message id, the deduplication key.
    #[serde(default)]
    pub mid: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub attachments: Vec<AttachmentDescriptor>,
}

/// Attachment as it appears on the wire, before normalization.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AttachmentDescriptor {
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub payload: Option<AttachmentPayload>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AttachmentPayload {
    #[serde(default)]
    pub url: Option<String>,
}

/// Maps wire attachments into the stored form: unrecognized type strings
/// become `file`, entries without a URL are dropped.
pub fn normalize_attachments(descriptors: &[AttachmentDescriptor]) -> Vec<Attachment> {
    descriptors
        .iter()
        .filter_map(|descriptor| {
            let url = descriptor
                .payload
                .as_ref()
                .and_then(|payload| payload.url.as_deref())
                .filter(|url| !url.is_empty())?;
            let kind = match descriptor.kind.as_deref() {
                Some(raw) => AttachmentKind::from_platform(raw),
                None => AttachmentKind::File,
            };
            Some(Attachment {
                kind,
                url: url.to_string(),
            })
        })
        .collect()
}

/// Upstream millisecond epoch when present and representable, else the
/// processing instant.
pub fn event_timestamp(millis: Option<i64>) -> DateTime<Utc> {
    millis
        .and_then(DateTime::from_timestamp_millis)
        .unwrap_or_else(Utc::now)
}
