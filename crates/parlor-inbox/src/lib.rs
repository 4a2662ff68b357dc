pub mod actor;
pub mod error;
pub mod events;
pub mod processor;
pub mod resolver;
pub mod sender;

pub use actor::{Actor, Role};
pub use error::{InboxError, Result};
pub use events::{
    event_timestamp, normalize_attachments, AttachmentDescriptor, EventParty, EventPayload,
    MessagePayload, MessagingEvent, WebhookEntry, WebhookEnvelope,
};
pub use processor::{WebhookProcessor, EVENT_ACK};
pub use resolver::AccountResolver;
pub use sender::{MessageSender, OutboundAttachment, OutboundDraft};
