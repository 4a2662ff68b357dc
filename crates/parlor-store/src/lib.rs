pub mod client;
pub mod error;
pub mod models;
pub mod repositories;
pub mod trait_client;

pub use client::StoreClient;
pub use error::{is_duplicate_key, Result, StoreError};
pub use models::{
    clip_preview, Account, AccountUpdate, Attachment, AttachmentKind, Conversation, Direction,
    Message, PREVIEW_MAX_CHARS,
};
pub use repositories::{
    AccountRepository, ConversationRepository, MessageInsert, MessageRepository,
};
pub use trait_client::InboxStore;
