use thiserror::Error;

pub type Result<T> = std::result::Result<T, InboxError>;

/// Failures surfaced by the outbound and read paths. Inbound webhook
/// processing never returns these to the platform; they are logged and
/// the delivery is acknowledged regardless.
#[derive(Error, Debug)]
pub enum InboxError {
    /// Also covers conversations whose account the actor may not see,
    /// so probing cannot tell the two apart.
    #[error("Conversation not found")]
    ConversationNotFound,

    #[error("{0}")]
    InvalidDraft(String),

    #[error("Failed to send message: {0}")]
    Send(#[from] parlor_graph::GraphError),

    #[error(transparent)]
    Store(#[from] parlor_store::StoreError),
}
