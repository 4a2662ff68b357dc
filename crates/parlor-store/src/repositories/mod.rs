mod account;
mod conversation;
mod message;

pub use account::AccountRepository;
pub use conversation::ConversationRepository;
pub use message::{MessageInsert, MessageRepository};
