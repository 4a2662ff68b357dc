pub mod accounts;
pub mod conversations;
pub mod health;
pub mod messages;
pub mod webhook;
