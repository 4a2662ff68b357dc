pub mod client;
pub mod error;
pub mod traits;
pub mod types;

pub use client::{GraphClient, GraphClientBuilder, DEFAULT_API_VERSION};
pub use error::{GraphError, Result};
pub use traits::{GraphApi, OutboundContent, SendRequest};
pub use types::{BusinessProfile, MediaItem, SendReceipt, UserProfile};
