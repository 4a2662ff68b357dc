use parlor_graph::GraphApi;
use parlor_inbox::{MessageSender, WebhookProcessor};
use parlor_store::StoreClient;
use std::sync::Arc;

use crate::config::Config;

/// Shared application state passed to all handlers
///
/// All resources are wrapped in Arc for efficient sharing across async
/// tasks. The processor and sender are stateless services built once at
/// startup over the same store and graph client.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<StoreClient>,
    pub graph: Arc<dyn GraphApi>,
    pub processor: Arc<WebhookProcessor>,
    pub sender: Arc<MessageSender>,
}

impl AppState {
    pub fn new(
        config: Config,
        store: StoreClient,
        graph: Arc<dyn GraphApi>,
        processor: WebhookProcessor,
        sender: MessageSender,
    ) -> Self {
        Self {
            config: Arc::new(config),
            store: Arc::new(store),
            graph,
            processor: Arc::new(processor),
            sender: Arc::new(sender),
        }
    }
}
