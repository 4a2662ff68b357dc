use bson::doc;
use mongodb::{Client, Database};

use crate::error::{Result, StoreError};
use crate::repositories::{AccountRepository, ConversationRepository, MessageRepository};

/// Facade over the MongoDB collections backing the inbox.
///
/// Owns one driver client and hands out cheap repository clones; the
/// driver multiplexes a connection pool underneath, so cloning this
/// struct is the intended way to share it.
#[derive(Clone)]
pub struct StoreClient {
    accounts: AccountRepository,
    conversations: ConversationRepository,
    messages: MessageRepository,
    database: Database,
}

impl StoreClient {
    pub async fn new(uri: &str, db_name: &str) -> Result<Self> {
        let client = Client::with_uri_str(uri)
            .await
            .map_err(|e| StoreError::Connection(format!("Failed to connect to MongoDB: {e}")))?;
        let database = client.database(db_name);

        Ok(Self {
            accounts: AccountRepository::new(&client, db_name),
            conversations: ConversationRepository::new(&client, db_name),
            messages: MessageRepository::new(&client, db_name),
            database,
        })
    }

    pub fn accounts(&self) -> &AccountRepository {
        &self.accounts
    }

    pub fn conversations(&self) -> &ConversationRepository {
        &self.conversations
    }

    pub fn messages(&self) -> &MessageRepository {
        &self.messages
    }

    /// Creates every index the repositories rely on. Safe to run on
    /// every startup; existing indexes are left untouched.
    pub async fn ensure_indexes(&self) -> Result<()> {
        self.accounts.ensure_indexes().await?;
        self.conversations.ensure_indexes().await?;
        self.messages.ensure_indexes().await?;
        Ok(())
    }

    pub async fn ping(&self) -> Result<()> {
        self.database.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }
}
