use std::sync::Arc;

use parlor_store::{Account, InboxStore};

use crate::error::Result;

/// Maps the recipient identifier on an inbound event to the registered
/// account it denotes.
///
/// The platform does not populate `recipient.id` consistently across
/// event kinds and API versions, so resolution tries, in order: the
/// business id, the page id, and both again under the canonical decimal
/// rendering when the identifier is numeric. The order is load-bearing;
/// if one account's page id ever collides with another's business id,
/// the business id owner wins.
#[derive(Clone)]
pub struct AccountResolver {
    store: Arc<dyn InboxStore>,
}

impl AccountResolver {
    pub fn new(store: Arc<dyn InboxStore>) -> Self {
        Self { store }
    }

    /// Returns the unique active account for a recipient identifier, or
    /// `None` when no account is registered under it.
    pub async fn resolve_recipient(&self, recipient_id: &str) -> Result<Option<Account>> {
        if let Some(account) = self.lookup(recipient_id).await? {
            return Ok(Some(account));
        }

        if let Ok(numeric) = recipient_id.parse::<u64>() {
            let canonical = numeric.to_string();
            if canonical != recipient_id {
                if let Some(account) = self.lookup(&canonical).await? {
                    // Emitted on its own target so the rate of the
                    // numeric rewrite can be counted downstream.
                    tracing::info!(
                        target: "parlor_inbox::resolver",
                        recipient_id,
                        canonical,
                        "Recipient resolved through canonical numeric form"
                    );
                    return Ok(Some(account));
                }
            }
        }

        Ok(None)
    }

    async fn lookup(&self, id: &str) -> Result<Option<Account>> {
        if let Some(account) = self.store.account_by_business_id(id).await? {
            return Ok(Some(account));
        }
        Ok(self.store.account_by_page_id(id).await?)
    }
}
