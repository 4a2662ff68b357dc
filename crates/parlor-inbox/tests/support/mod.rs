#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use parlor_graph::{BusinessProfile, GraphApi, GraphError, SendReceipt, SendRequest, UserProfile};
use parlor_store::{
    Account, Conversation, Direction, InboxStore, Message, MessageInsert, StoreError,
};

pub fn test_account(page_id: &str, ig_business_id: &str) -> Account {
    Account::new(ObjectId::new(), page_id, ig_business_id, "token-1")
}

/// In-memory store double. State sits behind one mutex and lock scopes
/// stay tight, so no guard is ever held across an await.
#[derive(Default)]
pub struct MockStore {
    state: Mutex<StoreState>,
}

#[derive(Default)]
struct StoreState {
    accounts: Vec<Account>,
    conversations: Vec<Conversation>,
    messages: Vec<Message>,
    miss_message_lookups: bool,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_account(&self, account: Account) {
        self.state.lock().unwrap().accounts.push(account);
    }

    /// Pins `message_exists` to a miss. A redelivery then slips past the
    /// dedupe pre-check and is only caught by the insert, the same spot a
    /// concurrent delivery hits the unique index.
    pub fn miss_message_lookups(&self) {
        self.state.lock().unwrap().miss_message_lookups = true;
    }

    pub fn add_conversation(&self, conversation: Conversation) {
        self.state.lock().unwrap().conversations.push(conversation);
    }

    pub fn conversations(&self) -> Vec<Conversation> {
        self.state.lock().unwrap().conversations.clone()
    }

    pub fn messages(&self) -> Vec<Message> {
        self.state.lock().unwrap().messages.clone()
    }
}

#[async_trait]
impl InboxStore for MockStore {
    async fn account_by_business_id(
        &self,
        ig_business_id: &str,
    ) -> parlor_store::Result<Option<Account>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .accounts
            .iter()
            .find(|a| a.is_active && a.ig_business_id == ig_business_id)
            .cloned())
    }

    async fn account_by_page_id(&self, page_id: &str) -> parlor_store::Result<Option<Account>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .accounts
            .iter()
            .find(|a| a.is_active && a.page_id == page_id)
            .cloned())
    }

    async fn account_by_id(&self, id: ObjectId) -> parlor_store::Result<Option<Account>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .accounts
            .iter()
            .find(|a| a.is_active && a.id == id)
            .cloned())
    }

    async fn account_owned_by(
        &self,
        id: ObjectId,
        user_id: ObjectId,
    ) -> parlor_store::Result<Option<Account>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .accounts
            .iter()
            .find(|a| a.is_active && a.id == id && a.user_id == user_id)
            .cloned())
    }

    async fn conversation_by_id(
        &self,
        id: ObjectId,
    ) -> parlor_store::Result<Option<Conversation>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .conversations
            .iter()
            .find(|c| c.is_active && c.id == id)
            .cloned())
    }

    async fn find_or_create_conversation(
        &self,
        account_id: ObjectId,
        ig_user_id: &str,
        ig_username: Option<&str>,
    ) -> parlor_store::Result<Conversation> {
        let mut state = self.state.lock().unwrap();
        if let Some(conversation) = state
            .conversations
            .iter_mut()
            .find(|c| c.is_active && c.account_id == account_id && c.ig_user_id == ig_user_id)
        {
            if let Some(name) = ig_username {
                if !name.is_empty() && conversation.ig_username.as_deref() != Some(name) {
                    conversation.ig_username = Some(name.to_string());
                }
            }
            return Ok(conversation.clone());
        }

        let conversation = Conversation::new(
            account_id,
            ig_user_id,
            ig_username.filter(|n| !n.is_empty()).map(str::to_string),
        );
        state.conversations.push(conversation.clone());
        Ok(conversation)
    }

    async fn message_exists(&self, message_id: &str) -> parlor_store::Result<bool> {
        let state = self.state.lock().unwrap();
        if state.miss_message_lookups {
            return Ok(false);
        }
        Ok(state
            .messages
            .iter()
            .any(|m| m.message_id.as_deref() == Some(message_id)))
    }

    async fn insert_message(&self, message: &Message) -> parlor_store::Result<MessageInsert> {
        let mut state = self.state.lock().unwrap();
        if let Some(message_id) = message.message_id.as_deref() {
            if state
                .messages
                .iter()
                .any(|m| m.message_id.as_deref() == Some(message_id))
            {
                return Ok(MessageInsert::Duplicate);
            }
        }
        state.messages.push(message.clone());
        Ok(MessageInsert::Inserted(message.id))
    }

    async fn record_inbound(
        &self,
        conversation_id: ObjectId,
        preview: &str,
        at: DateTime<Utc>,
    ) -> parlor_store::Result<()> {
        let mut state = self.state.lock().unwrap();
        let conversation = state
            .conversations
            .iter_mut()
            .find(|c| c.id == conversation_id)
            .ok_or_else(|| StoreError::Internal("unknown conversation".to_string()))?;
        conversation.last_message = Some(preview.to_string());
        conversation.last_message_at = Some(at);
        conversation.unread_count += 1;
        conversation.updated_at = Utc::now();
        Ok(())
    }

    async fn record_outbound(
        &self,
        conversation_id: ObjectId,
        preview: &str,
        at: DateTime<Utc>,
    ) -> parlor_store::Result<()> {
        let mut state = self.state.lock().unwrap();
        let conversation = state
            .conversations
            .iter_mut()
            .find(|c| c.id == conversation_id)
            .ok_or_else(|| StoreError::Internal("unknown conversation".to_string()))?;
        conversation.last_message = Some(preview.to_string());
        conversation.last_message_at = Some(at);
        conversation.updated_at = Utc::now();
        Ok(())
    }

    async fn mark_conversation_read(
        &self,
        conversation_id: ObjectId,
    ) -> parlor_store::Result<u64> {
        let mut state = self.state.lock().unwrap();
        let mut flipped = 0;
        for message in state.messages.iter_mut().filter(|m| {
            m.conversation_id == conversation_id
                && m.direction == Direction::Inbound
                && !m.is_read
        }) {
            message.is_read = true;
            flipped += 1;
        }
        if let Some(conversation) = state
            .conversations
            .iter_mut()
            .find(|c| c.id == conversation_id)
        {
            conversation.unread_count = 0;
        }
        Ok(flipped)
    }
}

/// Scripted Graph API double recording every send request it accepts.
#[derive(Default)]
pub struct MockGraph {
    state: Mutex<GraphState>,
}

#[derive(Default)]
struct GraphState {
    profiles: HashMap<String, UserProfile>,
    fail_profiles: bool,
    fail_sends: bool,
    sent: Vec<SendRequest>,
    send_seq: u64,
}

impl MockGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_profile(&self, ig_user_id: impl Into<String>, username: impl Into<String>) {
        let username = username.into();
        self.state.lock().unwrap().profiles.insert(
            ig_user_id.into(),
            UserProfile {
                username: Some(username.clone()),
                name: Some(username),
            },
        );
    }

    pub fn fail_profiles(&self) {
        self.state.lock().unwrap().fail_profiles = true;
    }

    pub fn fail_sends(&self) {
        self.state.lock().unwrap().fail_sends = true;
    }

    pub fn sent_requests(&self) -> Vec<SendRequest> {
        self.state.lock().unwrap().sent.clone()
    }

    fn api_error(message: &str) -> GraphError {
        GraphError::Api {
            status: 400,
            code: None,
            error_type: Some("OAuthException".to_string()),
            message: message.to_string(),
        }
    }
}

#[async_trait]
impl GraphApi for MockGraph {
    async fn send_message(&self, request: SendRequest) -> parlor_graph::Result<SendReceipt> {
        let mut state = self.state.lock().unwrap();
        if state.fail_sends {
            return Err(Self::api_error("Message failed to send"));
        }
        state.send_seq += 1;
        let receipt = SendReceipt {
            message_id: Some(format!("mid.out.{}", state.send_seq)),
            recipient_id: Some(request.recipient_id.clone()),
        };
        state.sent.push(request);
        Ok(receipt)
    }

    async fn user_profile(
        &self,
        ig_user_id: &str,
        _access_token: &str,
    ) -> parlor_graph::Result<UserProfile> {
        let state = self.state.lock().unwrap();
        if state.fail_profiles {
            return Err(Self::api_error("Profile lookup failed"));
        }
        match state.profiles.get(ig_user_id) {
            Some(profile) => Ok(profile.clone()),
            None => Err(Self::api_error("Unsupported get request")),
        }
    }

    async fn business_profile(
        &self,
        _ig_business_id: &str,
        username: &str,
        _access_token: &str,
    ) -> parlor_graph::Result<BusinessProfile> {
        Ok(BusinessProfile {
            username: Some(username.to_string()),
            ..BusinessProfile::default()
        })
    }
}
