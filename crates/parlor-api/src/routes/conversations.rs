use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use utoipa::ToSchema;

use parlor_store::Conversation;

use super::accounts::visible_account;
use crate::{
    actor::CurrentActor,
    error::{ApiError, ApiResult},
    state::AppState,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct ConversationResponse {
    pub id: String,
    pub account_id: String,
    pub ig_user_id: String,
    pub ig_username: Option<String>,
    pub last_message: Option<String>,
    pub last_message_at: Option<chrono::DateTime<chrono::Utc>>,
    pub unread_count: i64,
    pub is_active: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ConversationListResponse {
    pub conversations: Vec<ConversationResponse>,
    pub total: u64,
    pub limit: i64,
    pub skip: u64,
}

#[derive(Debug, Deserialize)]
pub struct ListConversationsQuery {
    #[serde(default)]
    pub skip: u64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    20
}

/// List conversations for an Instagram account, most recent first
#[utoipa::path(
    get,
    path = "/v1/conversations/{account_id}",
    params(
        ("account_id" = String, Path, description = "Account ID"),
        ("skip" = Option<u64>, Query, description = "Number of conversations to skip (default: 0)"),
        ("limit" = Option<i64>, Query, description = "Maximum number of conversations (default: 20, max: 100)")
    ),
    responses(
        (status = 200, description = "Conversations for the account", body = ConversationListResponse),
        (status = 404, description = "Account not found")
    ),
    tag = "conversations"
)]
pub async fn list_conversations(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    Path(account_id): Path<String>,
    Query(query): Query<ListConversationsQuery>,
) -> ApiResult<Json<ConversationListResponse>> {
    let account_id = ObjectId::from_str(&account_id)
        .map_err(|_| ApiError::BadRequest("Invalid account ID format".to_string()))?;

    let account = visible_account(&state, account_id, &actor).await?;

    let limit = query.limit.min(100); // Cap at 100
    let conversations = state
        .store
        .conversations()
        .list_active_for_account(account.id, query.skip, limit)
        .await?;
    let total = state
        .store
        .conversations()
        .count_active_for_account(account.id)
        .await?;

    Ok(Json(ConversationListResponse {
        conversations: conversations
            .into_iter()
            .map(conversation_to_response)
            .collect(),
        total,
        limit,
        skip: query.skip,
    }))
}

/// Get conversation details
#[utoipa::path(
    get,
    path = "/v1/conversations/detail/{conversation_id}",
    params(
        ("conversation_id" = String, Path, description = "Conversation ID")
    ),
    responses(
        (status = 200, description = "Conversation details", body = ConversationResponse),
        (status = 404, description = "Conversation not found")
    ),
    tag = "conversations"
)]
pub async fn get_conversation(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    Path(conversation_id): Path<String>,
) -> ApiResult<Json<ConversationResponse>> {
    let conversation_id = ObjectId::from_str(&conversation_id)
        .map_err(|_| ApiError::BadRequest("Invalid conversation ID format".to_string()))?;

    let (conversation, _account) = state
        .sender
        .conversation_scope(conversation_id, &actor)
        .await?;

    Ok(Json(conversation_to_response(conversation)))
}

/// Delete a conversation (soft delete)
#[utoipa::path(
    delete,
    path = "/v1/conversations/detail/{conversation_id}",
    params(
        ("conversation_id" = String, Path, description = "Conversation ID")
    ),
    responses(
        (status = 204, description = "Conversation deleted"),
        (status = 404, description = "Conversation not found")
    ),
    tag = "conversations"
)]
pub async fn delete_conversation(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    Path(conversation_id): Path<String>,
) -> ApiResult<StatusCode> {
    let conversation_id = ObjectId::from_str(&conversation_id)
        .map_err(|_| ApiError::BadRequest("Invalid conversation ID format".to_string()))?;

    let (conversation, _account) = state
        .sender
        .conversation_scope(conversation_id, &actor)
        .await?;
    state
        .store
        .conversations()
        .soft_delete(conversation.id)
        .await?;

    tracing::info!(conversation_id = %conversation.id, "Conversation deleted");
    Ok(StatusCode::NO_CONTENT)
}

fn conversation_to_response(conversation: Conversation) -> ConversationResponse {
    ConversationResponse {
        id: conversation.id.to_hex(),
        account_id: conversation.account_id.to_hex(),
        ig_user_id: conversation.ig_user_id,
        ig_username: conversation.ig_username,
        last_message: conversation.last_message,
        last_message_at: conversation.last_message_at,
        unread_count: conversation.unread_count,
        is_active: conversation.is_active,
        created_at: conversation.created_at,
        updated_at: conversation.updated_at,
    }
}
