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

use parlor_inbox::{OutboundAttachment, OutboundDraft};
use parlor_store::{Direction, Message};

use crate::{
    actor::CurrentActor,
    error::{ApiError, ApiResult},
    state::AppState,
};

/// Outbound draft body. Exactly one of `text` or `attachment` must be
/// set.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SendMessageRequest {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub attachment: Option<MessageAttachment>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageAttachment {
    #[serde(rename = "type")]
    pub kind: String,
    pub url: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub id: String,
    pub conversation_id: String,
    pub account_id: String,
    pub message_id: Option<String>,
    pub direction: String,
    pub sender_id: String,
    pub text: Option<String>,
    pub attachments: Vec<MessageAttachment>,
    pub sent_at: chrono::DateTime<chrono::Utc>,
    pub is_read: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageListResponse {
    pub messages: Vec<MessageResponse>,
    pub total: u64,
    pub limit: i64,
    pub skip: u64,
}

#[derive(Debug, Deserialize)]
pub struct ListMessagesQuery {
    #[serde(default)]
    pub skip: u64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    50
}

/// List messages in a conversation, newest first
#[utoipa::path(
    get,
    path = "/v1/messages/{conversation_id}",
    params(
        ("conversation_id" = String, Path, description = "Conversation ID"),
        ("skip" = Option<u64>, Query, description = "Number of messages to skip (default: 0)"),
        ("limit" = Option<i64>, Query, description = "Maximum number of messages (default: 50, max: 100)")
    ),
    responses(
        (status = 200, description = "Messages in the conversation", body = MessageListResponse),
        (status = 404, description = "Conversation not found")
    ),
    tag = "messages"
)]
pub async fn list_messages(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    Path(conversation_id): Path<String>,
    Query(query): Query<ListMessagesQuery>,
) -> ApiResult<Json<MessageListResponse>> {
    let conversation_id = ObjectId::from_str(&conversation_id)
        .map_err(|_| ApiError::BadRequest("Invalid conversation ID format".to_string()))?;

    let (conversation, _account) = state
        .sender
        .conversation_scope(conversation_id, &actor)
        .await?;

    let limit = query.limit.min(100); // Cap at 100
    let messages = state
        .store
        .messages()
        .list_for_conversation(conversation.id, query.skip, limit)
        .await?;
    let total = state
        .store
        .messages()
        .count_for_conversation(conversation.id)
        .await?;

    Ok(Json(MessageListResponse {
        messages: messages.into_iter().map(message_to_response).collect(),
        total,
        limit,
        skip: query.skip,
    }))
}

/// Send a message to the conversation's counterparty
#[utoipa::path(
    post,
    path = "/v1/messages/{conversation_id}",
    params(
        ("conversation_id" = String, Path, description = "Conversation ID")
    ),
    request_body = SendMessageRequest,
    responses(
        (status = 201, description = "Message sent", body = MessageResponse),
        (status = 400, description = "Invalid draft"),
        (status = 404, description = "Conversation not found"),
        (status = 502, description = "Platform rejected the send")
    ),
    tag = "messages"
)]
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    Path(conversation_id): Path<String>,
    Json(req): Json<SendMessageRequest>,
) -> ApiResult<(StatusCode, Json<MessageResponse>)> {
    let conversation_id = ObjectId::from_str(&conversation_id)
        .map_err(|_| ApiError::BadRequest("Invalid conversation ID format".to_string()))?;

    let draft = OutboundDraft {
        text: req.text,
        attachment: req.attachment.map(|attachment| OutboundAttachment {
            kind: attachment.kind,
            url: attachment.url,
        }),
    };

    let message = state
        .sender
        .send_message(conversation_id, &actor, &draft)
        .await?;

    Ok((StatusCode::CREATED, Json(message_to_response(message))))
}

/// Mark all counterparty messages in a conversation as read
#[utoipa::path(
    post,
    path = "/v1/messages/{conversation_id}/read",
    params(
        ("conversation_id" = String, Path, description = "Conversation ID")
    ),
    responses(
        (status = 204, description = "Messages marked as read"),
        (status = 404, description = "Conversation not found")
    ),
    tag = "messages"
)]
pub async fn mark_messages_read(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    Path(conversation_id): Path<String>,
) -> ApiResult<StatusCode> {
    let conversation_id = ObjectId::from_str(&conversation_id)
        .map_err(|_| ApiError::BadRequest("Invalid conversation ID format".to_string()))?;

    state.sender.mark_read(conversation_id, &actor).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn message_to_response(message: Message) -> MessageResponse {
    MessageResponse {
        id: message.id.to_hex(),
        conversation_id: message.conversation_id.to_hex(),
        account_id: message.account_id.to_hex(),
        message_id: message.message_id,
        direction: match message.direction {
            Direction::Inbound => "inbound".to_string(),
            Direction::Outbound => "outbound".to_string(),
        },
        sender_id: message.sender_id,
        text: message.text,
        attachments: message
            .attachments
            .into_iter()
            .map(|attachment| MessageAttachment {
                kind: attachment.kind.as_str().to_string(),
                url: attachment.url,
            })
            .collect(),
        sent_at: message.sent_at,
        is_read: message.is_read,
        created_at: message.created_at,
        updated_at: message.updated_at,
    }
}
