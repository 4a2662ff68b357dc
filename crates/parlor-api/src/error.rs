use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use parlor_inbox::InboxError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Instagram account not found")]
    AccountNotFound,

    #[error("Conversation not found")]
    ConversationNotFound,

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("Failed to send message: {0}")]
    SendFailed(parlor_graph::GraphError),

    #[error("Database error: {0}")]
    Database(#[from] parlor_store::StoreError),

    #[error("Internal server error")]
    Internal,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::AccountNotFound | ApiError::ConversationNotFound => {
                (StatusCode::NOT_FOUND, self.to_string())
            }
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, self.to_string()),
            ApiError::SendFailed(ref error) => {
                tracing::error!("Message send rejected upstream: {}", error);
                let message = match error.send_advice() {
                    Some(advice) => format!("Failed to send message: {advice}"),
                    None => self.to_string(),
                };
                (StatusCode::BAD_GATEWAY, message)
            }
            ApiError::Database(ref error) => {
                tracing::error!("Database error: {}", error);
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error".to_string())
            }
            ApiError::Internal => {
                tracing::error!("Internal error: {}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": { "code": status.as_u16(), "message": message }
        }));

        (status, body).into_response()
    }
}

impl From<InboxError> for ApiError {
    fn from(error: InboxError) -> Self {
        match error {
            InboxError::ConversationNotFound => ApiError::ConversationNotFound,
            InboxError::InvalidDraft(message) => ApiError::BadRequest(message),
            InboxError::Send(graph_error) => ApiError::SendFailed(graph_error),
            InboxError::Store(store_error) => ApiError::Database(store_error),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
