use utoipa::OpenApi;

use crate::routes::{accounts, conversations, health, messages, webhook};

/// OpenAPI description backing the Swagger UI at `/api/docs`.
#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        webhook::verify_webhook,
        webhook::receive_webhook,
        accounts::create_account,
        accounts::list_accounts,
        accounts::get_account,
        accounts::update_account,
        accounts::delete_account,
        accounts::get_account_profile,
        conversations::list_conversations,
        conversations::get_conversation,
        conversations::delete_conversation,
        messages::list_messages,
        messages::send_message,
        messages::mark_messages_read,
    ),
    components(schemas(
        health::HealthResponse,
        accounts::CreateAccountRequest,
        accounts::UpdateAccountRequest,
        accounts::AccountResponse,
        accounts::ProfileResponse,
        accounts::MediaItemResponse,
        conversations::ConversationResponse,
        conversations::ConversationListResponse,
        messages::SendMessageRequest,
        messages::MessageAttachment,
        messages::MessageResponse,
        messages::MessageListResponse,
    )),
    tags(
        (name = "health", description = "Service health"),
        (name = "webhook", description = "Meta webhook intake"),
        (name = "accounts", description = "Connected Instagram accounts"),
        (name = "conversations", description = "Inbox conversations"),
        (name = "messages", description = "Conversation messages")
    )
)]
pub struct ApiDoc;
