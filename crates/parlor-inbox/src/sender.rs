use std::sync::Arc;

use bson::oid::ObjectId;
use chrono::Utc;
use parlor_graph::{GraphApi, SendRequest};
use parlor_store::{
    clip_preview, Account, Attachment, AttachmentKind, Conversation, InboxStore, Message,
    MessageInsert,
};

use crate::actor::Actor;
use crate::error::{InboxError, Result};

/// Outbound payload from the inbox UI. Exactly one of `text` or
/// `attachment` must be set; empty text counts as unset.
#[derive(Debug, Clone, Default)]
pub struct OutboundDraft {
    pub text: Option<String>,
    pub attachment: Option<OutboundAttachment>,
}

impl OutboundDraft {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            attachment: None,
        }
    }

    pub fn attachment(kind: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            text: None,
            attachment: Some(OutboundAttachment {
                kind: kind.into(),
                url: url.into(),
            }),
        }
    }
}

/// Attachment as submitted by the caller; the type string is validated
/// against the closed set before anything is sent.
#[derive(Debug, Clone)]
pub struct OutboundAttachment {
    pub kind: String,
    pub url: String,
}

enum DraftContent<'a> {
    Text(&'a str),
    Attachment { kind: AttachmentKind, url: &'a str },
}

fn validate_draft(draft: &OutboundDraft) -> Result<DraftContent<'_>> {
    let text = draft.text.as_deref().filter(|text| !text.trim().is_empty());
    match (text, draft.attachment.as_ref()) {
        (Some(_), Some(_)) => Err(InboxError::InvalidDraft(
            "Provide either text or an attachment, not both".to_string(),
        )),
        (None, None) => Err(InboxError::InvalidDraft(
            "Either text or attachment is required".to_string(),
        )),
        (Some(text), None) => Ok(DraftContent::Text(text)),
        (None, Some(attachment)) => {
            let kind = AttachmentKind::from_strict(&attachment.kind).ok_or_else(|| {
                InboxError::InvalidDraft(format!(
                    "Unsupported attachment type: {}",
                    attachment.kind
                ))
            })?;
            if attachment.url.trim().is_empty() {
                return Err(InboxError::InvalidDraft(
                    "Attachment URL is required".to_string(),
                ));
            }
            Ok(DraftContent::Attachment {
                kind,
                url: &attachment.url,
            })
        }
    }
}

/// User-initiated writes against a conversation: sending and marking
/// read. Shares the store with the webhook processor and keeps the same
/// preview invariants from the other direction.
pub struct MessageSender {
    store: Arc<dyn InboxStore>,
    graph: Arc<dyn GraphApi>,
}

impl MessageSender {
    pub fn new(store: Arc<dyn InboxStore>, graph: Arc<dyn GraphApi>) -> Self {
        Self { store, graph }
    }

    /// Loads a conversation and its account, enforcing visibility:
    /// owners reach their own accounts, admins reach all. A conversation
    /// behind someone else's account reads as not found, so probing
    /// cannot distinguish the two.
    pub async fn conversation_scope(
        &self,
        conversation_id: ObjectId,
        actor: &Actor,
    ) -> Result<(Conversation, Account)> {
        let conversation = self
            .store
            .conversation_by_id(conversation_id)
            .await?
            .ok_or(InboxError::ConversationNotFound)?;

        let account = if actor.is_admin() {
            self.store.account_by_id(conversation.account_id).await?
        } else {
            self.store
                .account_owned_by(conversation.account_id, actor.user_id)
                .await?
        };
        let account = account.ok_or(InboxError::ConversationNotFound)?;

        Ok((conversation, account))
    }

    /// Sends a draft to the conversation's counterparty, then records the
    /// message. Authorization runs before the external call; a failed
    /// send persists nothing, so the preview never drifts from the log.
    pub async fn send_message(
        &self,
        conversation_id: ObjectId,
        actor: &Actor,
        draft: &OutboundDraft,
    ) -> Result<Message> {
        let content = validate_draft(draft)?;
        let (conversation, account) = self.conversation_scope(conversation_id, actor).await?;

        let request = match &content {
            DraftContent::Text(text) => SendRequest::text(
                account.send_scope(),
                conversation.ig_user_id.as_str(),
                account.page_access_token.as_str(),
                *text,
            ),
            DraftContent::Attachment { kind, url } => SendRequest::attachment(
                account.send_scope(),
                conversation.ig_user_id.as_str(),
                account.page_access_token.as_str(),
                kind.as_str(),
                *url,
            ),
        };
        let receipt = self.graph.send_message(request).await?;

        let sent_at = Utc::now();
        let (text, attachments, preview_source) = match content {
            DraftContent::Text(text) => (Some(text.to_string()), Vec::new(), text.to_string()),
            DraftContent::Attachment { kind, url } => (
                None,
                vec![Attachment {
                    kind,
                    url: url.to_string(),
                }],
                format!("[{}]", kind.as_str()),
            ),
        };
        let message = Message::outbound(
            conversation.id,
            account.id,
            receipt.message_id.clone(),
            account.ig_business_id.as_str(),
            text,
            attachments,
            sent_at,
        );

        if let MessageInsert::Duplicate = self.store.insert_message(&message).await? {
            tracing::warn!(
                message_id = ?receipt.message_id,
                "Outbound message id already recorded"
            );
        }
        self.store
            .record_outbound(conversation.id, &clip_preview(&preview_source), sent_at)
            .await?;

        tracing::info!(
            conversation_id = %conversation.id,
            message_id = ?receipt.message_id,
            "Message sent"
        );
        Ok(message)
    }

    /// Marks every counterparty message in the conversation read and
    /// zeroes the unread counter. Returns how many messages flipped.
    pub async fn mark_read(&self, conversation_id: ObjectId, actor: &Actor) -> Result<u64> {
        let (conversation, _account) = self.conversation_scope(conversation_id, actor).await?;
        let flipped = self.store.mark_conversation_read(conversation.id).await?;

        tracing::info!(
            conversation_id = %conversation.id,
            flipped,
            "Messages marked as read"
        );
        Ok(flipped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_empty_draft() {
        let draft = OutboundDraft::default();
        let result = validate_draft(&draft);
        assert!(matches!(result, Err(InboxError::InvalidDraft(_))));
    }

    #[test]
    fn test_validate_treats_blank_text_as_absent() {
        let draft = OutboundDraft::text("   ");
        assert!(validate_draft(&draft).is_err());

        let mut both = OutboundDraft::attachment("image", "https://cdn.example.com/a.jpg");
        both.text = Some(String::new());
        assert!(matches!(
            validate_draft(&both),
            Ok(DraftContent::Attachment { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_text_and_attachment_together() {
        let mut draft = OutboundDraft::text("hi");
        draft.attachment = Some(OutboundAttachment {
            kind: "image".to_string(),
            url: "https://cdn.example.com/a.jpg".to_string(),
        });

        let error = validate_draft(&draft).err().unwrap();
        assert!(error.to_string().contains("not both"));
    }

    #[test]
    fn test_validate_rejects_unknown_attachment_kind() {
        let draft = OutboundDraft::attachment("sticker", "https://cdn.example.com/a.webp");

        let error = validate_draft(&draft).err().unwrap();
        assert!(error.to_string().contains("Unsupported attachment type"));
    }

    #[test]
    fn test_validate_rejects_blank_attachment_url() {
        let draft = OutboundDraft::attachment("image", "  ");

        let error = validate_draft(&draft).err().unwrap();
        assert!(error.to_string().contains("URL"));
    }

    #[test]
    fn test_validate_accepts_plain_text() {
        let draft = OutboundDraft::text("hello there");
        assert!(matches!(validate_draft(&draft), Ok(DraftContent::Text("hello there"))));
    }
}
