mod support;

use std::sync::Arc;

use parlor_inbox::{WebhookProcessor, EVENT_ACK};
use parlor_store::{AttachmentKind, Direction, PREVIEW_MAX_CHARS};
use serde_json::{json, Value};
use support::{test_account, MockGraph, MockStore};

const VERIFY_TOKEN: &str = "shared-verify-token";

fn processor(store: &Arc<MockStore>, graph: &Arc<MockGraph>) -> WebhookProcessor {
    WebhookProcessor::new(store.clone(), graph.clone(), VERIFY_TOKEN)
}

fn delivery(events: Vec<Value>) -> Value {
    json!({
        "object": "instagram",
        "entry": [ { "id": "ENTRY1", "time": 1700000000000_i64, "messaging": events } ]
    })
}

fn text_event(sender: &str, recipient: &str, mid: &str, text: &str) -> Value {
    json!({
        "sender": { "id": sender },
        "recipient": { "id": recipient },
        "timestamp": 1700000000000_i64,
        "message": { "mid": mid, "text": text }
    })
}

#[tokio::test]
async fn test_inbound_message_end_to_end() {
    let store = Arc::new(MockStore::new());
    let graph = Arc::new(MockGraph::new());
    store.add_account(test_account("PAGE1", "BIZ123"));
    graph.add_profile("U1", "jane_doe");

    let processor = processor(&store, &graph);
    let ack = processor
        .ingest(delivery(vec![text_event("U1", "BIZ123", "M1", "hi")]))
        .await;

    assert_eq!(ack, EVENT_ACK);

    let conversations = store.conversations();
    assert_eq!(conversations.len(), 1);
    let conversation = &conversations[0];
    assert_eq!(conversation.ig_user_id, "U1");
    assert_eq!(conversation.ig_username.as_deref(), Some("jane_doe"));
    assert_eq!(conversation.last_message.as_deref(), Some("hi"));
    assert_eq!(conversation.unread_count, 1);
    assert_eq!(
        conversation.last_message_at.unwrap().timestamp_millis(),
        1700000000000
    );

    let messages = store.messages();
    assert_eq!(messages.len(), 1);
    let message = &messages[0];
    assert_eq!(message.direction, Direction::Inbound);
    assert_eq!(message.message_id.as_deref(), Some("M1"));
    assert_eq!(message.text.as_deref(), Some("hi"));
    assert_eq!(message.sender_id, "U1");
    assert!(!message.is_read);
    assert_eq!(message.sent_at.timestamp_millis(), 1700000000000);
}

#[tokio::test]
async fn test_redelivered_event_is_idempotent() {
    let store = Arc::new(MockStore::new());
    let graph = Arc::new(MockGraph::new());
    store.add_account(test_account("PAGE1", "BIZ123"));

    let processor = processor(&store, &graph);
    let event = delivery(vec![text_event("U1", "BIZ123", "M1", "hi")]);
    processor.ingest(event.clone()).await;
    processor.ingest(event).await;

    assert_eq!(store.messages().len(), 1);
    assert_eq!(store.conversations()[0].unread_count, 1);
}

#[tokio::test]
async fn test_duplicate_insert_race_keeps_single_message() {
    let store = Arc::new(MockStore::new());
    let graph = Arc::new(MockGraph::new());
    store.add_account(test_account("PAGE1", "BIZ123"));
    store.miss_message_lookups();

    let processor = processor(&store, &graph);
    let event = delivery(vec![text_event("U1", "BIZ123", "M1", "hi")]);
    processor.ingest(event.clone()).await;
    let ack = processor.ingest(event).await;

    // Both deliveries missed the pre-check; the insert outcome settles
    // the race and the loser must not touch the conversation.
    assert_eq!(ack, EVENT_ACK);
    assert_eq!(store.messages().len(), 1);
    assert_eq!(store.conversations().len(), 1);
    assert_eq!(store.conversations()[0].unread_count, 1);
    assert_eq!(store.conversations()[0].last_message.as_deref(), Some("hi"));
}

#[tokio::test]
async fn test_malformed_sibling_does_not_abort_valid_event() {
    let store = Arc::new(MockStore::new());
    let graph = Arc::new(MockGraph::new());
    store.add_account(test_account("PAGE1", "BIZ123"));

    let processor = processor(&store, &graph);
    let ack = processor
        .ingest(delivery(vec![
            json!({ "sender": "not-an-object" }),
            text_event("U1", "BIZ123", "M1", "hi"),
        ]))
        .await;

    assert_eq!(ack, EVENT_ACK);
    assert_eq!(store.messages().len(), 1);
}

#[tokio::test]
async fn test_unknown_recipient_is_skipped() {
    let store = Arc::new(MockStore::new());
    let graph = Arc::new(MockGraph::new());
    store.add_account(test_account("PAGE1", "BIZ123"));

    let processor = processor(&store, &graph);
    let ack = processor
        .ingest(delivery(vec![text_event("U1", "BIZ999", "M1", "hi")]))
        .await;

    assert_eq!(ack, EVENT_ACK);
    assert!(store.messages().is_empty());
    assert!(store.conversations().is_empty());
}

#[tokio::test]
async fn test_event_without_mid_is_skipped() {
    let store = Arc::new(MockStore::new());
    let graph = Arc::new(MockGraph::new());
    store.add_account(test_account("PAGE1", "BIZ123"));

    let processor = processor(&store, &graph);
    processor
        .ingest(delivery(vec![json!({
            "sender": { "id": "U1" },
            "recipient": { "id": "BIZ123" },
            "message": { "text": "hi" }
        })]))
        .await;

    assert!(store.messages().is_empty());
}

#[tokio::test]
async fn test_enrichment_failure_does_not_block_persistence() {
    let store = Arc::new(MockStore::new());
    let graph = Arc::new(MockGraph::new());
    store.add_account(test_account("PAGE1", "BIZ123"));
    graph.fail_profiles();

    let processor = processor(&store, &graph);
    processor
        .ingest(delivery(vec![text_event("U1", "BIZ123", "M1", "hi")]))
        .await;

    assert_eq!(store.messages().len(), 1);
    assert!(store.conversations()[0].ig_username.is_none());
}

#[tokio::test]
async fn test_enrichment_refreshes_stale_username() {
    let store = Arc::new(MockStore::new());
    let graph = Arc::new(MockGraph::new());
    store.add_account(test_account("PAGE1", "BIZ123"));
    graph.add_profile("U1", "old_name");

    let processor = processor(&store, &graph);
    processor
        .ingest(delivery(vec![text_event("U1", "BIZ123", "M1", "hi")]))
        .await;
    graph.add_profile("U1", "new_name");
    processor
        .ingest(delivery(vec![text_event("U1", "BIZ123", "M2", "again")]))
        .await;

    let conversations = store.conversations();
    assert_eq!(conversations.len(), 1);
    assert_eq!(conversations[0].ig_username.as_deref(), Some("new_name"));
}

#[tokio::test]
async fn test_attachment_only_message_uses_placeholder_preview() {
    let store = Arc::new(MockStore::new());
    let graph = Arc::new(MockGraph::new());
    store.add_account(test_account("PAGE1", "BIZ123"));

    let processor = processor(&store, &graph);
    processor
        .ingest(delivery(vec![json!({
            "sender": { "id": "U1" },
            "recipient": { "id": "BIZ123" },
            "timestamp": 1700000000000_i64,
            "message": {
                "mid": "M1",
                "attachments": [
                    { "type": "story_mention", "payload": { "url": "https://cdn.example.com/s.jpg" } },
                    { "type": "image", "payload": {} }
                ]
            }
        })]))
        .await;

    let messages = store.messages();
    assert_eq!(messages.len(), 1);
    // The url-less attachment is dropped from storage but still counted
    // in the placeholder, which reflects what the platform delivered.
    assert_eq!(messages[0].attachments.len(), 1);
    assert_eq!(messages[0].attachments[0].kind, AttachmentKind::File);
    assert_eq!(
        store.conversations()[0].last_message.as_deref(),
        Some("[2 attachment(s)]")
    );
}

#[tokio::test]
async fn test_reaction_and_read_events_persist_nothing() {
    let store = Arc::new(MockStore::new());
    let graph = Arc::new(MockGraph::new());
    store.add_account(test_account("PAGE1", "BIZ123"));

    let processor = processor(&store, &graph);
    let ack = processor
        .ingest(delivery(vec![
            json!({
                "sender": { "id": "U1" },
                "recipient": { "id": "BIZ123" },
                "reaction": { "mid": "M1", "action": "react", "emoji": "❤" }
            }),
            json!({
                "sender": { "id": "U1" },
                "recipient": { "id": "BIZ123" },
                "read": { "mid": "M1" }
            }),
        ]))
        .await;

    assert_eq!(ack, EVENT_ACK);
    assert!(store.messages().is_empty());
    assert!(store.conversations().is_empty());
}

#[tokio::test]
async fn test_repeat_sender_reuses_conversation() {
    let store = Arc::new(MockStore::new());
    let graph = Arc::new(MockGraph::new());
    store.add_account(test_account("PAGE1", "BIZ123"));

    let processor = processor(&store, &graph);
    processor
        .ingest(delivery(vec![
            text_event("U1", "BIZ123", "M1", "first"),
            text_event("U1", "BIZ123", "M2", "second"),
        ]))
        .await;

    let conversations = store.conversations();
    assert_eq!(conversations.len(), 1);
    assert_eq!(conversations[0].unread_count, 2);
    assert_eq!(conversations[0].last_message.as_deref(), Some("second"));
    assert_eq!(store.messages().len(), 2);
}

#[tokio::test]
async fn test_long_text_preview_is_clipped() {
    let store = Arc::new(MockStore::new());
    let graph = Arc::new(MockGraph::new());
    store.add_account(test_account("PAGE1", "BIZ123"));

    let long_text = "x".repeat(PREVIEW_MAX_CHARS + 100);
    let processor = processor(&store, &graph);
    processor
        .ingest(delivery(vec![text_event("U1", "BIZ123", "M1", &long_text)]))
        .await;

    let messages = store.messages();
    assert_eq!(messages[0].text.as_deref(), Some(long_text.as_str()));

    let preview = store.conversations()[0].last_message.clone().unwrap();
    assert_eq!(preview.chars().count(), PREVIEW_MAX_CHARS);
}

#[tokio::test]
async fn test_undecodable_delivery_still_acked() {
    let store = Arc::new(MockStore::new());
    let graph = Arc::new(MockGraph::new());

    let processor = processor(&store, &graph);
    let ack = processor.ingest(json!({ "entry": "not-a-list" })).await;

    assert_eq!(ack, EVENT_ACK);
    assert!(store.messages().is_empty());
}

#[tokio::test]
async fn test_verify_matrix() {
    let store = Arc::new(MockStore::new());
    let graph = Arc::new(MockGraph::new());
    let processor = processor(&store, &graph);

    assert_eq!(
        processor.verify("subscribe", VERIFY_TOKEN, "challenge-1"),
        Some("challenge-1".to_string())
    );
    assert_eq!(processor.verify("subscribe", "wrong-token", "challenge-1"), None);
    assert_eq!(processor.verify("unsubscribe", VERIFY_TOKEN, "challenge-1"), None);
    assert_eq!(processor.verify("", "", "challenge-1"), None);
}
