// Integration tests for direct messages and conversation summaries.

mod common;

use common::spawn_app;
use uuid::Uuid;
use workbridge::{
    models::{chatmodels::ConversationId, usermodel::UserRole},
    service::error::ServiceError,
};

#[tokio::test]
async fn test_self_message_is_refused_first() {
    let app = spawn_app().await;
    let alice = app.client("alice@shop.io").await;

    // Even an empty body reports the self-message.
    assert!(matches!(
        app.state
            .chat_service
            .send_direct_message(&alice, alice.id, String::new())
            .await,
        Err(ServiceError::SelfMessage)
    ));
}

#[tokio::test]
async fn test_send_validation() {
    let app = spawn_app().await;
    let chat = &app.state.chat_service;
    let alice = app.client("alice@shop.io").await;
    let bob = app.freelancer("bob@work.io").await;

    assert!(matches!(
        chat.send_direct_message(&alice, Uuid::new_v4(), "hello".to_string())
            .await,
        Err(ServiceError::NotFound(_))
    ));
    assert!(matches!(
        chat.send_direct_message(&alice, bob.id, "   ".to_string()).await,
        Err(ServiceError::Validation(_))
    ));
    assert!(matches!(
        chat.send_direct_message(&alice, bob.id, "x".repeat(5001)).await,
        Err(ServiceError::Validation(_))
    ));
    assert!(chat
        .send_direct_message(&alice, bob.id, "x".repeat(5000))
        .await
        .is_ok());
}

#[tokio::test]
async fn test_both_directions_share_a_conversation() {
    let app = spawn_app().await;
    let chat = &app.state.chat_service;
    let alice = app.client("alice@shop.io").await;
    let bob = app.freelancer("bob@work.io").await;

    let first = chat
        .send_direct_message(&alice, bob.id, "Are you free next week?".to_string())
        .await
        .unwrap();
    let reply = chat
        .send_direct_message(&bob, alice.id, "Yes, from Tuesday.".to_string())
        .await
        .unwrap();

    assert_eq!(first.conversation_id, reply.conversation_id);
    assert_eq!(first.conversation_id, ConversationId::between(bob.id, alice.id));
    assert!(!first.message.is_read);

    let messages = chat
        .get_messages(&bob, &first.conversation_id.to_string())
        .await
        .unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].message.content, "Are you free next week?");
    assert_eq!(messages[0].sender_name, "Client");
    assert_eq!(messages[0].sender_role, UserRole::Client);
    assert_eq!(messages[1].sender_name, "Freelancer");
    assert_eq!(messages[1].sender_role, UserRole::Freelancer);
}

#[tokio::test]
async fn test_conversation_summaries() {
    let app = spawn_app().await;
    let chat = &app.state.chat_service;
    let alice = app.client("alice@shop.io").await;
    let bob = app.freelancer("bob@work.io").await;
    let carol = app.freelancer("carol@work.io").await;

    chat.send_direct_message(&bob, alice.id, "First from bob".to_string())
        .await
        .unwrap();
    chat.send_direct_message(&bob, alice.id, "Second from bob".to_string())
        .await
        .unwrap();
    let long = "y".repeat(250);
    chat.send_direct_message(&carol, alice.id, long.clone())
        .await
        .unwrap();
    chat.send_direct_message(&alice, bob.id, "Latest, to bob".to_string())
        .await
        .unwrap();

    let summaries = chat.list_conversations(&alice).await.unwrap();
    assert_eq!(summaries.len(), 2);

    // Bob's thread carries the most recent message.
    assert_eq!(summaries[0].other_user.id, bob.id);
    assert_eq!(summaries[0].last_message_preview, "Latest, to bob");
    assert_eq!(summaries[0].unread_count, 2);

    assert_eq!(summaries[1].other_user.id, carol.id);
    assert_eq!(summaries[1].last_message_preview.chars().count(), 100);
    assert!(long.starts_with(&summaries[1].last_message_preview));
    assert_eq!(summaries[1].unread_count, 1);
    assert_eq!(
        summaries[1].conversation_id,
        ConversationId::between(alice.id, carol.id)
    );

    assert_eq!(chat.unread_total(&alice).await.unwrap(), 3);
    assert_eq!(chat.unread_total(&bob).await.unwrap(), 1);

    let bob_view = chat.list_conversations(&bob).await.unwrap();
    assert_eq!(bob_view.len(), 1);
    assert_eq!(bob_view[0].unread_count, 1);
}

#[tokio::test]
async fn test_mark_read_is_idempotent() {
    let app = spawn_app().await;
    let chat = &app.state.chat_service;
    let alice = app.client("alice@shop.io").await;
    let bob = app.freelancer("bob@work.io").await;

    let sent = chat
        .send_direct_message(&bob, alice.id, "one".to_string())
        .await
        .unwrap();
    chat.send_direct_message(&bob, alice.id, "two".to_string())
        .await
        .unwrap();
    chat.send_direct_message(&alice, bob.id, "three".to_string())
        .await
        .unwrap();
    let conversation = sent.conversation_id.to_string();

    assert_eq!(chat.mark_conversation_read(&alice, &conversation).await.unwrap(), 2);
    assert_eq!(chat.mark_conversation_read(&alice, &conversation).await.unwrap(), 0);

    assert_eq!(chat.unread_total(&alice).await.unwrap(), 0);
    // Alice's own message to bob stays unread for him.
    assert_eq!(chat.unread_total(&bob).await.unwrap(), 1);

    let summaries = chat.list_conversations(&alice).await.unwrap();
    assert_eq!(summaries[0].unread_count, 0);
}

#[tokio::test]
async fn test_outsiders_cannot_read() {
    let app = spawn_app().await;
    let chat = &app.state.chat_service;
    let alice = app.client("alice@shop.io").await;
    let bob = app.freelancer("bob@work.io").await;
    let eve = app.client("eve@shop.io").await;

    let sent = chat
        .send_direct_message(&alice, bob.id, "private".to_string())
        .await
        .unwrap();
    let conversation = sent.conversation_id.to_string();

    assert!(matches!(
        chat.get_messages(&eve, &conversation).await,
        Err(ServiceError::Forbidden(_))
    ));
    assert!(matches!(
        chat.mark_conversation_read(&eve, &conversation).await,
        Err(ServiceError::Forbidden(_))
    ));

    // Admins get no special access to private threads.
    let root = app.root_admin().await;
    assert!(matches!(
        chat.get_messages(&root, &conversation).await,
        Err(ServiceError::Forbidden(_))
    ));
}

#[tokio::test]
async fn test_malformed_conversation_id() {
    let app = spawn_app().await;
    let chat = &app.state.chat_service;
    let alice = app.client("alice@shop.io").await;

    let same_user = format!("{}:{}", alice.id, alice.id);
    for raw in ["", "garbage", same_user.as_str()] {
        assert!(matches!(
            chat.get_messages(&alice, raw).await,
            Err(ServiceError::Validation(_))
        ));
    }
}

#[tokio::test]
async fn test_empty_inbox() {
    let app = spawn_app().await;
    let alice = app.client("alice@shop.io").await;

    assert!(app
        .state
        .chat_service
        .list_conversations(&alice)
        .await
        .unwrap()
        .is_empty());
    assert_eq!(app.state.chat_service.unread_total(&alice).await.unwrap(), 0);
}
