use morning_news::sessions::{
    append_exchange, append_message, create_conversation, delete_conversation,
    get_conversation_with_messages, get_messages, list_conversations, resolve_conversation, Role,
};

async fn setup_test_db() -> sqlx::SqlitePool {
    let pool = common::init_db_pool("sqlite::memory:", 1)
        .await
        .expect("Failed to create test pool");
    common::ensure_schema(&pool).await.expect("Failed to create schema");
    pool
}

#[tokio::test]
async fn test_conversation_crud() {
    let pool = setup_test_db().await;

    // Test 1: Create conversation
    let conversation = create_conversation(&pool, Some("user-1"))
        .await
        .expect("Failed to create conversation");
    assert_eq!(conversation.user_id.as_deref(), Some("user-1"));
    assert_eq!(conversation.session_id.len(), 36);

    // Test 2: Append messages
    append_message(&pool, conversation.id, Role::User, "Hello")
        .await
        .expect("Failed to store user message");
    append_exchange(&pool, conversation.id, "Any news?", "Plenty!")
        .await
        .expect("Failed to store exchange");

    // Test 3: Messages come back in append order with roles preserved
    let messages = get_messages(&pool, conversation.id).await.unwrap();
    let turns: Vec<(Role, &str)> = messages.iter().map(|m| (m.role, m.content.as_str())).collect();
    assert_eq!(
        turns,
        vec![
            (Role::User, "Hello"),
            (Role::User, "Any news?"),
            (Role::Assistant, "Plenty!"),
        ]
    );

    // Test 4: Listing counts messages
    let sessions = list_conversations(&pool, "user-1").await.unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].session_id, conversation.session_id);
    assert_eq!(sessions[0].message_count, 3);
    assert!(list_conversations(&pool, "someone-else").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_resolve_reuses_known_and_mints_for_unknown() {
    let pool = setup_test_db().await;

    let fresh = resolve_conversation(&pool, None, None).await.unwrap();
    assert!(fresh.created);

    let reused = resolve_conversation(&pool, Some(&fresh.conversation.session_id), None)
        .await
        .unwrap();
    assert!(!reused.created);
    assert_eq!(reused.conversation.id, fresh.conversation.id);

    let unknown = resolve_conversation(&pool, Some("not-a-session"), Some("u"))
        .await
        .unwrap();
    assert!(unknown.created);
    assert_ne!(unknown.conversation.session_id, "not-a-session");
    assert_ne!(unknown.conversation.session_id, fresh.conversation.session_id);
}

#[tokio::test]
async fn test_delete_removes_conversation_and_messages() {
    let pool = setup_test_db().await;

    let conversation = create_conversation(&pool, None).await.unwrap();
    append_exchange(&pool, conversation.id, "q", "a").await.unwrap();

    assert!(delete_conversation(&pool, &conversation.session_id).await.unwrap());
    assert!(get_conversation_with_messages(&pool, &conversation.session_id)
        .await
        .unwrap()
        .is_none());

    let orphans: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM messages WHERE conversation_id = ?")
        .bind(conversation.id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(orphans, 0);

    // Second delete reports unknown
    assert!(!delete_conversation(&pool, &conversation.session_id).await.unwrap());
}
