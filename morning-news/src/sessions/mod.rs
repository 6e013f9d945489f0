use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::fmt;
use std::str::FromStr;
use tracing::info;
use uuid::Uuid;

/// Author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            other => Err(anyhow!("unknown message role: {}", other)),
        }
    }
}

/// Conversation represents one chat session, addressed externally by `session_id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Conversation {
    pub id: i64,
    pub user_id: Option<String>,
    pub session_id: String,
    pub created_at: DateTime<Utc>,
}

/// ChatMessage represents a single message in a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: i64,
    pub conversation_id: i64,
    pub content: String,
    pub role: Role,
    pub timestamp: DateTime<Utc>,
}

/// Row of the per-user session listing
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SessionSummary {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub message_count: i64,
}

/// Outcome of [`resolve_conversation`]
#[derive(Debug, Clone)]
pub struct SessionResolution {
    pub conversation: Conversation,
    /// True when no conversation matched and a new one was created
    pub created: bool,
}

/// Create a new conversation with a freshly minted session token
pub async fn create_conversation(pool: &SqlitePool, user_id: Option<&str>) -> Result<Conversation> {
    let session_id = Uuid::new_v4().to_string();

    let conversation = sqlx::query_as::<_, Conversation>(
        r#"
        INSERT INTO conversations (user_id, session_id, created_at)
        VALUES (?, ?, ?)
        RETURNING id, user_id, session_id, created_at
        "#,
    )
    .bind(user_id)
    .bind(&session_id)
    .bind(Utc::now())
    .fetch_one(pool)
    .await
    .context("Failed to insert conversation")?;

    info!(session_id = %conversation.session_id, "created conversation");
    Ok(conversation)
}

/// Look up a conversation by its session token
pub async fn find_conversation(pool: &SqlitePool, session_id: &str) -> Result<Option<Conversation>> {
    sqlx::query_as::<_, Conversation>(
        "SELECT id, user_id, session_id, created_at FROM conversations WHERE session_id = ?",
    )
    .bind(session_id)
    .fetch_optional(pool)
    .await
    .context("Failed to fetch conversation")
}

/// Get-or-create: reuse the conversation addressed by `session_id` when it exists,
/// otherwise create a new conversation with a fresh token. An unknown token is never
/// adopted; the caller receives the new token in the returned conversation.
pub async fn resolve_conversation(
    pool: &SqlitePool,
    session_id: Option<&str>,
    user_id: Option<&str>,
) -> Result<SessionResolution> {
    if let Some(session_id) = session_id.filter(|s| !s.is_empty()) {
        if let Some(conversation) = find_conversation(pool, session_id).await? {
            return Ok(SessionResolution { conversation, created: false });
        }
    }

    let conversation = create_conversation(pool, user_id).await?;
    Ok(SessionResolution { conversation, created: true })
}

/// List all sessions for a user, newest first
pub async fn list_conversations(pool: &SqlitePool, user_id: &str) -> Result<Vec<SessionSummary>> {
    sqlx::query_as::<_, SessionSummary>(
        r#"
        SELECT c.session_id, c.created_at, COUNT(m.id) AS message_count
        FROM conversations c
        LEFT JOIN messages m ON m.conversation_id = c.id
        WHERE c.user_id = ?
        GROUP BY c.id
        ORDER BY c.created_at DESC, c.id DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .context("Failed to list sessions")
}

/// Get all messages for a conversation in the order they were appended
pub async fn get_messages(pool: &SqlitePool, conversation_id: i64) -> Result<Vec<ChatMessage>> {
    let rows = sqlx::query_as::<_, ChatMessageRow>(
        r#"
        SELECT id, conversation_id, content, role, timestamp
        FROM messages
        WHERE conversation_id = ?
        ORDER BY timestamp ASC, id ASC
        "#,
    )
    .bind(conversation_id)
    .fetch_all(pool)
    .await
    .context("Failed to fetch messages")?;

    rows.into_iter().map(ChatMessage::try_from).collect()
}

/// Get a conversation together with its full message history
pub async fn get_conversation_with_messages(
    pool: &SqlitePool,
    session_id: &str,
) -> Result<Option<(Conversation, Vec<ChatMessage>)>> {
    let Some(conversation) = find_conversation(pool, session_id).await? else {
        return Ok(None);
    };
    let messages = get_messages(pool, conversation.id).await?;
    Ok(Some((conversation, messages)))
}

/// Store a single chat message
pub async fn append_message(
    pool: &SqlitePool,
    conversation_id: i64,
    role: Role,
    content: &str,
) -> Result<ChatMessage> {
    let row = sqlx::query_as::<_, ChatMessageRow>(
        r#"
        INSERT INTO messages (conversation_id, content, role, timestamp)
        VALUES (?, ?, ?, ?)
        RETURNING id, conversation_id, content, role, timestamp
        "#,
    )
    .bind(conversation_id)
    .bind(content)
    .bind(role.as_str())
    .bind(Utc::now())
    .fetch_one(pool)
    .await
    .context("Failed to insert message")?;

    ChatMessage::try_from(row)
}

/// Store a user turn and the assistant's reply atomically, in that order
pub async fn append_exchange(
    pool: &SqlitePool,
    conversation_id: i64,
    user_content: &str,
    assistant_content: &str,
) -> Result<(ChatMessage, ChatMessage)> {
    let mut tx = pool.begin().await.context("Failed to begin message transaction")?;

    let mut stored = Vec::with_capacity(2);
    for (role, content) in [(Role::User, user_content), (Role::Assistant, assistant_content)] {
        let row = sqlx::query_as::<_, ChatMessageRow>(
            r#"
            INSERT INTO messages (conversation_id, content, role, timestamp)
            VALUES (?, ?, ?, ?)
            RETURNING id, conversation_id, content, role, timestamp
            "#,
        )
        .bind(conversation_id)
        .bind(content)
        .bind(role.as_str())
        .bind(Utc::now())
        .fetch_one(&mut tx)
        .await
        .with_context(|| format!("Failed to insert {} message", role))?;
        stored.push(ChatMessage::try_from(row)?);
    }

    tx.commit().await.context("Failed to commit messages")?;

    let assistant = stored.pop().context("assistant message missing")?;
    let user = stored.pop().context("user message missing")?;
    Ok((user, assistant))
}

/// Delete a conversation and all of its messages in one transaction.
/// Returns false when no conversation has this session token.
pub async fn delete_conversation(pool: &SqlitePool, session_id: &str) -> Result<bool> {
    let mut tx = pool.begin().await.context("Failed to begin delete transaction")?;

    let conversation_id = sqlx::query_scalar::<_, i64>(
        "SELECT id FROM conversations WHERE session_id = ?",
    )
    .bind(session_id)
    .fetch_optional(&mut tx)
    .await
    .context("Failed to fetch conversation")?;

    let Some(conversation_id) = conversation_id else {
        tx.rollback().await.context("Failed to roll back delete")?;
        return Ok(false);
    };

    let removed = sqlx::query("DELETE FROM messages WHERE conversation_id = ?")
        .bind(conversation_id)
        .execute(&mut tx)
        .await
        .context("Failed to delete messages")?
        .rows_affected();

    sqlx::query("DELETE FROM conversations WHERE id = ?")
        .bind(conversation_id)
        .execute(&mut tx)
        .await
        .context("Failed to delete conversation")?;

    tx.commit().await.context("Failed to commit delete")?;
    info!(%session_id, messages = removed, "deleted conversation");
    Ok(true)
}

// Internal row type for SQLx mapping
#[derive(sqlx::FromRow)]
struct ChatMessageRow {
    id: i64,
    conversation_id: i64,
    content: String,
    role: String,
    timestamp: DateTime<Utc>,
}

impl TryFrom<ChatMessageRow> for ChatMessage {
    type Error = anyhow::Error;

    fn try_from(row: ChatMessageRow) -> Result<Self> {
        Ok(ChatMessage {
            id: row.id,
            conversation_id: row.conversation_id,
            content: row.content,
            role: row.role.parse()?,
            timestamp: row.timestamp,
        })
    }
}
