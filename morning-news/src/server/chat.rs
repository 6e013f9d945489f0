//! `/api/chat`: conversational turns and session management.

use rocket::serde::json::Json;
use rocket::{delete, get, post, routes, Route, State};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::error::{ApiError, ApiResult};
use super::AppState;
use crate::sessions::{self, ChatMessage, Conversation, SessionSummary};
use crate::storage;

/// Articles handed to the assistant as context for each turn
const CONTEXT_ARTICLES: i64 = 10;
const MAX_SOURCES: usize = 3;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatReply {
    pub response: String,
    pub session_id: String,
    pub sources: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ConversationHistory {
    #[serde(flatten)]
    pub conversation: Conversation,
    pub messages: Vec<ChatMessage>,
}

#[post("/message", data = "<body>")]
async fn send_message(state: &State<AppState>, body: Json<ChatRequest>) -> ApiResult<Json<ChatReply>> {
    const CONTEXT: &str = "Error processing message";
    let pool = &state.db;

    let resolution =
        sessions::resolve_conversation(pool, body.session_id.as_deref(), body.user_id.as_deref())
            .await
            .map_err(|e| ApiError::internal(CONTEXT, e))?;
    let conversation = resolution.conversation;

    // History is read before the new turn is stored, so it only holds earlier turns
    let history = sessions::get_messages(pool, conversation.id)
        .await
        .map_err(|e| ApiError::internal(CONTEXT, e))?;

    let articles = storage::list_recent_articles(pool, CONTEXT_ARTICLES, None)
        .await
        .map_err(|e| ApiError::internal(CONTEXT, e))?;

    let response = state
        .assistant
        .chat_response(&body.message, &history, &articles)
        .await;

    sessions::append_exchange(pool, conversation.id, &body.message, &response)
        .await
        .map_err(|e| ApiError::internal(CONTEXT, e))?;

    let sources = articles
        .iter()
        .take(MAX_SOURCES)
        .filter_map(|a| a.url.clone())
        .collect();

    Ok(Json(ChatReply {
        response,
        session_id: conversation.session_id,
        sources,
    }))
}

#[get("/history/<session_id>")]
async fn history(state: &State<AppState>, session_id: &str) -> ApiResult<Json<ConversationHistory>> {
    let found = sessions::get_conversation_with_messages(&state.db, session_id)
        .await
        .map_err(|e| ApiError::internal("Error fetching history", e))?;

    match found {
        Some((conversation, messages)) => Ok(Json(ConversationHistory { conversation, messages })),
        None => Err(ApiError::NotFound("Conversation not found")),
    }
}

#[post("/new-session?<user_id>")]
async fn new_session(state: &State<AppState>, user_id: Option<&str>) -> ApiResult<Json<serde_json::Value>> {
    let conversation = sessions::create_conversation(&state.db, user_id)
        .await
        .map_err(|e| ApiError::internal("Error creating session", e))?;
    Ok(Json(json!({ "session_id": conversation.session_id })))
}

#[get("/sessions?<user_id>")]
async fn list_sessions(state: &State<AppState>, user_id: &str) -> ApiResult<Json<Vec<SessionSummary>>> {
    sessions::list_conversations(&state.db, user_id)
        .await
        .map(Json)
        .map_err(|e| ApiError::internal("Error fetching sessions", e))
}

#[delete("/session/<session_id>")]
async fn delete_session(state: &State<AppState>, session_id: &str) -> ApiResult<Json<serde_json::Value>> {
    let deleted = sessions::delete_conversation(&state.db, session_id)
        .await
        .map_err(|e| ApiError::internal("Error deleting session", e))?;

    if !deleted {
        return Err(ApiError::NotFound("Conversation not found"));
    }
    Ok(Json(json!({ "message": "Session deleted successfully" })))
}

pub fn routes() -> Vec<Route> {
    routes![send_message, history, new_session, list_sessions, delete_session]
}
