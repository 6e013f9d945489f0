use std::sync::Arc;

use chrono::Utc;
use rocket::http::{ContentType, Header, Status};
use rocket::local::asynchronous::Client;
use serde_json::{json, Value};

use common::Config;
use morning_news::assistant::{prompts, Assistant, AssistantSettings};
use morning_news::ingestion::NewsAggregator;
use morning_news::server::{build_rocket, AppState};
use morning_news::storage::{self, NewArticle};

/// Rocket client over an in-memory store, with no provider keys and no model
async fn setup_client() -> (Client, sqlx::SqlitePool) {
    let pool = common::init_db_pool("sqlite::memory:", 1)
        .await
        .expect("Failed to create test pool");
    common::ensure_schema(&pool).await.expect("Failed to create schema");

    let config = Config::default();
    let state = AppState {
        started_at: Utc::now(),
        news: Arc::new(NewsAggregator::new(&config.news).unwrap()),
        assistant: Arc::new(Assistant::new(None, AssistantSettings::default())),
        config: Arc::new(config),
        db: pool.clone(),
    };

    let client = Client::tracked(build_rocket(state))
        .await
        .expect("valid rocket instance");
    (client, pool)
}

async fn post_json(client: &Client, uri: &str, body: Value) -> (Status, Value) {
    let response = client
        .post(uri.to_string())
        .header(ContentType::JSON)
        .body(body.to_string())
        .dispatch()
        .await;
    let status = response.status();
    (status, response.into_json().await.unwrap_or(Value::Null))
}

async fn get_json(client: &Client, uri: &str) -> (Status, Value) {
    let response = client.get(uri.to_string()).dispatch().await;
    let status = response.status();
    (status, response.into_json().await.unwrap_or(Value::Null))
}

#[tokio::test]
async fn test_root_and_health() {
    let (client, _pool) = setup_client().await;

    let (status, body) = get_json(&client, "/").await;
    assert_eq!(status, Status::Ok);
    assert_eq!(body["message"], "Morning News AI Assistant API");

    let (status, body) = get_json(&client, "/health").await;
    assert_eq!(status, Status::Ok);
    assert_eq!(body, json!({"status": "healthy", "service": "morning-news-api"}));

    let (status, body) = get_json(&client, "/api/status").await;
    assert_eq!(status, Status::Ok);
    assert_eq!(body["articles"], 0);
    assert_eq!(body["llm_configured"], false);

    let (status, body) = get_json(&client, "/no/such/route").await;
    assert_eq!(status, Status::NotFound);
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn test_chat_session_lifecycle() {
    let (client, _pool) = setup_client().await;

    // No session id: a new one is minted
    let (status, first) = post_json(&client, "/api/chat/message", json!({"message": "Good morning"})).await;
    assert_eq!(status, Status::Ok);
    let session_id = first["session_id"].as_str().unwrap().to_string();
    assert!(!first["response"].as_str().unwrap().is_empty());
    assert_eq!(first["sources"], json!([]));

    // Known session id: reused
    let (_, second) = post_json(
        &client,
        "/api/chat/message",
        json!({"message": "What's new?", "session_id": session_id}),
    )
    .await;
    assert_eq!(second["session_id"], session_id.as_str());

    // Unknown session id: a different fresh one
    let (_, third) = post_json(
        &client,
        "/api/chat/message",
        json!({"message": "Hi", "session_id": "made-up"}),
    )
    .await;
    let third_id = third["session_id"].as_str().unwrap();
    assert_ne!(third_id, "made-up");
    assert_ne!(third_id, session_id);

    let (status, history) = get_json(&client, &format!("/api/chat/history/{}", session_id)).await;
    assert_eq!(status, Status::Ok);
    assert_eq!(history["session_id"], session_id.as_str());
    let messages = history["messages"].as_array().unwrap();
    let roles: Vec<&str> = messages.iter().map(|m| m["role"].as_str().unwrap()).collect();
    assert_eq!(roles, ["user", "assistant", "user", "assistant"]);
    assert_eq!(messages[0]["content"], "Good morning");
    assert_eq!(messages[2]["content"], "What's new?");

    let response = client
        .delete(format!("/api/chat/session/{}", session_id))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);

    let (status, body) = get_json(&client, &format!("/api/chat/history/{}", session_id)).await;
    assert_eq!(status, Status::NotFound);
    assert_eq!(body["detail"], "Conversation not found");

    let response = client
        .delete(format!("/api/chat/session/{}", session_id))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::NotFound);
}

#[tokio::test]
async fn test_sessions_listed_per_user() {
    let (client, _pool) = setup_client().await;

    let (status, created) = post_json(&client, "/api/chat/new-session?user_id=alice", json!({})).await;
    assert_eq!(status, Status::Ok);
    let session_id = created["session_id"].as_str().unwrap();

    post_json(
        &client,
        "/api/chat/message",
        json!({"message": "hello", "session_id": session_id}),
    )
    .await;

    let (status, sessions) = get_json(&client, "/api/chat/sessions?user_id=alice").await;
    assert_eq!(status, Status::Ok);
    assert_eq!(sessions[0]["session_id"], session_id);
    assert_eq!(sessions[0]["message_count"], 2);

    let (_, none) = get_json(&client, "/api/chat/sessions?user_id=bob").await;
    assert_eq!(none, json!([]));
}

#[tokio::test]
async fn test_chat_sources_come_from_recent_articles() {
    let (client, pool) = setup_client().await;

    let articles: Vec<NewArticle> = (0..5)
        .map(|i| NewArticle {
            title: format!("Story {}", i),
            source: "Reuters".to_string(),
            url: Some(format!("https://example.com/{}", i)),
            category: Some("business".to_string()),
            ..Default::default()
        })
        .collect();
    storage::insert_articles(&pool, &articles).await.unwrap();

    let (_, reply) = post_json(&client, "/api/chat/message", json!({"message": "Markets?"})).await;
    assert_eq!(reply["sources"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_news_endpoints_over_stored_articles() {
    let (client, pool) = setup_client().await;

    // Empty store and no provider keys: refresh finds nothing
    let (status, briefing) = get_json(&client, "/api/news/briefing").await;
    assert_eq!(status, Status::Ok);
    assert_eq!(briefing["summary"], prompts::EMPTY_BRIEFING);
    assert_eq!(briefing["articles"], json!([]));

    let articles: Vec<NewArticle> = (0..12)
        .map(|i| NewArticle {
            title: format!("Story {}", i),
            source: "Reuters".to_string(),
            category: Some(if i % 2 == 0 { "world" } else { "business" }.to_string()),
            ..Default::default()
        })
        .collect();
    storage::insert_articles(&pool, &articles).await.unwrap();

    let (_, briefing) = get_json(&client, "/api/news/briefing").await;
    assert_eq!(briefing["articles"].as_array().unwrap().len(), 10);
    assert_eq!(briefing["categories"], json!(["business", "world"]));
    assert!(!briefing["summary"].as_str().unwrap().is_empty());

    let (_, listed) = get_json(&client, "/api/news/articles?limit=3&category=world").await;
    let listed = listed.as_array().unwrap();
    assert_eq!(listed.len(), 3);
    assert!(listed.iter().all(|a| a["category"] == "world"));

    let (_, categories) = get_json(&client, "/api/news/categories").await;
    assert_eq!(categories, json!(["business", "world"]));

    let id = listed[0]["id"].as_i64().unwrap();
    let (status, summary) = get_json(&client, &format!("/api/news/article/{}/summary", id)).await;
    assert_eq!(status, Status::Ok);
    assert!(!summary["summary"].as_str().unwrap().is_empty());

    let (status, body) = get_json(&client, "/api/news/article/99999/summary").await;
    assert_eq!(status, Status::NotFound);
    assert_eq!(body["detail"], "Article not found");

    let (status, refreshed) = post_json(&client, "/api/news/refresh", json!({})).await;
    assert_eq!(status, Status::Ok);
    assert_eq!(refreshed["fetched"], 0);
    assert_eq!(refreshed["saved"], 0);

    let (_, topics) = get_json(&client, "/api/news/topics").await;
    // Offline: first-seen categories of the newest articles
    assert_eq!(topics["topics"], json!(["business", "world"]));
}

#[tokio::test]
async fn test_user_preferences_routes() {
    let (client, _pool) = setup_client().await;

    // Categories of an unknown user are the defaults and are not persisted
    let (_, categories) = get_json(&client, "/api/user/preferences/carol/categories").await;
    assert_eq!(categories["categories"], json!(["general", "business", "technology"]));

    let (status, prefs) = get_json(&client, "/api/user/preferences/carol").await;
    assert_eq!(status, Status::Ok);
    assert_eq!(prefs["preferred_categories"], json!(["general", "business", "technology"]));
    assert_eq!(prefs["tone_preference"], "casual");
    assert_eq!(prefs["briefing_time"], "08:00");

    let (_, again) = get_json(&client, "/api/user/preferences/carol").await;
    assert_eq!(again, prefs);

    let (status, updated) = post_json(
        &client,
        "/api/user/preferences/carol/categories",
        json!(["science", "health"]),
    )
    .await;
    assert_eq!(status, Status::Ok);
    assert_eq!(updated["categories"], json!(["science", "health"]));

    let (status, _) = post_json(&client, "/api/user/preferences/carol/tone", json!({"tone": "sarcastic"})).await;
    assert_eq!(status, Status::BadRequest);

    let (status, toned) = post_json(&client, "/api/user/preferences/carol/tone", json!({"tone": "serious"})).await;
    assert_eq!(status, Status::Ok);
    assert_eq!(toned["tone"], "serious");

    let (status, saved) = post_json(&client, "/api/user/preferences", json!({"user_id": "dave"})).await;
    assert_eq!(status, Status::Ok);
    assert_eq!(saved["preferred_categories"], json!([]));
    assert_eq!(saved["tone_preference"], "casual");

    let (_, available) = get_json(&client, "/api/user/available-categories").await;
    assert_eq!(available["categories"].as_array().unwrap().len(), 9);

    let (_, tones) = get_json(&client, "/api/user/tone-options").await;
    assert_eq!(tones["tones"][0], json!({"value": "casual", "label": "Casual & Friendly"}));
}

#[tokio::test]
async fn test_cors_headers_for_allowed_origin() {
    let (client, _pool) = setup_client().await;

    let response = client
        .get("/health")
        .header(Header::new("Origin", "http://localhost:3000"))
        .dispatch()
        .await;
    assert_eq!(
        response.headers().get_one("Access-Control-Allow-Origin"),
        Some("http://localhost:3000")
    );

    let response = client
        .get("/health")
        .header(Header::new("Origin", "http://elsewhere.test"))
        .dispatch()
        .await;
    assert!(response.headers().get_one("Access-Control-Allow-Origin").is_none());

    let preflight = client
        .options("/api/chat/message")
        .header(Header::new("Origin", "http://localhost:3000"))
        .dispatch()
        .await;
    assert_eq!(preflight.status(), Status::NoContent);
}
