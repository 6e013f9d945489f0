//! Rocket HTTP surface. `main` builds the services once and hands them over in
//! [`AppState`]; the server never opens or migrates the database itself.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use rocket::serde::json::Json;
use rocket::{catchers, get, routes, Build, Rocket, State};
use serde_json::json;

use common::Config;

use crate::assistant::Assistant;
use crate::ingestion::NewsAggregator;
use crate::storage;

pub mod chat;
pub mod cors;
pub mod error;
pub mod news;
pub mod user;

pub use error::{ApiError, ApiResult};

/// Application state stored inside Rocket managed state.
#[derive(Clone)]
pub struct AppState {
    pub started_at: DateTime<Utc>,
    pub config: Arc<Config>,
    pub db: sqlx::SqlitePool,
    pub assistant: Arc<Assistant>,
    pub news: Arc<NewsAggregator>,
}

#[get("/")]
fn index() -> Json<serde_json::Value> {
    Json(json!({ "message": "Morning News AI Assistant API", "version": "1.0.0" }))
}

#[get("/health")]
fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "healthy", "service": "morning-news-api" }))
}

/// Uptime, environment and store size
#[get("/api/status")]
async fn status(state: &State<AppState>) -> ApiResult<Json<serde_json::Value>> {
    let articles = storage::count_articles(&state.db)
        .await
        .map_err(|e| ApiError::internal("Error fetching status", e))?;

    Ok(Json(json!({
        "status": "ok",
        "uptime_seconds": (Utc::now() - state.started_at).num_seconds(),
        "environment": state.config.app.environment,
        "articles": articles,
        "llm_configured": state.assistant.has_provider(),
    })))
}

/// Assemble the Rocket instance: routes, catchers, CORS and the bind address
/// from `[server]`.
pub fn build_rocket(state: AppState) -> Rocket<Build> {
    let fig = rocket::Config::figment()
        .merge(("address", state.config.server.address.clone()))
        .merge(("port", state.config.server.port));

    let cors = cors::Cors::new(state.config.app.allowed_origins.clone());

    rocket::custom(fig)
        .manage(state)
        .attach(cors)
        .mount("/", routes![index, health, status, cors::preflight])
        .mount("/api/chat", chat::routes())
        .mount("/api/news", news::routes())
        .mount("/api/user", user::routes())
        .register("/", catchers![error::not_found, error::default_catcher])
}

/// Build and launch the server. Blocks until Rocket shuts down
/// (SIGINT/SIGTERM or Ctrl-C).
pub async fn launch_rocket(state: AppState) -> Result<()> {
    tracing::info!(
        address = %state.config.server.address,
        port = state.config.server.port,
        "Starting Rocket HTTP server"
    );

    build_rocket(state)
        .launch()
        .await
        .map_err(|e| anyhow!("Rocket failed: {}", e))?;

    tracing::info!("Rocket HTTP server has shut down");
    Ok(())
}
