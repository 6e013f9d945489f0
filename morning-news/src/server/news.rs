//! `/api/news`: briefing, article listings, refresh and topic endpoints.

use chrono::{DateTime, Utc};
use rocket::serde::json::Json;
use rocket::{get, post, routes, Route, State};
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeSet;

use super::error::{ApiError, ApiResult};
use super::AppState;
use crate::ingestion;
use crate::storage::{self, Article};

const BRIEFING_POOL: i64 = 20;
const BRIEFING_ARTICLES: usize = 10;
const DEFAULT_LIMIT: i64 = 20;

#[derive(Debug, Serialize)]
pub struct Briefing {
    pub summary: String,
    pub articles: Vec<Article>,
    pub generated_at: DateTime<Utc>,
    pub categories: Vec<String>,
}

#[get("/briefing")]
async fn briefing(state: &State<AppState>) -> ApiResult<Json<Briefing>> {
    const CONTEXT: &str = "Error generating briefing";
    let pool = &state.db;

    let mut articles = storage::list_recent_articles(pool, BRIEFING_POOL, None)
        .await
        .map_err(|e| ApiError::internal(CONTEXT, e))?;

    if articles.is_empty() {
        tracing::info!("article store empty, refreshing before briefing");
        ingestion::refresh_news(pool, &state.news)
            .await
            .map_err(|e| ApiError::internal(CONTEXT, e))?;
        articles = storage::list_recent_articles(pool, BRIEFING_POOL, None)
            .await
            .map_err(|e| ApiError::internal(CONTEXT, e))?;
    }

    let summary = state.assistant.generate_morning_briefing(&articles).await;

    let categories = articles
        .iter()
        .filter_map(|a| a.category.clone())
        .filter(|c| !c.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    articles.truncate(BRIEFING_ARTICLES);

    Ok(Json(Briefing {
        summary,
        articles,
        generated_at: Utc::now(),
        categories,
    }))
}

#[get("/articles?<limit>&<category>")]
async fn articles(
    state: &State<AppState>,
    limit: Option<i64>,
    category: Option<&str>,
) -> ApiResult<Json<Vec<Article>>> {
    let category = category.filter(|c| !c.is_empty());
    storage::list_recent_articles(&state.db, limit.unwrap_or(DEFAULT_LIMIT), category)
        .await
        .map(Json)
        .map_err(|e| ApiError::internal("Error fetching articles", e))
}

#[get("/categories")]
async fn categories(state: &State<AppState>) -> ApiResult<Json<Vec<String>>> {
    storage::list_categories(&state.db)
        .await
        .map(Json)
        .map_err(|e| ApiError::internal("Error fetching categories", e))
}

#[post("/refresh")]
async fn refresh(state: &State<AppState>) -> ApiResult<Json<serde_json::Value>> {
    let outcome = ingestion::refresh_news(&state.db, &state.news)
        .await
        .map_err(|e| ApiError::internal("Error refreshing news", e))?;

    Ok(Json(json!({
        "message": "Successfully refreshed news",
        "fetched": outcome.fetched,
        "saved": outcome.saved,
    })))
}

#[get("/trending")]
async fn trending(state: &State<AppState>) -> Json<serde_json::Value> {
    let topics = state.news.get_trending_topics().await;
    Json(json!({ "topics": topics }))
}

#[get("/topics")]
async fn topics(state: &State<AppState>) -> ApiResult<Json<serde_json::Value>> {
    let articles = storage::list_recent_articles(&state.db, BRIEFING_POOL, None)
        .await
        .map_err(|e| ApiError::internal("Error extracting topics", e))?;
    let topics = state.assistant.extract_key_topics(&articles).await;
    Ok(Json(json!({ "topics": topics })))
}

#[get("/article/<id>/summary")]
async fn article_summary(state: &State<AppState>, id: i64) -> ApiResult<Json<serde_json::Value>> {
    let article = storage::get_article(&state.db, id)
        .await
        .map_err(|e| ApiError::internal("Error generating summary", e))?
        .ok_or(ApiError::NotFound("Article not found"))?;

    let summary = state.assistant.summarize_article(&article).await;
    Ok(Json(json!({ "summary": summary })))
}

pub fn routes() -> Vec<Route> {
    routes![briefing, articles, categories, refresh, trending, topics, article_summary]
}
