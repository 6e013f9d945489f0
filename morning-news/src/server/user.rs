//! `/api/user`: preference records and the static catalogues behind them.

use rocket::serde::json::Json;
use rocket::{get, post, routes, Route, State};
use serde::Deserialize;
use serde_json::json;

use super::error::{ApiError, ApiResult};
use super::AppState;
use crate::preferences::{self, PreferenceUpdate, UserPreference};

#[derive(Debug, Deserialize)]
pub struct ToneUpdate {
    pub tone: String,
}

#[get("/preferences/<user_id>")]
async fn get_preferences(state: &State<AppState>, user_id: &str) -> ApiResult<Json<UserPreference>> {
    let (prefs, _created) = preferences::get_or_create_preferences(&state.db, user_id)
        .await
        .map_err(|e| ApiError::internal("Error fetching preferences", e))?;
    Ok(Json(prefs))
}

#[post("/preferences", data = "<body>")]
async fn save_preferences(
    state: &State<AppState>,
    body: Json<PreferenceUpdate>,
) -> ApiResult<Json<UserPreference>> {
    preferences::upsert_preferences(&state.db, &body)
        .await
        .map(Json)
        .map_err(|e| ApiError::internal("Error updating preferences", e))
}

/// Stored categories, or the defaults when the user has no record. Never creates one.
#[get("/preferences/<user_id>/categories")]
async fn get_categories(state: &State<AppState>, user_id: &str) -> ApiResult<Json<serde_json::Value>> {
    let categories = preferences::find_preferences(&state.db, user_id)
        .await
        .map_err(|e| ApiError::internal("Error fetching categories", e))?
        .map(|p| p.preferred_categories)
        .unwrap_or_else(preferences::default_categories);
    Ok(Json(json!({ "categories": categories })))
}

#[post("/preferences/<user_id>/categories", data = "<body>")]
async fn set_categories(
    state: &State<AppState>,
    user_id: &str,
    body: Json<Vec<String>>,
) -> ApiResult<Json<serde_json::Value>> {
    let prefs = preferences::update_categories(&state.db, user_id, &body)
        .await
        .map_err(|e| ApiError::internal("Error updating categories", e))?;
    Ok(Json(json!({
        "message": "Categories updated successfully",
        "categories": prefs.preferred_categories,
    })))
}

#[post("/preferences/<user_id>/tone", data = "<body>")]
async fn set_tone(
    state: &State<AppState>,
    user_id: &str,
    body: Json<ToneUpdate>,
) -> ApiResult<Json<serde_json::Value>> {
    if !preferences::is_known_tone(&body.tone) {
        return Err(ApiError::BadRequest(format!("Unknown tone: {}", body.tone)));
    }

    let prefs = preferences::update_tone(&state.db, user_id, &body.tone)
        .await
        .map_err(|e| ApiError::internal("Error updating tone", e))?;
    Ok(Json(json!({
        "message": "Tone updated successfully",
        "tone": prefs.tone_preference,
    })))
}

#[get("/available-categories")]
fn available_categories() -> Json<serde_json::Value> {
    Json(json!({ "categories": preferences::AVAILABLE_CATEGORIES }))
}

#[get("/tone-options")]
fn tone_options() -> Json<serde_json::Value> {
    let tones: Vec<_> = preferences::TONE_OPTIONS
        .iter()
        .map(|(value, label)| json!({ "value": value, "label": label }))
        .collect();
    Json(json!({ "tones": tones }))
}

pub fn routes() -> Vec<Route> {
    routes![
        get_preferences,
        save_preferences,
        get_categories,
        set_categories,
        set_tone,
        available_categories,
        tone_options,
    ]
}
