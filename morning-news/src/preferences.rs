use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::info;

pub const DEFAULT_CATEGORIES: [&str; 3] = ["general", "business", "technology"];
pub const DEFAULT_TONE: &str = "casual";
pub const DEFAULT_BRIEFING_TIME: &str = "08:00";

/// Categories a user may pick from
pub const AVAILABLE_CATEGORIES: [&str; 9] = [
    "general",
    "business",
    "technology",
    "sports",
    "entertainment",
    "health",
    "science",
    "politics",
    "world",
];

/// Selectable tones with their display labels
pub const TONE_OPTIONS: [(&str, &str); 4] = [
    ("casual", "Casual & Friendly"),
    ("professional", "Professional"),
    ("humorous", "Light & Humorous"),
    ("serious", "Serious & Formal"),
];

pub fn default_categories() -> Vec<String> {
    DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect()
}

/// Per-user briefing preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPreference {
    pub id: i64,
    pub user_id: String,
    pub preferred_categories: Vec<String>,
    pub tone_preference: Option<String>,
    pub briefing_time: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Body of a create-or-update request; missing fields take the request defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreferenceUpdate {
    pub user_id: String,
    #[serde(default)]
    pub preferred_categories: Vec<String>,
    #[serde(default = "default_tone")]
    pub tone_preference: String,
    #[serde(default = "default_briefing_time")]
    pub briefing_time: String,
}

fn default_tone() -> String {
    DEFAULT_TONE.to_string()
}

fn default_briefing_time() -> String {
    DEFAULT_BRIEFING_TIME.to_string()
}

/// Read a user's preferences, creating the default record first if none exists.
/// The returned flag is true when this call created the record.
pub async fn get_or_create_preferences(pool: &SqlitePool, user_id: &str) -> Result<(UserPreference, bool)> {
    let categories_json = serde_json::to_string(&DEFAULT_CATEGORIES)
        .context("failed to serialize default categories")?;

    let created = sqlx::query(
        r#"
        INSERT OR IGNORE INTO user_preferences
            (user_id, preferred_categories, tone_preference, briefing_time, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(user_id)
    .bind(&categories_json)
    .bind(DEFAULT_TONE)
    .bind(DEFAULT_BRIEFING_TIME)
    .bind(Utc::now())
    .execute(pool)
    .await
    .context("failed to create default preferences")?
    .rows_affected()
        > 0;

    if created {
        info!(%user_id, "created default preferences");
    }

    let prefs = find_preferences(pool, user_id)
        .await?
        .context("preferences missing after insert")?;
    Ok((prefs, created))
}

/// Read a user's preferences without creating anything
pub async fn find_preferences(pool: &SqlitePool, user_id: &str) -> Result<Option<UserPreference>> {
    let row = sqlx::query_as::<_, PreferenceRow>(
        r#"
        SELECT id, user_id, preferred_categories, tone_preference, briefing_time, created_at
        FROM user_preferences
        WHERE user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .context("failed to fetch preferences")?;

    row.map(UserPreference::try_from).transpose()
}

/// Create or replace all preference fields for a user
pub async fn upsert_preferences(pool: &SqlitePool, update: &PreferenceUpdate) -> Result<UserPreference> {
    let categories_json = serde_json::to_string(&update.preferred_categories)
        .context("failed to serialize categories")?;

    sqlx::query(
        r#"
        INSERT INTO user_preferences
            (user_id, preferred_categories, tone_preference, briefing_time, created_at)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(user_id) DO UPDATE SET
            preferred_categories = excluded.preferred_categories,
            tone_preference = excluded.tone_preference,
            briefing_time = excluded.briefing_time
        "#,
    )
    .bind(&update.user_id)
    .bind(&categories_json)
    .bind(&update.tone_preference)
    .bind(&update.briefing_time)
    .bind(Utc::now())
    .execute(pool)
    .await
    .context("failed to upsert preferences")?;

    find_preferences(pool, &update.user_id)
        .await?
        .context("preferences missing after upsert")
}

/// Replace a user's categories, creating the default record first if none exists
pub async fn update_categories(
    pool: &SqlitePool,
    user_id: &str,
    categories: &[String],
) -> Result<UserPreference> {
    let categories_json =
        serde_json::to_string(categories).context("failed to serialize categories")?;

    sqlx::query(
        r#"
        INSERT INTO user_preferences
            (user_id, preferred_categories, tone_preference, briefing_time, created_at)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(user_id) DO UPDATE SET
            preferred_categories = excluded.preferred_categories
        "#,
    )
    .bind(user_id)
    .bind(&categories_json)
    .bind(DEFAULT_TONE)
    .bind(DEFAULT_BRIEFING_TIME)
    .bind(Utc::now())
    .execute(pool)
    .await
    .context("failed to update categories")?;

    find_preferences(pool, user_id)
        .await?
        .context("preferences missing after category update")
}

/// Replace a user's tone, creating the default record first if none exists
pub async fn update_tone(pool: &SqlitePool, user_id: &str, tone: &str) -> Result<UserPreference> {
    let categories_json = serde_json::to_string(&DEFAULT_CATEGORIES)
        .context("failed to serialize default categories")?;

    sqlx::query(
        r#"
        INSERT INTO user_preferences
            (user_id, preferred_categories, tone_preference, briefing_time, created_at)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(user_id) DO UPDATE SET
            tone_preference = excluded.tone_preference
        "#,
    )
    .bind(user_id)
    .bind(&categories_json)
    .bind(tone)
    .bind(DEFAULT_BRIEFING_TIME)
    .bind(Utc::now())
    .execute(pool)
    .await
    .context("failed to update tone")?;

    find_preferences(pool, user_id)
        .await?
        .context("preferences missing after tone update")
}

pub fn is_known_tone(tone: &str) -> bool {
    TONE_OPTIONS.iter().any(|(value, _)| *value == tone)
}

/// Database row for user_preferences; categories are stored as a JSON list
#[derive(Debug, Clone, sqlx::FromRow)]
struct PreferenceRow {
    id: i64,
    user_id: String,
    preferred_categories: Option<String>,
    tone_preference: Option<String>,
    briefing_time: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<PreferenceRow> for UserPreference {
    type Error = anyhow::Error;

    fn try_from(row: PreferenceRow) -> Result<Self> {
        let preferred_categories = match row.preferred_categories.as_deref() {
            Some(json) if !json.is_empty() => serde_json::from_str(json)
                .with_context(|| format!("invalid stored categories for user {}", row.user_id))?,
            _ => Vec::new(),
        };

        Ok(UserPreference {
            id: row.id,
            user_id: row.user_id,
            preferred_categories,
            tone_preference: row.tone_preference,
            briefing_time: row.briefing_time,
            created_at: row.created_at,
        })
    }
}
