use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{debug, info};

/// A stored article, as returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Article {
    pub id: i64,
    pub title: String,
    pub content: Option<String>,
    pub summary: Option<String>,
    pub source: String,
    pub category: Option<String>,
    pub url: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub sentiment: Option<f64>,
    pub created_at: DateTime<Utc>,
}

/// A normalized article produced by a provider, not yet stored
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewArticle {
    pub title: String,
    pub content: Option<String>,
    pub summary: Option<String>,
    pub source: String,
    pub category: Option<String>,
    pub url: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

const ARTICLE_COLUMNS: &str =
    "id, title, content, summary, source, category, url, published_at, sentiment, created_at";

/// Stores a batch of articles, skipping any whose (title, source) pair is already present.
/// The whole batch is committed once. Returns the number of newly inserted rows.
///
/// Insert-if-absent is delegated to the `UNIQUE(title, source)` constraint, so two
/// concurrent refreshes cannot both insert the same article.
pub async fn insert_articles(pool: &SqlitePool, articles: &[NewArticle]) -> Result<u64> {
    let mut tx = pool.begin().await.context("failed to begin article transaction")?;
    let now = Utc::now();
    let mut saved = 0u64;

    for article in articles {
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO articles
                (title, content, summary, source, category, url, published_at, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&article.title)
        .bind(&article.content)
        .bind(&article.summary)
        .bind(&article.source)
        .bind(&article.category)
        .bind(&article.url)
        .bind(article.published_at)
        .bind(now)
        .execute(&mut tx)
        .await
        .with_context(|| format!("failed to insert article {:?}", article.title))?;

        if result.rows_affected() == 0 {
            debug!(title = %article.title, source = %article.source, "article already stored");
        }
        saved += result.rows_affected();
    }

    tx.commit().await.context("failed to commit article batch")?;
    info!("Stored {} new articles out of {}", saved, articles.len());
    Ok(saved)
}

/// Most recently ingested articles first, optionally restricted to one category.
pub async fn list_recent_articles(
    pool: &SqlitePool,
    limit: i64,
    category: Option<&str>,
) -> Result<Vec<Article>> {
    let limit = limit.max(0);
    let articles = match category {
        Some(category) => {
            let sql = format!(
                "SELECT {} FROM articles WHERE category = ? ORDER BY created_at DESC, id DESC LIMIT ?",
                ARTICLE_COLUMNS
            );
            sqlx::query_as::<_, Article>(&sql)
                .bind(category)
                .bind(limit)
                .fetch_all(pool)
                .await
        }
        None => {
            let sql = format!(
                "SELECT {} FROM articles ORDER BY created_at DESC, id DESC LIMIT ?",
                ARTICLE_COLUMNS
            );
            sqlx::query_as::<_, Article>(&sql)
                .bind(limit)
                .fetch_all(pool)
                .await
        }
    }
    .context("failed to list articles")?;

    Ok(articles)
}

/// Distinct non-empty categories of stored articles.
pub async fn list_categories(pool: &SqlitePool) -> Result<Vec<String>> {
    sqlx::query_scalar::<_, String>(
        "SELECT DISTINCT category FROM articles WHERE category IS NOT NULL AND category <> '' ORDER BY category",
    )
    .fetch_all(pool)
    .await
    .context("failed to list categories")
}

pub async fn get_article(pool: &SqlitePool, id: i64) -> Result<Option<Article>> {
    let sql = format!("SELECT {} FROM articles WHERE id = ?", ARTICLE_COLUMNS);
    sqlx::query_as::<_, Article>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch article")
}

pub async fn count_articles(pool: &SqlitePool) -> Result<i64> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM articles")
        .fetch_one(pool)
        .await
        .context("failed to count articles")
}
