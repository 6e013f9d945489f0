/*!
common/src/lib.rs

Shared configuration types and DB helper functions for Morning News.

This file provides:
- Config data structures (deserialized from TOML, overlaid from the environment)
- Helpers to initialize an SQLite pool and bootstrap the schema
*/

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

pub mod config;

pub use config::{
    AppConfig, AssistantConfig, CacheConfig, Config, DatabaseConfig, LlmConfig, NewsConfig,
    ServerConfig,
};

/// Initialize an SQLite connection pool from an sqlx connection string.
///
/// File databases get their parent directory created and run in WAL mode.
/// In-memory databases (`sqlite::memory:`) are pinned to a single connection
/// that is never recycled, since every SQLite connection would otherwise see
/// its own empty database.
///
/// Example:
///   let pool = init_db_pool("sqlite://data/morning_news.db", 5).await?;
pub async fn init_db_pool(url: &str, max_connections: u32) -> Result<SqlitePool> {
    let in_memory = url.contains(":memory:");

    let mut options = SqliteConnectOptions::from_str(url)
        .with_context(|| format!("invalid database url: {}", url))?
        .create_if_missing(true);

    if !in_memory {
        if let Some(parent) = Path::new(db_file_path(url)).parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.with_context(|| {
                    format!("Failed to create DB parent directory: {}", parent.display())
                })?;
            }
        }
        options = options.journal_mode(SqliteJournalMode::Wal);
    }

    let pool_options = if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
    } else {
        SqlitePoolOptions::new().max_connections(max_connections.max(1))
    };

    let pool = pool_options
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to connect to sqlite database at: {}", url))?;

    Ok(pool)
}

/// Strip the `sqlite:` scheme and any query string from a connection string.
fn db_file_path(url: &str) -> &str {
    let path = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))
        .unwrap_or(url);
    path.split('?').next().unwrap_or(path)
}

/// Ensure the required schema exists. Runs CREATE TABLE IF NOT EXISTS statements for
/// every table, so it is idempotent and safe to call at startup.
pub async fn ensure_schema(pool: &SqlitePool) -> Result<()> {
    tracing::info!("ensuring DB schema (CREATE TABLE IF NOT EXISTS ...)");

    let stmts = [
        r#"
        CREATE TABLE IF NOT EXISTS articles (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            content TEXT,
            summary TEXT,
            source TEXT NOT NULL DEFAULT '',
            category TEXT,
            url TEXT,
            published_at TIMESTAMP,
            sentiment REAL,
            created_at TIMESTAMP NOT NULL,
            UNIQUE(title, source)
        );
        "#,
        "CREATE INDEX IF NOT EXISTS idx_articles_created_at ON articles(created_at);",
        r#"
        CREATE TABLE IF NOT EXISTS conversations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id TEXT,
            session_id TEXT NOT NULL UNIQUE,
            created_at TIMESTAMP NOT NULL
        );
        "#,
        "CREATE INDEX IF NOT EXISTS idx_conversations_user ON conversations(user_id);",
        r#"
        CREATE TABLE IF NOT EXISTS messages (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            conversation_id INTEGER NOT NULL,
            content TEXT NOT NULL,
            role TEXT NOT NULL CHECK (role IN ('user', 'assistant')),
            timestamp TIMESTAMP NOT NULL,
            FOREIGN KEY(conversation_id) REFERENCES conversations(id)
        );
        "#,
        "CREATE INDEX IF NOT EXISTS idx_messages_conversation ON messages(conversation_id, timestamp);",
        r#"
        CREATE TABLE IF NOT EXISTS user_preferences (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id TEXT NOT NULL UNIQUE,
            preferred_categories TEXT,
            tone_preference TEXT,
            briefing_time TEXT,
            created_at TIMESTAMP NOT NULL
        );
        "#,
    ];

    for s in &stmts {
        sqlx::query(s)
            .execute(pool)
            .await
            .with_context(|| "failed to ensure schema")?;
    }

    tracing::info!("DB schema ensured");
    Ok(())
}
