//! Configuration sections, their defaults, and the loaders that fill them from
//! TOML files and the process environment.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub address: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

/// Database configuration section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// sqlx connection string (e.g. "sqlite://data/morning_news.db" or "sqlite::memory:")
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://morning_news.db".to_string(),
            max_connections: 5,
        }
    }
}

/// Cache connection settings. Carried for deployment parity; nothing reads a cache yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub url: String,
    pub ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379/0".to_string(),
            ttl_seconds: 3600,
        }
    }
}

/// News provider credentials and request shaping
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsConfig {
    pub news_api_key: Option<String>,
    pub guardian_api_key: Option<String>,
    pub news_api_base_url: String,
    pub guardian_api_base_url: String,
    pub country: String,
    pub page_size: u32,
    pub timeout_seconds: u64,
    /// Interval used by the optional background refresh loop
    pub refresh_interval_seconds: u64,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            news_api_key: None,
            guardian_api_key: None,
            news_api_base_url: "https://newsapi.org/v2".to_string(),
            guardian_api_base_url: "https://content.guardianapis.com".to_string(),
            country: "us".to_string(),
            page_size: 20,
            timeout_seconds: 10,
            refresh_interval_seconds: 1800,
        }
    }
}

/// Hosted language model (OpenAI-compatible chat completions)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub api_url: String,
    pub model: String,
    pub max_tokens: usize,
    pub temperature: f32,
    pub timeout_seconds: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: "https://api.openai.com/v1/chat/completions".to_string(),
            model: "gpt-4".to_string(),
            max_tokens: 1000,
            temperature: 0.7,
            timeout_seconds: 30,
        }
    }
}

/// Character budgets applied to article text before it is put into a prompt
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    pub briefing_summary_chars: usize,
    pub context_summary_chars: usize,
    pub content_chars: usize,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            briefing_summary_chars: 200,
            context_summary_chars: 100,
            content_chars: 1000,
        }
    }
}

/// Application-wide settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub secret_key: String,
    pub debug: bool,
    pub environment: String,
    pub allowed_origins: Vec<String>,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            secret_key: "your-secret-key-here".to_string(),
            debug: false,
            environment: "development".to_string(),
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:8000".to_string(),
            ],
            log_level: "info".to_string(),
        }
    }
}

/// Top-level application configuration (deserialized from config.toml, then
/// overlaid with environment variables)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub cache: CacheConfig,
    pub news: NewsConfig,
    pub llm: LlmConfig,
    pub assistant: AssistantConfig,
    pub app: AppConfig,
}

impl Config {
    /// Load configuration from a TOML file asynchronously.
    ///
    /// Example:
    ///   let cfg = Config::from_file("config.toml").await?;
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = tokio::fs::read_to_string(path.as_ref())
            .await
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        let cfg: Config = toml::from_str(&data).context("Failed to parse TOML configuration")?;
        Ok(cfg)
    }

    /// Load configuration with an optional default file and an optional override file.
    /// If both are present, they are merged (override takes precedence). Missing files
    /// are skipped, so the result may be pure defaults.
    pub async fn load_with_defaults(default_path: Option<&Path>, override_path: Option<&Path>) -> Result<Self> {
        let mut config_value = toml::Value::Table(toml::map::Map::new());

        for path in [default_path, override_path].into_iter().flatten() {
            if !path.exists() {
                continue;
            }
            let data = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            let val: toml::Value = toml::from_str(&data)
                .with_context(|| format!("Failed to parse configuration: {}", path.display()))?;
            merge_toml(&mut config_value, val);
        }

        let cfg: Config = config_value.try_into().context("Failed to parse merged configuration")?;
        Ok(cfg)
    }

    /// Overlay values from the process environment.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Overlay values produced by `lookup` (an environment variable reader).
    /// Empty values are treated as unset.
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("DATABASE_URL") {
            self.database.url = v;
        }
        if let Some(v) = get("REDIS_URL") {
            self.cache.url = v;
        }
        if let Some(v) = get("CACHE_TTL") {
            self.cache.ttl_seconds = parse_env("CACHE_TTL", &v)?;
        }
        if let Some(v) = get("NEWS_API_KEY") {
            self.news.news_api_key = Some(v);
        }
        if let Some(v) = get("GUARDIAN_API_KEY") {
            self.news.guardian_api_key = Some(v);
        }
        if let Some(v) = get("NEWS_REFRESH_INTERVAL") {
            self.news.refresh_interval_seconds = parse_env("NEWS_REFRESH_INTERVAL", &v)?;
        }
        if let Some(v) = get("OPENAI_API_KEY") {
            self.llm.api_key = Some(v);
        }
        if let Some(v) = get("OPENAI_MODEL") {
            self.llm.model = v;
        }
        if let Some(v) = get("MAX_TOKENS") {
            self.llm.max_tokens = parse_env("MAX_TOKENS", &v)?;
        }
        if let Some(v) = get("TEMPERATURE") {
            self.llm.temperature = parse_env("TEMPERATURE", &v)?;
        }
        if let Some(v) = get("SECRET_KEY") {
            self.app.secret_key = v;
        }
        if let Some(v) = get("DEBUG") {
            self.app.debug = v.trim().eq_ignore_ascii_case("true");
        }
        if let Some(v) = get("ENVIRONMENT") {
            self.app.environment = v;
        }
        if let Some(v) = get("ALLOWED_ORIGINS") {
            self.app.allowed_origins = split_origins(&v);
        }
        if let Some(v) = get("LOG_LEVEL") {
            self.app.log_level = v.to_lowercase();
        }

        Ok(())
    }
}

fn parse_env<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .trim()
        .parse::<T>()
        .with_context(|| format!("invalid value for {}: {:?}", key, value))
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn merge_toml(a: &mut toml::Value, b: toml::Value) {
    match (a, b) {
        (toml::Value::Table(a_map), toml::Value::Table(b_map)) => {
            for (k, v) in b_map {
                if let Some(a_val) = a_map.get_mut(&k) {
                    merge_toml(a_val, v);
                } else {
                    a_map.insert(k, v);
                }
            }
        }
        (a_val, b_val) => *a_val = b_val,
    }
}
