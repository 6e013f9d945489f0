use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::Client;
use serde::Serialize;
use sqlx::SqlitePool;
use std::collections::BTreeSet;
use std::time::Duration;
use tracing::{error, info, warn};

use common::NewsConfig;

use crate::storage::{self, NewArticle};

pub mod guardian;
pub mod newsapi;

pub use guardian::{process_guardian_article, GuardianArticle};
pub use newsapi::{process_newsapi_article, NewsApiArticle};

/// Headline categories requested from NewsAPI on every aggregation (None = general)
const HEADLINE_CATEGORIES: [Option<&str>; 3] = [None, Some("business"), Some("technology")];
/// Guardian sections requested on every aggregation
const GUARDIAN_SECTIONS: [&str; 2] = ["world", "business"];

/// Fetches recent articles from NewsAPI and the Guardian and normalizes them.
///
/// Provider failures (missing key, transport error, error status) are logged and
/// degrade to an empty result for that call; they are never returned to the caller.
pub struct NewsAggregator {
    client: Client,
    news_api_key: Option<String>,
    guardian_api_key: Option<String>,
    news_api_base: String,
    guardian_api_base: String,
    country: String,
    page_size: u32,
}

/// Counts reported by [`refresh_news`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RefreshOutcome {
    pub fetched: usize,
    pub saved: u64,
}

impl NewsAggregator {
    pub fn new(config: &NewsConfig) -> Result<Self> {
        for base in [&config.news_api_base_url, &config.guardian_api_base_url] {
            url::Url::parse(base).with_context(|| format!("invalid provider base url: {}", base))?;
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("MorningNews/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build reqwest client")?;

        Ok(Self {
            client,
            news_api_key: config.news_api_key.clone().filter(|k| !k.is_empty()),
            guardian_api_key: config.guardian_api_key.clone().filter(|k| !k.is_empty()),
            news_api_base: config.news_api_base_url.trim_end_matches('/').to_string(),
            guardian_api_base: config.guardian_api_base_url.trim_end_matches('/').to_string(),
            country: config.country.clone(),
            page_size: config.page_size,
        })
    }

    /// Top headlines from NewsAPI; empty on any failure.
    pub async fn fetch_top_headlines(&self, category: Option<&str>, country: &str) -> Vec<NewsApiArticle> {
        let Some(api_key) = self.news_api_key.as_deref() else {
            warn!("NewsAPI key not configured");
            return Vec::new();
        };

        match self.request_top_headlines(api_key, category, country).await {
            Ok(articles) => articles,
            Err(e) => {
                error!(category = ?category, "Error fetching news from NewsAPI: {:#}", e);
                Vec::new()
            }
        }
    }

    async fn request_top_headlines(
        &self,
        api_key: &str,
        category: Option<&str>,
        country: &str,
    ) -> Result<Vec<NewsApiArticle>> {
        let url = format!("{}/top-headlines", self.news_api_base);
        let mut params = vec![
            ("apiKey", api_key.to_string()),
            ("country", country.to_string()),
            ("pageSize", self.page_size.to_string()),
        ];
        if let Some(category) = category {
            params.push(("category", category.to_string()));
        }

        let data: newsapi::HeadlinesResponse = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await
            .context("NewsAPI request failed")?
            .error_for_status()
            .context("NewsAPI returned an error status")?
            .json()
            .await
            .context("failed to decode NewsAPI response")?;

        if data.status != "ok" {
            anyhow::bail!(
                "NewsAPI error: {}",
                data.message.unwrap_or_else(|| data.status.clone())
            );
        }

        Ok(data.articles)
    }

    /// Newest articles from the Guardian content API; empty on any failure.
    pub async fn fetch_guardian_articles(&self, section: Option<&str>) -> Vec<GuardianArticle> {
        let Some(api_key) = self.guardian_api_key.as_deref() else {
            warn!("Guardian API key not configured");
            return Vec::new();
        };

        match self.request_guardian(api_key, section).await {
            Ok(articles) => articles,
            Err(e) => {
                error!(section = ?section, "Error fetching news from Guardian: {:#}", e);
                Vec::new()
            }
        }
    }

    async fn request_guardian(&self, api_key: &str, section: Option<&str>) -> Result<Vec<GuardianArticle>> {
        let url = format!("{}/search", self.guardian_api_base);
        let mut params = vec![
            ("api-key", api_key.to_string()),
            ("show-fields", "headline,trailText,body,thumbnail".to_string()),
            ("page-size", self.page_size.to_string()),
            ("order-by", "newest".to_string()),
        ];
        if let Some(section) = section {
            params.push(("section", section.to_string()));
        }

        let data: guardian::SearchEnvelope = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await
            .context("Guardian request failed")?
            .error_for_status()
            .context("Guardian returned an error status")?
            .json()
            .await
            .context("failed to decode Guardian response")?;

        if data.response.status != "ok" {
            anyhow::bail!("Guardian API error: status {}", data.response.status);
        }

        Ok(data.response.results)
    }

    /// Fan out the five provider calls concurrently and concatenate the normalized
    /// results. Each call degrades independently, so one failing provider only
    /// removes its own articles.
    pub async fn fetch_all_news(&self) -> Vec<NewArticle> {
        let country = self.country.as_str();
        let (general, business, technology, world, guardian_business) = tokio::join!(
            self.fetch_top_headlines(HEADLINE_CATEGORIES[0], country),
            self.fetch_top_headlines(HEADLINE_CATEGORIES[1], country),
            self.fetch_top_headlines(HEADLINE_CATEGORIES[2], country),
            self.fetch_guardian_articles(Some(GUARDIAN_SECTIONS[0])),
            self.fetch_guardian_articles(Some(GUARDIAN_SECTIONS[1])),
        );

        let mut all_articles = Vec::new();

        for (category, batch) in HEADLINE_CATEGORIES.iter().zip([general, business, technology]) {
            for raw in &batch {
                match process_newsapi_article(raw, *category) {
                    Ok(article) => all_articles.push(article),
                    Err(e) => error!("Error processing NewsAPI article: {:#}", e),
                }
            }
        }

        for batch in [world, guardian_business] {
            for raw in &batch {
                match process_guardian_article(raw) {
                    Ok(article) => all_articles.push(article),
                    Err(e) => error!("Error processing Guardian article: {:#}", e),
                }
            }
        }

        info!("Fetched {} articles from all providers", all_articles.len());
        all_articles
    }

    /// Distinct categories of a fresh aggregation, sorted. A naive stand-in for
    /// trend detection.
    pub async fn get_trending_topics(&self) -> Vec<String> {
        self.fetch_all_news()
            .await
            .into_iter()
            .filter_map(|a| a.category)
            .filter(|c| !c.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// Aggregate from all providers and store whatever is not already present.
pub async fn refresh_news(pool: &SqlitePool, aggregator: &NewsAggregator) -> Result<RefreshOutcome> {
    let articles = aggregator.fetch_all_news().await;
    let saved = storage::insert_articles(pool, &articles).await?;
    Ok(RefreshOutcome { fetched: articles.len(), saved })
}

/// Parse a provider timestamp. A trailing `Z` is rewritten to an explicit `+00:00`
/// offset before RFC 3339 parsing; offset-less timestamps are taken as UTC.
/// Absent or empty input yields `None`.
pub fn parse_timestamp(raw: Option<&str>) -> Result<Option<DateTime<Utc>>> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };

    let normalized = match raw.strip_suffix('Z') {
        Some(stem) => format!("{}+00:00", stem),
        None => raw.to_string(),
    };

    if let Ok(parsed) = DateTime::parse_from_rfc3339(&normalized) {
        return Ok(Some(parsed.with_timezone(&Utc)));
    }

    let naive = NaiveDateTime::parse_from_str(&normalized, "%Y-%m-%dT%H:%M:%S%.f")
        .with_context(|| format!("invalid timestamp: {}", raw))?;
    Ok(Some(DateTime::from_naive_utc_and_offset(naive, Utc)))
}
