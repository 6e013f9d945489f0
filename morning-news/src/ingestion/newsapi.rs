//! NewsAPI (`/v2/top-headlines`) response shapes and their normalization.

use anyhow::Result;
use serde::Deserialize;

use super::parse_timestamp;
use crate::storage::NewArticle;

#[derive(Debug, Deserialize)]
pub struct HeadlinesResponse {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub articles: Vec<NewsApiArticle>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsApiArticle {
    #[serde(default)]
    pub source: Option<NewsApiSource>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub published_at: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewsApiSource {
    pub id: Option<String>,
    pub name: Option<String>,
}

/// Map a NewsAPI article into the unified shape. `category` is the category the
/// headlines were requested for; uncategorized requests are filed under "general".
pub fn process_newsapi_article(article: &NewsApiArticle, category: Option<&str>) -> Result<NewArticle> {
    Ok(NewArticle {
        title: article.title.clone().unwrap_or_default(),
        content: article.content.clone(),
        summary: article.description.clone(),
        source: article
            .source
            .as_ref()
            .and_then(|s| s.name.clone())
            .unwrap_or_default(),
        category: Some(category.unwrap_or("general").to_string()),
        url: article.url.clone(),
        published_at: parse_timestamp(article.published_at.as_deref())?,
    })
}
