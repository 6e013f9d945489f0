//! Guardian content API (`/search`) response shapes and their normalization.

use anyhow::Result;
use serde::Deserialize;

use super::parse_timestamp;
use crate::storage::NewArticle;

pub const GUARDIAN_SOURCE: &str = "The Guardian";

/// Wide enough that paragraphs are never re-wrapped
const TEXT_WIDTH: usize = 10_000;

#[derive(Debug, Deserialize)]
pub struct SearchEnvelope {
    pub response: SearchResponse,
}

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    pub status: String,
    #[serde(default)]
    pub results: Vec<GuardianArticle>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuardianArticle {
    pub id: Option<String>,
    pub section_name: Option<String>,
    pub web_publication_date: Option<String>,
    pub web_title: Option<String>,
    pub web_url: Option<String>,
    #[serde(default)]
    pub fields: Option<GuardianFields>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuardianFields {
    pub headline: Option<String>,
    pub trail_text: Option<String>,
    pub body: Option<String>,
    pub thumbnail: Option<String>,
}

/// Map a Guardian search result into the unified shape. Body and trail text are
/// HTML and are flattened to plain text.
pub fn process_guardian_article(article: &GuardianArticle) -> Result<NewArticle> {
    let fields = article.fields.clone().unwrap_or_default();

    Ok(NewArticle {
        title: fields
            .headline
            .or_else(|| article.web_title.clone())
            .unwrap_or_default(),
        content: fields.body.as_deref().map(html_to_text),
        summary: fields.trail_text.as_deref().map(html_to_text),
        source: GUARDIAN_SOURCE.to_string(),
        category: Some(
            article
                .section_name
                .clone()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "general".to_string()),
        ),
        url: article.web_url.clone(),
        published_at: parse_timestamp(article.web_publication_date.as_deref())?,
    })
}

fn html_to_text(html: &str) -> String {
    match html2text::from_read(html.as_bytes(), TEXT_WIDTH) {
        Ok(text) => text.trim().to_string(),
        Err(e) => {
            tracing::warn!("failed to convert Guardian HTML to text: {}", e);
            html.to_string()
        }
    }
}
