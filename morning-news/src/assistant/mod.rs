//! Persona-driven assistant: briefings, chat replies, summaries and topic
//! extraction on top of an optional [`LlmProvider`].
//!
//! Every public operation returns usable text. When no provider is configured or
//! the provider call fails, the matching template in [`fallback`] is used instead.

use anyhow::{anyhow, Result};
use std::sync::Arc;
use tracing::{info, warn};

use common::{AssistantConfig, LlmConfig};

use crate::llm::{ChatTurn, LlmProvider, LlmRequest};
use crate::sessions::{ChatMessage, Role};
use crate::storage::Article;

pub mod fallback;
pub mod prompts;

const BRIEFING_ARTICLES: usize = 10;
const CONTEXT_ARTICLES: usize = 5;
const HISTORY_TURNS: usize = 10;
const TOPIC_ARTICLES: usize = 20;
const MAX_TOPICS: usize = 10;
const SUMMARY_MAX_TOKENS: usize = 150;
const TOPICS_MAX_TOKENS: usize = 200;
const TOPICS_TEMPERATURE: f32 = 0.3;

/// First `max_chars` characters of `s`, never splitting a code point
pub fn excerpt(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

/// Generation parameters and prompt character budgets
#[derive(Debug, Clone)]
pub struct AssistantSettings {
    pub max_tokens: usize,
    pub temperature: f32,
    pub briefing_summary_chars: usize,
    pub context_summary_chars: usize,
    pub content_chars: usize,
}

impl Default for AssistantSettings {
    fn default() -> Self {
        Self::from_config(&LlmConfig::default(), &AssistantConfig::default())
    }
}

impl AssistantSettings {
    pub fn from_config(llm: &LlmConfig, assistant: &AssistantConfig) -> Self {
        Self {
            max_tokens: llm.max_tokens,
            temperature: llm.temperature,
            briefing_summary_chars: assistant.briefing_summary_chars,
            context_summary_chars: assistant.context_summary_chars,
            content_chars: assistant.content_chars,
        }
    }
}

pub struct Assistant {
    provider: Option<Arc<dyn LlmProvider>>,
    settings: AssistantSettings,
}

impl Assistant {
    pub fn new(provider: Option<Arc<dyn LlmProvider>>, settings: AssistantSettings) -> Self {
        Self { provider, settings }
    }

    /// True when a hosted model is configured
    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    async fn complete(&self, request: LlmRequest) -> Result<String> {
        let provider = self
            .provider
            .as_ref()
            .ok_or_else(|| anyhow!("no language model configured"))?;
        let response = provider.generate(request).await?;
        info!(
            model = %response.model,
            tokens = response.usage.total_tokens,
            "LLM completion received"
        );
        Ok(response.content.trim().to_string())
    }

    /// Morning briefing over the first ten articles
    pub async fn generate_morning_briefing(&self, articles: &[Article]) -> String {
        if articles.is_empty() {
            return prompts::EMPTY_BRIEFING.to_string();
        }

        let selected = &articles[..articles.len().min(BRIEFING_ARTICLES)];
        let request = LlmRequest::prompt(
            prompts::PERSONA,
            prompts::briefing(selected, self.settings.briefing_summary_chars),
        )
        .with_max_tokens(self.settings.max_tokens)
        .with_temperature(self.settings.temperature);

        match self.complete(request).await {
            Ok(text) if !text.is_empty() => text,
            Ok(_) => {
                warn!("LLM returned an empty briefing, using fallback");
                fallback::briefing(selected)
            }
            Err(e) => {
                warn!("Error generating briefing: {:#}", e);
                fallback::briefing(selected)
            }
        }
    }

    /// Reply to `message` given earlier turns of the conversation (oldest first)
    /// and the current articles.
    pub async fn chat_response(
        &self,
        message: &str,
        history: &[ChatMessage],
        articles: &[Article],
    ) -> String {
        let mut turns = vec![ChatTurn::system(prompts::PERSONA)];

        let recent = &history[history.len().saturating_sub(HISTORY_TURNS)..];
        turns.extend(recent.iter().map(|m| match m.role {
            Role::User => ChatTurn::user(m.content.clone()),
            Role::Assistant => ChatTurn::assistant(m.content.clone()),
        }));

        if !articles.is_empty() {
            let top = &articles[..articles.len().min(CONTEXT_ARTICLES)];
            turns.push(ChatTurn::system(prompts::news_context(
                top,
                self.settings.context_summary_chars,
            )));
        }

        turns.push(ChatTurn::user(message));

        let request = LlmRequest {
            messages: turns,
            max_tokens: Some(self.settings.max_tokens),
            temperature: Some(self.settings.temperature),
            timeout_seconds: None,
        };

        match self.complete(request).await {
            Ok(text) if !text.is_empty() => text,
            Ok(_) => fallback::chat(message, articles),
            Err(e) => {
                warn!("Error generating chat response: {:#}", e);
                fallback::chat(message, articles)
            }
        }
    }

    pub async fn summarize_article(&self, article: &Article) -> String {
        let request = LlmRequest::prompt(
            prompts::PERSONA,
            prompts::article_summary(article, self.settings.content_chars),
        )
        .with_max_tokens(SUMMARY_MAX_TOKENS)
        .with_temperature(self.settings.temperature);

        match self.complete(request).await {
            Ok(text) if !text.is_empty() => text,
            Ok(_) => fallback::summary(article),
            Err(e) => {
                warn!(article_id = article.id, "Error summarizing article: {:#}", e);
                fallback::summary(article)
            }
        }
    }

    /// Up to ten topic strings. Falls back to the distinct categories of the
    /// first ten articles.
    pub async fn extract_key_topics(&self, articles: &[Article]) -> Vec<String> {
        if articles.is_empty() {
            return Vec::new();
        }

        let selected = &articles[..articles.len().min(TOPIC_ARTICLES)];
        let request = LlmRequest::prompt(prompts::TOPICS_SYSTEM, prompts::key_topics(selected))
            .with_max_tokens(TOPICS_MAX_TOKENS)
            .with_temperature(TOPICS_TEMPERATURE);

        match self.complete(request).await {
            Ok(text) => {
                let topics = parse_topic_lines(&text);
                if topics.is_empty() {
                    fallback::key_topics(articles)
                } else {
                    topics
                }
            }
            Err(e) => {
                warn!("Error extracting topics: {:#}", e);
                fallback::key_topics(articles)
            }
        }
    }
}

fn parse_topic_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| line.trim().trim_start_matches(['-', '•', '*', ' ']).trim_end())
        .filter(|line| !line.is_empty())
        .take(MAX_TOPICS)
        .map(str::to_string)
        .collect()
}
