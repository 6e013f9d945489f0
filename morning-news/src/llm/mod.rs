use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use common::LlmConfig;

/// Core trait for hosted language model providers
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate a completion for a sequence of chat turns
    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse>;
}

/// One role-tagged turn of a chat completion request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: String,
    pub content: String,
}

impl ChatTurn {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".to_string(), content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".to_string(), content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: "assistant".to_string(), content: content.into() }
    }
}

/// Request structure for LLM generation
#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub messages: Vec<ChatTurn>,
    pub max_tokens: Option<usize>,
    pub temperature: Option<f32>,
    pub timeout_seconds: Option<u64>,
}

impl LlmRequest {
    /// Single-turn request: a system instruction followed by one user prompt.
    pub fn prompt(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatTurn::system(system), ChatTurn::user(user)],
            max_tokens: None,
            temperature: None,
            timeout_seconds: None,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// Response from LLM generation
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub content: String,
    pub usage: UsageMetadata,
    pub model: String,
}

/// Token usage metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UsageMetadata {
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
    pub total_tokens: usize,
}

pub mod remote;

/// Build the remote provider from configuration.
///
/// Returns `None` when no API key is configured; callers then run without a
/// model and every assistant operation takes its fallback path.
pub fn provider_from_config(config: &LlmConfig) -> Option<Arc<dyn LlmProvider>> {
    let api_key = match config.api_key.as_deref().map(str::trim) {
        Some(key) if !key.is_empty() => key.to_string(),
        _ => {
            tracing::warn!("LLM API key not configured; assistant will use fallback responses");
            return None;
        }
    };

    let provider = remote::RemoteLlmProvider::new(&config.api_url, api_key, &config.model)
        .with_defaults(config.timeout_seconds, config.max_tokens, config.temperature);

    tracing::info!(model = %provider.model(), url = %config.api_url, "LLM provider initialized");
    Some(Arc::new(provider) as Arc<dyn LlmProvider>)
}
