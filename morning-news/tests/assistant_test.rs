use std::sync::{Arc, Mutex};

use anyhow::Result;
use chrono::Utc;

use common::{AssistantConfig, LlmConfig};
use morning_news::assistant::{fallback, Assistant, AssistantSettings};
use morning_news::llm::remote::RemoteLlmProvider;
use morning_news::llm::{LlmProvider, LlmRequest, LlmResponse, UsageMetadata};
use morning_news::sessions::{ChatMessage, Role};
use morning_news::storage::Article;

/// Records every request and answers with a fixed reply
struct RecordingProvider {
    reply: String,
    requests: Mutex<Vec<LlmRequest>>,
}

#[async_trait::async_trait]
impl LlmProvider for RecordingProvider {
    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse> {
        self.requests.lock().unwrap().push(request);
        Ok(LlmResponse {
            content: self.reply.clone(),
            usage: UsageMetadata::default(),
            model: "recording".to_string(),
        })
    }
}

fn article(id: i64, title: &str) -> Article {
    Article {
        id,
        title: title.to_string(),
        content: Some(format!("{} content", title)),
        summary: Some(format!("{} summary", title)),
        source: "Reuters".to_string(),
        category: Some("business".to_string()),
        url: Some(format!("https://example.com/{}", id)),
        published_at: None,
        sentiment: None,
        created_at: Utc::now(),
    }
}

/// Settings with small, distinctive truncation budgets
fn tight_settings() -> AssistantSettings {
    AssistantSettings::from_config(
        &LlmConfig::default(),
        &AssistantConfig {
            briefing_summary_chars: 7,
            context_summary_chars: 5,
            content_chars: 13,
        },
    )
}

fn recording(reply: &str) -> Arc<RecordingProvider> {
    Arc::new(RecordingProvider {
        reply: reply.to_string(),
        requests: Mutex::new(Vec::new()),
    })
}

fn padded_article(id: i64) -> Article {
    Article {
        title: format!("T{}", id),
        summary: Some("s".repeat(20)),
        content: Some("c".repeat(30)),
        ..article(id, "")
    }
}

fn message(id: i64, role: Role, content: &str) -> ChatMessage {
    ChatMessage {
        id,
        conversation_id: 1,
        content: content.to_string(),
        role,
        timestamp: Utc::now(),
    }
}

#[tokio::test]
async fn test_chat_prompt_layout() {
    let provider = Arc::new(RecordingProvider {
        reply: "Sure thing".to_string(),
        requests: Mutex::new(Vec::new()),
    });
    let assistant = Assistant::new(Some(provider.clone() as Arc<dyn LlmProvider>), AssistantSettings::default());

    let history: Vec<ChatMessage> = (0..12)
        .map(|i| {
            let role = if i % 2 == 0 { Role::User } else { Role::Assistant };
            message(i, role, &format!("turn {}", i))
        })
        .collect();
    let articles: Vec<Article> = (0..8).map(|i| article(i, &format!("Story {}", i))).collect();

    let reply = assistant.chat_response("What now?", &history, &articles).await;
    assert_eq!(reply, "Sure thing");

    let requests = provider.requests.lock().unwrap();
    let turns = &requests[0].messages;

    // persona + 10 history turns + context + new message
    assert_eq!(turns.len(), 13);
    assert_eq!(turns[0].role, "system");
    assert_eq!(turns[1].content, "turn 2");
    assert_eq!(turns[1].role, "user");
    assert_eq!(turns[10].content, "turn 11");
    assert_eq!(turns[10].role, "assistant");

    let context = &turns[11];
    assert_eq!(context.role, "system");
    assert!(context.content.contains("Story 4"));
    assert!(!context.content.contains("Story 5"));

    assert_eq!(turns[12].role, "user");
    assert_eq!(turns[12].content, "What now?");
}

#[tokio::test]
async fn test_chat_without_articles_has_no_context_turn() {
    let provider = Arc::new(RecordingProvider {
        reply: "ok".to_string(),
        requests: Mutex::new(Vec::new()),
    });
    let assistant = Assistant::new(Some(provider.clone() as Arc<dyn LlmProvider>), AssistantSettings::default());

    assistant.chat_response("hi", &[], &[]).await;
    let requests = provider.requests.lock().unwrap();
    assert_eq!(requests[0].messages.len(), 2);
}

#[tokio::test]
async fn test_topics_parsed_from_model_reply() {
    let provider = Arc::new(RecordingProvider {
        reply: "- Interest rates\n• Elections\n* Chip exports\n".to_string(),
        requests: Mutex::new(Vec::new()),
    });
    let assistant = Assistant::new(Some(provider.clone() as Arc<dyn LlmProvider>), AssistantSettings::default());

    let topics = assistant.extract_key_topics(&[article(1, "Fed holds")]).await;
    assert_eq!(topics, ["Interest rates", "Elections", "Chip exports"]);

    let requests = provider.requests.lock().unwrap();
    assert_eq!(requests[0].max_tokens, Some(200));
    assert_eq!(requests[0].temperature, Some(0.3));
}

#[tokio::test]
async fn test_remote_failure_falls_back_everywhere() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/")
        .with_status(401)
        .with_body(r#"{"error": {"message": "Incorrect API key provided"}}"#)
        .create_async()
        .await;

    let provider = RemoteLlmProvider::new(server.url(), "bad-key", "gpt-4");
    let assistant = Assistant::new(Some(Arc::new(provider) as Arc<dyn LlmProvider>), AssistantSettings::default());
    let articles = vec![article(1, "Markets rally"), article(2, "Rates hold")];

    let briefing = assistant.generate_morning_briefing(&articles).await;
    assert!(!briefing.is_empty());

    let chat = assistant.chat_response("Tell me more", &[], &articles).await;
    assert!(chat.ends_with(fallback::CHAT_FOLLOW_UP));

    let summary = assistant.summarize_article(&articles[0]).await;
    assert_eq!(summary, "Markets rally summary");

    let topics = assistant.extract_key_topics(&articles).await;
    assert_eq!(topics, ["business"]);
}

#[tokio::test]
async fn test_missing_credential_still_produces_text() {
    let assistant = Assistant::new(None, AssistantSettings::default());
    let articles = vec![article(1, "Markets rally")];

    assert!(!assistant.generate_morning_briefing(&articles).await.is_empty());
    assert!(!assistant.chat_response("hello", &[], &articles).await.is_empty());
    assert!(!assistant.summarize_article(&articles[0]).await.is_empty());
}

#[tokio::test]
async fn test_briefing_prompt_uses_ten_articles_and_summary_budget() {
    let provider = recording("Morning!");
    let assistant = Assistant::new(Some(provider.clone() as Arc<dyn LlmProvider>), tight_settings());
    let articles: Vec<Article> = (0..15).map(padded_article).collect();

    assert_eq!(assistant.generate_morning_briefing(&articles).await, "Morning!");

    let requests = provider.requests.lock().unwrap();
    let prompt = &requests[0].messages.last().unwrap().content;
    assert!(prompt.contains("**T9**"));
    assert!(!prompt.contains("**T10**"));
    assert!(prompt.contains(&format!("{}...", "s".repeat(7))));
    assert!(!prompt.contains(&"s".repeat(8)));
}

#[tokio::test]
async fn test_summary_prompt_uses_content_budget_and_token_cap() {
    let provider = recording("Short and sweet.");
    let assistant = Assistant::new(Some(provider.clone() as Arc<dyn LlmProvider>), tight_settings());

    assistant.summarize_article(&padded_article(1)).await;

    let requests = provider.requests.lock().unwrap();
    assert_eq!(requests[0].max_tokens, Some(150));
    let prompt = &requests[0].messages.last().unwrap().content;
    assert!(prompt.contains(&format!("{}...", "c".repeat(13))));
    assert!(!prompt.contains(&"c".repeat(14)));
}

#[tokio::test]
async fn test_chat_context_uses_context_budget() {
    let provider = recording("ok");
    let assistant = Assistant::new(Some(provider.clone() as Arc<dyn LlmProvider>), tight_settings());
    let articles: Vec<Article> = (0..15).map(padded_article).collect();

    assistant.chat_response("hi", &[], &articles).await;

    let requests = provider.requests.lock().unwrap();
    let context = &requests[0].messages[1].content;
    assert!(context.contains("T4 (Reuters)"));
    assert!(!context.contains("T5 (Reuters)"));
    assert!(context.contains(&format!("{}...", "s".repeat(5))));
    assert!(!context.contains(&"s".repeat(6)));
}

#[tokio::test]
async fn test_offline_chat_cites_one_of_the_first_three_articles() {
    let assistant = Assistant::new(None, AssistantSettings::default());
    let titles: Vec<String> = (0..6)
        .map(|i| format!("Headline {:02} {}", i, "x".repeat(150)))
        .collect();
    let articles: Vec<Article> = titles
        .iter()
        .enumerate()
        .map(|(i, t)| article(i as i64, t))
        .collect();

    let reply = assistant.chat_response("markets", &[], &articles).await;

    let cited = |title: &str| {
        let cut: String = title.chars().take(100).collect();
        reply.contains(&format!("For example, there's this story from Reuters: '{}...'", cut))
    };
    assert_eq!(titles[..3].iter().filter(|t| cited(t)).count(), 1);
    assert!(titles[3..].iter().all(|t| !reply.contains(&t[..11])));
    assert!(reply.ends_with(fallback::CHAT_FOLLOW_UP));
}
