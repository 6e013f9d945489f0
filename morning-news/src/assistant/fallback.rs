//! Template responses used when the language model cannot be reached.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::storage::Article;

use super::excerpt;

pub const DEVELOPING_STORY: &str = "This story is developing, and there's definitely more to unpack here. The key details are still emerging, but it's worth keeping an eye on how this unfolds!";

pub const CHAT_FOLLOW_UP: &str =
    "\n\nWhat's your take on this? Any particular angle you'd like to explore further?";

const GREETINGS: [&str; 3] = [
    "☀️ Good morning! Welcome to your daily dose of what's happening around the world!",
    "☕ Rise and shine! Here's the quick rundown before your coffee gets cold.",
    "👋 Morning! Let's catch you up on what the world has been up to.",
];

const SECTIONS: [&str; 3] = [
    "🏛️ **Politics & Policy**: There's quite a bit of political movement today with various policy discussions heating up across different regions. Leaders are making moves that could shape the coming months.",
    "💼 **Business Buzz**: The markets are showing some interesting patterns, with tech stocks getting attention and traditional sectors adapting to new realities. Always fascinating to watch how these trends develop!",
    "🌍 **Global Affairs**: International relations continue to evolve, with diplomatic discussions and strategic partnerships making headlines. It's like watching a very complex chess game unfold.",
];

const CLOSINGS: [&str; 3] = [
    "What catches your eye from today's news? I'm here to dive deeper into any of these stories or chat about whatever's on your mind! ☕",
    "Want the backstory on any of these? Just ask and we'll dig in together. ☕",
    "Which one should we unpack first? I'm all ears (and caffeine). ☕",
];

/// Offline briefing: random greeting, up to three headlines (or the canned
/// sections when there are none worth naming), random closing.
pub fn briefing(articles: &[Article]) -> String {
    let mut rng = rand::thread_rng();
    let greeting = GREETINGS.choose(&mut rng).copied().unwrap_or(GREETINGS[0]);
    let closing = CLOSINGS.choose(&mut rng).copied().unwrap_or(CLOSINGS[0]);

    let headlines: Vec<String> = articles
        .iter()
        .filter(|a| !a.title.is_empty())
        .take(3)
        .map(|a| format!("📰 **{}** ({})", excerpt(&a.title, 100), a.source))
        .collect();

    let body = if headlines.is_empty() {
        SECTIONS.join("\n\n")
    } else {
        let mut lines = vec!["Here's what's making headlines:".to_string()];
        lines.extend(headlines);
        lines.join("\n\n")
    };

    format!("{}\n\n{}\n\n{}", greeting, body, closing)
}

/// Offline chat reply: one of five templates, optionally pointing at one of the
/// first three articles, then a fixed follow-up question.
pub fn chat(message: &str, articles: &[Article]) -> String {
    let mut rng = rand::thread_rng();
    let templates = [
        format!(
            "That's a great question about {}... Based on what I'm seeing in today's news, there are definitely some interesting angles to explore. What specific aspect would you like to dive into?",
            excerpt(message, 30)
        ),
        "Interesting point! The news today actually touches on similar themes. From what I can tell, there are a few key developments that might be relevant to what you're asking about.".to_string(),
        "I love that you're thinking about this! 📰 Today's headlines have some fascinating connections to your question. Let me share what I'm seeing...".to_string(),
        "Great timing asking about this! There's actually quite a bit happening in the news right now that relates to your question. Want to explore the latest developments?".to_string(),
        "You've hit on something that's definitely making waves today! ☕ The current news cycle has some really compelling stories around this topic.".to_string(),
    ];

    let mut response = templates[rng.gen_range(0..templates.len())].clone();

    let candidates = &articles[..articles.len().min(3)];
    if let Some(article) = candidates.choose(&mut rng) {
        response.push_str(&format!(
            "\n\nFor example, there's this story from {}: '{}...' which really highlights some of the key issues at play.",
            article.source,
            excerpt(&article.title, 100)
        ));
    }

    response.push_str(CHAT_FOLLOW_UP);
    response
}

/// Offline summary: the provider's own summary if it has one
pub fn summary(article: &Article) -> String {
    article
        .summary
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEVELOPING_STORY)
        .to_string()
}

/// Offline topics: distinct categories of the first ten articles, in first-seen order
pub fn key_topics(articles: &[Article]) -> Vec<String> {
    let mut topics: Vec<String> = Vec::new();
    for category in articles.iter().take(10).filter_map(|a| a.category.as_deref()) {
        if !category.is_empty() && !topics.iter().any(|t| t == category) {
            topics.push(category.to_string());
        }
    }
    topics
}
