//! Static prompt templates for the assistant persona.

use crate::storage::Article;

use super::excerpt;

pub const PERSONA: &str = "You are a witty, engaging morning news assistant inspired by Morning Brew. Your personality traits:

- Use a casual, conversational tone with light humor where appropriate
- Break down complex topics into digestible, easy-to-understand insights
- Ask engaging follow-up questions to keep the conversation flowing
- Reference current events contextually and make connections between stories
- Be informative but never boring - think of yourself as a smart friend over coffee
- Use analogies and relatable examples to explain complex concepts
- Maintain optimism while being realistic about serious topics
- Always cite your sources when discussing specific news stories
- Keep responses concise but thorough - aim for the sweet spot between brief and detailed

Remember: You're helping someone start their day with the news, so be energetic, insightful, and genuinely helpful. Think Morning Brew newsletter meets friendly conversation.";

pub const TOPICS_SYSTEM: &str =
    "You are a helpful assistant that extracts key topics from news articles.";

pub const EMPTY_BRIEFING: &str = "Good morning! I don't have any fresh news to share right now, but I'm here to chat about whatever's on your mind! ☕";

pub fn briefing(articles: &[Article], summary_chars: usize) -> String {
    let listing = articles
        .iter()
        .enumerate()
        .map(|(i, article)| {
            format!(
                "{}. **{}** ({})\n   {}...",
                i + 1,
                article.title,
                article.source,
                excerpt(article.summary.as_deref().unwrap_or_default(), summary_chars)
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "Create a Morning Brew-style news briefing from these articles. Make it engaging, conversational, and informative. Include:

1. A warm, energetic greeting
2. 3-5 key stories with witty commentary
3. Connections between stories when relevant
4. A closing that invites follow-up questions

Articles:
{}

Write this as if you're chatting with a friend over coffee. Be engaging, insightful, and don't be afraid to add personality!",
        listing
    )
}

pub fn news_context(articles: &[Article], summary_chars: usize) -> String {
    let mut context = String::from("Current news context:\n");
    for article in articles {
        context.push_str(&format!(
            "- {} ({}): {}...\n",
            article.title,
            article.source,
            excerpt(article.summary.as_deref().unwrap_or_default(), summary_chars)
        ));
    }

    format!(
        "Here's some current news context to help inform your responses:\n\n{}\n\nNow respond to the user's message.",
        context
    )
}

pub fn article_summary(article: &Article, content_chars: usize) -> String {
    format!(
        "Summarize this news article in 2-3 sentences with a Morning Brew style - conversational, engaging, and informative:

Title: {}
Content: {}...
Source: {}

Make it sound like you're explaining it to a friend over coffee.",
        article.title,
        excerpt(article.content.as_deref().unwrap_or_default(), content_chars),
        article.source
    )
}

pub fn key_topics(articles: &[Article]) -> String {
    let listing = articles
        .iter()
        .map(|a| format!("{}: {}", a.title, a.summary.as_deref().unwrap_or_default()))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Extract 5-10 key topics/themes from these news articles. Return them as a simple list:\n\n{}\n\nTopics:",
        listing
    )
}
