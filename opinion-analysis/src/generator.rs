use llm_interface::LlmProvider;
use opinionlens_core::{ChatMessage, CoreError, RetrievedComment, SentimentStats};
use std::sync::Arc;
use tracing::debug;

/// Prompt budget knobs: at most this many comments, truncated per comment.
const MAX_PROMPT_COMMENTS: usize = 20;
const MAX_COMMENT_CHARS: usize = 200;

/// Chat prompts see only recent history and the closest context snippets.
const MAX_HISTORY_TURNS: usize = 5;
const MAX_CONTEXT_SNIPPETS: usize = 3;

/// Builds prompts and requests narrative text from the injected provider.
///
/// Generation failures come back as errors; deciding whether to show the
/// user a soft apology or a hard failure belongs to the calling layer.
pub struct ResponseGenerator {
    llm: Arc<dyn LlmProvider>,
}

impl ResponseGenerator {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    /// Narrative synthesis over one candidate set. An empty set short-
    /// circuits to a canned notice without touching the provider.
    pub async fn opinion_analysis(
        &self,
        query: &str,
        comments: &[RetrievedComment],
        sentiment_stats: &SentimentStats,
        detailed: bool,
    ) -> Result<String, CoreError> {
        if comments.is_empty() {
            return Ok(no_data_response(query));
        }

        let formatted_comments = format_comments(comments);
        let formatted_stats = format_sentiment_stats(sentiment_stats, comments.len());

        let prompt = if detailed {
            format!(
                "You are an analyst summarizing public opinion from video \
                 comments. Based on the comments below, analyze the overall \
                 opinion on the question and answer in the language the \
                 comments are written in.\n\n\
                 Consider the overall sentiment, the main arguments on each \
                 side, and what commenters care about most.\n\n\
                 Structure the answer as:\n\
                 ### Opinion summary\n\
                 ### Main viewpoints (positive / negative / neutral)\n\
                 ### Conclusion\n\n\
                 Comments:\n{}\n\n\
                 Sentiment statistics:\n{}\n\n\
                 Question: {}",
                formatted_comments, formatted_stats, query
            )
        } else {
            format!(
                "Based on the comments below, give a brief answer to the \
                 question in 3-5 sentences, in the language the comments are \
                 written in.\n\n\
                 Comments:\n{}\n\n\
                 Sentiment statistics:\n{}\n\n\
                 Question: {}",
                formatted_comments, formatted_stats, query
            )
        };

        debug!(
            "Requesting opinion analysis over {} comments (detailed: {})",
            comments.len(),
            detailed
        );
        self.llm.generate(&prompt).await
    }

    /// Grounded chat reply over retrieved context plus recent history.
    pub async fn contextual_response(
        &self,
        query: &str,
        context: &[RetrievedComment],
        history: &[ChatMessage],
    ) -> Result<String, CoreError> {
        let context_text = context
            .iter()
            .take(MAX_CONTEXT_SNIPPETS)
            .map(|comment| format!("- {}", truncate_chars(&comment.content, MAX_COMMENT_CHARS)))
            .collect::<Vec<_>>()
            .join("\n");

        let prompt = format!(
            "Answer the user's question using the collected comments below. \
             Reply in the user's language.\n\n\
             Related comments:\n{}\n\n\
             Previous conversation:\n{}\n\n\
             Question: {}\n\nAnswer:",
            context_text,
            format_history(history),
            query
        );

        self.llm.generate(&prompt).await
    }

    /// Plain chat reply without retrieval.
    pub async fn direct_response(
        &self,
        query: &str,
        history: &[ChatMessage],
    ) -> Result<String, CoreError> {
        let prompt = format!(
            "Continue the conversation naturally, in the user's language.\n\n\
             Previous conversation:\n{}\n\n\
             User: {}\n\nAssistant:",
            format_history(history),
            query
        );

        self.llm.generate(&prompt).await
    }
}

/// Canned notice for queries with no matching comments.
pub fn no_data_response(query: &str) -> String {
    format!(
        "### No matching comments\n\
         No collected comments are relevant to '{}'.\n\n\
         Things to check:\n\
         1. Whether the search phrasing matches the topic\n\
         2. Whether comments for this topic have been collected yet\n\
         3. Whether a broader keyword finds more comments\n\n\
         Collect comments for the topic first, then ask again.",
        query
    )
}

fn format_comments(comments: &[RetrievedComment]) -> String {
    comments
        .iter()
        .take(MAX_PROMPT_COMMENTS)
        .enumerate()
        .map(|(index, comment)| {
            format!(
                "[{}] {} ({} likes): {}",
                index + 1,
                comment.metadata.author_or_anonymous(),
                comment.metadata.likes_or_zero(),
                truncate_chars(&comment.content, MAX_COMMENT_CHARS)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_sentiment_stats(stats: &SentimentStats, total_comments: usize) -> String {
    format!(
        "positive: {:.1}%\nnegative: {:.1}%\nneutral: {:.1}%\ntotal comments: {}\ndominant: {}",
        stats.positive * 100.0,
        stats.negative * 100.0,
        stats.neutral * 100.0,
        total_comments,
        stats.dominant()
    )
}

fn format_history(history: &[ChatMessage]) -> String {
    let recent_start = history.len().saturating_sub(MAX_HISTORY_TURNS);
    history[recent_start..]
        .iter()
        .map(|message| format!("{}: {}", message.role.as_str(), message.content))
        .collect::<Vec<_>>()
        .join("\n")
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
