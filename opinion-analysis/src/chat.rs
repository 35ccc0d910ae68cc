use crate::engine::AnalysisEngine;
use crate::service::AnalysisService;
use opinionlens_core::{ChatMessage, CoreError, ErrorExt};
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::warn;

/// Conversations keep only their most recent messages.
const MAX_HISTORY_MESSAGES: usize = 20;

/// Messages carrying a video link trigger a full collect-and-analyze pass.
const VIDEO_ANALYSIS_COMMENTS: usize = 200;

const VIDEO_URL_PATTERNS: &[&str] = &[
    r"https?://(?:www\.)?youtube\.com/watch\?v=([a-zA-Z0-9_-]{11})",
    r"https?://youtu\.be/([a-zA-Z0-9_-]{11})",
    r"https?://(?:www\.)?youtube\.com/embed/([a-zA-Z0-9_-]{11})",
    r"https?://(?:www\.)?youtube\.com/v/([a-zA-Z0-9_-]{11})",
];

/// Conversational front over the engine.
///
/// This is the one layer that softens failures: a generation or analysis
/// error becomes an apologetic reply in the payload instead of failing the
/// exchange, so a flaky provider degrades the conversation rather than
/// ending it.
pub struct ChatService {
    engine: Arc<AnalysisEngine>,
    analysis: Arc<AnalysisService>,
    conversations: Mutex<HashMap<String, Vec<ChatMessage>>>,
    url_patterns: Vec<Regex>,
}

impl ChatService {
    pub fn new(engine: Arc<AnalysisEngine>, analysis: Arc<AnalysisService>) -> Self {
        let url_patterns = VIDEO_URL_PATTERNS
            .iter()
            .map(|pattern| Regex::new(pattern).expect("video URL pattern is valid"))
            .collect();

        Self {
            engine,
            analysis,
            conversations: Mutex::new(HashMap::new()),
            url_patterns,
        }
    }

    pub fn extract_video_url<'a>(&self, message: &'a str) -> Option<&'a str> {
        self.url_patterns
            .iter()
            .find_map(|pattern| pattern.find(message))
            .map(|found| found.as_str())
    }

    pub fn extract_video_id(&self, url: &str) -> Option<String> {
        self.url_patterns
            .iter()
            .find_map(|pattern| pattern.captures(url))
            .and_then(|captures| captures.get(1))
            .map(|id| id.as_str().to_string())
    }

    /// Processes one user message and returns the reply plus its sources.
    ///
    /// Never returns an error: failures embed as reply text, which keeps
    /// the conversation alive at the cost of a soft answer.
    pub async fn process_message(
        &self,
        message: &str,
        conversation_id: &str,
        use_rag: bool,
    ) -> (String, Option<Vec<String>>) {
        let history = self.history_snapshot(conversation_id).await;

        let outcome = if let Some(url) = self.extract_video_url(message) {
            self.handle_video_analysis(message, url).await
        } else if use_rag {
            self.engine.generate_response(message, &history).await
        } else {
            self.engine
                .generate_direct_response(message, &history)
                .await
                .map(|response| (response, Vec::new()))
        };

        let (response, sources) = match outcome {
            Ok((response, sources)) => {
                let sources = if sources.is_empty() {
                    None
                } else {
                    Some(sources)
                };
                (response, sources)
            }
            Err(e) => {
                warn!("Chat response failed: {}", e);
                (
                    format!(
                        "Sorry, I could not produce a response: {}",
                        e.user_friendly_message()
                    ),
                    None,
                )
            }
        };

        self.append_turn(conversation_id, message, &response).await;
        (response, sources)
    }

    async fn handle_video_analysis(
        &self,
        message: &str,
        url: &str,
    ) -> Result<(String, Vec<String>), CoreError> {
        let Some(video_id) = self.extract_video_id(url) else {
            return Ok((
                "Sorry, I could not read a video id from that link.".to_string(),
                Vec::new(),
            ));
        };

        let mut analysis_query = message.replace(url, "").trim().to_string();
        if analysis_query.chars().count() < 3 {
            analysis_query = "overall public opinion on this video".to_string();
        }

        let collection = self
            .analysis
            .collect_video_comments(&video_id, VIDEO_ANALYSIS_COMMENTS)
            .await?;

        let (analysis_text, _analysis) = self
            .analysis
            .analyze_topic_opinion(&analysis_query, Some(&video_id), true)
            .await?;

        let response = format!(
            "**Video analysis**\n\n\
             Collected comments: {}\n\
             Indexed chunks: {}\n\n\
             {}\n\n\
             Source: {}",
            collection.collected_comments, collection.processed_chunks, analysis_text, url
        );
        let sources = vec![format!("YouTube Video: {}", video_id)];

        Ok((response, sources))
    }

    async fn history_snapshot(&self, conversation_id: &str) -> Vec<ChatMessage> {
        self.conversations
            .lock()
            .await
            .get(conversation_id)
            .cloned()
            .unwrap_or_default()
    }

    async fn append_turn(&self, conversation_id: &str, user: &str, assistant: &str) {
        let mut conversations = self.conversations.lock().await;
        let history = conversations
            .entry(conversation_id.to_string())
            .or_default();
        history.push(ChatMessage::user(user));
        history.push(ChatMessage::assistant(assistant));

        if history.len() > MAX_HISTORY_MESSAGES {
            let excess = history.len() - MAX_HISTORY_MESSAGES;
            history.drain(..excess);
        }
    }

    pub async fn get_conversation_history(&self, conversation_id: &str) -> Vec<ChatMessage> {
        self.history_snapshot(conversation_id).await
    }

    pub async fn clear_conversation(&self, conversation_id: &str) {
        self.conversations.lock().await.remove(conversation_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // URL handling is pure string work; build the service pieces lazily in
    // the flow tests and exercise only the regexes here.
    fn patterns() -> Vec<Regex> {
        VIDEO_URL_PATTERNS
            .iter()
            .map(|pattern| Regex::new(pattern).expect("pattern is valid"))
            .collect()
    }

    fn find_url(message: &str) -> Option<&str> {
        patterns()
            .iter()
            .find_map(|pattern| pattern.find(message))
            .map(|found| found.as_str())
    }

    #[test]
    fn test_detects_all_video_url_forms() {
        let cases = [
            "check https://www.youtube.com/watch?v=dQw4w9WgXcQ please",
            "https://youtu.be/dQw4w9WgXcQ 반응 어때?",
            "embedded https://www.youtube.com/embed/dQw4w9WgXcQ",
            "old style https://youtube.com/v/dQw4w9WgXcQ",
        ];
        for case in cases {
            assert!(find_url(case).is_some(), "no URL found in: {}", case);
        }
    }

    #[test]
    fn test_ignores_messages_without_video_links() {
        assert!(find_url("그 영상 어땠어?").is_none());
        assert!(find_url("https://example.com/watch?v=dQw4w9WgXcQ").is_none());
    }

    #[test]
    fn test_extracts_video_id() {
        let captures = patterns()[1]
            .captures("https://youtu.be/dQw4w9WgXcQ")
            .expect("short link should match");
        assert_eq!(&captures[1], "dQw4w9WgXcQ");
    }
}
