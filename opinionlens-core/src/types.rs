use serde::{Deserialize, Serialize};

/// Placeholder used wherever a comment author is missing from metadata.
pub const ANONYMOUS_AUTHOR: &str = "anonymous";

/// A raw comment as fetched from the platform, before cleaning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentData {
    pub comment_id: String,
    pub text: String,
    pub author: String,
    pub like_count: u64,
    pub video_id: String,
    pub video_title: String,
    pub published_at: String,
}

/// Sentiment distribution over a comment or a comment set.
///
/// Channels are proportions in [0, 1]. A non-empty aggregation sums to 1;
/// the all-zero value marks "no data" and is distinct from all-neutral.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentStats {
    pub positive: f32,
    pub negative: f32,
    pub neutral: f32,
}

impl SentimentStats {
    pub const ZERO: SentimentStats = SentimentStats {
        positive: 0.0,
        negative: 0.0,
        neutral: 0.0,
    };

    pub const NEUTRAL: SentimentStats = SentimentStats {
        positive: 0.0,
        negative: 0.0,
        neutral: 1.0,
    };

    pub fn new(positive: f32, negative: f32, neutral: f32) -> Self {
        Self {
            positive,
            negative,
            neutral,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.positive == 0.0 && self.negative == 0.0 && self.neutral == 0.0
    }

    pub fn dominant(&self) -> &'static str {
        if self.positive > self.negative && self.positive > self.neutral {
            "positive"
        } else if self.negative > self.positive && self.negative > self.neutral {
            "negative"
        } else {
            "neutral"
        }
    }
}

/// Typed metadata attached to every stored comment chunk.
///
/// Optional fields replace the loose metadata maps a scraped payload tends
/// to produce; defaulting happens once, in the accessors below.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentMetadata {
    pub comment_id: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub like_count: Option<u64>,
    pub video_id: String,
    #[serde(default)]
    pub video_title: Option<String>,
    #[serde(default)]
    pub published_at: Option<String>,
    pub topic: String,
    #[serde(default)]
    pub sentiment: Option<SentimentStats>,
    #[serde(default)]
    pub chunk_index: u32,
    #[serde(default)]
    pub is_chunked: bool,
}

impl CommentMetadata {
    pub fn author_or_anonymous(&self) -> &str {
        self.author.as_deref().unwrap_or(ANONYMOUS_AUTHOR)
    }

    pub fn likes_or_zero(&self) -> u64 {
        self.like_count.unwrap_or(0)
    }

    pub fn video_title_or_empty(&self) -> &str {
        self.video_title.as_deref().unwrap_or("")
    }
}

/// Unit of storage in the vector index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredComment {
    pub id: String,
    pub content: String,
    pub embedding: Vec<f32>,
    pub metadata: CommentMetadata,
}

/// A raw nearest-neighbor hit as returned by the store.
#[derive(Debug, Clone)]
pub struct ScoredComment {
    pub content: String,
    pub metadata: CommentMetadata,
    pub score: f32,
}

/// A comment hit bound to one retrieval call.
///
/// The relevance score is similarity against that call's query embedding;
/// scores from different calls are not comparable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedComment {
    pub content: String,
    pub metadata: CommentMetadata,
    pub relevance_score: f32,
}

/// Evidence projection of a retrieved comment, produced only for reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepresentativeComment {
    pub content: String,
    pub author: String,
    pub like_count: u64,
    pub video_title: String,
    pub combined_score: f32,
}

/// Structured output of one opinion-analysis request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub query: String,
    pub topic: Option<String>,
    pub sentiment_stats: SentimentStats,
    pub representative_comments: Vec<RepresentativeComment>,
    pub keywords: Vec<String>,
    pub total_relevant_comments: usize,
}

/// Summary returned by a topic collection run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionSummary {
    pub topic: String,
    pub collected_comments: usize,
    pub processed_chunks: usize,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionStats {
    pub total_documents: usize,
    pub store_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicOverview {
    pub topic: String,
    pub total_comments: usize,
    pub sentiment_overview: SentimentStats,
    pub top_keywords: Vec<String>,
    pub collection_stats: CollectionStats,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemStats {
    pub total_stored_comments: usize,
    pub embedding_model: String,
    pub vector_store_type: String,
    pub status: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
            timestamp: chrono::Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dominant_sentiment() {
        assert_eq!(SentimentStats::new(0.6, 0.3, 0.1).dominant(), "positive");
        assert_eq!(SentimentStats::new(0.1, 0.7, 0.2).dominant(), "negative");
        assert_eq!(SentimentStats::new(0.2, 0.2, 0.6).dominant(), "neutral");
        // Ties fall back to neutral
        assert_eq!(SentimentStats::new(0.5, 0.5, 0.0).dominant(), "neutral");
    }

    #[test]
    fn test_zero_stats_are_distinct_from_neutral() {
        assert!(SentimentStats::ZERO.is_zero());
        assert!(!SentimentStats::NEUTRAL.is_zero());
    }

    #[test]
    fn test_metadata_defaults() {
        let metadata = CommentMetadata {
            comment_id: "c1".to_string(),
            author: None,
            like_count: None,
            video_id: "v1".to_string(),
            video_title: None,
            published_at: None,
            topic: "topic".to_string(),
            sentiment: None,
            chunk_index: 0,
            is_chunked: false,
        };

        assert_eq!(metadata.author_or_anonymous(), ANONYMOUS_AUTHOR);
        assert_eq!(metadata.likes_or_zero(), 0);
        assert_eq!(metadata.video_title_or_empty(), "");
    }
}
