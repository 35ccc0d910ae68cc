pub mod chat;
pub mod engine;
pub mod extractor;
pub mod generator;
pub mod processor;
pub mod ranker;
pub mod retrieval;
pub mod sentiment;
pub mod service;
pub mod splitter;

pub use chat::ChatService;
pub use engine::AnalysisEngine;
pub use extractor::KeywordExtractor;
pub use generator::ResponseGenerator;
pub use processor::{CommentCleaner, CommentProcessor};
pub use ranker::rank_comments;
pub use retrieval::RetrievalCoordinator;
pub use sentiment::{aggregate_sentiment, parse_sentiment_scores, SentimentAnalyzer};
pub use service::{AnalysisService, ServiceStats};
pub use splitter::split_text;
