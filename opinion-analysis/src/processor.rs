use crate::sentiment::SentimentAnalyzer;
use crate::splitter::split_text;
use embedding_engine::TextEmbedder;
use opinionlens_core::{CommentData, CommentMetadata, CoreError, StoredComment};
use regex::Regex;
use std::sync::Arc;
use tracing::{debug, info};
use vector_store::VectorStore;
use youtube_client::CommentSource;

/// Comments shorter than this after cleaning carry no analyzable opinion.
const MIN_COMMENT_CHARS: usize = 10;

/// batchEmbedContents accepts at most 100 requests per call.
const EMBED_BATCH_SIZE: usize = 100;

/// Normalizes raw comment text before storage.
///
/// Collapses whitespace, squeezes drawn-out laughter (ㅋㅋㅋㅋ) and
/// repeated punctuation down to two characters, and rejects comments with
/// no Hangul, Latin, or digit content at all.
pub struct CommentCleaner {
    whitespace: Regex,
    laughter: Regex,
    punctuation: Regex,
    substantive: Regex,
}

impl CommentCleaner {
    pub fn new() -> Self {
        Self {
            whitespace: Regex::new(r"\s+").expect("whitespace pattern is valid"),
            // `regex` has no backreference support, so each repeated run is
            // spelled out per-character rather than via `([ㅋㅎ])\1{2,}`.
            laughter: Regex::new(r"ㅋ{3,}|ㅎ{3,}").expect("laughter pattern is valid"),
            punctuation: Regex::new(r"!{3,}|\?{3,}|\.{3,}").expect("punctuation pattern is valid"),
            substantive: Regex::new(r"[가-힣A-Za-z0-9]").expect("substantive pattern is valid"),
        }
    }

    pub fn clean(&self, text: &str) -> Option<String> {
        let squeeze_run = |caps: &regex::Captures| {
            let ch = caps[0].chars().next().expect("run is non-empty");
            let mut doubled = String::with_capacity(ch.len_utf8() * 2);
            doubled.push(ch);
            doubled.push(ch);
            doubled
        };
        let cleaned = self.whitespace.replace_all(text.trim(), " ");
        let cleaned = self.laughter.replace_all(&cleaned, &squeeze_run);
        let cleaned = self.punctuation.replace_all(&cleaned, &squeeze_run);

        if !self.substantive.is_match(&cleaned) {
            return None;
        }
        Some(cleaned.into_owned())
    }
}

impl Default for CommentCleaner {
    fn default() -> Self {
        Self::new()
    }
}

/// Collection pipeline: fetch, clean, classify, chunk, embed, store.
pub struct CommentProcessor {
    source: Arc<dyn CommentSource>,
    sentiment: SentimentAnalyzer,
    embedder: Arc<dyn TextEmbedder>,
    store: Arc<dyn VectorStore>,
    cleaner: CommentCleaner,
    chunk_size: usize,
    chunk_overlap: usize,
}

impl CommentProcessor {
    pub fn new(
        source: Arc<dyn CommentSource>,
        sentiment: SentimentAnalyzer,
        embedder: Arc<dyn TextEmbedder>,
        store: Arc<dyn VectorStore>,
        chunk_size: usize,
        chunk_overlap: usize,
    ) -> Self {
        Self {
            source,
            sentiment,
            embedder,
            store,
            cleaner: CommentCleaner::new(),
            chunk_size,
            chunk_overlap,
        }
    }

    /// Collects comments for a topic across videos and indexes them.
    /// Returns (comments fetched, chunks stored).
    pub async fn collect_and_process(
        &self,
        topic: &str,
        max_videos: usize,
        max_comments_per_video: usize,
    ) -> Result<(usize, usize), CoreError> {
        let comments = self
            .source
            .collect_comments_by_topic(topic, max_videos, max_comments_per_video)
            .await?;
        let collected = comments.len();

        let stored = self.process_and_store(comments, topic).await?;
        info!(
            "Topic '{}': {} comments collected, {} chunks stored",
            topic, collected, stored
        );
        Ok((collected, stored))
    }

    /// Collects comments for one video, using the video id as its topic.
    pub async fn collect_and_process_video(
        &self,
        video_id: &str,
        max_comments: usize,
    ) -> Result<(usize, usize), CoreError> {
        let mut comments = self.source.video_comments(video_id, max_comments).await?;
        for comment in &mut comments {
            if comment.video_title.is_empty() {
                comment.video_title = format!("Video {}", video_id);
            }
        }
        let collected = comments.len();

        let stored = self.process_and_store(comments, video_id).await?;
        info!(
            "Video '{}': {} comments collected, {} chunks stored",
            video_id, collected, stored
        );
        Ok((collected, stored))
    }

    async fn process_and_store(
        &self,
        comments: Vec<CommentData>,
        topic: &str,
    ) -> Result<usize, CoreError> {
        let mut contents: Vec<String> = Vec::new();
        let mut metadatas: Vec<CommentMetadata> = Vec::new();

        for comment in comments {
            let Some(cleaned) = self.cleaner.clean(&comment.text) else {
                continue;
            };
            if cleaned.chars().count() < MIN_COMMENT_CHARS {
                continue;
            }

            let sentiment = self.sentiment.classify(&cleaned).await;
            let base = CommentMetadata {
                comment_id: comment.comment_id.clone(),
                author: Some(comment.author.clone()),
                like_count: Some(comment.like_count),
                video_id: comment.video_id.clone(),
                video_title: Some(comment.video_title.clone()),
                published_at: Some(comment.published_at.clone()),
                topic: topic.to_string(),
                sentiment: Some(sentiment),
                chunk_index: 0,
                is_chunked: false,
            };

            if cleaned.chars().count() > self.chunk_size {
                let chunks = split_text(&cleaned, self.chunk_size, self.chunk_overlap);
                let chunked = chunks.len() > 1;
                for (index, chunk) in chunks.into_iter().enumerate() {
                    let mut metadata = base.clone();
                    metadata.chunk_index = index as u32;
                    metadata.is_chunked = chunked;
                    contents.push(chunk);
                    metadatas.push(metadata);
                }
            } else {
                contents.push(cleaned);
                metadatas.push(base);
            }
        }

        if contents.is_empty() {
            debug!("No comments survived cleaning for topic '{}'", topic);
            return Ok(0);
        }

        let mut documents = Vec::with_capacity(contents.len());
        for (batch_number, batch) in contents.chunks(EMBED_BATCH_SIZE).enumerate() {
            let embeddings = self.embedder.embed_batch(batch).await?;
            for (offset, embedding) in embeddings.into_iter().enumerate() {
                let index = batch_number * EMBED_BATCH_SIZE + offset;
                let metadata = metadatas[index].clone();
                documents.push(StoredComment {
                    id: format!("{}/{}", metadata.comment_id, metadata.chunk_index),
                    content: contents[index].clone(),
                    embedding,
                    metadata,
                });
            }
        }

        let stored = documents.len();
        self.store.upsert(documents).await?;
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use llm_interface::LlmProvider;
    use opinionlens_core::SentimentStats;
    use vector_store::InMemoryVectorStore;
    use youtube_client::VideoInfo;

    struct CannedSource {
        comments: Vec<CommentData>,
    }

    #[async_trait]
    impl CommentSource for CannedSource {
        async fn search_videos(
            &self,
            _query: &str,
            _max_results: usize,
        ) -> Result<Vec<VideoInfo>, CoreError> {
            Ok(Vec::new())
        }

        async fn video_comments(
            &self,
            _video_id: &str,
            _max_results: usize,
        ) -> Result<Vec<CommentData>, CoreError> {
            Ok(self.comments.clone())
        }

        async fn collect_comments_by_topic(
            &self,
            _query: &str,
            _max_videos: usize,
            _max_comments_per_video: usize,
        ) -> Result<Vec<CommentData>, CoreError> {
            Ok(self.comments.clone())
        }
    }

    struct CannedLlm;

    #[async_trait]
    impl LlmProvider for CannedLlm {
        async fn generate(&self, _prompt: &str) -> Result<String, CoreError> {
            Ok("positive: 0.5\nnegative: 0.3\nneutral: 0.2".to_string())
        }

        fn model_name(&self) -> &str {
            "canned"
        }
    }

    struct CountingEmbedder;

    #[async_trait]
    impl TextEmbedder for CountingEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>, CoreError> {
            Ok(vec![text.chars().count() as f32, 1.0])
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, CoreError> {
            let mut vectors = Vec::with_capacity(texts.len());
            for text in texts {
                vectors.push(self.embed(text).await?);
            }
            Ok(vectors)
        }

        fn model_name(&self) -> &str {
            "counting"
        }
    }

    fn comment(id: &str, text: &str) -> CommentData {
        CommentData {
            comment_id: id.to_string(),
            text: text.to_string(),
            author: "viewer".to_string(),
            like_count: 3,
            video_id: "video1".to_string(),
            video_title: "Video One".to_string(),
            published_at: "2024-01-01T00:00:00Z".to_string(),
        }
    }

    fn processor(comments: Vec<CommentData>, store: Arc<InMemoryVectorStore>) -> CommentProcessor {
        CommentProcessor::new(
            Arc::new(CannedSource { comments }),
            SentimentAnalyzer::new(Arc::new(CannedLlm)),
            Arc::new(CountingEmbedder),
            store,
            1000,
            200,
        )
    }

    #[test]
    fn test_cleaner_squeezes_laughter_and_punctuation() {
        let cleaner = CommentCleaner::new();
        assert_eq!(
            cleaner.clean("진짜 웃기다 ㅋㅋㅋㅋㅋ!!!!").as_deref(),
            Some("진짜 웃기다 ㅋㅋ!!")
        );
    }

    #[test]
    fn test_cleaner_collapses_whitespace() {
        let cleaner = CommentCleaner::new();
        assert_eq!(
            cleaner.clean("  좋은   영상\n\n감사합니다  ").as_deref(),
            Some("좋은 영상 감사합니다")
        );
    }

    #[test]
    fn test_cleaner_rejects_symbol_only_comments() {
        let cleaner = CommentCleaner::new();
        assert!(cleaner.clean("!!! ♥♥♥ ...").is_none());
        assert!(cleaner.clean("").is_none());
    }

    #[tokio::test]
    async fn test_collect_and_process_stores_cleaned_comments() {
        let store = Arc::new(InMemoryVectorStore::new());
        let processor = processor(
            vec![
                comment("c1", "정말 유익한 설명 감사합니다"),
                comment("c2", "짧음"),     // below the length floor
                comment("c3", "!!!???"),   // symbol-only
            ],
            store.clone(),
        );

        let (collected, stored) = processor
            .collect_and_process("테스트", 5, 50)
            .await
            .expect("collection should succeed");

        assert_eq!(collected, 3);
        assert_eq!(stored, 1);
        assert_eq!(store.count().await.expect("count should succeed"), 1);

        let hits = store.query(&[1.0, 1.0], 10).await.expect("query should succeed");
        let metadata = &hits[0].metadata;
        assert_eq!(metadata.topic, "테스트");
        assert_eq!(metadata.author.as_deref(), Some("viewer"));
        let sentiment = metadata.sentiment.expect("sentiment should be attached");
        assert!((sentiment.positive - 0.5).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_long_comments_are_chunked() {
        let store = Arc::new(InMemoryVectorStore::new());
        let long_text = "이 영상의 내용이 아주 상세합니다. ".repeat(30);
        let processor = CommentProcessor::new(
            Arc::new(CannedSource {
                comments: vec![comment("c1", &long_text)],
            }),
            SentimentAnalyzer::new(Arc::new(CannedLlm)),
            Arc::new(CountingEmbedder),
            store.clone(),
            100,
            20,
        );

        let (collected, stored) = processor
            .collect_and_process("테스트", 5, 50)
            .await
            .expect("collection should succeed");

        assert_eq!(collected, 1);
        assert!(stored > 1);

        let hits = store.query(&[1.0, 1.0], 50).await.expect("query should succeed");
        assert!(hits.iter().all(|hit| hit.metadata.is_chunked));
        // Chunk ids stay distinct under one comment id
        let mut indices: Vec<u32> = hits.iter().map(|hit| hit.metadata.chunk_index).collect();
        indices.sort_unstable();
        indices.dedup();
        assert_eq!(indices.len(), hits.len());
    }

    #[tokio::test]
    async fn test_video_collection_uses_video_id_as_topic() {
        let store = Arc::new(InMemoryVectorStore::new());
        let processor = processor(
            vec![comment("c1", "정말 유익한 설명 감사합니다")],
            store.clone(),
        );

        let (collected, stored) = processor
            .collect_and_process_video("abc123", 50)
            .await
            .expect("collection should succeed");

        assert_eq!((collected, stored), (1, 1));
        let hits = store.query(&[1.0, 1.0], 10).await.expect("query should succeed");
        assert_eq!(hits[0].metadata.topic, "abc123");
    }

    #[tokio::test]
    async fn test_empty_fetch_stores_nothing() {
        let store = Arc::new(InMemoryVectorStore::new());
        let processor = processor(Vec::new(), store.clone());

        let (collected, stored) = processor
            .collect_and_process("테스트", 5, 50)
            .await
            .expect("collection should succeed");

        assert_eq!((collected, stored), (0, 0));
        assert_eq!(store.count().await.expect("count should succeed"), 0);
    }
}
