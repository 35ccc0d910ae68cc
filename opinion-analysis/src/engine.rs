use crate::extractor::KeywordExtractor;
use crate::generator::ResponseGenerator;
use crate::processor::CommentProcessor;
use crate::ranker::rank_comments;
use crate::retrieval::RetrievalCoordinator;
use crate::sentiment::{aggregate_sentiment, SentimentAnalyzer};
use embedding_engine::TextEmbedder;
use llm_interface::LlmProvider;
use opinionlens_core::{
    AnalysisResult, AppConfig, ChatMessage, CollectionStats, CollectionSummary, CoreError,
    RetrievedComment, SentimentStats, SystemStats, TopicOverview,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;
use vector_store::VectorStore;
use youtube_client::CommentSource;

/// Evidence and keyword budgets for one analysis report.
const REPRESENTATIVE_COUNT: usize = 5;
const ANALYSIS_KEYWORD_COUNT: usize = 10;

/// Overview approximates "everything stored for the topic" with one broad
/// retrieval; large topics can exceed this breadth and undercount.
const OVERVIEW_TOP_K: usize = 50;
const OVERVIEW_KEYWORD_COUNT: usize = 10;

/// Chat answers ground on a handful of closest comments.
const CHAT_CONTEXT_TOP_K: usize = 5;

/// Top-level workflow over one opinion-analysis request: retrieve, filter,
/// then rank / extract / aggregate / synthesize over one shared candidate
/// set, joined into a single report.
///
/// Holds no per-request state; concurrent requests only share the injected
/// store and the per-topic collection locks.
pub struct AnalysisEngine {
    retrieval: RetrievalCoordinator,
    processor: CommentProcessor,
    generator: ResponseGenerator,
    extractor: KeywordExtractor,
    embedder: Arc<dyn TextEmbedder>,
    store: Arc<dyn VectorStore>,
    collection_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
    default_top_k: usize,
}

impl AnalysisEngine {
    pub fn new(
        source: Arc<dyn CommentSource>,
        embedder: Arc<dyn TextEmbedder>,
        llm: Arc<dyn LlmProvider>,
        store: Arc<dyn VectorStore>,
        config: &AppConfig,
    ) -> Self {
        let retrieval = RetrievalCoordinator::new(embedder.clone(), store.clone());
        let processor = CommentProcessor::new(
            source,
            SentimentAnalyzer::new(llm.clone()),
            embedder.clone(),
            store.clone(),
            config.chunk_size,
            config.chunk_overlap,
        );
        let generator = ResponseGenerator::new(llm);

        Self {
            retrieval,
            processor,
            generator,
            extractor: KeywordExtractor::new(),
            embedder,
            store,
            collection_locks: Mutex::new(HashMap::new()),
            default_top_k: config.top_k_comments,
        }
    }

    /// One collection may run per topic at a time; a second call for the
    /// same topic waits instead of fetching the same comments twice.
    async fn topic_lock(&self, topic: &str) -> Arc<Mutex<()>> {
        let mut locks = self.collection_locks.lock().await;
        locks
            .entry(topic.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Collects and indexes comments for a topic. Fetch, chunking,
    /// embedding, and storage all happen in the processor; this layer adds
    /// mutual exclusion and shapes the summary. Collaborator failures
    /// propagate.
    pub async fn collect_and_analyze_topic(
        &self,
        topic: &str,
        max_videos: usize,
        max_comments_per_video: usize,
    ) -> Result<CollectionSummary, CoreError> {
        let lock = self.topic_lock(topic).await;
        let _guard = lock.lock().await;

        info!("Collecting comments for topic '{}'", topic);
        let (collected, processed) = self
            .processor
            .collect_and_process(topic, max_videos, max_comments_per_video)
            .await?;

        Ok(CollectionSummary {
            topic: topic.to_string(),
            collected_comments: collected,
            processed_chunks: processed,
            status: "completed".to_string(),
        })
    }

    /// Collects and indexes comments for a single video, with the video id
    /// standing in as the topic.
    pub async fn collect_video(
        &self,
        video_id: &str,
        max_comments: usize,
    ) -> Result<CollectionSummary, CoreError> {
        let lock = self.topic_lock(video_id).await;
        let _guard = lock.lock().await;

        info!("Collecting comments for video '{}'", video_id);
        let (collected, processed) = self
            .processor
            .collect_and_process_video(video_id, max_comments)
            .await?;

        Ok(CollectionSummary {
            topic: video_id.to_string(),
            collected_comments: collected,
            processed_chunks: processed,
            status: "completed".to_string(),
        })
    }

    /// Answers an opinion question with a narrative plus structured
    /// evidence.
    ///
    /// Retrieval runs once; ranking, keyword extraction, aggregation, and
    /// narrative synthesis all see that same candidate list, so the
    /// evidence cannot drift from the narrative. Synthesis is joined with
    /// the local steps before the report is assembled.
    pub async fn analyze_opinion(
        &self,
        query: &str,
        topic: Option<&str>,
        top_k: Option<usize>,
        detailed: bool,
    ) -> Result<(String, AnalysisResult), CoreError> {
        let top_k = top_k.unwrap_or(self.default_top_k);
        let candidates = self.retrieval.retrieve(query, top_k, topic).await?;
        let sentiment_stats = attached_sentiment(&candidates);

        let (narrative, representative_comments, keywords) = tokio::join!(
            self.generator
                .opinion_analysis(query, &candidates, &sentiment_stats, detailed),
            async { rank_comments(&candidates, REPRESENTATIVE_COUNT) },
            async {
                self.extractor.extract(
                    candidates.iter().map(|comment| comment.content.as_str()),
                    ANALYSIS_KEYWORD_COUNT,
                )
            },
        );
        let analysis_text = narrative?;

        let result = AnalysisResult {
            query: query.to_string(),
            topic: topic.map(str::to_string),
            sentiment_stats,
            representative_comments,
            keywords,
            total_relevant_comments: candidates.len(),
        };
        Ok((analysis_text, result))
    }

    /// Best-effort snapshot of one topic, bounded by retrieval breadth.
    pub async fn get_topic_overview(&self, topic: &str) -> Result<TopicOverview, CoreError> {
        let candidates = self
            .retrieval
            .retrieve(topic, OVERVIEW_TOP_K, Some(topic))
            .await?;

        let sentiment_overview = attached_sentiment(&candidates);
        let top_keywords = self.extractor.extract(
            candidates.iter().map(|comment| comment.content.as_str()),
            OVERVIEW_KEYWORD_COUNT,
        );

        Ok(TopicOverview {
            topic: topic.to_string(),
            total_comments: candidates.len(),
            sentiment_overview,
            top_keywords,
            collection_stats: CollectionStats {
                total_documents: self.store.count().await?,
                store_type: self.store.store_type().to_string(),
            },
        })
    }

    /// Removes everything stored for a topic. Clearing an absent or
    /// already-cleared topic is a no-op, not an error.
    pub async fn clear_topic_data(&self, topic: &str) -> Result<usize, CoreError> {
        let removed = self.store.delete_by_topic(topic).await?;
        info!("Cleared {} documents for topic '{}'", removed, topic);
        Ok(removed)
    }

    pub async fn get_system_stats(&self) -> Result<SystemStats, CoreError> {
        Ok(SystemStats {
            total_stored_comments: self.store.count().await?,
            embedding_model: self.embedder.model_name().to_string(),
            vector_store_type: self.store.store_type().to_string(),
            status: "operational".to_string(),
        })
    }

    /// Grounded chat answer plus the video titles it drew from.
    pub async fn generate_response(
        &self,
        query: &str,
        history: &[ChatMessage],
    ) -> Result<(String, Vec<String>), CoreError> {
        let context = self
            .retrieval
            .retrieve(query, CHAT_CONTEXT_TOP_K, None)
            .await?;

        let response = self
            .generator
            .contextual_response(query, &context, history)
            .await?;

        let mut sources: Vec<String> = Vec::new();
        for comment in &context {
            let title = comment.metadata.video_title_or_empty();
            if !title.is_empty() && !sources.iter().any(|existing| existing == title) {
                sources.push(title.to_string());
            }
        }

        Ok((response, sources))
    }

    /// Chat answer without retrieval grounding.
    pub async fn generate_direct_response(
        &self,
        query: &str,
        history: &[ChatMessage],
    ) -> Result<String, CoreError> {
        self.generator.direct_response(query, history).await
    }
}

/// Mean of the sentiment distributions stamped on the candidates at
/// collection time; a candidate that somehow lost its distribution counts
/// as neutral rather than failing the request.
fn attached_sentiment(candidates: &[RetrievedComment]) -> SentimentStats {
    let distributions: Vec<SentimentStats> = candidates
        .iter()
        .map(|comment| {
            comment
                .metadata
                .sentiment
                .unwrap_or(SentimentStats::NEUTRAL)
        })
        .collect();
    aggregate_sentiment(&distributions)
}
