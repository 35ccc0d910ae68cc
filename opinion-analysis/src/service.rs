use crate::engine::AnalysisEngine;
use opinionlens_core::{
    AnalysisResult, CollectionSummary, CoreError, SystemStats, TopicOverview,
};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Quick demo runs collect a small sample before analyzing.
const QUICK_ANALYSIS_VIDEOS: usize = 5;
const QUICK_ANALYSIS_COMMENTS_PER_VIDEO: usize = 50;

/// Engine stats extended with the topics this service has collected.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceStats {
    pub system: SystemStats,
    pub collected_topics: Vec<String>,
}

/// Facade over the engine for the surrounding application layer.
///
/// Tracks which topics were collected during this process lifetime; the
/// durable source of truth stays in the store itself.
pub struct AnalysisService {
    engine: Arc<AnalysisEngine>,
    collected_topics: RwLock<HashSet<String>>,
}

impl AnalysisService {
    pub fn new(engine: Arc<AnalysisEngine>) -> Self {
        Self {
            engine,
            collected_topics: RwLock::new(HashSet::new()),
        }
    }

    pub async fn collect_topic_comments(
        &self,
        topic: &str,
        max_videos: usize,
        max_comments_per_video: usize,
    ) -> Result<CollectionSummary, CoreError> {
        let summary = self
            .engine
            .collect_and_analyze_topic(topic, max_videos, max_comments_per_video)
            .await?;
        self.collected_topics.write().await.insert(topic.to_string());
        Ok(summary)
    }

    pub async fn collect_video_comments(
        &self,
        video_id: &str,
        max_comments: usize,
    ) -> Result<CollectionSummary, CoreError> {
        let summary = self.engine.collect_video(video_id, max_comments).await?;
        self.collected_topics
            .write()
            .await
            .insert(video_id.to_string());
        Ok(summary)
    }

    pub async fn analyze_topic_opinion(
        &self,
        query: &str,
        topic: Option<&str>,
        detailed: bool,
    ) -> Result<(String, AnalysisResult), CoreError> {
        self.engine.analyze_opinion(query, topic, None, detailed).await
    }

    pub async fn get_topic_overview(&self, topic: &str) -> Result<TopicOverview, CoreError> {
        self.engine.get_topic_overview(topic).await
    }

    pub async fn get_collected_topics(&self) -> Vec<String> {
        let mut topics: Vec<String> = self
            .collected_topics
            .read()
            .await
            .iter()
            .cloned()
            .collect();
        topics.sort();
        topics
    }

    pub async fn clear_topic_data(&self, topic: &str) -> Result<(), CoreError> {
        self.engine.clear_topic_data(topic).await?;
        self.collected_topics.write().await.remove(topic);
        Ok(())
    }

    pub async fn get_system_stats(&self) -> Result<ServiceStats, CoreError> {
        let system = self.engine.get_system_stats().await?;
        Ok(ServiceStats {
            system,
            collected_topics: self.get_collected_topics().await,
        })
    }

    /// Collect a small sample for a topic and analyze it in one call.
    pub async fn quick_analysis(
        &self,
        topic_and_query: &str,
    ) -> Result<(String, AnalysisResult, CollectionSummary), CoreError> {
        let collection = self
            .collect_topic_comments(
                topic_and_query,
                QUICK_ANALYSIS_VIDEOS,
                QUICK_ANALYSIS_COMMENTS_PER_VIDEO,
            )
            .await?;

        let (analysis_text, analysis) = self
            .analyze_topic_opinion(topic_and_query, Some(topic_and_query), true)
            .await?;

        Ok((analysis_text, analysis, collection))
    }
}
