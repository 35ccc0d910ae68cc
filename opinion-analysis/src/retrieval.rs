use embedding_engine::TextEmbedder;
use opinionlens_core::{CoreError, RetrievedComment};
use std::sync::Arc;
use tracing::debug;
use vector_store::VectorStore;

/// Composes query embedding with nearest-neighbor search and an optional
/// topic post-filter.
pub struct RetrievalCoordinator {
    embedder: Arc<dyn TextEmbedder>,
    store: Arc<dyn VectorStore>,
}

impl RetrievalCoordinator {
    pub fn new(embedder: Arc<dyn TextEmbedder>, store: Arc<dyn VectorStore>) -> Self {
        Self { embedder, store }
    }

    /// Returns up to `top_k` comments by descending relevance to `query`.
    ///
    /// The topic filter is applied after the `top_k` fetch, so a filtered
    /// call may return fewer comments than requested; narrow topics thin
    /// out rather than widen the search. Zero matches is an empty vec,
    /// never an error.
    pub async fn retrieve(
        &self,
        query: &str,
        top_k: usize,
        topic_filter: Option<&str>,
    ) -> Result<Vec<RetrievedComment>, CoreError> {
        let query_embedding = self.embedder.embed(query).await?;
        let hits = self.store.query(&query_embedding, top_k).await?;

        let mut comments: Vec<RetrievedComment> = hits
            .into_iter()
            .map(|hit| RetrievedComment {
                content: hit.content,
                metadata: hit.metadata,
                relevance_score: hit.score.clamp(0.0, 1.0),
            })
            .collect();

        if let Some(topic) = topic_filter {
            comments.retain(|comment| comment.metadata.topic == topic);
        }

        debug!(
            "Retrieved {} comments for query '{}' (top_k {}, topic {:?})",
            comments.len(),
            query,
            top_k,
            topic_filter
        );
        Ok(comments)
    }
}
