use async_trait::async_trait;
use embedding_engine::cosine_similarity;
use opinionlens_core::{CoreError, ScoredComment, StoredComment, VectorStoreError};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, info};


/// Durable comment index, as seen by collection, retrieval, and deletion.
///
/// Implementations own their synchronization; callers never lock around
/// store calls.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Inserts documents, replacing any existing document with the same id.
    async fn upsert(&self, documents: Vec<StoredComment>) -> Result<(), CoreError>;

    /// Returns up to `top_k` documents by descending similarity to
    /// `embedding`. Scores are clamped to [0, 1].
    async fn query(&self, embedding: &[f32], top_k: usize)
        -> Result<Vec<ScoredComment>, CoreError>;

    /// Removes every document stored under `topic`; returns how many were
    /// removed. Deleting an absent topic removes zero and is not an error.
    async fn delete_by_topic(&self, topic: &str) -> Result<usize, CoreError>;

    async fn count(&self) -> Result<usize, CoreError>;

    fn store_type(&self) -> &str;
}

/// Cosine-similarity index held entirely in memory.
///
/// Doubles as the test double for anything that takes a `dyn VectorStore`.
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    documents: RwLock<HashMap<String, StoredComment>>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn upsert(&self, documents: Vec<StoredComment>) -> Result<(), CoreError> {
        for document in &documents {
            if document.embedding.is_empty() {
                return Err(CoreError::VectorStore(VectorStoreError::EmptyEmbedding {
                    document_id: document.id.clone(),
                }));
            }
        }

        let mut store = self.documents.write().await;
        if let Some(existing) = store.values().next() {
            let expected = existing.embedding.len();
            for document in &documents {
                if document.embedding.len() != expected {
                    return Err(CoreError::VectorStore(VectorStoreError::DimensionMismatch {
                        expected,
                        actual: document.embedding.len(),
                    }));
                }
            }
        }

        let count = documents.len();
        for document in documents {
            store.insert(document.id.clone(), document);
        }
        debug!("Upserted {} documents ({} total)", count, store.len());
        Ok(())
    }

    async fn query(
        &self,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<ScoredComment>, CoreError> {
        let store = self.documents.read().await;

        let mut scored: Vec<ScoredComment> = store
            .values()
            .map(|document| ScoredComment {
                content: document.content.clone(),
                metadata: document.metadata.clone(),
                score: cosine_similarity(embedding, &document.embedding).clamp(0.0, 1.0),
            })
            .collect();

        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(top_k);
        Ok(scored)
    }

    async fn delete_by_topic(&self, topic: &str) -> Result<usize, CoreError> {
        let mut store = self.documents.write().await;
        let before = store.len();
        store.retain(|_, document| document.metadata.topic != topic);
        let removed = before - store.len();
        info!("Deleted {} documents for topic '{}'", removed, topic);
        Ok(removed)
    }

    async fn count(&self) -> Result<usize, CoreError> {
        Ok(self.documents.read().await.len())
    }

    fn store_type(&self) -> &str {
        "in-memory"
    }
}
