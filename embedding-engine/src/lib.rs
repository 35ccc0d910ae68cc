use async_trait::async_trait;
use opinionlens_core::{CoreError, EmbeddingError};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini rejects single inputs beyond its token window; this guards with a
/// generous character bound before the request is even built.
const MAX_INPUT_CHARS: usize = 8000;

/// Text-to-vector conversion, as seen by retrieval and collection.
#[async_trait]
pub trait TextEmbedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, CoreError>;

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, CoreError>;

    fn model_name(&self) -> &str;
}

/// Cosine similarity between two vectors, in [-1, 1].
/// Zero-length or mismatched vectors score 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[derive(Debug, Serialize)]
struct EmbedContentRequest<'a> {
    model: String,
    content: ContentPayload<'a>,
}

#[derive(Debug, Serialize)]
struct ContentPayload<'a> {
    parts: Vec<TextPart<'a>>,
}

#[derive(Debug, Serialize)]
struct TextPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct BatchEmbedRequest<'a> {
    requests: Vec<EmbedContentRequest<'a>>,
}

#[derive(Debug, Deserialize)]
struct EmbedContentResponse {
    embedding: EmbeddingValues,
}

#[derive(Debug, Deserialize)]
struct BatchEmbedResponse {
    embeddings: Vec<EmbeddingValues>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}

#[derive(Debug)]
pub struct GeminiEmbeddings {
    http_client: Client,
    api_key: String,
    model: String,
}

impl GeminiEmbeddings {
    pub fn new(api_key: String, model: String) -> Self {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http_client,
            api_key,
            model,
        }
    }

    fn check_input(&self, text: &str) -> Result<(), CoreError> {
        let length = text.chars().count();
        if length > MAX_INPUT_CHARS {
            return Err(CoreError::Embedding(EmbeddingError::InputTooLong {
                length,
                max_chars: MAX_INPUT_CHARS,
            }));
        }
        Ok(())
    }

    fn map_error_status(&self, status: StatusCode) -> EmbeddingError {
        match status.as_u16() {
            400 | 401 | 403 => EmbeddingError::AuthenticationFailed {
                provider: "gemini".to_string(),
            },
            404 => EmbeddingError::ModelNotAvailable {
                model: self.model.clone(),
            },
            429 => EmbeddingError::RateLimitExceeded {
                provider: "gemini".to_string(),
                retry_after: 30,
            },
            _ => EmbeddingError::ServiceUnavailable {
                provider: "gemini".to_string(),
            },
        }
    }

    async fn post_json<B: Serialize, R: for<'de> Deserialize<'de>>(
        &self,
        method: &str,
        body: &B,
    ) -> Result<R, CoreError> {
        let url = format!(
            "{}/models/{}:{}?key={}",
            GEMINI_API_BASE, self.model, method, self.api_key
        );

        let response = self
            .http_client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                error!("Embedding request failed: {}", e);
                if e.is_timeout() {
                    CoreError::Embedding(EmbeddingError::RequestTimeout {
                        provider: "gemini".to_string(),
                    })
                } else {
                    CoreError::Network(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            error!("Embedding request rejected with status {}", status);
            return Err(CoreError::Embedding(self.map_error_status(status)));
        }

        response.json::<R>().await.map_err(|e| {
            error!("Failed to parse embedding response: {}", e);
            CoreError::Embedding(EmbeddingError::InvalidResponseFormat {
                provider: "gemini".to_string(),
            })
        })
    }

    fn request_for<'a>(&self, text: &'a str) -> EmbedContentRequest<'a> {
        EmbedContentRequest {
            model: format!("models/{}", self.model),
            content: ContentPayload {
                parts: vec![TextPart { text }],
            },
        }
    }
}

#[async_trait]
impl TextEmbedder for GeminiEmbeddings {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, CoreError> {
        self.check_input(text)?;

        let response: EmbedContentResponse = self
            .post_json("embedContent", &self.request_for(text))
            .await?;

        debug!(
            "Embedded {} chars into {} dimensions",
            text.chars().count(),
            response.embedding.values.len()
        );
        Ok(response.embedding.values)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, CoreError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        for text in texts {
            self.check_input(text)?;
        }

        let request = BatchEmbedRequest {
            requests: texts.iter().map(|t| self.request_for(t)).collect(),
        };
        let response: BatchEmbedResponse = self.post_json("batchEmbedContents", &request).await?;

        let vectors: Vec<Vec<f32>> = response
            .embeddings
            .into_iter()
            .map(|embedding| embedding.values)
            .collect();

        if vectors.len() != texts.len() {
            return Err(CoreError::Embedding(EmbeddingError::InvalidResponseFormat {
                provider: "gemini".to_string(),
            }));
        }
        // All vectors in one batch must share a dimension
        if let Some(first) = vectors.first() {
            let expected = first.len();
            for vector in &vectors {
                if vector.len() != expected {
                    return Err(CoreError::Embedding(EmbeddingError::DimensionMismatch {
                        expected,
                        actual: vector.len(),
                    }));
                }
            }
        }

        Ok(vectors)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
