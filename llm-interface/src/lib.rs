use async_trait::async_trait;
use opinionlens_core::{CoreError, LlmError};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Text generation, as seen by narrative synthesis and sentiment
/// classification.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, CoreError>;

    fn model_name(&self) -> &str;
}

#[derive(Debug, Clone)]
pub struct GenerationOptions {
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_output_tokens: 1000,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<TextPart<'a>>,
}

#[derive(Debug, Serialize)]
struct TextPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug)]
pub struct GeminiProvider {
    http_client: Client,
    api_key: String,
    model: String,
    options: GenerationOptions,
}

impl GeminiProvider {
    pub fn new(api_key: String, model: String, options: GenerationOptions) -> Self {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http_client,
            api_key,
            model,
            options,
        }
    }

    fn map_error_status(&self, status: StatusCode) -> LlmError {
        match status.as_u16() {
            400 | 401 => LlmError::InvalidApiKey {
                provider: "gemini".to_string(),
            },
            403 => LlmError::AuthenticationFailed {
                provider: "gemini".to_string(),
            },
            404 => LlmError::ModelNotAvailable {
                model: self.model.clone(),
            },
            429 => LlmError::RateLimitExceeded {
                provider: "gemini".to_string(),
                retry_after: 30,
            },
            _ => LlmError::ServiceUnavailable {
                provider: "gemini".to_string(),
            },
        }
    }

    fn extract_text(response: GenerateContentResponse) -> Result<String, LlmError> {
        if let Some(feedback) = response.prompt_feedback {
            if let Some(reason) = feedback.block_reason {
                return Err(LlmError::ContentFiltered { reason });
            }
        }

        let text = response
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .map(|part| part.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(LlmError::EmptyCompletion {
                provider: "gemini".to_string(),
            });
        }
        Ok(trimmed.to_string())
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    async fn generate(&self, prompt: &str) -> Result<String, CoreError> {
        if prompt.trim().is_empty() {
            return Err(CoreError::Llm(LlmError::InvalidPrompt {
                reason: "empty prompt".to_string(),
            }));
        }

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            GEMINI_API_BASE, self.model, self.api_key
        );
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![TextPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: self.options.temperature,
                max_output_tokens: self.options.max_output_tokens,
            },
        };

        debug!(
            "Requesting completion from {} ({} prompt chars)",
            self.model,
            prompt.chars().count()
        );
        let response = self
            .http_client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("Generation request failed: {}", e);
                if e.is_timeout() {
                    CoreError::Llm(LlmError::RequestTimeout {
                        provider: "gemini".to_string(),
                    })
                } else {
                    CoreError::Network(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            error!("Generation request rejected with status {}", status);
            return Err(CoreError::Llm(self.map_error_status(status)));
        }

        let parsed: GenerateContentResponse = response.json().await.map_err(|e| {
            error!("Failed to parse generation response: {}", e);
            CoreError::Llm(LlmError::InvalidResponseFormat {
                provider: "gemini".to_string(),
            })
        })?;

        Self::extract_text(parsed).map_err(CoreError::Llm)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_text_joins_parts() {
        let response: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"Hello "},{"text":"world"}]}}]}"#,
        )
        .expect("response should parse");

        let text = GeminiProvider::extract_text(response).expect("text should extract");
        assert_eq!(text, "Hello world");
    }

    #[test]
    fn test_extract_text_empty_candidates() {
        let response: GenerateContentResponse =
            serde_json::from_str(r#"{"candidates":[]}"#).expect("response should parse");

        let result = GeminiProvider::extract_text(response);
        assert!(matches!(result, Err(LlmError::EmptyCompletion { .. })));
    }

    #[test]
    fn test_extract_text_blocked_prompt() {
        let response: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[],"promptFeedback":{"blockReason":"SAFETY"}}"#,
        )
        .expect("response should parse");

        let result = GeminiProvider::extract_text(response);
        assert!(matches!(
            result,
            Err(LlmError::ContentFiltered { reason }) if reason == "SAFETY"
        ));
    }

    #[tokio::test]
    async fn test_empty_prompt_rejected() {
        let provider = GeminiProvider::new(
            "key".to_string(),
            "gemini-2.0-flash-lite".to_string(),
            GenerationOptions::default(),
        );
        let result = provider.generate("   ").await;
        assert!(matches!(
            result,
            Err(CoreError::Llm(LlmError::InvalidPrompt { .. }))
        ));
    }

    #[test]
    fn test_model_name() {
        let provider = GeminiProvider::new(
            "key".to_string(),
            "gemini-2.0-flash-lite".to_string(),
            GenerationOptions::default(),
        );
        assert_eq!(provider.model_name(), "gemini-2.0-flash-lite");
    }
}
