use crate::metrics::{QuotaTracker, QuotaUsage, RequestRecord};
use crate::rate_limiter::{RateLimitConfig, RateLimitStatus, RateLimiter};
use opinionlens_core::{CoreError, YouTubeApiError};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

const YOUTUBE_API_BASE: &str = "https://www.googleapis.com/youtube/v3";

/// Quota units billed by the Data API per call.
pub const SEARCH_QUOTA_COST: u64 = 100;
pub const COMMENT_THREADS_QUOTA_COST: u64 = 1;

/// search.list caps maxResults at 50, commentThreads.list at 100.
const SEARCH_PAGE_LIMIT: usize = 50;
const COMMENT_PAGE_LIMIT: usize = 100;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchListResponse {
    pub items: Vec<SearchResult>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub id: SearchResultId,
    pub snippet: SearchSnippet,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResultId {
    pub kind: String,
    pub video_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchSnippet {
    pub title: String,
    pub channel_title: String,
    pub published_at: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentThreadListResponse {
    pub items: Vec<CommentThread>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentThread {
    pub id: String,
    pub snippet: CommentThreadSnippet,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentThreadSnippet {
    pub top_level_comment: TopLevelComment,
    #[serde(default)]
    pub total_reply_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopLevelComment {
    pub id: String,
    pub snippet: CommentSnippet,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentSnippet {
    pub text_display: String,
    pub author_display_name: String,
    #[serde(default)]
    pub like_count: u64,
    pub published_at: String,
}

/// Error envelope the Data API returns with non-2xx statuses.
#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    errors: Vec<ApiErrorItem>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorItem {
    #[serde(default)]
    reason: Option<String>,
}

#[derive(Debug)]
pub struct YouTubeApiClient {
    http_client: Client,
    rate_limiter: Arc<RateLimiter>,
    quota: Arc<QuotaTracker>,
    api_key: String,
}

impl YouTubeApiClient {
    pub fn new(api_key: String) -> Self {
        let rate_config = RateLimitConfig::youtube_data();
        let rate_limiter = Arc::new(RateLimiter::new(rate_config));
        let quota = Arc::new(QuotaTracker::new());

        let http_client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http_client,
            rate_limiter,
            quota,
            api_key,
        }
    }

    async fn make_request(
        &self,
        endpoint: &str,
        quota_cost: u64,
        query_params: &[(&str, String)],
        resource_hint: &str,
    ) -> Result<Response, CoreError> {
        let url = format!("{}{}", YOUTUBE_API_BASE, endpoint);
        let start_time = Instant::now();

        // Acquire rate limit permit
        let _permit = self.rate_limiter.acquire_permit().await;
        debug!("Acquired rate limit permit for GET {}", endpoint);

        let request_builder = self
            .http_client
            .get(&url)
            .query(query_params)
            .query(&[("key", self.api_key.as_str())]);

        info!("Making YouTube API request: GET {}", endpoint);
        let result = request_builder.send().await;

        let mut record = RequestRecord {
            endpoint: endpoint.to_string(),
            quota_cost,
            status_code: None,
            response_time: start_time.elapsed(),
            success: false,
            rate_limited: false,
        };

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                error!("Network error for GET {}: {}", endpoint, e);
                self.quota.record(record).await;
                if e.is_timeout() {
                    return Err(CoreError::YouTubeApi(YouTubeApiError::RequestTimeout));
                }
                return Err(CoreError::Network(e));
            }
        };

        let status = response.status();
        record.status_code = Some(status.as_u16());
        record.response_time = start_time.elapsed();

        if status.is_success() {
            record.success = true;
            self.quota.record(record).await;
            debug!("Request successful: {} {}", status, endpoint);
            return Ok(response);
        }

        error!("Request failed with status: {} for {}", status, endpoint);
        let body = response.text().await.unwrap_or_default();
        let api_error = Self::map_error_response(status, &body, resource_hint);
        record.rate_limited = matches!(
            api_error,
            YouTubeApiError::RateLimitExceeded { .. } | YouTubeApiError::QuotaExceeded
        );
        self.quota.record(record).await;

        Err(CoreError::YouTubeApi(api_error))
    }

    /// Translates a Data API error envelope into a typed error, using the
    /// per-item `reason` codes Google attaches to 4xx responses.
    fn map_error_response(status: StatusCode, body: &str, resource_hint: &str) -> YouTubeApiError {
        let reason = serde_json::from_str::<ApiErrorEnvelope>(body)
            .ok()
            .and_then(|envelope| {
                envelope
                    .error
                    .errors
                    .into_iter()
                    .find_map(|item| item.reason)
            })
            .unwrap_or_default();

        match status.as_u16() {
            400 => {
                if reason == "keyInvalid" {
                    YouTubeApiError::InvalidApiKey
                } else {
                    YouTubeApiError::InvalidResponse {
                        details: format!("Bad request: {}", reason),
                    }
                }
            }
            401 => YouTubeApiError::InvalidApiKey,
            403 => match reason.as_str() {
                "quotaExceeded" | "dailyLimitExceeded" => YouTubeApiError::QuotaExceeded,
                "rateLimitExceeded" | "userRateLimitExceeded" => {
                    warn!("Rate limited by YouTube, backing off");
                    YouTubeApiError::RateLimitExceeded { retry_after: 60 }
                }
                "commentsDisabled" => YouTubeApiError::CommentsDisabled {
                    video_id: resource_hint.to_string(),
                },
                _ => YouTubeApiError::Forbidden {
                    resource: resource_hint.to_string(),
                },
            },
            404 => YouTubeApiError::VideoNotFound {
                video_id: resource_hint.to_string(),
            },
            429 => YouTubeApiError::RateLimitExceeded { retry_after: 60 },
            code if status.is_server_error() => YouTubeApiError::ServerError { status_code: code },
            _ => YouTubeApiError::InvalidResponse {
                details: format!("Unexpected status {}: {}", status, reason),
            },
        }
    }

    /// One page of video search results for a query, relevance-ordered.
    pub async fn search_videos(
        &self,
        query: &str,
        max_results: usize,
        page_token: Option<&str>,
    ) -> Result<SearchListResponse, CoreError> {
        let mut params = vec![
            ("part", "id,snippet".to_string()),
            ("q", query.to_string()),
            ("type", "video".to_string()),
            ("order", "relevance".to_string()),
            (
                "maxResults",
                max_results.min(SEARCH_PAGE_LIMIT).to_string(),
            ),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token.to_string()));
        }

        let response = self
            .make_request("/search", SEARCH_QUOTA_COST, &params, query)
            .await?;

        let listing: SearchListResponse = response.json().await.map_err(|e| {
            error!("Failed to parse search results: {}", e);
            CoreError::YouTubeApi(YouTubeApiError::InvalidResponse {
                details: format!("Failed to parse search results for '{}'", query),
            })
        })?;

        info!(
            "Retrieved {} search results for '{}'",
            listing.items.len(),
            query
        );
        Ok(listing)
    }

    /// One page of plain-text top-level comment threads for a video,
    /// relevance-ordered.
    pub async fn list_comment_threads(
        &self,
        video_id: &str,
        max_results: usize,
        page_token: Option<&str>,
    ) -> Result<CommentThreadListResponse, CoreError> {
        let mut params = vec![
            ("part", "snippet".to_string()),
            ("videoId", video_id.to_string()),
            ("order", "relevance".to_string()),
            ("textFormat", "plainText".to_string()),
            (
                "maxResults",
                max_results.min(COMMENT_PAGE_LIMIT).to_string(),
            ),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token.to_string()));
        }

        let response = self
            .make_request(
                "/commentThreads",
                COMMENT_THREADS_QUOTA_COST,
                &params,
                video_id,
            )
            .await?;

        let listing: CommentThreadListResponse = response.json().await.map_err(|e| {
            error!("Failed to parse comment threads: {}", e);
            CoreError::YouTubeApi(YouTubeApiError::InvalidResponse {
                details: format!("Failed to parse comment threads for video {}", video_id),
            })
        })?;

        debug!(
            "Retrieved {} comment threads for video {}",
            listing.items.len(),
            video_id
        );
        Ok(listing)
    }

    pub async fn get_quota_usage(&self) -> QuotaUsage {
        self.quota.usage().await
    }

    pub async fn get_rate_limit_status(&self) -> RateLimitStatus {
        self.rate_limiter.get_rate_limit_status().await
    }

    pub async fn reset_quota_usage(&self) {
        self.quota.reset().await;
    }
}
