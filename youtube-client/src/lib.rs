pub mod api;
pub mod metrics;
pub mod rate_limiter;

use crate::api::{SearchResult, YouTubeApiClient};
use async_trait::async_trait;
use opinionlens_core::{retry_with_backoff, CommentData, CoreError, YouTubeApiError};
use std::time::Duration;
use tracing::{info, warn};

/// A video surfaced by topic search; carries just enough context to stamp
/// comments with their source.
#[derive(Debug, Clone)]
pub struct VideoInfo {
    pub video_id: String,
    pub title: String,
    pub channel_title: String,
    pub published_at: String,
    pub description: String,
}

impl TryFrom<SearchResult> for VideoInfo {
    type Error = CoreError;

    fn try_from(result: SearchResult) -> Result<Self, Self::Error> {
        let video_id = result.id.video_id.ok_or_else(|| {
            CoreError::YouTubeApi(YouTubeApiError::InvalidResponse {
                details: "Search result is not a video".to_string(),
            })
        })?;
        Ok(Self {
            video_id,
            title: result.snippet.title,
            channel_title: result.snippet.channel_title,
            published_at: result.snippet.published_at,
            description: result.snippet.description,
        })
    }
}

/// Platform comment fetching, as seen by the analysis pipeline.
///
/// The collection workflow depends on this trait only, so tests can swap in
/// a canned source without any network access.
#[async_trait]
pub trait CommentSource: Send + Sync {
    async fn search_videos(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<VideoInfo>, CoreError>;

    async fn video_comments(
        &self,
        video_id: &str,
        max_results: usize,
    ) -> Result<Vec<CommentData>, CoreError>;

    /// Search for videos about `query`, then gather up to
    /// `max_comments_per_video` comments from each, stamping video titles.
    async fn collect_comments_by_topic(
        &self,
        query: &str,
        max_videos: usize,
        max_comments_per_video: usize,
    ) -> Result<Vec<CommentData>, CoreError>;
}

#[derive(Debug)]
pub struct YouTubeClient {
    api: YouTubeApiClient,
}

impl YouTubeClient {
    pub fn new(api_key: String) -> Self {
        Self {
            api: YouTubeApiClient::new(api_key),
        }
    }

    pub fn api(&self) -> &YouTubeApiClient {
        &self.api
    }

    /// Fetches comment pages until `max_results` comments are gathered or
    /// the listing runs out of pages.
    async fn fetch_all_comments(
        &self,
        video_id: &str,
        max_results: usize,
    ) -> Result<Vec<CommentData>, CoreError> {
        let mut comments = Vec::new();
        let mut page_token: Option<String> = None;

        while comments.len() < max_results {
            let remaining = max_results - comments.len();
            let listing = self
                .api
                .list_comment_threads(video_id, remaining, page_token.as_deref())
                .await?;

            for thread in listing.items {
                let snippet = thread.snippet.top_level_comment.snippet;
                comments.push(CommentData {
                    comment_id: thread.snippet.top_level_comment.id,
                    text: snippet.text_display,
                    author: snippet.author_display_name,
                    like_count: snippet.like_count,
                    video_id: video_id.to_string(),
                    video_title: String::new(), // stamped by the caller
                    published_at: snippet.published_at,
                });
                if comments.len() >= max_results {
                    break;
                }
            }

            page_token = listing.next_page_token;
            if page_token.is_none() {
                break;
            }
        }

        Ok(comments)
    }
}

#[async_trait]
impl CommentSource for YouTubeClient {
    async fn search_videos(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<VideoInfo>, CoreError> {
        let listing = self.api.search_videos(query, max_results, None).await?;

        let mut videos = Vec::with_capacity(listing.items.len());
        for result in listing.items {
            match VideoInfo::try_from(result) {
                Ok(video) => videos.push(video),
                Err(e) => warn!("Skipping non-video search result: {}", e),
            }
        }
        videos.truncate(max_results);
        Ok(videos)
    }

    async fn video_comments(
        &self,
        video_id: &str,
        max_results: usize,
    ) -> Result<Vec<CommentData>, CoreError> {
        retry_with_backoff(
            || self.fetch_all_comments(video_id, max_results),
            2,
            Duration::from_secs(1),
        )
        .await
    }

    async fn collect_comments_by_topic(
        &self,
        query: &str,
        max_videos: usize,
        max_comments_per_video: usize,
    ) -> Result<Vec<CommentData>, CoreError> {
        let videos = self.search_videos(query, max_videos).await?;
        info!("Found {} videos for '{}'", videos.len(), query);

        let mut all_comments = Vec::new();
        for video in &videos {
            let comments = match self
                .video_comments(&video.video_id, max_comments_per_video)
                .await
            {
                Ok(comments) => comments,
                // Videos with disabled or missing comment sections are
                // expected in any search result page; skip them.
                Err(CoreError::YouTubeApi(YouTubeApiError::CommentsDisabled { video_id })) => {
                    warn!("Comments disabled for video {}, skipping", video_id);
                    continue;
                }
                Err(CoreError::YouTubeApi(YouTubeApiError::VideoNotFound { video_id })) => {
                    warn!("Video {} disappeared from results, skipping", video_id);
                    continue;
                }
                Err(e) => return Err(e),
            };

            info!(
                "Video '{}': collected {} comments",
                video.title,
                comments.len()
            );
            all_comments.extend(comments.into_iter().map(|mut comment| {
                comment.video_title = video.title.clone();
                comment
            }));
        }

        info!(
            "Collected {} comments total for '{}'",
            all_comments.len(),
            query
        );
        Ok(all_comments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{SearchResultId, SearchSnippet};

    fn search_result(video_id: Option<&str>) -> SearchResult {
        SearchResult {
            id: SearchResultId {
                kind: "youtube#video".to_string(),
                video_id: video_id.map(str::to_string),
            },
            snippet: SearchSnippet {
                title: "Test Video".to_string(),
                channel_title: "Test Channel".to_string(),
                published_at: "2024-01-01T00:00:00Z".to_string(),
                description: "A test upload".to_string(),
            },
        }
    }

    #[test]
    fn test_video_info_conversion() {
        let video = VideoInfo::try_from(search_result(Some("abc123")))
            .expect("video result should convert");
        assert_eq!(video.video_id, "abc123");
        assert_eq!(video.title, "Test Video");
        assert_eq!(video.channel_title, "Test Channel");
    }

    #[test]
    fn test_video_info_conversion_rejects_non_video() {
        let result = VideoInfo::try_from(search_result(None));
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_client_creation() {
        let client = YouTubeClient::new("test-api-key".to_string());
        let usage = client.api().get_quota_usage().await;
        assert_eq!(usage.total_requests, 0);
    }
}
