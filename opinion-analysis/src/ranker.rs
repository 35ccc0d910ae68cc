use opinionlens_core::{RepresentativeComment, RetrievedComment};

const RELEVANCE_WEIGHT: f32 = 0.7;
const POPULARITY_WEIGHT: f32 = 0.3;

/// Like counts saturate here so virality cannot outvote semantic
/// relevance. 100 likes marks "clearly popular" for mid-sized comment
/// sections; tune per deployment.
const LIKE_SATURATION: f32 = 100.0;

/// Selects up to `max_count` evidence comments by blended score:
/// 70% retrieval relevance, 30% capped popularity.
///
/// The sort is stable and descending, so equal scores keep retrieval
/// order and the output is deterministic for identical input. Missing
/// metadata defaults instead of failing.
pub fn rank_comments(
    comments: &[RetrievedComment],
    max_count: usize,
) -> Vec<RepresentativeComment> {
    let mut representatives: Vec<RepresentativeComment> = comments
        .iter()
        .map(|comment| {
            let relevance = comment.relevance_score.clamp(0.0, 1.0);
            let popularity =
                (comment.metadata.likes_or_zero() as f32 / LIKE_SATURATION).min(1.0);
            RepresentativeComment {
                content: comment.content.clone(),
                author: comment.metadata.author_or_anonymous().to_string(),
                like_count: comment.metadata.likes_or_zero(),
                video_title: comment.metadata.video_title_or_empty().to_string(),
                combined_score: RELEVANCE_WEIGHT * relevance + POPULARITY_WEIGHT * popularity,
            }
        })
        .collect();

    representatives.sort_by(|a, b| b.combined_score.total_cmp(&a.combined_score));
    representatives.truncate(max_count);
    representatives
}

#[cfg(test)]
mod tests {
    use super::*;
    use opinionlens_core::{CommentMetadata, ANONYMOUS_AUTHOR};

    fn retrieved(
        content: &str,
        like_count: Option<u64>,
        relevance_score: f32,
    ) -> RetrievedComment {
        RetrievedComment {
            content: content.to_string(),
            metadata: CommentMetadata {
                comment_id: content.to_string(),
                author: None,
                like_count,
                video_id: "video1".to_string(),
                video_title: Some("Video".to_string()),
                published_at: None,
                topic: "topic".to_string(),
                sentiment: None,
                chunk_index: 0,
                is_chunked: false,
            },
            relevance_score,
        }
    }

    #[test]
    fn test_blended_scores_and_ordering() {
        let comments = vec![
            retrieved("정말 좋은 영상", Some(150), 0.9),
            retrieved("별로임", Some(0), 0.4),
        ];

        let ranked = rank_comments(&comments, 5);

        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].content, "정말 좋은 영상");
        // 0.7 * 0.9 + 0.3 * min(150/100, 1) = 0.93
        assert!((ranked[0].combined_score - 0.93).abs() < 1e-6);
        // 0.7 * 0.4 + 0.3 * 0 = 0.28
        assert!((ranked[1].combined_score - 0.28).abs() < 1e-6);
    }

    #[test]
    fn test_like_count_saturates() {
        let modest = rank_comments(&[retrieved("a", Some(100), 0.0)], 1);
        let viral = rank_comments(&[retrieved("b", Some(1_000_000), 0.0)], 1);
        assert!((modest[0].combined_score - 0.3).abs() < 1e-6);
        assert!((viral[0].combined_score - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_missing_metadata_defaults() {
        let ranked = rank_comments(&[retrieved("a", None, 0.5)], 1);
        assert_eq!(ranked[0].like_count, 0);
        assert_eq!(ranked[0].author, ANONYMOUS_AUTHOR);
        assert!((ranked[0].combined_score - 0.35).abs() < 1e-6);
    }

    #[test]
    fn test_scores_stay_in_unit_interval() {
        let comments = vec![
            retrieved("a", Some(u64::MAX), 2.0), // out-of-range relevance clamps
            retrieved("b", Some(0), -1.0),
        ];
        let ranked = rank_comments(&comments, 5);
        for comment in &ranked {
            assert!((0.0..=1.0).contains(&comment.combined_score));
        }
    }

    #[test]
    fn test_truncates_to_max_count() {
        let comments: Vec<RetrievedComment> = (0..10)
            .map(|i| retrieved(&format!("c{}", i), Some(i), 0.5))
            .collect();
        assert_eq!(rank_comments(&comments, 5).len(), 5);
    }

    #[test]
    fn test_ties_keep_retrieval_order() {
        let comments = vec![
            retrieved("first", Some(10), 0.5),
            retrieved("second", Some(10), 0.5),
        ];
        let ranked = rank_comments(&comments, 5);
        assert_eq!(ranked[0].content, "first");
        assert_eq!(ranked[1].content, "second");
    }

    #[test]
    fn test_empty_input_yields_empty_output() {
        assert!(rank_comments(&[], 5).is_empty());
    }
}
