use llm_interface::LlmProvider;
use opinionlens_core::SentimentStats;
use std::sync::Arc;
use tracing::warn;

/// Arithmetic mean of sentiment distributions over a comment set.
///
/// The empty set maps to the all-zero distribution, not all-neutral, so
/// "no data" stays distinguishable from "uniformly neutral data".
pub fn aggregate_sentiment(distributions: &[SentimentStats]) -> SentimentStats {
    if distributions.is_empty() {
        return SentimentStats::ZERO;
    }

    let count = distributions.len() as f32;
    let mut total = SentimentStats::ZERO;
    for stats in distributions {
        total.positive += stats.positive;
        total.negative += stats.negative;
        total.neutral += stats.neutral;
    }

    SentimentStats {
        positive: total.positive / count,
        negative: total.negative / count,
        neutral: total.neutral / count,
    }
}

/// LLM-backed per-comment sentiment classification.
///
/// Used at collection time, where a classifier hiccup must not sink a whole
/// batch: failures degrade to all-neutral instead of propagating.
pub struct SentimentAnalyzer {
    llm: Arc<dyn LlmProvider>,
}

impl SentimentAnalyzer {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    pub async fn classify(&self, text: &str) -> SentimentStats {
        let prompt = format!(
            "Rate the sentiment of the following comment. Reply with three \
             lines in exactly this format, where the numbers are between 0 \
             and 1 and sum to 1:\n\
             positive: <number>\n\
             negative: <number>\n\
             neutral: <number>\n\n\
             Comment: {}",
            text
        );

        match self.llm.generate(&prompt).await {
            Ok(response) => parse_sentiment_scores(&response).unwrap_or(SentimentStats::NEUTRAL),
            Err(e) => {
                warn!("Sentiment classification failed, defaulting to neutral: {}", e);
                SentimentStats::NEUTRAL
            }
        }
    }

    /// Classifies a set of texts and averages the result.
    pub async fn classify_set(&self, texts: &[String]) -> SentimentStats {
        if texts.is_empty() {
            return SentimentStats::ZERO;
        }

        let mut distributions = Vec::with_capacity(texts.len());
        for text in texts {
            distributions.push(self.classify(text).await);
        }
        aggregate_sentiment(&distributions)
    }
}

/// Parses a `positive:/negative:/neutral:` line triple, renormalizing so
/// the channels sum to 1. Returns None when no channel parses above zero.
pub fn parse_sentiment_scores(response: &str) -> Option<SentimentStats> {
    let mut stats = SentimentStats::ZERO;

    for line in response.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let Ok(value) = value.trim().parse::<f32>() else {
            continue;
        };
        if value < 0.0 {
            continue;
        }
        match key.trim().to_ascii_lowercase().as_str() {
            "positive" => stats.positive = value,
            "negative" => stats.negative = value,
            "neutral" => stats.neutral = value,
            _ => {}
        }
    }

    let total = stats.positive + stats.negative + stats.neutral;
    if total <= 0.0 {
        return None;
    }
    Some(SentimentStats {
        positive: stats.positive / total,
        negative: stats.negative / total,
        neutral: stats.neutral / total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use opinionlens_core::{CoreError, LlmError};

    struct CannedLlm(&'static str);

    #[async_trait]
    impl LlmProvider for CannedLlm {
        async fn generate(&self, _prompt: &str) -> Result<String, CoreError> {
            Ok(self.0.to_string())
        }

        fn model_name(&self) -> &str {
            "canned"
        }
    }

    struct FailingLlm;

    #[async_trait]
    impl LlmProvider for FailingLlm {
        async fn generate(&self, _prompt: &str) -> Result<String, CoreError> {
            Err(CoreError::Llm(LlmError::ServiceUnavailable {
                provider: "gemini".to_string(),
            }))
        }

        fn model_name(&self) -> &str {
            "failing"
        }
    }

    #[test]
    fn test_aggregate_empty_is_exactly_zero() {
        let stats = aggregate_sentiment(&[]);
        assert_eq!(stats, SentimentStats::ZERO);
    }

    #[test]
    fn test_aggregate_is_mean_and_sums_to_one() {
        let stats = aggregate_sentiment(&[
            SentimentStats::new(1.0, 0.0, 0.0),
            SentimentStats::new(0.0, 1.0, 0.0),
            SentimentStats::new(0.2, 0.2, 0.6),
        ]);

        assert!((stats.positive - 0.4).abs() < 1e-6);
        assert!((stats.negative - 0.4).abs() < 1e-6);
        assert!((stats.neutral - 0.2).abs() < 1e-6);
        let sum = stats.positive + stats.negative + stats.neutral;
        assert!((sum - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_parse_well_formed_scores() {
        let stats = parse_sentiment_scores("positive: 0.7\nnegative: 0.1\nneutral: 0.2")
            .expect("scores should parse");
        assert!((stats.positive - 0.7).abs() < 1e-6);
        assert!((stats.negative - 0.1).abs() < 1e-6);
        assert!((stats.neutral - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_parse_renormalizes_non_unit_totals() {
        let stats = parse_sentiment_scores("positive: 2\nnegative: 1\nneutral: 1")
            .expect("scores should parse");
        assert!((stats.positive - 0.5).abs() < 1e-6);
        let sum = stats.positive + stats.negative + stats.neutral;
        assert!((sum - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_parse_tolerates_surrounding_chatter() {
        let response = "Here is my assessment:\npositive: 0.5\nnegative: 0.5\nneutral: 0\nThanks!";
        let stats = parse_sentiment_scores(response).expect("scores should parse");
        assert!((stats.positive - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_parse_garbage_returns_none() {
        assert!(parse_sentiment_scores("no scores here").is_none());
        assert!(parse_sentiment_scores("positive: maybe").is_none());
        assert!(parse_sentiment_scores("").is_none());
    }

    #[tokio::test]
    async fn test_classify_parses_llm_output() {
        let analyzer = SentimentAnalyzer::new(Arc::new(CannedLlm(
            "positive: 0.8\nnegative: 0.1\nneutral: 0.1",
        )));
        let stats = analyzer.classify("정말 좋은 영상").await;
        assert!((stats.positive - 0.8).abs() < 1e-6);
        assert_eq!(stats.dominant(), "positive");
    }

    #[tokio::test]
    async fn test_classify_degrades_to_neutral_on_failure() {
        let analyzer = SentimentAnalyzer::new(Arc::new(FailingLlm));
        let stats = analyzer.classify("아무 댓글").await;
        assert_eq!(stats, SentimentStats::NEUTRAL);
    }

    #[tokio::test]
    async fn test_classify_degrades_to_neutral_on_garbage() {
        let analyzer = SentimentAnalyzer::new(Arc::new(CannedLlm("I cannot rate this.")));
        let stats = analyzer.classify("아무 댓글").await;
        assert_eq!(stats, SentimentStats::NEUTRAL);
    }

    #[tokio::test]
    async fn test_classify_set_empty_is_zero() {
        let analyzer = SentimentAnalyzer::new(Arc::new(FailingLlm));
        let stats = analyzer.classify_set(&[]).await;
        assert_eq!(stats, SentimentStats::ZERO);
    }
}
