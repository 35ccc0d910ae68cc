use regex::Regex;
use std::collections::{HashMap, HashSet};

/// Tokens that carry no topical signal: deictic and filler words plus the
/// boilerplate every comment section repeats, in both scripts.
const STOPWORDS: &[&str] = &[
    // Korean deictics and fillers
    "정말", "진짜", "너무", "완전", "그냥", "근데", "그리고", "그래서", "하지만",
    "이거", "그거", "저거", "이런", "그런", "저런", "여기", "거기", "저기",
    "약간", "많이", "매우", "아주", "오늘", "지금", "같은", "있는", "없는",
    // Korean platform boilerplate
    "영상", "채널", "구독", "댓글", "좋아요", "알림",
    // English fillers
    "the", "and", "for", "that", "this", "with", "was", "are", "you", "not",
    "but", "have", "just", "really", "very",
    // English platform boilerplate
    "subscribe", "channel", "video", "comment", "like", "youtube",
];

/// Pulls the most frequent salient terms out of a comment collection.
///
/// Tokens are maximal runs of at least two Hangul syllables or at least
/// three ASCII letters; single Hangul syllables are almost always particles
/// while two-letter Latin fragments are noise, hence the asymmetric floor.
pub struct KeywordExtractor {
    token_pattern: Regex,
    stopwords: HashSet<&'static str>,
}

impl KeywordExtractor {
    pub fn new() -> Self {
        Self {
            token_pattern: Regex::new(r"[가-힣]{2,}|[A-Za-z]{3,}")
                .expect("token pattern is valid"),
            stopwords: STOPWORDS.iter().copied().collect(),
        }
    }

    /// Returns up to `max_count` distinct terms ordered by descending
    /// frequency; equal counts keep first-seen order. Never fails: inputs
    /// with no surviving tokens yield an empty vec.
    pub fn extract<'a, I>(&self, texts: I, max_count: usize) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
        let mut next_seen = 0usize;

        for text in texts {
            for token_match in self.token_pattern.find_iter(text) {
                let raw = token_match.as_str();
                let token = if raw.is_ascii() {
                    raw.to_ascii_lowercase()
                } else {
                    raw.to_string()
                };

                if self.stopwords.contains(token.as_str()) {
                    continue;
                }
                // The pattern should never emit these, enforced anyway
                if token.chars().count() <= 1 {
                    continue;
                }

                let entry = counts.entry(token).or_insert_with(|| {
                    next_seen += 1;
                    (0, next_seen)
                });
                entry.0 += 1;
            }
        }

        let mut ranked: Vec<(String, usize, usize)> = counts
            .into_iter()
            .map(|(token, (count, seen))| (token, count, seen))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
        ranked.truncate(max_count);

        ranked.into_iter().map(|(token, _, _)| token).collect()
    }
}

impl Default for KeywordExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frequency_ranking_with_stopword_filtering() {
        let extractor = KeywordExtractor::new();
        let keywords = extractor.extract(
            ["이 영상 정말 재밌다", "재밌다 완전 재밌다"],
            10,
        );

        // "재밌다" appears three times; "영상", "정말", "완전" are stopwords
        // and "이" is below the Hangul token floor.
        assert_eq!(keywords, vec!["재밌다".to_string()]);
    }

    #[test]
    fn test_latin_tokens_lowercased_and_merged() {
        let extractor = KeywordExtractor::new();
        let keywords = extractor.extract(["Rust is great", "rust rocks"], 10);

        assert_eq!(keywords[0], "rust");
        assert!(keywords.contains(&"great".to_string()));
        assert!(keywords.contains(&"rocks".to_string()));
        // "is" is below the Latin token floor
        assert!(!keywords.contains(&"is".to_string()));
    }

    #[test]
    fn test_ties_keep_first_seen_order() {
        let extractor = KeywordExtractor::new();
        let keywords = extractor.extract(["alpha beta", "alpha beta"], 10);
        assert_eq!(keywords, vec!["alpha".to_string(), "beta".to_string()]);
    }

    #[test]
    fn test_max_count_truncation() {
        let extractor = KeywordExtractor::new();
        let keywords = extractor.extract(["alpha beta gamma delta"], 2);
        assert_eq!(keywords.len(), 2);
    }

    #[test]
    fn test_no_stopword_ever_returned() {
        let extractor = KeywordExtractor::new();
        let keywords = extractor.extract(
            ["subscribe channel video 정말 완전 좋아요 구독"],
            10,
        );
        assert!(keywords.is_empty());
    }

    #[test]
    fn test_empty_input_yields_empty_output() {
        let extractor = KeywordExtractor::new();
        assert!(extractor.extract(std::iter::empty::<&str>(), 10).is_empty());
        assert!(extractor.extract(["!!! ... ???"], 10).is_empty());
    }

    #[test]
    fn test_mixed_script_text() {
        let extractor = KeywordExtractor::new();
        let keywords = extractor.extract(["김치 is the best 김치 food"], 10);
        assert_eq!(keywords[0], "김치");
        assert!(keywords.contains(&"best".to_string()));
        assert!(keywords.contains(&"food".to_string()));
    }
}
