/// Split points tried in order of preference: paragraph break, line break,
/// sentence punctuation, then any whitespace.
const SEPARATORS: &[&str] = &["\n\n", "\n", ". ", "! ", "? ", " "];

/// Splits text into chunks of at most `chunk_size` characters, preferring
/// natural boundaries and overlapping consecutive chunks by up to
/// `chunk_overlap` characters.
///
/// Operates on character counts, never byte offsets, so multi-byte scripts
/// split cleanly.
pub fn split_text(text: &str, chunk_size: usize, chunk_overlap: usize) -> Vec<String> {
    assert!(chunk_overlap < chunk_size, "overlap must be below chunk size");

    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= chunk_size {
        let trimmed = text.trim();
        return if trimmed.is_empty() {
            Vec::new()
        } else {
            vec![trimmed.to_string()]
        };
    }

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < chars.len() {
        let window_end = (start + chunk_size).min(chars.len());
        let cut = if window_end == chars.len() {
            window_end
        } else {
            match find_cut(&chars[start..window_end]) {
                Some(offset) => start + offset,
                None => window_end, // no boundary in range, hard cut
            }
        };

        let chunk: String = chars[start..cut].iter().collect();
        let trimmed = chunk.trim();
        if !trimmed.is_empty() {
            chunks.push(trimmed.to_string());
        }

        if cut >= chars.len() {
            break;
        }
        let overlapped = cut.saturating_sub(chunk_overlap);
        start = if overlapped > start { overlapped } else { cut };
    }

    chunks
}

/// Finds the rightmost preferred boundary in the window, returning the
/// index just past it.
fn find_cut(window: &[char]) -> Option<usize> {
    for separator in SEPARATORS {
        let needle: Vec<char> = separator.chars().collect();
        if let Some(position) = rfind_chars(window, &needle) {
            if position > 0 {
                return Some(position + needle.len());
            }
        }
    }
    None
}

fn rfind_chars(haystack: &[char], needle: &[char]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    (0..=haystack.len() - needle.len())
        .rev()
        .find(|&i| haystack[i..i + needle.len()] == *needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_is_one_chunk() {
        let chunks = split_text("짧은 댓글입니다", 100, 20);
        assert_eq!(chunks, vec!["짧은 댓글입니다".to_string()]);
    }

    #[test]
    fn test_whitespace_only_text_yields_nothing() {
        assert!(split_text("   \n  ", 100, 20).is_empty());
    }

    #[test]
    fn test_chunks_respect_size_limit() {
        let text = "가나다라마바사 ".repeat(50);
        let chunks = split_text(&text, 40, 10);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 40);
        }
    }

    #[test]
    fn test_prefers_sentence_boundaries() {
        let text = "첫 번째 문장입니다. 두 번째 문장입니다. 세 번째 문장입니다. 네 번째 문장입니다.";
        let chunks = split_text(text, 30, 5);

        assert!(chunks.len() > 1);
        // Every non-final chunk should end at a sentence break, not mid-word
        for chunk in &chunks[..chunks.len() - 1] {
            assert!(chunk.ends_with('.'), "chunk '{}' cut mid-sentence", chunk);
        }
    }

    #[test]
    fn test_consecutive_chunks_overlap() {
        let text = "alpha bravo charlie delta echo foxtrot golf hotel india juliet";
        let chunks = split_text(text, 30, 12);

        assert!(chunks.len() > 1);
        // Some tail content of chunk N reappears at the head of chunk N+1
        let first_tail: String = chunks[0]
            .chars()
            .rev()
            .take(6)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        assert!(
            chunks[1].contains(first_tail.trim()),
            "expected overlap between '{}' and '{}'",
            chunks[0],
            chunks[1]
        );
    }

    #[test]
    fn test_unbroken_text_hard_cuts() {
        let text = "가".repeat(95);
        let chunks = split_text(&text, 30, 5);

        assert!(chunks.len() >= 3);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 30);
        }
        // Nothing is lost: total coverage reaches the end of the input
        assert!(chunks.last().map(|c| !c.is_empty()).unwrap_or(false));
    }

    #[test]
    fn test_keeps_all_content_in_order() {
        let text = "one two three four five six seven eight nine ten";
        let chunks = split_text(text, 20, 0);

        let rejoined = chunks.join(" ");
        for word in text.split_whitespace() {
            assert!(rejoined.contains(word));
        }
    }
}
