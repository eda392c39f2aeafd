//! Reply splitting
//!
//! Long model output is broken into a few chat-sized fragments on sentence boundaries so it
//! reads like someone typing several short messages.

/// Replies shorter than this stay whole
pub const SPLIT_THRESHOLD: usize = 150;
/// Target maximum fragment length
pub const MAX_FRAGMENT_CHARS: usize = 200;
/// Upper bound on fragments before the first two are merged
pub const MAX_FRAGMENTS: usize = 3;

/// Split `reply` into ordered fragments
///
/// Never returns an empty vector for non-blank input. A single sentence longer than
/// [`MAX_FRAGMENT_CHARS`] is kept whole.
pub fn split_reply(reply: &str) -> Vec<String> {
    let reply = reply.trim();
    if reply.chars().count() < SPLIT_THRESHOLD {
        return vec![reply.to_string()];
    }

    let mut chunks: Vec<String> = Vec::new();
    let mut current = String::new();
    for sentence in sentences(reply) {
        if !current.is_empty()
            && current.chars().count() + sentence.chars().count() > MAX_FRAGMENT_CHARS
        {
            chunks.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(sentence);
    }
    if !current.trim().is_empty() {
        chunks.push(current);
    }

    if chunks.len() > MAX_FRAGMENTS {
        let rest = chunks.split_off(2);
        let merged = chunks.join(" ");
        chunks = std::iter::once(merged).chain(rest).collect();
    }
    chunks
}

/// Sentences ending in `.`, `!` or `?` followed by whitespace; the terminator stays attached
fn sentences(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((_, c)) = chars.next() {
        if matches!(c, '.' | '!' | '?') {
            if let Some(&(next, n)) = chars.peek() {
                if n.is_whitespace() {
                    let sentence = text[start..next].trim();
                    if !sentence.is_empty() {
                        out.push(sentence);
                    }
                    start = next;
                }
            }
        }
    }
    let tail = text[start..].trim();
    if !tail.is_empty() {
        out.push(tail);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_reply_untouched() {
        assert_eq!(split_reply("Perfect! What's your name?"), vec!["Perfect! What's your name?"]);
    }

    #[test]
    fn test_sentence_split() {
        assert_eq!(
            sentences("Hi there. How are you?  Great!"),
            vec!["Hi there.", "How are you?", "Great!"]
        );
        // Decimal points are not boundaries
        assert_eq!(sentences("It costs $1.5M. Nice!"), vec!["It costs $1.5M.", "Nice!"]);
    }

    #[test]
    fn test_long_reply_chunks() {
        let sentence = "This sentence is exactly fifty characters long ok.";
        assert_eq!(sentence.len(), 50);
        let reply = vec![sentence; 6].join(" ");

        let chunks = split_reply(&reply);
        assert_eq!(chunks.len(), 2);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= MAX_FRAGMENT_CHARS);
        }
        assert_eq!(chunks.join(" "), reply);
    }

    #[test]
    fn test_more_than_three_chunks_merge_first_two() {
        let sentence = "x".repeat(120) + ".";
        let reply = vec![sentence.as_str(); 5].join(" ");

        let chunks = split_reply(&reply);
        assert_eq!(chunks.len(), 4);
        assert_eq!(chunks[0], format!("{} {}", sentence, sentence));
        assert_eq!(chunks.join(" "), reply);
    }
}
