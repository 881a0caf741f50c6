//! Tag extraction without the model.
//!
//! Used when the completion call fails, times out, or the memo is too short to
//! be worth a round trip.

use std::collections::HashMap;

/// Tag returned when no keyword survives filtering.
pub const PLACEHOLDER_TAG: &str = "메모";

/// Upper bound on tags attached to a suggestion.
pub const MAX_TAGS: usize = 3;

/// Korean particles/pronouns and English function words.
const STOPWORDS: &[&str] = &[
    "그", "이", "저", "것", "수", "등", "들", "및", "좀", "더", "잘", "안", "또", "한", "와", "과",
    "의", "가", "을", "를", "에", "에서", "로", "으로", "는", "은", "께서", "도", "만", "있", "없",
    "하", "되", "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "is", "are",
    "was", "were",
];

fn is_hangul_syllable(c: char) -> bool {
    ('\u{AC00}'..='\u{D7A3}').contains(&c)
}

/// Replace everything but Hangul syllables, ASCII alphanumerics and
/// whitespace with spaces, then collapse whitespace.
pub fn preprocess(text: &str) -> String {
    let cleaned: String = text
        .chars()
        .map(|c| {
            if is_hangul_syllable(c) || c.is_ascii_alphanumeric() || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();

    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_stopword(word: &str) -> bool {
    let lower = word.to_lowercase();
    STOPWORDS.contains(&lower.as_str())
}

/// Rank candidate keywords by position-weighted frequency.
///
/// The i-th of n surviving words scores `1 + (n - i) / n`, so earlier words
/// weigh more and repeated words accumulate. Ties keep first-occurrence
/// order. Returns [`PLACEHOLDER_TAG`] alone when nothing survives.
pub fn extract_keywords(text: &str, max_keywords: usize) -> Vec<String> {
    let processed = preprocess(text);
    let words: Vec<&str> = processed
        .split_whitespace()
        .filter(|w| w.chars().count() >= 2 && !is_stopword(w))
        .collect();

    let n = words.len() as f64;
    let mut order: Vec<(&str, f64)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for (i, &word) in words.iter().enumerate() {
        let weight = 1.0 + (n - i as f64) / n;
        match index.get(word).copied() {
            Some(slot) => order[slot].1 += weight,
            None => {
                index.insert(word, order.len());
                order.push((word, weight));
            }
        }
    }

    // Stable sort keeps first-occurrence order among equal scores.
    order.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    let ranked: Vec<String> = order
        .into_iter()
        .take(max_keywords)
        .map(|(word, _)| word.to_string())
        .collect();

    if ranked.is_empty() {
        vec![PLACEHOLDER_TAG.to_string()]
    } else {
        ranked
    }
}

/// Parse a model reply such as `"work, ideas meeting"` into at most
/// [`MAX_TAGS`] tags. Commas and whitespace both separate tags.
pub fn parse_tag_reply(reply: &str) -> Vec<String> {
    reply
        .split(|c: char| c == ',' || c.is_whitespace())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .take(MAX_TAGS)
        .map(str::to_string)
        .collect()
}
