//! Title generation without the model.

/// Content at or below this many characters is its own title.
const SHORT_CONTENT_CHARS: usize = 30;
/// Longest first sentence used verbatim.
const MAX_SENTENCE_CHARS: usize = 50;
/// Length of a truncated title before the ellipsis.
const TRUNCATED_CHARS: usize = 30;
/// Longest model-generated title kept verbatim.
const MAX_GENERATED_CHARS: usize = 50;

const ELLIPSIS: &str = "...";

fn take_chars(text: &str, n: usize) -> String {
    text.chars().take(n).collect()
}

/// Derive a title from memo content. Lengths are counted in characters.
pub fn fallback_title(content: &str) -> String {
    let cleaned = content.trim();
    let cleaned_len = cleaned.chars().count();

    if cleaned_len <= SHORT_CONTENT_CHARS {
        return cleaned.to_string();
    }

    let first = cleaned
        .split(['.', '\n', '!', '?'])
        .next()
        .unwrap_or("")
        .trim();
    let first_len = first.chars().count();

    if first_len > 0 && first_len <= MAX_SENTENCE_CHARS {
        return first.to_string();
    }

    if first_len > MAX_SENTENCE_CHARS {
        return format!("{}{}", take_chars(first, TRUNCATED_CHARS), ELLIPSIS);
    }

    format!("{}{}", take_chars(cleaned, TRUNCATED_CHARS), ELLIPSIS)
}

/// Trim a model-generated title; `None` when the reply is blank.
pub fn clamp_generated_title(reply: &str) -> Option<String> {
    let title = reply.trim();
    if title.is_empty() {
        return None;
    }

    if title.chars().count() > MAX_GENERATED_CHARS {
        Some(format!(
            "{}{}",
            take_chars(title, MAX_GENERATED_CHARS - ELLIPSIS.len()),
            ELLIPSIS
        ))
    } else {
        Some(title.to_string())
    }
}
