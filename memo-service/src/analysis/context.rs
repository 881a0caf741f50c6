//! The memo window sent to the model as grounding.

use crate::models::Memo;

/// Most memos ever included in a prompt.
pub const CONTEXT_LIMIT: usize = 100;

/// The `limit` most recent memos by creation time, oldest first.
pub fn recent_window(memos: &[Memo], limit: usize) -> Vec<&Memo> {
    let mut sorted: Vec<&Memo> = memos.iter().collect();
    sorted.sort_by_key(|m| m.created_at);
    let skip = sorted.len().saturating_sub(limit);
    sorted.into_iter().skip(skip).collect()
}

/// Render memos as prompt context: one block per memo, blank-line separated.
///
/// With `with_time` the header also carries the `HH:MM` creation time.
pub fn format_memo_context(memos: &[&Memo], with_time: bool) -> String {
    memos
        .iter()
        .map(|memo| {
            let stamp = if with_time {
                memo.created_at.format("%Y-%m-%d %H:%M")
            } else {
                memo.created_at.format("%Y-%m-%d")
            };
            format!(
                "[{}] {}\n태그: {}\n내용: {}",
                stamp,
                memo.title,
                memo.tags.join(", "),
                memo.content
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
