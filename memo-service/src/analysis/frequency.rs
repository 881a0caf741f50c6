//! Tag-frequency aggregation for statistics and the chart view.

use crate::models::{Memo, MemoStats, TagCount};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// Label of the bucket that absorbs tags beyond the top N.
pub const OTHER_LABEL: &str = "기타";
pub const DEFAULT_TOP_TAGS: usize = 10;
pub const DEFAULT_WINDOW_DAYS: u32 = 30;
const PREVIEWS_PER_SLICE: usize = 2;
const PREVIEW_CHARS: usize = 40;

/// Count memos per tag, in order of first appearance.
pub fn tag_counts(memos: &[Memo]) -> Vec<TagCount> {
    grouped(memos)
        .into_iter()
        .map(|(tag, members)| TagCount {
            tag: tag.to_string(),
            count: members.len(),
        })
        .collect()
}

/// Total memo count plus tag counts, most frequent first.
pub fn tag_frequency(memos: &[Memo]) -> MemoStats {
    let mut tag_frequency = tag_counts(memos);
    tag_frequency.sort_by(|a, b| b.count.cmp(&a.count));

    MemoStats {
        total_memos: memos.len(),
        tag_frequency,
    }
}

/// Group memos by tag, preserving first-appearance order of the tags.
///
/// A memo listing the same tag twice is counted once for it.
fn grouped(memos: &[Memo]) -> Vec<(&str, Vec<&Memo>)> {
    let mut groups: Vec<(&str, Vec<&Memo>)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for memo in memos {
        let mut seen: HashSet<&str> = HashSet::new();
        for tag in &memo.tags {
            let tag = tag.as_str();
            if !seen.insert(tag) {
                continue;
            }
            match index.get(tag).copied() {
                Some(slot) => groups[slot].1.push(memo),
                None => {
                    index.insert(tag, groups.len());
                    groups.push((tag, vec![memo]));
                }
            }
        }
    }

    groups
}

/// A short look at one memo inside a chart slice.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemoPreview {
    pub id: Uuid,
    pub title: String,
    pub preview: String,
    pub created_at: DateTime<Utc>,
}

impl MemoPreview {
    fn from_memo(memo: &Memo) -> Self {
        let preview = if memo.content.chars().count() > PREVIEW_CHARS {
            format!("{}...", memo.content.chars().take(PREVIEW_CHARS).collect::<String>())
        } else {
            memo.content.clone()
        };

        Self {
            id: memo.id,
            title: memo.title.clone(),
            preview,
            created_at: memo.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSlice {
    pub label: String,
    pub count: usize,
    /// Share of all slice counts, one decimal place.
    pub percentage: f64,
    pub is_other: bool,
    pub recent: Vec<MemoPreview>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    /// Memos inside the window.
    pub total_memos: usize,
    pub slices: Vec<ChartSlice>,
}

fn recent_previews<'a>(members: impl IntoIterator<Item = &'a Memo>) -> Vec<MemoPreview> {
    let mut seen = HashSet::new();
    let mut unique: Vec<&Memo> = members.into_iter().filter(|m| seen.insert(m.id)).collect();
    unique.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    unique
        .into_iter()
        .take(PREVIEWS_PER_SLICE)
        .map(MemoPreview::from_memo)
        .collect()
}

/// Pie-chart data for memos created in the last `window_days` (all memos when
/// `None`).
///
/// The `top` most frequent tags become slices; the remaining tags collapse
/// into one [`OTHER_LABEL`] slice whose count is the sum of their counts.
pub fn chart_slices(
    memos: &[Memo],
    now: DateTime<Utc>,
    window_days: Option<u32>,
    top: usize,
) -> ChartData {
    // A window reaching past the earliest representable date covers everything.
    let since = window_days.and_then(|days| {
        Duration::try_days(i64::from(days)).and_then(|span| now.checked_sub_signed(span))
    });
    let in_window: Vec<Memo> = match since {
        Some(since) => memos.iter().filter(|m| m.created_at >= since).cloned().collect(),
        None => memos.to_vec(),
    };

    let mut groups = grouped(&in_window);
    groups.sort_by(|a, b| b.1.len().cmp(&a.1.len()));

    let rest = if groups.len() > top {
        groups.split_off(top)
    } else {
        Vec::new()
    };

    let mut slices: Vec<ChartSlice> = groups
        .into_iter()
        .map(|(tag, members)| ChartSlice {
            label: tag.to_string(),
            count: members.len(),
            percentage: 0.0,
            is_other: false,
            recent: recent_previews(members),
        })
        .collect();

    let other_count: usize = rest.iter().map(|(_, members)| members.len()).sum();
    if other_count > 0 {
        slices.push(ChartSlice {
            label: OTHER_LABEL.to_string(),
            count: other_count,
            percentage: 0.0,
            is_other: true,
            recent: recent_previews(rest.into_iter().flat_map(|(_, members)| members)),
        });
    }

    let total: usize = slices.iter().map(|s| s.count).sum();
    if total > 0 {
        for slice in &mut slices {
            slice.percentage = (slice.count as f64 * 1000.0 / total as f64).round() / 10.0;
        }
    }

    ChartData {
        total_memos: in_window.len(),
        slices,
    }
}
