//! Memo model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A user-authored note.
///
/// Tags are free-form and unordered for everything but display; the
/// three-tag convention is a client concern and is not enforced here.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Memo {
    pub id: Uuid,
    pub user_email: String,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Memo {
    /// Build a fresh memo with a new id and both timestamps set to now.
    pub fn new(input: CreateMemo) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_email: input.user_email,
            title: input.title,
            content: input.content,
            tags: input.tags,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Case-insensitive substring match on title, content or any tag.
    pub fn matches_text(&self, query: &str) -> bool {
        let needle = query.to_lowercase();
        self.title.to_lowercase().contains(&needle)
            || self.content.to_lowercase().contains(&needle)
            || self.tags.iter().any(|t| t.to_lowercase().contains(&needle))
    }

    /// Apply a partial update and refresh `updated_at`.
    pub fn apply(&mut self, update: UpdateMemo) {
        if let Some(title) = update.title {
            self.title = title;
        }
        if let Some(content) = update.content {
            self.content = content;
        }
        if let Some(tags) = update.tags {
            self.tags = tags;
        }
        self.updated_at = Utc::now();
    }
}

/// Input for creating a memo. The owner always comes from the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMemo {
    pub user_email: String,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
}

/// Partial replacement of memo fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateMemo {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl UpdateMemo {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none() && self.tags.is_none()
    }
}

/// Per-owner memo statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoStats {
    pub total_memos: usize,
    pub tag_frequency: Vec<TagCount>,
}

/// Number of memos carrying a tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagCount {
    pub tag: String,
    pub count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memo() -> Memo {
        Memo::new(CreateMemo {
            user_email: "a@example.com".to_string(),
            title: "Weekly Review".to_string(),
            content: "Went over the roadmap".to_string(),
            tags: vec!["Work".to_string(), "planning".to_string()],
        })
    }

    #[test]
    fn text_match_is_case_insensitive_across_fields() {
        let memo = memo();
        assert!(memo.matches_text("weekly"));
        assert!(memo.matches_text("ROADMAP"));
        assert!(memo.matches_text("work"));
        assert!(!memo.matches_text("groceries"));
    }

    #[test]
    fn apply_replaces_only_given_fields() {
        let mut memo = memo();
        let before = memo.updated_at;
        memo.apply(UpdateMemo {
            title: Some("Retro".to_string()),
            ..Default::default()
        });

        assert_eq!(memo.title, "Retro");
        assert_eq!(memo.content, "Went over the roadmap");
        assert_eq!(memo.tags.len(), 2);
        assert!(memo.updated_at >= before);
    }
}
