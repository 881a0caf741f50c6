use crate::models::{CreateMemo, UpdateMemo};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateMemoRequest {
    #[serde(default)]
    pub title: String,
    #[validate(length(min = 1, message = "Content is required"))]
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl CreateMemoRequest {
    pub fn into_input(self, user_email: &str) -> CreateMemo {
        CreateMemo {
            user_email: user_email.to_string(),
            title: self.title,
            content: self.content,
            tags: self.tags,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateMemoRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl From<UpdateMemoRequest> for UpdateMemo {
    fn from(req: UpdateMemoRequest) -> Self {
        UpdateMemo {
            title: req.title,
            content: req.content,
            tags: req.tags,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
}

impl SearchParams {
    /// The query when it holds more than whitespace.
    pub fn query(&self) -> Option<&str> {
        self.q.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub success: bool,
}
