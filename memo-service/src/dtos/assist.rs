use crate::services::{ChatTurn, Suggestion};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use validator::Validate;

/// A field that is not a JSON string reads as empty, so validation reports
/// it as missing.
fn string_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        _ => String::new(),
    })
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ContentRequest {
    #[validate(length(min = 1, message = "Content is required"))]
    #[serde(default, deserialize_with = "string_or_empty")]
    pub content: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ChatRequest {
    #[validate(length(min = 1, message = "Message is required"))]
    #[serde(default, deserialize_with = "string_or_empty")]
    pub message: String,
    /// Earlier turns, oldest first. Accepts `chatHistory` from older clients.
    #[serde(default, alias = "chatHistory")]
    pub history: Vec<ChatTurn>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TagsResponse {
    pub tags: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TitleResponse {
    pub title: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SuggestionsResponse {
    pub suggestions: Vec<Suggestion>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn non_string_content_reads_as_empty() {
        for content in [json!(5), json!(null), json!(["a"]), json!({ "a": 1 })] {
            let req: ContentRequest = serde_json::from_value(json!({ "content": content })).unwrap();
            assert!(req.content.is_empty());
            assert!(req.validate().is_err());
        }
    }

    #[test]
    fn string_message_is_kept() {
        let req: ChatRequest = serde_json::from_value(json!({ "message": "hi" })).unwrap();
        assert_eq!(req.message, "hi");
        assert!(req.history.is_empty());
        assert!(req.validate().is_ok());
    }
}
