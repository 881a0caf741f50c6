//! Model-assisted features: tag, title and insight suggestions plus chat.
//!
//! Suggestion calls are raced against a per-operation timer and degrade to the
//! local heuristics in [`crate::analysis`] on any failure. Chat is the only
//! operation that surfaces provider errors to the caller.

use crate::analysis::{
    clamp_generated_title, extract_keywords, fallback_title, format_memo_context,
    parse_tag_reply, recent_window, CONTEXT_LIMIT, MAX_TAGS,
};
use crate::models::Memo;
use crate::services::metrics::{record_ai_request, record_fallback};
use crate::services::providers::{
    ChatMessage, CompletionProvider, CompletionRequest, GenerationParams, ProviderError,
    ProviderStream,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{instrument, warn};

/// Content shorter than this (after trimming) skips the model for tags.
pub const MIN_TAG_CONTENT_CHARS: usize = 5;
/// Content shorter than this (after trimming) skips the model for titles.
pub const MIN_TITLE_CONTENT_CHARS: usize = 10;

const TAG_SYSTEM_PROMPT: &str = "당신은 메모의 내용을 분석하여 적절한 태그를 생성하는 AI입니다. \
메모의 핵심 키워드나 주제를 나타내는 태그 1-3개를 생성하세요. \
각 태그는 한 단어로 간결하게 작성하며, 쉼표로 구분합니다. 예시: 업무, 아이디어, 회의";

const TITLE_SYSTEM_PROMPT: &str = "당신은 메모의 내용을 분석하여 간결하고 명확한 제목을 생성하는 AI입니다. \
제목은 30자 이내로 작성하며, 메모의 핵심 내용을 담아야 합니다. \
존댓말을 사용하지 않고 자연스러운 명사형이나 동사원형으로 작성하세요.";

const SUGGESTIONS_SYSTEM_PROMPT: &str = r#"당신은 사용자의 메모 패턴을 분석하여 실용적인 인사이트를 제공하는 AI입니다.

최근 메모들을 분석하여 다음과 같은 제안을 1-3개 생성하세요:
1. 패턴 발견: 자주 사용되는 태그나 주제 패턴
2. 행동 제안: 메모를 기반으로 추천할 수 있는 다음 행동
3. 빈틈 발견: 최근 작성되지 않은 주제나 사라진 패턴
4. 요약 제안: 여러 메모를 묶어 요약하거나 정리할 제안

각 제안은 다음 JSON 형식으로 작성하세요:
{
  "suggestions": [
    {
      "title": "제목 (짧게, 10자 이내)",
      "body": "구체적인 설명 (한두 문장)"
    }
  ]
}

제안은 실용적이고 구체적이어야 하며, 사용자가 바로 실행할 수 있는 내용이어야 합니다."#;

/// Chat instructions. `{count}` is replaced with the number of memos in the
/// context window.
const CHAT_SYSTEM_PROMPT: &str = "당신은 사용자의 메모를 분석하여 유용한 대화를 제공하는 AI 어시스턴트입니다.

사용자의 최근 메모 {count}개가 제공됩니다. 메모의 제목, 태그, 내용, 작성 시간을 모두 참고하여 답변하세요.

대화할 때:
- 메모의 내용을 기반으로 구체적이고 실용적인 답변을 제공하세요
- 태그를 활용하여 관련 메모들을 연결하세요
- 작성 시간을 고려하여 최근 동향이나 변화를 파악하세요
- 간결하고 친근하게 답변하세요
- 필요하다면 메모의 특정 부분을 인용하세요";

/// One insight card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
}

impl Suggestion {
    fn new(title: &str, body: &str) -> Self {
        Self {
            title: title.to_string(),
            body: body.to_string(),
        }
    }

    /// Returned to owners without any memos.
    pub fn getting_started() -> Self {
        Self::new(
            "시작하기",
            "첫 메모를 작성하면 AI가 패턴을 분석하고 제안을 드릴게요.",
        )
    }

    /// Returned when insight generation fails.
    pub fn keep_writing() -> Self {
        Self::new(
            "계속 작성하기",
            "메모를 더 작성하면 더 정확한 패턴 분석이 가능해요.",
        )
    }
}

/// Model reply for insights. A missing or `null` list means no suggestions.
#[derive(Debug, Deserialize)]
struct SuggestionReply {
    #[serde(default)]
    suggestions: Option<Vec<Suggestion>>,
}

/// A previous chat turn supplied by the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: String,
    pub message: String,
}

impl ChatTurn {
    fn to_message(&self) -> ChatMessage {
        if self.role == "user" {
            ChatMessage::user(self.message.clone())
        } else {
            ChatMessage::assistant(self.message.clone())
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AssistantTimeouts {
    pub tags: Duration,
    pub title: Duration,
    pub suggestions: Duration,
}

#[derive(Clone)]
pub struct Assistant {
    provider: Arc<dyn CompletionProvider>,
    timeouts: AssistantTimeouts,
}

impl Assistant {
    pub fn new(provider: Arc<dyn CompletionProvider>, timeouts: AssistantTimeouts) -> Self {
        Self { provider, timeouts }
    }

    pub async fn health_check(&self) -> Result<(), ProviderError> {
        self.provider.health_check().await
    }

    /// Up to three tags for `content`. Never fails.
    #[instrument(skip(self, content), fields(content_len = content.len()))]
    pub async fn suggest_tags(&self, content: &str) -> Vec<String> {
        let trimmed = content.trim();
        if trimmed.chars().count() < MIN_TAG_CONTENT_CHARS {
            record_fallback("tags", "short_content");
            return extract_keywords(content, MAX_TAGS);
        }

        let request = CompletionRequest {
            messages: vec![
                ChatMessage::system(TAG_SYSTEM_PROMPT),
                ChatMessage::user(format!(
                    "다음 메모에 적합한 태그 1-3개를 생성해주세요. 태그는 쉼표로 구분하여 응답하세요:\n\n{}",
                    trimmed
                )),
            ],
            params: GenerationParams {
                temperature: Some(0.5),
                max_tokens: Some(50),
                json_response: false,
            },
        };

        let reason = match self.complete_text("tags", &request, self.timeouts.tags).await {
            Ok(reply) => {
                let tags = parse_tag_reply(&reply);
                if !tags.is_empty() {
                    return tags;
                }
                "unparsable_reply"
            }
            Err(reason) => reason,
        };

        record_fallback("tags", reason);
        extract_keywords(content, MAX_TAGS)
    }

    /// A title for `content`. Never fails.
    #[instrument(skip(self, content), fields(content_len = content.len()))]
    pub async fn suggest_title(&self, content: &str) -> String {
        let trimmed = content.trim();
        if trimmed.chars().count() < MIN_TITLE_CONTENT_CHARS {
            record_fallback("title", "short_content");
            return fallback_title(content);
        }

        let request = CompletionRequest {
            messages: vec![
                ChatMessage::system(TITLE_SYSTEM_PROMPT),
                ChatMessage::user(format!("다음 메모의 제목을 생성해주세요:\n\n{}", trimmed)),
            ],
            params: GenerationParams {
                temperature: Some(0.7),
                max_tokens: Some(100),
                json_response: false,
            },
        };

        let reason = match self
            .complete_text("title", &request, self.timeouts.title)
            .await
        {
            Ok(reply) => match clamp_generated_title(&reply) {
                Some(title) => return title,
                None => "empty_reply",
            },
            Err(reason) => reason,
        };

        record_fallback("title", reason);
        fallback_title(content)
    }

    /// Insight cards over the owner's recent memos. Never fails.
    #[instrument(skip(self, memos), fields(memo_count = memos.len()))]
    pub async fn suggest_insights(&self, memos: &[Memo]) -> Vec<Suggestion> {
        if memos.is_empty() {
            return vec![Suggestion::getting_started()];
        }

        let window = recent_window(memos, CONTEXT_LIMIT);
        let request = CompletionRequest {
            messages: vec![
                ChatMessage::system(SUGGESTIONS_SYSTEM_PROMPT),
                ChatMessage::user(format!(
                    "다음은 사용자의 최근 메모 {}개입니다:\n\n{}",
                    window.len(),
                    format_memo_context(&window, false)
                )),
            ],
            params: GenerationParams {
                temperature: Some(0.8),
                max_tokens: Some(500),
                json_response: true,
            },
        };

        let reason = match self
            .complete_text("suggestions", &request, self.timeouts.suggestions)
            .await
        {
            Ok(reply) => match serde_json::from_str::<SuggestionReply>(&reply) {
                Ok(parsed) => return parsed.suggestions.unwrap_or_default(),
                Err(e) => {
                    warn!(error = %e, "Suggestion reply is not valid JSON");
                    "unparsable_reply"
                }
            },
            Err(reason) => reason,
        };

        record_fallback("suggestions", reason);
        vec![Suggestion::keep_writing()]
    }

    /// Start a streamed chat reply grounded in the owner's memos.
    #[instrument(skip_all, fields(history = history.len(), memo_count = memos.len()))]
    pub async fn chat(
        &self,
        message: &str,
        history: &[ChatTurn],
        memos: &[Memo],
    ) -> Result<ProviderStream, ProviderError> {
        let request = build_chat_request(message, history, memos);

        match self.provider.complete_stream(&request).await {
            Ok(stream) => {
                record_ai_request("chat", "success");
                Ok(stream)
            }
            Err(e) => {
                record_ai_request("chat", e.kind());
                Err(e)
            }
        }
    }

    /// Run a completion under `timeout`, returning the non-empty reply text
    /// or a short fallback reason.
    async fn complete_text(
        &self,
        operation: &'static str,
        request: &CompletionRequest,
        timeout: Duration,
    ) -> Result<String, &'static str> {
        let outcome = tokio::time::timeout(timeout, self.provider.complete(request)).await;

        let reason = match outcome {
            Ok(Ok(completion)) => match completion.text {
                Some(text) if !text.trim().is_empty() => {
                    record_ai_request(operation, "success");
                    return Ok(text);
                }
                _ => "empty_reply",
            },
            Ok(Err(e)) => {
                warn!(operation, error = %e, "Completion failed, using fallback");
                e.kind()
            }
            Err(_) => {
                warn!(operation, timeout_secs = timeout.as_secs_f64(), "Completion timed out, using fallback");
                "timeout"
            }
        };

        record_ai_request(operation, reason);
        Err(reason)
    }
}

pub(crate) fn build_chat_request(
    message: &str,
    history: &[ChatTurn],
    memos: &[Memo],
) -> CompletionRequest {
    let window = recent_window(memos, CONTEXT_LIMIT);
    let system = format!(
        "{}\n\n메모 데이터:\n{}",
        CHAT_SYSTEM_PROMPT.replace("{count}", &window.len().to_string()),
        format_memo_context(&window, true)
    );

    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage::system(system));
    messages.extend(history.iter().map(ChatTurn::to_message));
    messages.push(ChatMessage::user(message));

    CompletionRequest {
        messages,
        params: GenerationParams {
            temperature: Some(0.7),
            max_tokens: Some(800),
            json_response: false,
        },
    }
}
