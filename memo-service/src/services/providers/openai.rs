//! OpenAI-compatible chat completions provider.
//!
//! Talks to `POST {base_url}/chat/completions`, both plain and streaming
//! (server-sent events terminated by `data: [DONE]`).

use super::sse::SseBuffer;
use super::{
    ChatMessage, Completion, CompletionProvider, CompletionRequest, FinishReason, ProviderError,
    ProviderStream, StreamChunk,
};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use service_core::observability::TracedRequestExt;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: Secret<String>,
    pub base_url: String,
    pub model: String,
    /// Per-request timeout for non-streaming calls.
    pub request_timeout: Duration,
}

pub struct OpenAiProvider {
    config: OpenAiConfig,
    client: Client,
}

impl OpenAiProvider {
    pub fn new(config: OpenAiConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ProviderError::NotConfigured(format!("HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn body<'a>(&'a self, request: &'a CompletionRequest, stream: bool) -> ChatCompletionBody<'a> {
        ChatCompletionBody {
            model: &self.config.model,
            messages: &request.messages,
            temperature: request.params.temperature,
            max_tokens: request.params.max_tokens,
            stream,
            response_format: request
                .params
                .json_response
                .then_some(ResponseFormat { kind: "json_object" }),
        }
    }

    async fn check_status(response: Response) -> Result<Response, ProviderError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status.as_u16() == 429 {
            return Err(ProviderError::RateLimited);
        }

        let error_text = response.text().await.unwrap_or_default();
        Err(ProviderError::ApiError(format!(
            "Completion API error {}: {}",
            status, error_text
        )))
    }
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, ProviderError> {
        tracing::debug!(
            model = %self.config.model,
            messages = request.messages.len(),
            json = request.params.json_response,
            "Sending completion request"
        );

        let response = self
            .client
            .post(self.url("chat/completions"))
            .bearer_auth(self.config.api_key.expose_secret())
            .timeout(self.config.request_timeout)
            .json(&self.body(request, false))
            .with_trace_context()
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        let response = Self::check_status(response).await?;

        let api_response: ChatCompletionResponse = response.json().await.map_err(|e| {
            ProviderError::MalformedResponse(format!("Failed to parse response: {}", e))
        })?;

        let choice = api_response.choices.into_iter().next();
        let finish_reason =
            FinishReason::from_api(choice.as_ref().and_then(|c| c.finish_reason.as_deref()));
        let usage = api_response.usage.unwrap_or_default();

        Ok(Completion {
            text: choice.and_then(|c| c.message.content),
            input_tokens: usage.prompt_tokens,
            output_tokens: usage.completion_tokens,
            finish_reason,
        })
    }

    async fn complete_stream(
        &self,
        request: &CompletionRequest,
    ) -> Result<ProviderStream, ProviderError> {
        tracing::debug!(
            model = %self.config.model,
            messages = request.messages.len(),
            "Starting streaming completion"
        );

        let response = self
            .client
            .post(self.url("chat/completions"))
            .bearer_auth(self.config.api_key.expose_secret())
            .json(&self.body(request, true))
            .with_trace_context()
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        let response = Self::check_status(response).await?;

        let (tx, rx) = mpsc::channel(32);

        tokio::spawn(async move {
            let mut body = response.bytes_stream();
            let mut sse = SseBuffer::default();
            let mut finish_reason = FinishReason::Complete;

            while let Some(chunk) = body.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        let _ = tx.send(Err(ProviderError::NetworkError(e.to_string()))).await;
                        return;
                    }
                };

                for payload in sse.push(&chunk) {
                    if payload == "[DONE]" {
                        let _ = tx.send(Ok(StreamChunk::Complete { finish_reason })).await;
                        return;
                    }

                    let parsed: ChatCompletionChunk = match serde_json::from_str(&payload) {
                        Ok(parsed) => parsed,
                        Err(e) => {
                            tracing::warn!(error = %e, "Skipping unparsable stream event");
                            continue;
                        }
                    };

                    for choice in parsed.choices {
                        if let Some(text) = choice.delta.content.filter(|t| !t.is_empty()) {
                            // Receiver gone means the client disconnected.
                            if tx.send(Ok(StreamChunk::Text(text))).await.is_err() {
                                return;
                            }
                        }
                        if choice.finish_reason.is_some() {
                            finish_reason = FinishReason::from_api(choice.finish_reason.as_deref());
                        }
                    }
                }
            }

            let _ = tx.send(Ok(StreamChunk::Complete { finish_reason })).await;
        });

        Ok(Box::pin(ReceiverStream::new(rx)) as ProviderStream)
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        if self.config.api_key.expose_secret().is_empty() {
            return Err(ProviderError::NotConfigured(
                "Completion API key not configured".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Chat Completions API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatCompletionBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: AssistantMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: Delta,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct Delta {
    #[serde(default)]
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::providers::GenerationParams;

    fn provider() -> OpenAiProvider {
        OpenAiProvider::new(OpenAiConfig {
            api_key: Secret::new("sk-test".to_string()),
            base_url: "https://example.test/v1/".to_string(),
            model: "gpt-4o-mini".to_string(),
            request_timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[test]
    fn body_includes_only_requested_options() {
        let provider = provider();
        let request = CompletionRequest {
            messages: vec![ChatMessage::system("sys"), ChatMessage::user("hi")],
            params: GenerationParams {
                temperature: Some(0.5),
                max_tokens: Some(50),
                json_response: false,
            },
        };

        let value = serde_json::to_value(provider.body(&request, false)).unwrap();
        assert_eq!(value["model"], "gpt-4o-mini");
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["content"], "hi");
        assert_eq!(value["max_tokens"], 50);
        assert!(value.get("stream").is_none());
        assert!(value.get("response_format").is_none());
    }

    #[test]
    fn json_mode_and_streaming_are_flagged() {
        let provider = provider();
        let request = CompletionRequest {
            messages: vec![ChatMessage::user("hi")],
            params: GenerationParams {
                json_response: true,
                ..Default::default()
            },
        };

        let value = serde_json::to_value(provider.body(&request, true)).unwrap();
        assert_eq!(value["stream"], true);
        assert_eq!(value["response_format"]["type"], "json_object");
        assert!(value.get("temperature").is_none());
    }

    #[test]
    fn url_tolerates_trailing_slash() {
        assert_eq!(
            provider().url("chat/completions"),
            "https://example.test/v1/chat/completions"
        );
    }
}
