//! Scripted provider for tests and local runs without an API key.

use super::{
    Completion, CompletionProvider, CompletionRequest, FinishReason, ProviderError,
    ProviderStream, Role, StreamChunk,
};
use async_trait::async_trait;
use std::sync::Mutex;

/// What the mock does when asked for a completion.
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Reply with the last user message, prefixed with `Mock response for: `.
    Echo,
    /// Reply with fixed text (streamed as a single chunk).
    Reply(String),
    /// Reply with no text at all.
    Empty,
    /// Stream the given chunks in order.
    Chunks(Vec<String>),
    /// Stream the given chunks, then drop the connection.
    ChunksThenError(Vec<String>),
    /// Fail with an API error.
    Fail,
    /// Never answer.
    Hang,
}

pub struct MockCompletionProvider {
    behavior: Mutex<MockBehavior>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl MockCompletionProvider {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior: Mutex::new(behavior),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn echo() -> Self {
        Self::new(MockBehavior::Echo)
    }

    pub fn replying(text: impl Into<String>) -> Self {
        Self::new(MockBehavior::Reply(text.into()))
    }

    pub fn failing() -> Self {
        Self::new(MockBehavior::Fail)
    }

    pub fn hanging() -> Self {
        Self::new(MockBehavior::Hang)
    }

    pub fn streaming<I, S>(chunks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(MockBehavior::Chunks(
            chunks.into_iter().map(Into::into).collect(),
        ))
    }

    pub fn broken_after<I, S>(chunks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(MockBehavior::ChunksThenError(
            chunks.into_iter().map(Into::into).collect(),
        ))
    }

    pub fn set_behavior(&self, behavior: MockBehavior) {
        *self.behavior.lock().unwrap_or_else(|e| e.into_inner()) = behavior;
    }

    /// Requests received so far, oldest first.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn record(&self, request: &CompletionRequest) -> MockBehavior {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request.clone());
        self.behavior
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn echo_text(request: &CompletionRequest) -> String {
        let prompt = request
            .messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .unwrap_or_default();
        format!("Mock response for: {}", prompt)
    }
}

#[async_trait]
impl CompletionProvider for MockCompletionProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, ProviderError> {
        let text = match self.record(request) {
            MockBehavior::Echo => Some(Self::echo_text(request)),
            MockBehavior::Reply(text) => Some(text),
            MockBehavior::Chunks(chunks) => Some(chunks.concat()),
            MockBehavior::ChunksThenError(_) => {
                return Err(ProviderError::NetworkError("Mock disconnect".to_string()));
            }
            MockBehavior::Empty => None,
            MockBehavior::Fail => {
                return Err(ProviderError::ApiError("Mock failure".to_string()));
            }
            MockBehavior::Hang => std::future::pending().await,
        };

        Ok(Completion {
            output_tokens: text.as_ref().map_or(0, |t| t.len() as u32 / 4),
            text,
            input_tokens: 0,
            finish_reason: FinishReason::Complete,
        })
    }

    async fn complete_stream(
        &self,
        request: &CompletionRequest,
    ) -> Result<ProviderStream, ProviderError> {
        let (texts, breaks) = match self.record(request) {
            MockBehavior::Echo => (vec![Self::echo_text(request)], false),
            MockBehavior::Reply(text) => (vec![text], false),
            MockBehavior::Chunks(chunks) => (chunks, false),
            MockBehavior::ChunksThenError(chunks) => (chunks, true),
            MockBehavior::Empty => (Vec::new(), false),
            MockBehavior::Fail => {
                return Err(ProviderError::ApiError("Mock failure".to_string()));
            }
            MockBehavior::Hang => std::future::pending().await,
        };

        let last = if breaks {
            Err(ProviderError::NetworkError("Mock disconnect".to_string()))
        } else {
            Ok(StreamChunk::Complete {
                finish_reason: FinishReason::Complete,
            })
        };
        let chunks: Vec<Result<StreamChunk, ProviderError>> = texts
            .into_iter()
            .map(|t| Ok(StreamChunk::Text(t)))
            .chain(std::iter::once(last))
            .collect();

        Ok(Box::pin(tokio_stream::iter(chunks)))
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        Ok(())
    }
}
