use crate::dtos::{ChatRequest, ContentRequest, SuggestionsResponse, TagsResponse, TitleResponse};
use crate::middleware::AuthUser;
use crate::services::providers::StreamChunk;
use crate::startup::AppState;
use crate::utils::ValidatedJson;
use axum::{
    body::Body,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use futures::StreamExt;
use service_core::error::AppError;
use tracing::instrument;

#[instrument(skip_all)]
pub async fn generate_tags(
    State(state): State<AppState>,
    _user: AuthUser,
    ValidatedJson(req): ValidatedJson<ContentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let tags = state.assistant.suggest_tags(&req.content).await;
    Ok(Json(TagsResponse { tags }))
}

#[instrument(skip_all)]
pub async fn generate_title(
    State(state): State<AppState>,
    _user: AuthUser,
    ValidatedJson(req): ValidatedJson<ContentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let title = state.assistant.suggest_title(&req.content).await;
    Ok(Json(TitleResponse { title }))
}

/// Insight cards over the caller's memos. Falls back to a static card when
/// the memos cannot be loaded.
#[instrument(skip_all, fields(user = %user.email()))]
pub async fn generate_suggestions(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let suggestions = match state.store.list_for_owner(user.email()).await {
        Ok(memos) => state.assistant.suggest_insights(&memos).await,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load memos for suggestions");
            crate::services::metrics::record_fallback("suggestions", "store_error");
            vec![crate::services::Suggestion::keep_writing()]
        }
    };

    Ok(Json(SuggestionsResponse { suggestions }))
}

/// Stream the assistant's reply as chunked plain text.
#[instrument(skip_all, fields(user = %user.email()))]
pub async fn chat(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(req): ValidatedJson<ChatRequest>,
) -> Result<Response, AppError> {
    let failed = || AppError::OperationFailed("Failed to process chat request".to_string());

    let memos = state.store.list_for_owner(user.email()).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to load memos for chat");
        failed()
    })?;

    let upstream = state
        .assistant
        .chat(&req.message, &req.history, &memos)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Chat completion failed");
            failed()
        })?;

    // An upstream failure after the headers are sent aborts the body so the
    // client sees a truncated response rather than a clean end.
    let body = upstream.filter_map(|chunk| {
        futures::future::ready(match chunk {
            Ok(StreamChunk::Text(text)) if text.is_empty() => None,
            Ok(StreamChunk::Text(text)) => Some(Ok(text)),
            Ok(StreamChunk::Complete { finish_reason }) => {
                tracing::debug!(?finish_reason, "Chat stream finished");
                None
            }
            Err(e) => {
                tracing::error!(error = %e, "Chat stream failed mid-response");
                Some(Err(e))
            }
        })
    });

    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        Body::from_stream(body),
    )
        .into_response())
}
