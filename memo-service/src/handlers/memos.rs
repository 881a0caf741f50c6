use crate::analysis::tag_frequency;
use crate::dtos::{CreateMemoRequest, DeleteResponse, SearchParams, UpdateMemoRequest};
use crate::middleware::AuthUser;
use crate::models::UpdateMemo;
use crate::startup::AppState;
use crate::utils::ValidatedJson;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;
use tracing::instrument;
use uuid::Uuid;

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(anyhow::anyhow!("Memo {} not found", id))
}

/// The caller's memos, newest first, or search hits when `q` is set.
#[instrument(skip_all, fields(user = %user.email()))]
pub async fn list_memos(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<SearchParams>,
) -> Result<impl IntoResponse, AppError> {
    let memos = match params.query() {
        Some(query) => state.store.search(query, user.email()).await?,
        None => state.store.list_for_owner(user.email()).await?,
    };

    Ok(Json(memos))
}

#[instrument(skip_all, fields(user = %user.email()))]
pub async fn create_memo(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(req): ValidatedJson<CreateMemoRequest>,
) -> Result<impl IntoResponse, AppError> {
    let memo = state.store.create(req.into_input(user.email())).await?;
    Ok((StatusCode::CREATED, Json(memo)))
}

#[instrument(skip_all, fields(user = %user.email(), memo_id = %id))]
pub async fn get_memo(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let memo = state
        .store
        .get(id)
        .await?
        .filter(|memo| memo.user_email == user.email())
        .ok_or_else(|| not_found(id))?;

    Ok(Json(memo))
}

#[instrument(skip_all, fields(user = %user.email(), memo_id = %id))]
pub async fn update_memo(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateMemoRequest>,
) -> Result<impl IntoResponse, AppError> {
    let update: UpdateMemo = req.into();

    // Nothing to change: answer with the stored memo and keep `updated_at`.
    let memo = if update.is_empty() {
        state
            .store
            .get(id)
            .await?
            .filter(|memo| memo.user_email == user.email())
    } else {
        state.store.update(id, user.email(), update).await?
    };

    Ok(Json(memo.ok_or_else(|| not_found(id))?))
}

#[instrument(skip_all, fields(user = %user.email(), memo_id = %id))]
pub async fn delete_memo(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let deleted = state.store.delete(id, user.email()).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to delete memo");
        AppError::OperationFailed("Failed to delete memo".to_string())
    })?;

    if !deleted {
        return Err(not_found(id));
    }

    Ok(Json(DeleteResponse { success: true }))
}

#[instrument(skip_all, fields(user = %user.email()))]
pub async fn memo_stats(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let memos = state.store.list_for_owner(user.email()).await?;
    Ok(Json(tag_frequency(&memos)))
}
