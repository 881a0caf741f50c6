use crate::analysis::{build_graph, chart_slices};
use crate::dtos::{ChartParams, GraphParams};
use crate::middleware::AuthUser;
use crate::startup::AppState;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use service_core::error::AppError;
use tracing::instrument;

/// Tag distribution over the recent window, top tags plus a `기타` slice.
#[instrument(skip_all, fields(user = %user.email()))]
pub async fn chart(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<ChartParams>,
) -> Result<impl IntoResponse, AppError> {
    let memos = state.store.list_for_owner(user.email()).await?;
    let data = chart_slices(&memos, Utc::now(), params.window(), params.top());
    Ok(Json(data))
}

/// Tag/memo relationship graph with layout positions.
#[instrument(skip_all, fields(user = %user.email()))]
pub async fn graph(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<GraphParams>,
) -> Result<impl IntoResponse, AppError> {
    let memos = state.store.list_for_owner(user.email()).await?;
    let selected = params.tag.as_deref().filter(|t| !t.is_empty());
    let graph = build_graph(&memos, selected, &mut rand::thread_rng());
    Ok(Json(graph))
}
