use crate::services::metrics::get_metrics;
use crate::startup::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "memo-service",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// 200 when the memo store answers and the completion provider is
/// configured, 503 otherwise.
pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    if let Err(e) = state.store.health_check().await {
        tracing::warn!(error = %e, "Readiness check failed: memo store");
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "unavailable", "component": "database" })),
        );
    }

    if let Err(e) = state.assistant.health_check().await {
        tracing::warn!(error = %e, "Readiness check failed: completion provider");
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "unavailable", "component": "llm" })),
        );
    }

    (StatusCode::OK, Json(json!({ "status": "ready" })))
}

pub async fn metrics_handler() -> impl IntoResponse {
    (
        [("content-type", "text/plain; version=0.0.4")],
        get_metrics(),
    )
}
