mod common;

use axum::http::StatusCode;
use common::{token_with, TestApp, OWNER, TEST_AUDIENCE, TEST_JWT_SECRET};
use tower::util::ServiceExt;

async fn status_with_token(app: &TestApp, token: Option<String>) -> StatusCode {
    let mut builder = axum::http::Request::builder().uri("/api/memos");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }

    app.router
        .clone()
        .oneshot(builder.body(axum::body::Body::empty()).unwrap())
        .await
        .unwrap()
        .status()
}

#[tokio::test]
async fn api_requires_bearer_token() {
    let app = TestApp::new();
    assert_eq!(status_with_token(&app, None).await, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn api_rejects_bad_tokens() {
    let app = TestApp::new();

    let wrong_secret = token_with(OWNER, "not-the-secret", TEST_AUDIENCE, 3600);
    let wrong_audience = token_with(OWNER, TEST_JWT_SECRET, "anon", 3600);
    let expired = token_with(OWNER, TEST_JWT_SECRET, TEST_AUDIENCE, -3600);

    for token in [wrong_secret, wrong_audience, expired, "garbage".to_string()] {
        assert_eq!(
            status_with_token(&app, Some(token)).await,
            StatusCode::UNAUTHORIZED
        );
    }
}

#[tokio::test]
async fn api_accepts_valid_token() {
    let app = TestApp::new();
    let token = token_with(OWNER, TEST_JWT_SECRET, TEST_AUDIENCE, 3600);
    assert_eq!(status_with_token(&app, Some(token)).await, StatusCode::OK);
}

#[tokio::test]
async fn health_is_public() {
    let app = TestApp::new();
    let response = app.request("GET", "/health", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
}
