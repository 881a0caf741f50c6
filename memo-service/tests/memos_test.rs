mod common;

use axum::http::StatusCode;
use common::{body_json, TestApp, OWNER, STRANGER};
use serde_json::json;

#[tokio::test]
async fn create_memo_uses_session_owner() {
    let app = TestApp::new();

    let response = app
        .post(
            "/api/memos",
            OWNER,
            json!({
                "title": "Standup",
                "content": "Discussed the release plan",
                "tags": ["work"],
                "user_email": "spoofed@example.com"
            }),
        )
        .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["user_email"], OWNER);
    assert_eq!(body["tags"], json!(["work"]));
    assert_eq!(app.store.all().len(), 1);
}

#[tokio::test]
async fn create_memo_requires_content() {
    let app = TestApp::new();

    let response = app
        .post("/api/memos", OWNER, json!({ "title": "Empty" }))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "Content is required");
}

#[tokio::test]
async fn list_returns_only_own_memos_newest_first() {
    let app = TestApp::new();
    app.seed(OWNER, "old", "first", &[], 3);
    app.seed(OWNER, "new", "second", &[], 1);
    app.seed(STRANGER, "theirs", "hidden", &[], 0);

    let body = body_json(app.get("/api/memos", OWNER).await).await;
    let titles: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["title"].as_str().unwrap())
        .collect();

    assert_eq!(titles, vec!["new", "old"]);
}

#[tokio::test]
async fn search_matches_title_content_and_tags() {
    let app = TestApp::new();
    app.seed(OWNER, "Groceries", "milk and eggs", &["home"], 2);
    app.seed(OWNER, "Sprint", "ship the MILK feature", &["work"], 1);
    app.seed(OWNER, "Garden", "water plants", &["Homework"], 0);

    let body = body_json(app.get("/api/memos?q=milk", OWNER).await).await;
    assert_eq!(body.as_array().unwrap().len(), 2);

    let body = body_json(app.get("/api/memos?q=home", OWNER).await).await;
    let titles: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Garden", "Groceries"]);
}

#[tokio::test]
async fn get_memo_of_another_owner_is_not_found() {
    let app = TestApp::new();
    let memo = app.seed(STRANGER, "private", "secret", &[], 0);

    let response = app.get(&format!("/api/memos/{}", memo.id), OWNER).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.get(&format!("/api/memos/{}", memo.id), STRANGER).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn patch_replaces_only_given_fields() {
    let app = TestApp::new();
    let memo = app.seed(OWNER, "Draft", "body", &["a"], 1);

    let response = app
        .request(
            "PATCH",
            &format!("/api/memos/{}", memo.id),
            Some(OWNER),
            Some(json!({ "tags": ["b", "c"] })),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["title"], "Draft");
    assert_eq!(body["content"], "body");
    assert_eq!(body["tags"], json!(["b", "c"]));

    let stored = &app.store.all()[0];
    assert!(stored.updated_at > memo.updated_at);
}

#[tokio::test]
async fn empty_patch_leaves_memo_untouched() {
    let app = TestApp::new();
    let memo = app.seed(OWNER, "Draft", "body", &["a"], 1);

    let response = app
        .request("PATCH", &format!("/api/memos/{}", memo.id), Some(OWNER), Some(json!({})))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.store.all()[0].updated_at, memo.updated_at);
}

#[tokio::test]
async fn patch_of_foreign_memo_is_not_found() {
    let app = TestApp::new();
    let memo = app.seed(STRANGER, "theirs", "body", &[], 0);

    let response = app
        .request(
            "PATCH",
            &format!("/api/memos/{}", memo.id),
            Some(OWNER),
            Some(json!({ "title": "mine now" })),
        )
        .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(app.store.all()[0].title, "theirs");
}

#[tokio::test]
async fn delete_memo_reports_success_and_missing() {
    let app = TestApp::new();
    let memo = app.seed(OWNER, "gone", "soon", &[], 0);
    let uri = format!("/api/memos/{}", memo.id);

    let response = app.request("DELETE", &uri, Some(OWNER), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "success": true }));
    assert!(app.store.all().is_empty());

    let response = app.request("DELETE", &uri, Some(OWNER), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_failure_is_a_generic_500() {
    let app = TestApp::new();
    let memo = app.seed(OWNER, "stuck", "body", &[], 0);
    app.store.set_failing(true);

    let response = app
        .request("DELETE", &format!("/api/memos/{}", memo.id), Some(OWNER), None)
        .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await["error"], "Failed to delete memo");
}

#[tokio::test]
async fn stats_count_tags_by_frequency() {
    let app = TestApp::new();
    app.seed(OWNER, "a", "x", &["work", "rust"], 2);
    app.seed(OWNER, "b", "y", &["rust"], 1);
    app.seed(OWNER, "c", "z", &[], 0);
    app.seed(STRANGER, "d", "w", &["work"], 0);

    let body = body_json(app.get("/api/memos/stats", OWNER).await).await;

    assert_eq!(body["total_memos"], 3);
    assert_eq!(
        body["tag_frequency"],
        json!([
            { "tag": "rust", "count": 2 },
            { "tag": "work", "count": 1 }
        ])
    );
}
