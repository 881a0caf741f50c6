#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, Response, StatusCode},
    Router,
};
use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use memo_service::middleware::{Claims, JwtVerifier};
use memo_service::models::{CreateMemo, Memo, UpdateMemo};
use memo_service::services::providers::mock::MockCompletionProvider;
use memo_service::services::{Assistant, AssistantTimeouts, MemoStore};
use memo_service::startup::{build_router, AppState};
use secrecy::Secret;
use serde_json::Value;
use service_core::error::AppError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::util::ServiceExt;
use uuid::Uuid;

pub const TEST_JWT_SECRET: &str = "memo-test-secret";
pub const TEST_AUDIENCE: &str = "authenticated";
pub const OWNER: &str = "owner@example.com";
pub const STRANGER: &str = "stranger@example.com";

/// Memo store kept in a vector; `fail` makes every call error.
#[derive(Default)]
pub struct InMemoryMemoStore {
    memos: Mutex<Vec<Memo>>,
    fail: AtomicBool,
}

impl InMemoryMemoStore {
    pub fn insert(&self, memo: Memo) {
        self.memos.lock().unwrap().push(memo);
    }

    pub fn all(&self) -> Vec<Memo> {
        self.memos.lock().unwrap().clone()
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), AppError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::DatabaseError(anyhow::anyhow!("store offline")));
        }
        Ok(())
    }

    fn owned_newest_first(&self, user_email: &str) -> Vec<Memo> {
        let mut memos: Vec<Memo> = self
            .memos
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.user_email == user_email)
            .cloned()
            .collect();
        memos.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        memos
    }
}

#[async_trait]
impl MemoStore for InMemoryMemoStore {
    async fn create(&self, input: CreateMemo) -> Result<Memo, AppError> {
        self.check()?;
        let memo = Memo::new(input);
        self.insert(memo.clone());
        Ok(memo)
    }

    async fn list_for_owner(&self, user_email: &str) -> Result<Vec<Memo>, AppError> {
        self.check()?;
        Ok(self.owned_newest_first(user_email))
    }

    async fn get(&self, id: Uuid) -> Result<Option<Memo>, AppError> {
        self.check()?;
        Ok(self.memos.lock().unwrap().iter().find(|m| m.id == id).cloned())
    }

    async fn update(
        &self,
        id: Uuid,
        user_email: &str,
        update: UpdateMemo,
    ) -> Result<Option<Memo>, AppError> {
        self.check()?;
        let mut memos = self.memos.lock().unwrap();
        Ok(memos
            .iter_mut()
            .find(|m| m.id == id && m.user_email == user_email)
            .map(|memo| {
                memo.apply(update);
                memo.clone()
            }))
    }

    async fn delete(&self, id: Uuid, user_email: &str) -> Result<bool, AppError> {
        self.check()?;
        let mut memos = self.memos.lock().unwrap();
        let before = memos.len();
        memos.retain(|m| !(m.id == id && m.user_email == user_email));
        Ok(memos.len() < before)
    }

    async fn search(&self, query: &str, user_email: &str) -> Result<Vec<Memo>, AppError> {
        self.check()?;
        Ok(self
            .owned_newest_first(user_email)
            .into_iter()
            .filter(|m| m.matches_text(query))
            .collect())
    }

    async fn health_check(&self) -> Result<(), AppError> {
        self.check()
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryMemoStore>,
    pub provider: Arc<MockCompletionProvider>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_provider(MockCompletionProvider::echo())
    }

    pub fn with_provider(provider: MockCompletionProvider) -> Self {
        let store = Arc::new(InMemoryMemoStore::default());
        let provider = Arc::new(provider);
        let timeouts = AssistantTimeouts {
            tags: Duration::from_millis(100),
            title: Duration::from_millis(100),
            suggestions: Duration::from_millis(100),
        };

        let state = AppState {
            store: store.clone(),
            assistant: Assistant::new(provider.clone(), timeouts),
            jwt: Arc::new(JwtVerifier::new(
                &Secret::new(TEST_JWT_SECRET.to_string()),
                TEST_AUDIENCE,
            )),
        };

        Self {
            router: build_router(state, &[]),
            store,
            provider,
        }
    }

    /// Seed a memo for `owner` created `days_ago` days back.
    pub fn seed(&self, owner: &str, title: &str, content: &str, tags: &[&str], days_ago: i64) -> Memo {
        let mut memo = Memo::new(CreateMemo {
            user_email: owner.to_string(),
            title: title.to_string(),
            content: content.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        });
        memo.created_at = Utc::now() - ChronoDuration::days(days_ago);
        memo.updated_at = memo.created_at;
        self.store.insert(memo.clone());
        memo
    }

    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        user: Option<&str>,
        body: Option<Value>,
    ) -> Response<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(email) = user {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token_for(email)));
        }

        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        self.router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap()
    }

    pub async fn get(&self, uri: &str, user: &str) -> Response<Body> {
        self.request("GET", uri, Some(user), None).await
    }

    pub async fn post(&self, uri: &str, user: &str, body: Value) -> Response<Body> {
        self.request("POST", uri, Some(user), Some(body)).await
    }
}

pub fn token_for(email: &str) -> String {
    token_with(email, TEST_JWT_SECRET, TEST_AUDIENCE, 3600)
}

pub fn token_with(email: &str, secret: &str, audience: &str, expires_in_secs: i64) -> String {
    let claims = Claims {
        sub: Uuid::new_v4().to_string(),
        email: email.to_string(),
        exp: Utc::now().timestamp() + expires_in_secs,
        aud: audience.to_string(),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_str(&body_text(response).await).unwrap()
}

pub fn assert_status(response: &Response<Body>, expected: StatusCode) {
    assert_eq!(response.status(), expected, "unexpected status");
}
