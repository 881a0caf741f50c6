//! Memo persistence.
//!
//! Handlers talk to [`MemoStore`]; production uses [`PgMemoStore`] and the
//! integration tests swap in an in-memory implementation.

use crate::models::{CreateMemo, Memo, UpdateMemo};
use crate::services::metrics::record_query_duration;
use async_trait::async_trait;
use service_core::error::AppError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::{Duration, Instant};
use tracing::{info, instrument, warn};
use uuid::Uuid;

const MEMO_COLUMNS: &str = "id, user_email, title, content, tags, created_at, updated_at";

#[async_trait]
pub trait MemoStore: Send + Sync {
    async fn create(&self, input: CreateMemo) -> Result<Memo, AppError>;

    /// All memos of one owner, newest first.
    async fn list_for_owner(&self, user_email: &str) -> Result<Vec<Memo>, AppError>;

    /// Unscoped lookup. Callers compare `user_email` with the session owner.
    async fn get(&self, id: Uuid) -> Result<Option<Memo>, AppError>;

    /// Returns `None` when no memo with this id belongs to the owner.
    async fn update(
        &self,
        id: Uuid,
        user_email: &str,
        update: UpdateMemo,
    ) -> Result<Option<Memo>, AppError>;

    /// Returns whether a memo was removed.
    async fn delete(&self, id: Uuid, user_email: &str) -> Result<bool, AppError>;

    async fn search(&self, query: &str, user_email: &str) -> Result<Vec<Memo>, AppError>;

    async fn health_check(&self) -> Result<(), AppError>;
}

/// PostgreSQL-backed memo store.
#[derive(Clone)]
pub struct PgMemoStore {
    pool: PgPool,
}

impl PgMemoStore {
    #[instrument(skip(database_url), fields(service = "memo-service"))]
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn fulltext_search(&self, query: &str, user_email: &str) -> Result<Vec<Memo>, sqlx::Error> {
        sqlx::query_as::<_, Memo>(&format!(
            "SELECT {} FROM search_memos($1, $2)",
            MEMO_COLUMNS
        ))
        .bind(query)
        .bind(user_email)
        .fetch_all(&self.pool)
        .await
    }
}

#[async_trait]
impl MemoStore for PgMemoStore {
    #[instrument(skip(self, input), fields(user_email = %input.user_email))]
    async fn create(&self, input: CreateMemo) -> Result<Memo, AppError> {
        let started = Instant::now();
        let memo = Memo::new(input);

        let memo = sqlx::query_as::<_, Memo>(&format!(
            r#"
            INSERT INTO memos (id, user_email, title, content, tags, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            MEMO_COLUMNS
        ))
        .bind(memo.id)
        .bind(&memo.user_email)
        .bind(&memo.title)
        .bind(&memo.content)
        .bind(&memo.tags)
        .bind(memo.created_at)
        .bind(memo.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to create memo: {}", e)))?;

        record_query_duration("create_memo", started.elapsed().as_secs_f64());
        info!(memo_id = %memo.id, "Memo created");

        Ok(memo)
    }

    #[instrument(skip(self))]
    async fn list_for_owner(&self, user_email: &str) -> Result<Vec<Memo>, AppError> {
        let started = Instant::now();

        let memos = sqlx::query_as::<_, Memo>(&format!(
            "SELECT {} FROM memos WHERE user_email = $1 ORDER BY created_at DESC",
            MEMO_COLUMNS
        ))
        .bind(user_email)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list memos: {}", e)))?;

        record_query_duration("list_memos", started.elapsed().as_secs_f64());
        Ok(memos)
    }

    #[instrument(skip(self))]
    async fn get(&self, id: Uuid) -> Result<Option<Memo>, AppError> {
        sqlx::query_as::<_, Memo>(&format!("SELECT {} FROM memos WHERE id = $1", MEMO_COLUMNS))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to fetch memo: {}", e)))
    }

    #[instrument(skip(self, update))]
    async fn update(
        &self,
        id: Uuid,
        user_email: &str,
        update: UpdateMemo,
    ) -> Result<Option<Memo>, AppError> {
        let started = Instant::now();

        let memo = sqlx::query_as::<_, Memo>(&format!(
            r#"
            UPDATE memos
            SET title = COALESCE($3, title),
                content = COALESCE($4, content),
                tags = COALESCE($5, tags),
                updated_at = NOW()
            WHERE id = $1 AND user_email = $2
            RETURNING {}
            "#,
            MEMO_COLUMNS
        ))
        .bind(id)
        .bind(user_email)
        .bind(update.title)
        .bind(update.content)
        .bind(update.tags)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to update memo: {}", e)))?;

        record_query_duration("update_memo", started.elapsed().as_secs_f64());
        Ok(memo)
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: Uuid, user_email: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM memos WHERE id = $1 AND user_email = $2")
            .bind(id)
            .bind(user_email)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to delete memo: {}", e))
            })?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            info!(memo_id = %id, "Memo deleted");
        }
        Ok(deleted)
    }

    #[instrument(skip(self))]
    async fn search(&self, query: &str, user_email: &str) -> Result<Vec<Memo>, AppError> {
        let started = Instant::now();

        let memos = match self.fulltext_search(query, user_email).await {
            Ok(memos) => memos,
            Err(e) => {
                warn!(error = %e, "Full-text search unavailable, filtering in process");
                self.list_for_owner(user_email)
                    .await?
                    .into_iter()
                    .filter(|m| m.matches_text(query))
                    .collect()
            }
        };

        record_query_duration("search_memos", started.elapsed().as_secs_f64());
        Ok(memos)
    }

    #[instrument(skip(self))]
    async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;
        Ok(())
    }
}
