use crate::config::{LlmProviderKind, MemoConfig};
use crate::handlers;
use crate::middleware::{auth_middleware, JwtVerifier};
use crate::services::providers::mock::MockCompletionProvider;
use crate::services::providers::openai::{OpenAiConfig, OpenAiProvider};
use crate::services::providers::CompletionProvider;
use crate::services::{Assistant, AssistantTimeouts, MemoStore, PgMemoStore};
use axum::{
    http::{HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use secrecy::ExposeSecret;
use service_core::error::AppError;
use service_core::middleware::{
    metrics::metrics_middleware, security_headers::security_headers_middleware,
    tracing::request_id_middleware,
};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn MemoStore>,
    pub assistant: Assistant,
    pub jwt: Arc<JwtVerifier>,
}

/// Routes and layers, independent of how the state was built.
pub fn build_router(state: AppState, cors_allowed_origins: &[String]) -> Router {
    let api = Router::new()
        .route(
            "/memos",
            get(handlers::list_memos).post(handlers::create_memo),
        )
        .route("/memos/stats", get(handlers::memo_stats))
        .route(
            "/memos/:id",
            get(handlers::get_memo)
                .patch(handlers::update_memo)
                .delete(handlers::delete_memo),
        )
        .route("/generate-tags", post(handlers::generate_tags))
        .route("/generate-title", post(handlers::generate_title))
        .route("/generate-suggestions", post(handlers::generate_suggestions))
        .route("/chat", post(handlers::chat))
        .route("/insights/chart", get(handlers::chart))
        .route("/insights/graph", get(handlers::graph))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let mut app = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics_handler))
        .nest("/api", api)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(request_id_middleware));

    if let Some(cors) = cors_layer(cors_allowed_origins) {
        app = app.layer(cors);
    }

    app.with_state(state)
}

fn cors_layer(origins: &[String]) -> Option<CorsLayer> {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if origins.is_empty() {
        return None;
    }

    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
            .allow_headers([
                axum::http::header::AUTHORIZATION,
                axum::http::header::CONTENT_TYPE,
            ]),
    )
}

fn build_provider(config: &MemoConfig) -> Result<Arc<dyn CompletionProvider>, AppError> {
    match config.llm.provider {
        LlmProviderKind::OpenAi => {
            let provider = OpenAiProvider::new(OpenAiConfig {
                api_key: config.llm.api_key.clone(),
                base_url: config.llm.base_url.clone(),
                model: config.llm.model.clone(),
                request_timeout: config.llm.request_timeout,
            })
            .map_err(|e| AppError::ConfigError(anyhow::anyhow!(e)))?;
            Ok(Arc::new(provider))
        }
        LlmProviderKind::Mock => {
            tracing::warn!("Using mock completion provider");
            Ok(Arc::new(MockCompletionProvider::echo()))
        }
    }
}

pub struct Application {
    port: u16,
    server: Box<dyn Future<Output = std::io::Result<()>> + Send + Unpin>,
    store: PgMemoStore,
}

impl Application {
    /// Connect to the database, run migrations, and bind the listener.
    pub async fn build(config: MemoConfig) -> Result<Self, AppError> {
        let store = PgMemoStore::connect(
            config.database.url.expose_secret(),
            config.database.max_connections,
            config.database.min_connections,
        )
        .await
        .map_err(|e| {
            tracing::error!("Failed to connect to PostgreSQL: {}", e);
            e
        })?;
        store.run_migrations().await?;

        let provider = build_provider(&config)?;
        let assistant = Assistant::new(
            provider,
            AssistantTimeouts {
                tags: config.llm.tags_timeout,
                title: config.llm.title_timeout,
                suggestions: config.llm.suggestions_timeout,
            },
        );

        let state = AppState {
            store: Arc::new(store.clone()),
            assistant,
            jwt: Arc::new(JwtVerifier::new(
                &config.auth.jwt_secret,
                &config.auth.audience,
            )),
        };

        let app = build_router(state, &config.cors_allowed_origins);

        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(port, service = %config.service_name, "HTTP server listening");

        let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());

        Ok(Self {
            port,
            server: Box::new(Box::pin(async move { server.await })),
            store,
        })
    }

    pub fn store(&self) -> &PgMemoStore {
        &self.store
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.server.await
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
