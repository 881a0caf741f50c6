use memo_service::config::MemoConfig;
use memo_service::services::init_metrics;
use memo_service::startup::Application;
use service_core::observability::init_tracing;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();

    let config = match MemoConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_tracing(
        &config.service_name,
        &config.log_level,
        config.otlp_endpoint.as_deref(),
    );

    if let Err(e) = init_metrics() {
        tracing::error!("Failed to initialize metrics: {}", e);
        std::process::exit(1);
    }

    tracing::info!(
        llm_provider = ?config.llm.provider,
        model = %config.llm.model,
        "Starting memo-service"
    );

    let application = match Application::build(config).await {
        Ok(app) => app,
        Err(e) => {
            tracing::error!("Failed to build application: {}", e);
            std::process::exit(1);
        }
    };

    application.run_until_stopped().await?;

    tracing::info!("memo-service stopped");
    Ok(())
}
