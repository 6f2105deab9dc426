use std::sync::Arc;
use std::time::Duration;

use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::EnvFilter;

use label_compliance::app_state::AppState;
use label_compliance::config::AppConfig;
use label_compliance::routes;
use label_compliance::services::{ocr::OpenAiClient, storage::LocalStorage};

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    let config = AppConfig::from_env().expect("Failed to load configuration from environment");

    tracing::info!(
        max_batch_size = config.effective_max_batch_size(),
        batch_concurrency = config.batch_concurrency,
        model = %config.openai_model,
        "Initializing label-compliance server"
    );

    let prometheus_handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus metrics recorder");
    routes::metrics::describe_metrics();

    tracing::info!(upload_dir = %config.upload_dir, "Initializing image storage");
    let storage = LocalStorage::new(&config.upload_dir)
        .await
        .expect("Failed to initialize upload directory");

    if config.api_key().is_none() {
        tracing::warn!("OPENAI_API_KEY not set; every label will fail extraction");
    }
    let extractor = OpenAiClient::new(
        config.api_key(),
        &config.openai_model,
        &config.openai_base_url,
        Duration::from_secs(config.openai_timeout_seconds),
    )
    .expect("Failed to initialize OpenAI client");

    let bind_addr = config.bind_addr.clone();
    let state = AppState::new(config, storage, Arc::new(extractor));
    let app = routes::build_router(state, Arc::new(prometheus_handle));

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", bind_addr);

    axum::serve(listener, app).await.expect("Server error");
}
