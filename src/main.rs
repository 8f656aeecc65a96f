use actix_web::{middleware, web, App, HttpServer};
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use order_lifecycle::api::{configure_routes, AppState};
use order_lifecycle::config::AppConfig;
use order_lifecycle::engine::LifecycleEngine;
use order_lifecycle::metrics::Metrics;
use order_lifecycle::utils::RetryConfig;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured logging with environment-based filtering
    // Default to INFO level, can be overridden with RUST_LOG env var
    // Example: RUST_LOG=debug cargo run
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,order_lifecycle=debug"))
        )
        .init();

    tracing::info!("🚀 Starting order lifecycle engine");

    // === 1. Configuration ===
    let config = AppConfig::from_env()?;

    // === 2. Initialize Prometheus metrics ===
    let metrics = Arc::new(Metrics::new()?);
    tracing::info!("📊 Metrics registry created with {} metrics", metrics.registry().gather().len());

    // === 3. Engine over the in-memory event store ===
    let engine = Arc::new(LifecycleEngine::in_memory(config.engine_settings(), metrics.clone()));
    let state = AppState {
        engine,
        metrics: metrics.clone(),
        retry: RetryConfig::with_max_attempts(config.retry_max_attempts),
    };

    // === 4. HTTP API ===
    let bind = (config.server_host.clone(), config.server_port);
    tracing::info!("🌐 Listening on http://{}:{}/api/v1", bind.0, bind.1);

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .app_data(web::Data::new(state.clone()))
            .app_data(web::Data::new(state.metrics.clone()))
            .configure(configure_routes)
    })
    .bind(bind)?
    .run()
    .await?;

    tracing::info!("Server stopped");
    Ok(())
}
