use std::sync::Arc;

use anyhow::Context;
use quarry_orchestrator::delivery::{JsonFileExporter, WebhookNotifier};
use quarry_orchestrator::source::BlogSource;
use quarry_orchestrator::{Collaborators, Config, Orchestrator, api};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Pick up a local .env before reading anything else
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quarry_orchestrator=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Quarry Orchestrator...");

    let config = Config::from_env();
    config.validate().context("Invalid configuration")?;

    let source = BlogSource::new(&config.source_url, config.request_timeout)
        .context("Failed to create blog source")?;
    let notifier =
        WebhookNotifier::new(config.notify_timeout).context("Failed to create webhook notifier")?;
    let exporter = JsonFileExporter::new(&config.export_dir, config.export_base_url.clone());

    let orchestrator = Orchestrator::start(
        &config,
        Collaborators {
            source: Arc::new(source),
            exporter: Arc::new(exporter),
            notifier: Arc::new(notifier),
        },
    );

    // Build router with all API endpoints
    let app = api::create_router(orchestrator.service());

    tracing::info!("Listening on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    orchestrator.shutdown().await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
