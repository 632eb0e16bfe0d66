//! Marketplace server binary
//!
//! Usage: `marketplace-server [config.toml]`. Without a file, configuration
//! comes from `MARKETPLACE_*` environment variables. Prometheus metrics are
//! served at `/metrics` on `metrics_listen_addr`.

use anyhow::Context;
use axum::{http::StatusCode, routing::get, Router};
use marketplace_core::{metrics::Metrics, Config, MarketplaceHandle};

fn metrics_router(metrics: Metrics) -> Router {
    Router::new().route(
        "/metrics",
        get(move || {
            let metrics = metrics.clone();
            async move {
                match metrics.export() {
                    Ok(body) => (StatusCode::OK, body),
                    Err(e) => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        format!("Failed to encode metrics: {}", e),
                    ),
                }
            }
        }),
    )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => Config::from_file(&path)
            .with_context(|| format!("failed to load config from {}", path))?,
        None => Config::from_env().context("invalid MARKETPLACE_* environment")?,
    };

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        data_dir = ?config.data_dir,
        persistence = config.persistence_enabled,
        "Starting marketplace server"
    );

    let metrics_addr = config.metrics_listen_addr.clone();
    let handle = MarketplaceHandle::open(config)
        .await
        .context("failed to open marketplace")?;

    let overview = handle.admin_overview().await?;
    tracing::info!(
        overview = %serde_json::to_string(&overview)?,
        "Marketplace opened"
    );

    let listener = tokio::net::TcpListener::bind(&metrics_addr)
        .await
        .with_context(|| format!("failed to bind metrics listener on {}", metrics_addr))?;
    tracing::info!(addr = %metrics_addr, "Serving metrics");

    axum::serve(listener, metrics_router(handle.metrics().clone()))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for ctrl-c");
            }
        })
        .await
        .context("metrics server failed")?;

    tracing::info!("Shutting down marketplace server");
    handle.shutdown().await?;
    Ok(())
}
