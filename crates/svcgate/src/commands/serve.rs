use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use crate::args::ServeArgs;
use svcgate::http::{create_router, AppState};
use svcgate_core::{Config, ConversionService};

pub async fn run(args: &ServeArgs, config_path: Option<&Path>) -> Result<()> {
    let config = Config::load(config_path)?;

    let host = args.host.clone().unwrap_or_else(|| config.server.host.clone());
    let port = args.port.unwrap_or(config.server.port);

    let service =
        ConversionService::from_config(&config).context("Failed to initialise conversion service")?;
    info!(
        engine = %service.engine_kind(),
        presets = service.catalog().len(),
        staging = %service.staging().root().display(),
        "Conversion service ready"
    );

    let state = AppState::new(Arc::new(service), config.server.response);
    let router = create_router(state, config.server.max_upload_bytes);

    let addr = format!("{}:{}", host, port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("HTTP server listening on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /process-audio/");
    info!("  GET  /presets");
    info!("  GET  /health");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server terminated unexpectedly")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
