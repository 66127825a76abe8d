//! fsgd - filestore-gateway server
//!
//! Serves get, list, upload and delete of files kept in an S3-compatible
//! bucket over plain HTTP.

use std::sync::Arc;

use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use filestore_gateway::cli::ServerArgs;
use filestore_gateway::openapi::DOCS_UI_PATH;
use filestore_gateway::{create_router, with_api_docs, AppState};
use fsg_core::{BackendEndpoint, StorageConfig};
use fsg_s3::S3Client;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = ServerArgs::parse();

    // Initialize tracing subscriber for logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(args.default_log_filter())),
        )
        .init();

    let config = StorageConfig::from_env();
    let endpoint = BackendEndpoint::DEFAULT;

    info!("Starting filestore-gateway...");
    info!(
        "  Storage: {}",
        if config.is_active { "active" } else { "inactive" }
    );
    info!("  Bucket: {}", config.bucket);
    info!("  Endpoint: {} ({})", endpoint.host, endpoint.region);

    let client = S3Client::new(&config, endpoint).await?;
    let state = AppState::new(&config, Arc::new(client));
    let mut app = create_router(state);
    if args.openapi {
        app = with_api_docs(app);
        info!("  API docs: {}", DOCS_UI_PATH);
    }

    let addr = args.listen_addr();
    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
