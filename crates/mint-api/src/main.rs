//! Mint API
//!
//! Calling route for proof generation

use anyhow::{Context, Result};
use mint_api::{create_router, AppState, Config, ProofServiceClient};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mint_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Mint API");

    let config = Config::from_env().context("Failed to load configuration")?;
    info!("Proof service: {}", config.proof_service_url);

    let proof_service = ProofServiceClient::new(
        config.proof_service_url.clone(),
        config.proof_service_timeout,
        config.retry,
    )
    .context("Failed to create proof service client")?;

    if !proof_service.health_check().await.unwrap_or(false) {
        tracing::warn!("Proof service is not reachable yet; requests will retry");
    }

    let app = create_router(AppState { proof_service });

    let addr = config.address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Mint API running on http://{}", addr);
    info!("  POST /api/generate-proof - Proof and mint calldata");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
