//! Proof Generation Service
//!
//! REST API for generating and verifying AIGC mint proofs

use anyhow::{Context, Result};
use proof_generation_service::{
    create_router, AppState, CircuitArtifacts, Config, ProofPipeline, SnarkjsBackend,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "proof_generation_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Proof Generation Service");

    // Configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    config
        .ensure_directories()
        .context("Failed to create directories")?;

    info!("Work directory: {}", config.work_dir.display());
    info!("Circuit: {}", config.circuit_wasm.display());
    info!("Proving key: {}", config.proving_key.display());

    // Keys and circuit are checked once and shared read-only
    let artifacts = Arc::new(
        CircuitArtifacts::load(&config).context("Circuit artifacts are not ready")?,
    );
    let n_public = artifacts.n_public;

    let backend = SnarkjsBackend::new(artifacts, config.proving_timeout)
        .with_node(config.node_bin.clone(), config.node_max_old_space_mb)
        .with_snarkjs(config.snarkjs_bin.clone());

    let pipeline = ProofPipeline::new(Arc::new(backend), config.work_dir.clone())
        .with_verification(config.verify_after_prove)
        .with_public_signal_count(n_public);

    let state = AppState::new(pipeline).with_body_limit(config.max_body_bytes);
    let app = create_router(state);

    // Bind and serve
    let addr = config.address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Proof Generation Service running on http://{}", addr);
    info!("  POST /proof - Generate proof");
    info!("  POST /verify - Verify proof");

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
