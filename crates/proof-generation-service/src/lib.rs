//! Proof Generation Service
//!
//! Turns AIGC mint requests (prompt, image, author, request id) into Groth16
//! proofs whose first public signal binds all four values. Witness generation
//! and proving are delegated to the circom/snarkjs toolkit; every request
//! runs in its own scratch directory.
//!
//! ## Endpoints
//!
//! - `POST /proof` - Generate and verify a proof
//! - `POST /verify` - Verify an existing proof
//! - `GET /health` - Health check

pub mod artifacts;
pub mod config;
pub mod handlers;
pub mod pipeline;
pub mod prover;
pub mod scratch;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use artifacts::CircuitArtifacts;
pub use config::Config;
pub use handlers::AppState;
pub use pipeline::{ProofOutcome, ProofPipeline, Stage};
pub use prover::{ProvingBackend, SnarkjsBackend, Witness};
pub use scratch::Scratch;

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let body_limit = state.body_limit;
    let shared_state = Arc::new(state);

    Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/proof", post(handlers::generate_proof_handler))
        .route("/verify", post(handlers::verify_proof_handler))
        .with_state(shared_state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
