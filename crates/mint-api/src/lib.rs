//! Mint API
//!
//! The web route behind the remix UI: takes the plain mint fields, obtains
//! a verified proof from the Proof Generation Service and returns the
//! ABI-encoded arguments for the mint call.
//!
//! ## Endpoints
//!
//! - `POST /api/generate-proof` - Proof and mint calldata for `{ prompt, image, author, requestId }`
//! - `GET /health` - Health check

pub mod config;
pub mod handlers;
pub mod proof_client;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use config::Config;
pub use handlers::AppState;
pub use proof_client::{ProofServiceClient, RetryPolicy};

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/api/generate-proof", post(handlers::generate_proof_handler))
        .with_state(Arc::new(state))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
