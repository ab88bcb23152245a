//! API handlers for Proof Generation Service

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tracing::info;

use remix_common::{
    ProofInput, ProofResponse, PublicSignals, VerificationRequest, VerificationResponse,
};

use crate::pipeline::ProofPipeline;

/// Default request body limit; images travel hex-encoded
pub const DEFAULT_BODY_LIMIT: usize = 16 * 1024 * 1024;

/// Shared application state
pub struct AppState {
    pub pipeline: ProofPipeline,
    pub body_limit: usize,
}

impl AppState {
    pub fn new(pipeline: ProofPipeline) -> Self {
        Self {
            pipeline,
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    pub fn with_body_limit(mut self, body_limit: usize) -> Self {
        self.body_limit = body_limit;
        self
    }
}

/// API Error type
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": self.message
        });

        (self.status, Json(body)).into_response()
    }
}

impl From<remix_common::Error> for ApiError {
    fn from(err: remix_common::Error) -> Self {
        ApiError {
            status: StatusCode::from_u16(err.status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            message: err.to_string(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError {
            status: StatusCode::BAD_REQUEST,
            message: format!("Invalid request body: {}", rejection.body_text()),
        }
    }
}

/// Health check endpoint
pub async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "proof-generation-service"
    }))
}

/// Generate a proof binding prompt, image, author and request id
pub async fn generate_proof_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ProofInput>, JsonRejection>,
) -> Result<Json<ProofResponse>, ApiError> {
    let Json(input) = payload?;

    let outcome = state.pipeline.generate(&input).await?;
    let response = outcome.into_response()?;

    Ok(Json(response))
}

/// Verify a proof against its public inputs
pub async fn verify_proof_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<VerificationRequest>, JsonRejection>,
) -> Result<Json<VerificationResponse>, ApiError> {
    let Json(request) = payload?;
    info!("Received verification request");

    let proof = request.proof.into_proof()?;
    let signals = PublicSignals::from(request.public_inputs);

    let verified = state.pipeline.verify(&proof, &signals).await?;

    Ok(Json(VerificationResponse {
        verified,
        error: (!verified).then(|| "Verification failed".to_string()),
    }))
}
