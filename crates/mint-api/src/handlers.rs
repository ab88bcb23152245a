//! API handlers for the mint API

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info};

use remix_common::{
    check_public_signals, CircuitInput, Error, Groth16Proof, MintCalldata, ProofRequest,
    PublicSignals,
};

use crate::proof_client::ProofServiceClient;

/// Shared application state
pub struct AppState {
    pub proof_service: ProofServiceClient,
}

/// API Error type
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": self.message
        });

        (self.status, Json(body)).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        if err.status_code() >= 500 {
            error!("Mint proof request failed: {}", err);
        }
        ApiError {
            status: StatusCode::from_u16(err.status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            message: err.to_string(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::bad_request(format!("Invalid request body: {}", rejection.body_text()))
    }
}

/// Fields as the user submits them. `requestId` may be text or a JSON
/// integer; integers beyond u64 must be sent as decimal text.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateProofRequest {
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub request_id: Option<Value>,
}

/// The four fields, all present
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MintFields {
    pub prompt: String,
    pub image: String,
    pub author: String,
    pub request_id: String,
}

impl GenerateProofRequest {
    fn required_fields(&self) -> Result<MintFields, ApiError> {
        let missing = || ApiError::bad_request("Missing required fields");

        let text = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let request_id = match &self.request_id {
            Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
            Some(Value::Number(n)) => match n.as_u64() {
                Some(id) => id.to_string(),
                None => {
                    let msg = format!("numeric requestId must be an integer in u64, got {}", n);
                    return Err(Error::invalid_input(msg).into());
                }
            },
            _ => return Err(missing()),
        };

        Ok(MintFields {
            prompt: text(&self.prompt).ok_or_else(missing)?,
            image: text(&self.image).ok_or_else(missing)?,
            author: text(&self.author).ok_or_else(missing)?,
            request_id,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateProofResponse {
    /// UTF-8 prompt bytes, hex
    pub prompt: String,
    /// `abi.encode(image, author, requestId)`, hex
    pub aigc_data: String,
    /// `abi.encode(a, b, c)`, hex
    pub proof: String,
    pub public_signals: Vec<String>,
    /// Complete `mint(bytes,bytes,bytes)` transaction input, hex
    pub calldata: String,
    pub data: MintFields,
}

/// Health check endpoint
pub async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let proof_service = match state.proof_service.health_check().await {
        Ok(true) => "up",
        _ => "down",
    };

    Json(serde_json::json!({
        "status": "healthy",
        "service": "mint-api",
        "proof_service": proof_service,
    }))
}

/// Obtain a proof for the submitted fields and return the mint arguments
pub async fn generate_proof_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<GenerateProofRequest>, JsonRejection>,
) -> Result<Json<GenerateProofResponse>, ApiError> {
    let Json(body) = payload?;

    let fields = body.required_fields()?;

    let request = ProofRequest::from_plain(
        &fields.prompt,
        &fields.image,
        &fields.author,
        &fields.request_id,
    )?;
    let expected_hash = CircuitInput::build(&request)?.public_hash()?;

    info!(
        "Requesting proof for author {} request {}",
        request.author, request.request_id
    );
    let response = state.proof_service.generate_proof(&request.to_wire()).await?;

    if !response.verified {
        return Err(Error::VerificationFailed.into());
    }

    let signals = PublicSignals::from(response.public_inputs);
    check_public_signals(&signals, &expected_hash)?;

    let proof = Groth16Proof::from_json_str(&response.proof).map_err(upstream_proof_error)?;
    let calldata = MintCalldata::new(&request, &proof).map_err(upstream_proof_error)?;

    Ok(Json(GenerateProofResponse {
        prompt: to_hex(&calldata.prompt),
        aigc_data: to_hex(&calldata.aigc_data),
        proof: to_hex(&calldata.proof),
        public_signals: signals.into_inner(),
        calldata: to_hex(&calldata.to_call_data()),
        data: fields,
    }))
}

/// A proof the service returned but cannot be encoded is a server fault
fn upstream_proof_error(err: Error) -> Error {
    match err {
        Error::InvalidInput(msg) => {
            Error::EncodingMismatch(format!("proof service returned an unusable proof: {}", msg))
        }
        other => other,
    }
}

fn to_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}
