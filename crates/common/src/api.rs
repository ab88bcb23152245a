//! Wire models shared by the proof service and its callers

use serde::{Deserialize, Serialize};

use crate::proof::Groth16Proof;
use crate::{Error, Result};

/// AIGC data section of a proof request (hex-encoded)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AigcDataInput {
    /// Image bytes
    #[serde(default)]
    pub image: String,

    /// 20-byte author address
    #[serde(default)]
    pub author: String,

    /// Big-endian request id word, at most 32 bytes
    #[serde(default)]
    pub request_id: String,
}

/// Body of `POST /proof`
///
/// Missing fields deserialize to empty strings so that they are reported by
/// the normalizer as invalid input rather than as a body rejection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofInput {
    /// UTF-8 prompt bytes
    #[serde(default)]
    pub prompt: String,

    #[serde(default)]
    pub aigc_data: AigcDataInput,
}

/// Response from `POST /proof`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProofResponse {
    /// Public-input hash as a decimal field element
    pub public_hash: String,

    /// snarkjs proof object, serialized as a JSON string
    pub proof: String,

    /// Public signals reported by the prover
    pub public_inputs: Vec<String>,

    /// Result of the post-generation verification
    pub verified: bool,
}

/// A proof as accepted by `POST /verify`: either the snarkjs object itself or
/// the JSON string returned from `POST /proof`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProofPayload {
    Object(Groth16Proof),
    Encoded(String),
}

impl ProofPayload {
    pub fn into_proof(self) -> Result<Groth16Proof> {
        match self {
            ProofPayload::Object(proof) => Ok(proof),
            ProofPayload::Encoded(json) => Groth16Proof::from_json_str(&json),
        }
    }
}

/// Body of `POST /verify`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationRequest {
    pub proof: ProofPayload,
    pub public_inputs: Vec<String>,
}

/// Response from `POST /verify`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationResponse {
    pub verified: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Error body returned by every service on failure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl From<&Error> for ErrorResponse {
    fn from(err: &Error) -> Self {
        Self {
            error: err.to_string(),
        }
    }
}
