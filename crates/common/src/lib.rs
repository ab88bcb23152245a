//! Shared building blocks for AIGC mint proofs: request normalization,
//! circuit input hashing, proof types and mint calldata encoding.

pub mod api;
pub mod calldata;
pub mod circuit;
pub mod error;
pub mod proof;
pub mod request;

pub use ark_bn254::Fr;

pub use api::{
    AigcDataInput, ErrorResponse, ProofInput, ProofPayload, ProofResponse, VerificationRequest,
    VerificationResponse,
};
pub use calldata::{
    decode_aigc_data, encode_aigc_data, encode_proof, AigcData, MintCalldata, SolidityProof,
};
pub use circuit::{check_public_signals, fr_to_decimal, CircuitInput, CIRCUIT_SIGNALS};
pub use error::{Error, Result};
pub use proof::{Groth16Proof, PublicSignals};
pub use request::{ProofRequest, RequestId};
