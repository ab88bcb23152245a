//! ABI encoding of mint calldata
//!
//! The mint entry point takes `(bytes prompt, bytes aigcData, bytes proof)`:
//! - `aigcData` is `abi.encode(bytes image, address author, uint256 requestId)`
//! - `proof` is `abi.encode(uint256[2] a, uint256[2][2] b, uint256[2] c)`
//!
//! Any layout difference here only shows up as an on-chain revert.

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::{sol, SolCall, SolValue};

use crate::proof::Groth16Proof;
use crate::request::ProofRequest;
use crate::{Error, Result};

sol! {
    function mint(bytes prompt, bytes aigcData, bytes proof) external returns (uint256 tokenId);
}

/// Decoded `aigcData` tuple
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AigcData {
    pub image: Vec<u8>,
    pub author: Address,
    pub request_id: U256,
}

/// Groth16 proof points in the order the Solidity verifier consumes them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolidityProof {
    pub a: [U256; 2],
    pub b: [[U256; 2]; 2],
    pub c: [U256; 2],
}

impl SolidityProof {
    /// Convert a snarkjs proof: drop the projective `z` coordinates and swap
    /// the G2 limbs into `[[x1, x0], [y1, y0]]`.
    pub fn from_groth16(proof: &Groth16Proof) -> Result<Self> {
        proof.validate()?;

        let b = &proof.pi_b;
        Ok(Self {
            a: [to_u256(&proof.pi_a[0])?, to_u256(&proof.pi_a[1])?],
            b: [
                [to_u256(&b[0][1])?, to_u256(&b[0][0])?],
                [to_u256(&b[1][1])?, to_u256(&b[1][0])?],
            ],
            c: [to_u256(&proof.pi_c[0])?, to_u256(&proof.pi_c[1])?],
        })
    }

    pub fn abi_encode(&self) -> Vec<u8> {
        (self.a, self.b, self.c).abi_encode_params()
    }

    pub fn abi_decode(data: &[u8]) -> Result<Self> {
        let (a, b, c) = <([U256; 2], [[U256; 2]; 2], [U256; 2])>::abi_decode_params(data, true)
            .map_err(|e| Error::EncodingMismatch(format!("proof bytes: {}", e)))?;
        Ok(Self { a, b, c })
    }
}

fn to_u256(value: &str) -> Result<U256> {
    U256::from_str_radix(value, 10)
        .map_err(|e| Error::invalid_input(format!("proof coordinate {}: {}", value, e)))
}

/// `abi.encode(uint256[2] a, uint256[2][2] b, uint256[2] c)` of a snarkjs proof
pub fn encode_proof(proof: &Groth16Proof) -> Result<Bytes> {
    Ok(SolidityProof::from_groth16(proof)?.abi_encode().into())
}

pub fn encode_aigc_data(image: &[u8], author: Address, request_id: U256) -> Bytes {
    (Bytes::copy_from_slice(image), author, request_id)
        .abi_encode_params()
        .into()
}

pub fn decode_aigc_data(data: &[u8]) -> Result<AigcData> {
    let (image, author, request_id) = <(Bytes, Address, U256)>::abi_decode_params(data, true)
        .map_err(|e| Error::EncodingMismatch(format!("aigcData: {}", e)))?;

    Ok(AigcData {
        image: image.to_vec(),
        author,
        request_id,
    })
}

/// Arguments of the mint call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintCalldata {
    pub prompt: Bytes,
    pub aigc_data: Bytes,
    pub proof: Bytes,
}

impl MintCalldata {
    pub fn new(request: &ProofRequest, proof: &Groth16Proof) -> Result<Self> {
        Ok(Self {
            prompt: Bytes::copy_from_slice(request.prompt.as_bytes()),
            aigc_data: encode_aigc_data(&request.image, request.author, request.request_id.to_u256()),
            proof: encode_proof(proof)?,
        })
    }

    /// `abi.encode(prompt, aigcData, proof)`
    pub fn encode(&self) -> Vec<u8> {
        (self.prompt.clone(), self.aigc_data.clone(), self.proof.clone()).abi_encode_params()
    }

    pub fn decode(data: &[u8]) -> Result<Self> {
        let (prompt, aigc_data, proof) = <(Bytes, Bytes, Bytes)>::abi_decode_params(data, true)
            .map_err(|e| Error::EncodingMismatch(format!("mint calldata: {}", e)))?;
        Ok(Self {
            prompt,
            aigc_data,
            proof,
        })
    }

    /// Full transaction input: selector followed by the encoded arguments
    pub fn to_call_data(&self) -> Vec<u8> {
        mintCall {
            prompt: self.prompt.clone(),
            aigcData: self.aigc_data.clone(),
            proof: self.proof.clone(),
        }
        .abi_encode()
    }

    pub fn from_call_data(data: &[u8]) -> Result<Self> {
        let call = mintCall::abi_decode(data, true)
            .map_err(|e| Error::EncodingMismatch(format!("mint call: {}", e)))?;
        Ok(Self {
            prompt: call.prompt,
            aigc_data: call.aigcData,
            proof: call.proof,
        })
    }
}
