//! Input normalization for proof requests
//!
//! A [`ProofRequest`] is the typed, fixed-width form of the four values bound
//! into a mint proof. It can be built from the hex wire format spoken by the
//! proof service or from the plain fields a wallet user submits.

use alloy_primitives::{Address, U256};
use std::fmt;

use crate::api::{AigcDataInput, ProofInput};
use crate::{Error, Result};

/// Largest text request id that fits a `bytes32` with a trailing NUL
const MAX_TEXT_REQUEST_ID: usize = 31;

/// A request identifier as a 32-byte big-endian word (`uint256` on chain)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId([u8; 32]);

impl RequestId {
    pub fn new(word: [u8; 32]) -> Self {
        Self(word)
    }

    /// Build from big-endian bytes of at most 32 bytes, left padded
    pub fn from_be_slice(bytes: &[u8]) -> Result<Self> {
        if bytes.is_empty() {
            return Err(Error::invalid_input("requestId is required"));
        }
        if bytes.len() > 32 {
            return Err(Error::invalid_input(format!(
                "requestId must be at most 32 bytes, got {}",
                bytes.len()
            )));
        }

        let mut word = [0u8; 32];
        word[32 - bytes.len()..].copy_from_slice(bytes);
        Ok(Self(word))
    }

    /// Parse a user-supplied identifier.
    ///
    /// Decimal digits and `0x` hex are taken as a number. Anything else is
    /// text, stored right padded like a Solidity `bytes32` string.
    pub fn parse(value: &str) -> Result<Self> {
        let value = value.trim();
        if value.is_empty() {
            return Err(Error::invalid_input("requestId is required"));
        }

        if value.bytes().all(|b| b.is_ascii_digit()) {
            let n = U256::from_str_radix(value, 10).map_err(|e| {
                Error::invalid_input(format!("requestId does not fit uint256: {}", e))
            })?;
            return Ok(Self(n.to_be_bytes::<32>()));
        }

        if let Some(digits) = strip_hex_prefix(value) {
            let bytes = hex::decode(digits)
                .map_err(|e| Error::invalid_input(format!("requestId is not valid hex: {}", e)))?;
            return Self::from_be_slice(&bytes);
        }

        let text = value.as_bytes();
        if text.len() > MAX_TEXT_REQUEST_ID {
            return Err(Error::invalid_input(format!(
                "requestId text must be at most {} bytes, got {}",
                MAX_TEXT_REQUEST_ID,
                text.len()
            )));
        }

        let mut word = [0u8; 32];
        word[..text.len()].copy_from_slice(text);
        Ok(Self(word))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_u256(&self) -> U256 {
        U256::from_be_bytes(self.0)
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// Normalized proof request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofRequest {
    pub prompt: String,
    pub image: Vec<u8>,
    pub author: Address,
    pub request_id: RequestId,
}

impl ProofRequest {
    pub fn new(prompt: String, image: Vec<u8>, author: Address, request_id: RequestId) -> Result<Self> {
        if prompt.is_empty() {
            return Err(Error::invalid_input("prompt is required"));
        }
        if image.is_empty() {
            return Err(Error::invalid_input("image is required"));
        }

        Ok(Self {
            prompt,
            image,
            author,
            request_id,
        })
    }

    /// Normalize the hex wire form received by the proof service
    pub fn from_wire(input: &ProofInput) -> Result<Self> {
        let prompt_bytes = decode_hex_field("prompt", &input.prompt)?;
        let prompt = String::from_utf8(prompt_bytes)
            .map_err(|_| Error::invalid_input("prompt is not valid UTF-8"))?;

        let image = decode_hex_field("image", &input.aigc_data.image)?;
        let author = address_from_bytes(&decode_hex_field("author", &input.aigc_data.author)?)?;
        let request_id =
            RequestId::from_be_slice(&decode_hex_field("requestId", &input.aigc_data.request_id)?)?;

        Self::new(prompt, image, author, request_id)
    }

    /// Normalize the plain fields a user submits.
    ///
    /// `image` is either `0x` hex or a reference such as a URL, which is
    /// bound by its UTF-8 bytes.
    pub fn from_plain(prompt: &str, image: &str, author: &str, request_id: &str) -> Result<Self> {
        let image = image.trim();
        let image_bytes = match strip_hex_prefix(image) {
            Some(digits) => hex::decode(digits)
                .map_err(|e| Error::invalid_input(format!("image is not valid hex: {}", e)))?,
            None => image.as_bytes().to_vec(),
        };

        let author = address_from_bytes(&decode_hex_field("author", author)?)?;
        let request_id = RequestId::parse(request_id)?;

        Self::new(prompt.to_string(), image_bytes, author, request_id)
    }

    /// Hex wire form for the proof service
    pub fn to_wire(&self) -> ProofInput {
        ProofInput {
            prompt: format!("0x{}", hex::encode(self.prompt.as_bytes())),
            aigc_data: AigcDataInput {
                image: format!("0x{}", hex::encode(&self.image)),
                author: format!("0x{}", hex::encode(self.author.as_slice())),
                request_id: self.request_id.to_string(),
            },
        }
    }
}

fn strip_hex_prefix(value: &str) -> Option<&str> {
    value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
}

fn decode_hex_field(name: &str, value: &str) -> Result<Vec<u8>> {
    let value = value.trim();
    let digits = strip_hex_prefix(value).unwrap_or(value);
    if digits.is_empty() {
        return Err(Error::invalid_input(format!("{} is required", name)));
    }

    hex::decode(digits).map_err(|e| Error::invalid_input(format!("{} is not valid hex: {}", name, e)))
}

fn address_from_bytes(bytes: &[u8]) -> Result<Address> {
    let raw: [u8; 20] = bytes.try_into().map_err(|_| {
        Error::invalid_input(format!("author must be exactly 20 bytes, got {}", bytes.len()))
    })?;
    Ok(Address::from(raw))
}
