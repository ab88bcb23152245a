//! Circuit input construction
//!
//! Each request field is reduced to one BN254 scalar by a Poseidon digest of
//! its full byte string, and those four digests are the circuit's input
//! signals. The public-input hash binds them as
//! `Poseidon(prompt, Poseidon(image, author, requestId))`.
//!
//! Poseidon uses the circomlib parameters so the digests agree with the
//! `Poseidon` template inside the circuit.

use ark_bn254::Fr;
use ark_ff::{BigInteger, PrimeField};
use light_poseidon::{Poseidon, PoseidonHasher};
use num_bigint::BigUint;
use serde_json::{Map, Value};

use crate::proof::PublicSignals;
use crate::request::ProofRequest;
use crate::{Error, Result};

/// Input signal names declared by the circuit, in declaration order
pub const CIRCUIT_SIGNALS: [&str; 4] = ["prompt", "image", "author", "requestId"];

/// Bytes per chunk; 31 bytes always fit below the scalar field modulus
const CHUNK_BYTES: usize = 31;

/// Poseidon hash over 1..=12 field elements
pub fn poseidon_hash(inputs: &[Fr]) -> Result<Fr> {
    let mut hasher = Poseidon::<Fr>::new_circom(inputs.len())?;
    Ok(hasher.hash(inputs)?)
}

/// Digest an arbitrary byte string into one field element.
///
/// The chain is seeded with the byte length so inputs that differ only by
/// trailing zero bytes do not collide.
pub fn field_digest(bytes: &[u8]) -> Result<Fr> {
    let mut hasher = Poseidon::<Fr>::new_circom(2)?;
    let mut state = Fr::from(bytes.len() as u64);

    for chunk in bytes.chunks(CHUNK_BYTES) {
        state = hasher.hash(&[state, Fr::from_be_bytes_mod_order(chunk)])?;
    }

    Ok(state)
}

/// Decimal string form used by circom and snarkjs
pub fn fr_to_decimal(value: &Fr) -> String {
    BigUint::from_bytes_be(&value.into_bigint().to_bytes_be()).to_string()
}

/// Parse a canonical decimal field element
pub fn fr_from_decimal(value: &str) -> Result<Fr> {
    let invalid = || Error::invalid_input(format!("not a field element: {:?}", value));

    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let n = BigUint::parse_bytes(value.as_bytes(), 10).ok_or_else(invalid)?;
    if n >= BigUint::from(Fr::MODULUS) {
        return Err(invalid());
    }

    Ok(Fr::from_be_bytes_mod_order(&n.to_bytes_be()))
}

/// The named signal set fed to the witness generator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitInput {
    pub prompt: Fr,
    pub image: Fr,
    pub author: Fr,
    pub request_id: Fr,
}

impl CircuitInput {
    pub fn build(request: &ProofRequest) -> Result<Self> {
        Ok(Self {
            prompt: field_digest(request.prompt.as_bytes())?,
            image: field_digest(&request.image)?,
            author: field_digest(request.author.as_slice())?,
            request_id: field_digest(request.request_id.as_bytes())?,
        })
    }

    /// Signals paired with their circuit names
    pub fn signals(&self) -> [(&'static str, Fr); 4] {
        [
            (CIRCUIT_SIGNALS[0], self.prompt),
            (CIRCUIT_SIGNALS[1], self.image),
            (CIRCUIT_SIGNALS[2], self.author),
            (CIRCUIT_SIGNALS[3], self.request_id),
        ]
    }

    /// Digest of the AIGC data tuple (image, author, requestId)
    pub fn aigc_hash(&self) -> Result<Fr> {
        poseidon_hash(&[self.image, self.author, self.request_id])
    }

    /// Public-input hash the circuit exposes as its first public signal
    pub fn public_hash(&self) -> Result<Fr> {
        poseidon_hash(&[self.prompt, self.aigc_hash()?])
    }

    /// `input.json` contents for the witness generator
    pub fn to_input_json(&self) -> Value {
        let signals = self
            .signals()
            .iter()
            .map(|(name, value)| (name.to_string(), Value::String(fr_to_decimal(value))))
            .collect::<Map<_, _>>();
        Value::Object(signals)
    }

    /// Parse an `input.json` object back into signals
    pub fn from_input_json(value: &Value) -> Result<Self> {
        let field = |name: &str| -> Result<Fr> {
            let raw = value.get(name).and_then(Value::as_str).ok_or_else(|| {
                Error::EncodingMismatch(format!("circuit input is missing signal {}", name))
            })?;
            fr_from_decimal(raw)
        };

        Ok(Self {
            prompt: field(CIRCUIT_SIGNALS[0])?,
            image: field(CIRCUIT_SIGNALS[1])?,
            author: field(CIRCUIT_SIGNALS[2])?,
            request_id: field(CIRCUIT_SIGNALS[3])?,
        })
    }
}

/// Confirm the prover's first public signal is the hash we computed
pub fn check_public_signals(signals: &PublicSignals, expected: &Fr) -> Result<()> {
    let reported = signals
        .public_hash()
        .ok_or_else(|| Error::EncodingMismatch("prover returned no public signals".into()))?;

    let reported = fr_from_decimal(reported)
        .map_err(|_| Error::EncodingMismatch(format!("public signal is not a field element: {}", reported)))?;

    if reported != *expected {
        return Err(Error::EncodingMismatch(format!(
            "public hash {} does not match computed {}",
            fr_to_decimal(&reported),
            fr_to_decimal(expected)
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::RequestId;
    use alloy_primitives::Address;

    fn request() -> ProofRequest {
        let mut image = vec![0xaau8; 32];
        image[31] = 0x01;
        ProofRequest::new(
            "pixel panda".into(),
            image,
            Address::from([0x11u8; 20]),
            RequestId::parse("r-1").unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_poseidon_matches_circomlib() {
        // circomlibjs poseidon([1, 2])
        let hash = poseidon_hash(&[Fr::from(1u64), Fr::from(2u64)]).unwrap();
        assert_eq!(
            fr_to_decimal(&hash),
            "7853200120776062878684798364095072458815029376092732009249414926327459813530"
        );
    }

    #[test]
    fn test_digest_is_length_bound() {
        assert_ne!(field_digest(&[0]).unwrap(), field_digest(&[0, 0]).unwrap());
        assert_ne!(field_digest(&[1u8; 31]).unwrap(), field_digest(&[1u8; 32]).unwrap());
    }

    #[test]
    fn test_long_inputs_are_fully_bound() {
        let a = vec![7u8; 4096];
        let mut b = a.clone();
        b[4000] = 8;
        assert_ne!(field_digest(&a).unwrap(), field_digest(&b).unwrap());
    }

    #[test]
    fn test_build_is_deterministic() {
        let first = CircuitInput::build(&request()).unwrap();
        let second = CircuitInput::build(&request()).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.public_hash().unwrap(), second.public_hash().unwrap());
    }

    #[test]
    fn test_single_field_changes_public_hash() {
        let base = request();
        let base_hash = CircuitInput::build(&base).unwrap().public_hash().unwrap();

        let mut prompt = base.clone();
        prompt.prompt = "pixel pandas".into();

        let mut image = base.clone();
        image.image[0] ^= 0x01;

        let mut author = base.clone();
        author.author = Address::from([0x12u8; 20]);

        let mut request_id = base.clone();
        request_id.request_id = RequestId::parse("r-2").unwrap();

        for changed in [prompt, image, author, request_id] {
            let hash = CircuitInput::build(&changed).unwrap().public_hash().unwrap();
            assert_ne!(hash, base_hash);
        }
    }

    #[test]
    fn test_input_json_uses_circuit_names() {
        let input = CircuitInput::build(&request()).unwrap();
        let json = input.to_input_json();

        for name in CIRCUIT_SIGNALS {
            assert!(json[name].is_string(), "missing {}", name);
        }
        assert_eq!(CircuitInput::from_input_json(&json).unwrap(), input);
    }

    #[test]
    fn test_decimal_parsing() {
        let value = Fr::from(123456789u64);
        assert_eq!(fr_from_decimal(&fr_to_decimal(&value)).unwrap(), value);
        assert_eq!(fr_to_decimal(&Fr::from(0u64)), "0");

        assert!(fr_from_decimal("").is_err());
        assert!(fr_from_decimal("-1").is_err());
        // scalar field modulus itself is out of range
        assert!(fr_from_decimal(
            "21888242871839275222246405745257275088548364400416034343698204186575808495617"
        )
        .is_err());
    }

    #[test]
    fn test_check_public_signals() {
        let expected = CircuitInput::build(&request()).unwrap().public_hash().unwrap();
        let good = PublicSignals::new(vec![fr_to_decimal(&expected)]);
        assert!(check_public_signals(&good, &expected).is_ok());

        let wrong = PublicSignals::new(vec!["1".into()]);
        assert!(matches!(
            check_public_signals(&wrong, &expected),
            Err(Error::EncodingMismatch(_))
        ));

        assert!(matches!(
            check_public_signals(&PublicSignals::default(), &expected),
            Err(Error::EncodingMismatch(_))
        ));
    }
}
