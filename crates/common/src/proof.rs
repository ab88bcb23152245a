//! Groth16 proof and public signal types in the snarkjs JSON layout

use ark_bn254::Fr;
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use crate::circuit::fr_from_decimal;
use crate::{Error, Result};

/// BN254 base field modulus, the bound for every proof coordinate
const BASE_FIELD_MODULUS: &str =
    "21888242871839275222246405745257275088696311157297823662689037894645226208583";

/// A Groth16 proof as written by `snarkjs groth16 prove`
///
/// Points are in projective form: `pi_a` and `pi_c` are `[x, y, z]`, `pi_b`
/// is `[[x0, x1], [y0, y1], [z0, z1]]`, all as decimal strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Groth16Proof {
    pub pi_a: Vec<String>,
    pub pi_b: Vec<Vec<String>>,
    pub pi_c: Vec<String>,
    #[serde(default = "default_protocol")]
    pub protocol: String,
    #[serde(default = "default_curve")]
    pub curve: String,
}

fn default_protocol() -> String {
    "groth16".to_string()
}

fn default_curve() -> String {
    "bn128".to_string()
}

impl Groth16Proof {
    /// Parse a proof from its JSON text, checking its shape
    pub fn from_json_str(json: &str) -> Result<Self> {
        let proof: Self = serde_json::from_str(json)
            .map_err(|e| Error::invalid_input(format!("malformed proof JSON: {}", e)))?;
        proof.check_shape()?;
        Ok(proof)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check the proof has the snarkjs shape and every coordinate is a
    /// canonical base field element
    pub fn validate(&self) -> Result<()> {
        self.check_shape()?;

        self.pi_a
            .iter()
            .chain(self.pi_b.iter().flatten())
            .chain(self.pi_c.iter())
            .try_for_each(|value| check_coordinate(value))
    }

    /// Check protocol and point dimensions only
    pub fn check_shape(&self) -> Result<()> {
        if self.protocol != "groth16" {
            return Err(Error::invalid_input(format!(
                "unsupported proof protocol: {}",
                self.protocol
            )));
        }

        check_g1("pi_a", &self.pi_a)?;
        check_g1("pi_c", &self.pi_c)?;

        if !(2..=3).contains(&self.pi_b.len()) {
            return Err(Error::invalid_input(format!(
                "pi_b must have 2 or 3 rows, got {}",
                self.pi_b.len()
            )));
        }
        for (i, row) in self.pi_b.iter().enumerate() {
            if row.len() != 2 {
                return Err(Error::invalid_input(format!(
                    "pi_b[{}] must have 2 coordinates, got {}",
                    i,
                    row.len()
                )));
            }
        }

        Ok(())
    }
}

fn check_g1(name: &str, point: &[String]) -> Result<()> {
    if !(2..=3).contains(&point.len()) {
        return Err(Error::invalid_input(format!(
            "{} must have 2 or 3 coordinates, got {}",
            name,
            point.len()
        )));
    }
    Ok(())
}

fn check_coordinate(value: &str) -> Result<()> {
    let modulus = BigUint::parse_bytes(BASE_FIELD_MODULUS.as_bytes(), 10)
        .ok_or_else(|| Error::EncodingMismatch("bad base field modulus".into()))?;

    let parsed = if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        None
    } else {
        BigUint::parse_bytes(value.as_bytes(), 10)
    };

    match parsed {
        Some(n) if n < modulus => Ok(()),
        _ => Err(Error::invalid_input(format!(
            "proof coordinate is not a base field element: {}",
            value
        ))),
    }
}

/// Ordered public signals; `[0]` is the public-input hash
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PublicSignals(pub Vec<String>);

impl PublicSignals {
    pub fn new(signals: Vec<String>) -> Self {
        Self(signals)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The public-input hash, if present
    pub fn public_hash(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    /// Parse every signal as a scalar field element
    pub fn to_field_elements(&self) -> Result<Vec<Fr>> {
        self.0.iter().map(|s| fr_from_decimal(s)).collect()
    }

    pub fn into_inner(self) -> Vec<String> {
        self.0
    }
}

impl From<Vec<String>> for PublicSignals {
    fn from(signals: Vec<String>) -> Self {
        Self(signals)
    }
}
