//! Circuit artifacts checked once at startup and shared read-only

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::Config;

/// Header fields of a snarkjs verification key
#[derive(Debug, Deserialize)]
struct VerificationKeyHeader {
    protocol: String,
    curve: String,
    #[serde(rename = "nPublic")]
    n_public: usize,
}

/// Paths to the compiled circuit and its keys
#[derive(Debug, Clone)]
pub struct CircuitArtifacts {
    pub circuit_wasm: PathBuf,
    pub witness_script: PathBuf,
    pub proving_key: PathBuf,
    pub verification_key: PathBuf,

    /// Number of public signals the verification key expects
    pub n_public: usize,
}

impl CircuitArtifacts {
    /// Check every artifact exists and read the verification key header
    pub fn load(config: &Config) -> Result<Self> {
        require_file(&config.circuit_wasm, "circuit wasm; compile the circuit first")?;
        require_file(&config.witness_script, "witness generation script")?;
        require_file(&config.proving_key, "proving key; run the trusted setup first")?;
        require_file(&config.verification_key, "verification key")?;

        let raw = std::fs::read_to_string(&config.verification_key).with_context(|| {
            format!(
                "Failed to read verification key: {}",
                config.verification_key.display()
            )
        })?;
        let header: VerificationKeyHeader =
            serde_json::from_str(&raw).context("Failed to parse verification key")?;

        if header.protocol != "groth16" {
            anyhow::bail!("Verification key is for {}, expected groth16", header.protocol);
        }
        if header.n_public == 0 {
            anyhow::bail!("Verification key declares no public signals");
        }

        info!(
            "Loaded verification key ({}, {} public signals)",
            header.curve, header.n_public
        );

        Ok(Self {
            circuit_wasm: config.circuit_wasm.clone(),
            witness_script: config.witness_script.clone(),
            proving_key: config.proving_key.clone(),
            verification_key: config.verification_key.clone(),
            n_public: header.n_public,
        })
    }
}

fn require_file(path: &Path, what: &str) -> Result<()> {
    if !path.is_file() {
        anyhow::bail!("{} not found ({})", path.display(), what);
    }
    Ok(())
}
