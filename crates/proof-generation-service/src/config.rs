//! Configuration for the Proof Generation Service
//!
//! Loads configuration from environment variables with sensible defaults.

use anyhow::{Context, Result};
use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Service configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// API server host
    pub host: String,

    /// API server port
    pub port: u16,

    /// Root directory for per-request scratch space
    pub work_dir: PathBuf,

    /// Compiled circuit (`.wasm`)
    pub circuit_wasm: PathBuf,

    /// Witness generation script emitted by circom
    pub witness_script: PathBuf,

    /// Groth16 proving key (`.zkey`)
    pub proving_key: PathBuf,

    /// Groth16 verification key (JSON)
    pub verification_key: PathBuf,

    /// Node.js executable used for witness generation
    pub node_bin: String,

    /// snarkjs executable
    pub snarkjs_bin: String,

    /// Heap limit handed to node for witness generation
    pub node_max_old_space_mb: u32,

    /// Limit for each external toolkit invocation
    pub proving_timeout: Duration,

    /// Verify every proof before returning it
    pub verify_after_prove: bool,

    /// Maximum accepted request body
    pub max_body_bytes: usize,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists (for local development)
        dotenvy::dotenv().ok();

        let config = Config {
            host: env::var("PROVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_var("PROVER_PORT", "8084")?,
            work_dir: env_path("WORK_DIR", "./work"),
            circuit_wasm: env_path("CIRCUIT_WASM", "panda_js/panda.wasm"),
            witness_script: env_path("WITNESS_SCRIPT", "panda_js/generate_witness.js"),
            proving_key: env_path("PROVING_KEY", "panda.zkey"),
            verification_key: env_path("VERIFICATION_KEY", "verification_key.json"),
            node_bin: env::var("NODE_BIN").unwrap_or_else(|_| "node".to_string()),
            snarkjs_bin: env::var("SNARKJS_BIN").unwrap_or_else(|_| "snarkjs".to_string()),
            node_max_old_space_mb: parse_var("NODE_MAX_OLD_SPACE_MB", "8192")?,
            proving_timeout: Duration::from_secs(parse_var("PROVING_TIMEOUT_SECS", "300")?),
            verify_after_prove: parse_var("VERIFY_AFTER_PROVE", "true")?,
            max_body_bytes: parse_var("MAX_BODY_BYTES", "16777216")?,
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.port == 0 {
            anyhow::bail!("PROVER_PORT must be greater than 0");
        }
        if self.proving_timeout.is_zero() {
            anyhow::bail!("PROVING_TIMEOUT_SECS must be greater than 0");
        }
        if self.max_body_bytes == 0 {
            anyhow::bail!("MAX_BODY_BYTES must be greater than 0");
        }

        Ok(())
    }

    /// Get the API server address
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Ensure the scratch root exists
    pub fn ensure_directories(&self) -> Result<()> {
        std::fs::create_dir_all(&self.work_dir).with_context(|| {
            format!("Failed to create work directory: {}", self.work_dir.display())
        })
    }
}

fn env_path(key: &str, default: &str) -> PathBuf {
    env::var(key).unwrap_or_else(|_| default.to_string()).into()
}

fn parse_var<T>(key: &str, default: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| default.to_string());
    raw.parse()
        .map_err(|e| anyhow::anyhow!("Invalid {}: {} ({})", key, raw, e))
}
