//! Groth16 proving backend
//!
//! Witness generation, proving and verification run in an external toolkit
//! (circom's witness generator under node, and snarkjs). [`ProvingBackend`]
//! is the capability the pipeline needs from it.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, warn};

use remix_common::{CircuitInput, Error, Groth16Proof, PublicSignals, Result};

use crate::artifacts::CircuitArtifacts;
use crate::scratch::Scratch;

/// Witness file produced for a single request
///
/// Not `Clone`: the prover takes it by value and it is consumed once.
#[derive(Debug)]
pub struct Witness {
    path: PathBuf,
}

impl Witness {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
pub trait ProvingBackend: Send + Sync {
    /// Evaluate the circuit on `input`, writing the witness into `scratch`
    async fn evaluate_circuit(&self, input: &CircuitInput, scratch: &Scratch) -> Result<Witness>;

    /// Produce a proof and public signals from a witness
    async fn prove(&self, witness: Witness, scratch: &Scratch) -> Result<(Groth16Proof, PublicSignals)>;

    /// Check a proof. `Ok(false)` means the proof is invalid; `Err` is
    /// reserved for failures to run the check at all.
    async fn verify(
        &self,
        proof: &Groth16Proof,
        signals: &PublicSignals,
        scratch: &Scratch,
    ) -> Result<bool>;
}

/// Backend that shells out to node and snarkjs
pub struct SnarkjsBackend {
    artifacts: Arc<CircuitArtifacts>,
    node_bin: String,
    snarkjs_bin: String,
    node_max_old_space_mb: u32,
    timeout: Duration,
}

impl SnarkjsBackend {
    pub fn new(artifacts: Arc<CircuitArtifacts>, timeout: Duration) -> Self {
        Self {
            artifacts,
            node_bin: "node".to_string(),
            snarkjs_bin: "snarkjs".to_string(),
            node_max_old_space_mb: 8192,
            timeout,
        }
    }

    pub fn with_node(mut self, node_bin: impl Into<String>, max_old_space_mb: u32) -> Self {
        self.node_bin = node_bin.into();
        self.node_max_old_space_mb = max_old_space_mb;
        self
    }

    pub fn with_snarkjs(mut self, snarkjs_bin: impl Into<String>) -> Self {
        self.snarkjs_bin = snarkjs_bin.into();
        self
    }

    /// Run a toolkit command under the configured timeout.
    ///
    /// The child is killed if the timeout fires.
    async fn run(
        &self,
        stage: &'static str,
        mut command: Command,
        fail: fn(String) -> Error,
    ) -> Result<Output> {
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!("Running {}: {:?}", stage, command);

        match tokio::time::timeout(self.timeout, command.output()).await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(e)) => Err(fail(format!("failed to start {}: {}", stage, e))),
            Err(_) => Err(Error::ProvingTimeout {
                stage,
                after: self.timeout,
            }),
        }
    }
}

fn stderr_of(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    if stderr.is_empty() {
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    } else {
        stderr
    }
}

#[async_trait]
impl ProvingBackend for SnarkjsBackend {
    async fn evaluate_circuit(&self, input: &CircuitInput, scratch: &Scratch) -> Result<Witness> {
        let input_path = scratch.input_path();
        let witness_path = scratch.witness_path();

        tokio::fs::write(&input_path, serde_json::to_vec(&input.to_input_json())?).await?;

        let mut command = Command::new(&self.node_bin);
        command
            .arg(format!("--max-old-space-size={}", self.node_max_old_space_mb))
            .arg(&self.artifacts.witness_script)
            .arg(&self.artifacts.circuit_wasm)
            .arg(&input_path)
            .arg(&witness_path);

        let output = self
            .run("witness generation", command, Error::CircuitEvaluation)
            .await?;

        if !output.status.success() {
            let stderr = stderr_of(&output);
            warn!("Witness generation failed: {}", stderr);
            return Err(Error::CircuitEvaluation(stderr));
        }
        if !witness_path.is_file() {
            return Err(Error::CircuitEvaluation(
                "witness generator exited without writing a witness".to_string(),
            ));
        }

        info!("Witness generated for request {}", scratch.id());
        Ok(Witness::new(witness_path))
    }

    async fn prove(&self, witness: Witness, scratch: &Scratch) -> Result<(Groth16Proof, PublicSignals)> {
        let proof_path = scratch.proof_path();
        let public_path = scratch.public_path();

        let mut command = Command::new(&self.snarkjs_bin);
        command
            .args(["groth16", "prove"])
            .arg(&self.artifacts.proving_key)
            .arg(witness.path())
            .arg(&proof_path)
            .arg(&public_path);

        let output = self.run("proof generation", command, Error::Proving).await?;

        if let Err(e) = tokio::fs::remove_file(witness.path()).await {
            debug!("Witness already gone: {}", e);
        }

        if !output.status.success() {
            let stderr = stderr_of(&output);
            warn!("Proof generation failed: {}", stderr);
            return Err(Error::Proving(stderr));
        }

        let proof_json = tokio::fs::read_to_string(&proof_path)
            .await
            .map_err(|e| Error::Proving(format!("proof not written: {}", e)))?;
        let proof: Groth16Proof = serde_json::from_str(&proof_json)
            .map_err(|e| Error::Proving(format!("unreadable proof: {}", e)))?;
        proof
            .validate()
            .map_err(|e| Error::Proving(format!("malformed proof: {}", e)))?;

        let public_json = tokio::fs::read_to_string(&public_path)
            .await
            .map_err(|e| Error::Proving(format!("public signals not written: {}", e)))?;
        let signals: PublicSignals = serde_json::from_str(&public_json)
            .map_err(|e| Error::Proving(format!("unreadable public signals: {}", e)))?;

        info!(
            "Proof generated for request {} ({} public signals)",
            scratch.id(),
            signals.len()
        );
        Ok((proof, signals))
    }

    async fn verify(
        &self,
        proof: &Groth16Proof,
        signals: &PublicSignals,
        scratch: &Scratch,
    ) -> Result<bool> {
        let proof_path = scratch.proof_path();
        let public_path = scratch.public_path();

        tokio::fs::write(&proof_path, serde_json::to_vec(proof)?).await?;
        tokio::fs::write(&public_path, serde_json::to_vec(signals)?).await?;

        let mut command = Command::new(&self.snarkjs_bin);
        command
            .args(["groth16", "verify"])
            .arg(&self.artifacts.verification_key)
            .arg(&public_path)
            .arg(&proof_path);

        let output = self.run("proof verification", command, Error::Proving).await?;

        let verified = output.status.success();
        if verified {
            info!("Proof verified for request {}", scratch.id());
        } else {
            warn!(
                "Proof verification failed for request {}: {}",
                scratch.id(),
                stderr_of(&output)
            );
        }

        Ok(verified)
    }
}
