//! Proof request pipeline
//!
//! Sequences normalization, circuit input construction, witness generation,
//! proving and the optional post-proof verification for a single request.
//! A failure at any stage moves the request to [`Stage::Failed`] and ends
//! it; the failing stage and reason go to the request's log span. Nothing is
//! retried because proving is expensive.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use remix_common::circuit::fr_to_decimal;
use remix_common::{
    check_public_signals, CircuitInput, Error, Fr, Groth16Proof, ProofInput, ProofRequest,
    ProofResponse, PublicSignals, Result,
};

use crate::prover::ProvingBackend;
use crate::scratch::Scratch;

/// Request lifecycle stages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    Normalizing,
    BuildingInput,
    GeneratingWitness,
    Proving,
    Verifying,
    Responding,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Received => "received",
            Stage::Normalizing => "normalizing",
            Stage::BuildingInput => "building_input",
            Stage::GeneratingWitness => "generating_witness",
            Stage::Proving => "proving",
            Stage::Verifying => "verifying",
            Stage::Responding => "responding",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Result of a successful proof request
#[derive(Debug, Clone)]
pub struct ProofOutcome {
    pub request_id: Uuid,
    pub public_hash: Fr,
    pub proof: Groth16Proof,
    pub public_signals: PublicSignals,
    pub verified: bool,
}

impl ProofOutcome {
    pub fn into_response(self) -> Result<ProofResponse> {
        Ok(ProofResponse {
            public_hash: fr_to_decimal(&self.public_hash),
            proof: self.proof.to_json_string()?,
            public_inputs: self.public_signals.into_inner(),
            verified: self.verified,
        })
    }
}

/// Proof generation and verification over a [`ProvingBackend`]
pub struct ProofPipeline {
    backend: Arc<dyn ProvingBackend>,
    work_dir: PathBuf,
    verify_after_prove: bool,
    n_public: Option<usize>,
}

impl ProofPipeline {
    pub fn new(backend: Arc<dyn ProvingBackend>, work_dir: PathBuf) -> Self {
        Self {
            backend,
            work_dir,
            verify_after_prove: true,
            n_public: None,
        }
    }

    pub fn with_verification(mut self, enabled: bool) -> Self {
        self.verify_after_prove = enabled;
        self
    }

    /// Reject `/verify` calls whose signal count differs from the key's
    pub fn with_public_signal_count(mut self, n_public: usize) -> Self {
        self.n_public = Some(n_public);
        self
    }

    /// Generate (and by default verify) a proof for a wire request
    pub async fn generate(&self, input: &ProofInput) -> Result<ProofOutcome> {
        let request_id = Uuid::new_v4();
        let span = info_span!("proof", request_id = %request_id);

        async move {
            info!("Received proof request");
            let mut stage = Stage::Received;

            let result = self.run(request_id, input, &mut stage).await;
            match &result {
                Ok(outcome) => info!(
                    "Proof request completed (verified: {})",
                    outcome.verified
                ),
                Err(e) => {
                    error!("Proof request failed at stage {}: {}", stage, e);
                    advance(&mut stage, Stage::Failed);
                }
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn run(&self, request_id: Uuid, input: &ProofInput, stage: &mut Stage) -> Result<ProofOutcome> {
        advance(stage, Stage::Normalizing);
        let request = ProofRequest::from_wire(input)?;

        advance(stage, Stage::BuildingInput);
        let circuit_input = CircuitInput::build(&request)?;
        let public_hash = circuit_input.public_hash()?;
        debug!("Computed public hash {}", fr_to_decimal(&public_hash));

        let scratch = Scratch::create(&self.work_dir, request_id)?;

        advance(stage, Stage::GeneratingWitness);
        let witness = self.backend.evaluate_circuit(&circuit_input, &scratch).await?;

        advance(stage, Stage::Proving);
        let (proof, public_signals) = self.backend.prove(witness, &scratch).await?;
        check_public_signals(&public_signals, &public_hash)?;

        let verified = if self.verify_after_prove {
            advance(stage, Stage::Verifying);
            self.backend.verify(&proof, &public_signals, &scratch).await?
        } else {
            false
        };

        advance(stage, Stage::Responding);
        Ok(ProofOutcome {
            request_id,
            public_hash,
            proof,
            public_signals,
            verified,
        })
    }

    /// Verify a caller-supplied proof.
    ///
    /// Shape errors are invalid input. Coordinates or signals that are not
    /// field elements cannot verify, so they return `false`.
    pub async fn verify(&self, proof: &Groth16Proof, signals: &PublicSignals) -> Result<bool> {
        proof.check_shape()?;

        if signals.is_empty() {
            return Err(Error::invalid_input("public_inputs must not be empty"));
        }
        if let Some(expected) = self.n_public {
            if signals.len() != expected {
                return Err(Error::invalid_input(format!(
                    "expected {} public inputs, got {}",
                    expected,
                    signals.len()
                )));
            }
        }

        if let Err(e) = proof.validate().and_then(|_| signals.to_field_elements()) {
            warn!("Rejecting proof without running verifier: {}", e);
            return Ok(false);
        }

        let request_id = Uuid::new_v4();
        let scratch = Scratch::create(&self.work_dir, request_id)?;

        self.backend
            .verify(proof, signals, &scratch)
            .instrument(info_span!("verify", request_id = %request_id))
            .await
    }
}

fn advance(stage: &mut Stage, next: Stage) {
    debug!("{} -> {}", stage, next);
    *stage = next;
}
