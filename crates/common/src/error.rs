use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Encoding mismatch: {0}")]
    EncodingMismatch(String),

    #[error("Circuit evaluation failed: {0}")]
    CircuitEvaluation(String),

    #[error("Proving failed: {0}")]
    Proving(String),

    #[error("{stage} timed out after {}s", after.as_secs())]
    ProvingTimeout { stage: &'static str, after: Duration },

    #[error("Proof verification failed")]
    VerificationFailed,

    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("JSON serialization error: {0}")]
    JsonSerialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }

    /// HTTP status code this error maps to at the service boundary
    pub fn status_code(&self) -> u16 {
        match self {
            Error::InvalidInput(_) => 400,
            _ => 500,
        }
    }
}

impl From<hex::FromHexError> for Error {
    fn from(err: hex::FromHexError) -> Self {
        Error::InvalidInput(format!("invalid hex: {}", err))
    }
}

impl From<light_poseidon::PoseidonError> for Error {
    fn from(err: light_poseidon::PoseidonError) -> Self {
        Error::EncodingMismatch(format!("poseidon: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
