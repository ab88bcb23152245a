//! Client for the Proof Generation Service
//!
//! Connection failures and 502/503 are treated as the service being
//! unavailable and retried with exponential backoff. Nothing else is retried.
//! A timeout or a 504 means a proving job may already be running, and
//! resubmitting it would start another one.

use anyhow::anyhow;
use reqwest::StatusCode;
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use remix_common::{Error, ErrorResponse, ProofInput, ProofResponse, Result};

/// Backoff schedule for unavailable upstreams
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Delay after the given (zero-based) failed attempt
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

pub struct ProofServiceClient {
    base_url: String,
    client: reqwest::Client,
    timeout: Duration,
    retry: RetryPolicy,
}

impl ProofServiceClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration, retry: RetryPolicy) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Other(anyhow!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
            timeout,
            retry,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Request a proof for normalized, hex-encoded fields
    pub async fn generate_proof(&self, input: &ProofInput) -> Result<ProofResponse> {
        self.post_with_retry("/proof", input).await
    }

    /// Check if the proof service is up
    pub async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/health", self.base_url);
        match self.client.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(e) if e.is_connect() || e.is_timeout() => Ok(false),
            Err(e) => Err(Error::Other(anyhow!("Health check failed: {}", e))),
        }
    }

    async fn post_with_retry<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        let mut last_failure = String::new();

        for attempt in 0..self.retry.max_attempts {
            debug!("POST {} (attempt {})", url, attempt + 1);

            match self.client.post(&url).json(body).send().await {
                Ok(response) if response.status().is_success() => {
                    return response.json::<T>().await.map_err(|e| {
                        Error::Other(anyhow!("Failed to parse response from {}: {}", url, e))
                    });
                }
                Ok(response) if is_unavailable(response.status()) => {
                    last_failure = format!("status {}", response.status());
                }
                Ok(response) => {
                    let status = response.status();
                    let message = match response.json::<ErrorResponse>().await {
                        Ok(body) => body.error,
                        Err(_) => status.to_string(),
                    };
                    return Err(upstream_error(status, message));
                }
                Err(e) if e.is_timeout() => {
                    warn!("Proof service did not answer within {:?}", self.timeout);
                    return Err(Error::ProvingTimeout {
                        stage: "proof service request",
                        after: self.timeout,
                    });
                }
                Err(e) if e.is_connect() => {
                    last_failure = e.to_string();
                }
                Err(e) => {
                    return Err(Error::Other(anyhow!("Request to {} failed: {}", url, e)));
                }
            }

            if attempt + 1 < self.retry.max_attempts {
                let delay = self.retry.delay(attempt);
                warn!(
                    "Proof service unavailable ({}), retrying in {:?}",
                    last_failure, delay
                );
                tokio::time::sleep(delay).await;
            }
        }

        Err(Error::UpstreamUnavailable(format!(
            "{} after {} attempts: {}",
            url, self.retry.max_attempts, last_failure
        )))
    }
}

fn is_unavailable(status: StatusCode) -> bool {
    matches!(status, StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE)
}

fn upstream_error(status: StatusCode, message: String) -> Error {
    if status.is_client_error() {
        Error::InvalidInput(message)
    } else {
        Error::Proving(format!("proof service returned {}: {}", status.as_u16(), message))
    }
}
