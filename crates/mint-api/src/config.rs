//! Configuration for the mint API

use anyhow::Result;
use std::env;
use std::time::Duration;

use crate::proof_client::RetryPolicy;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,

    /// Base URL of the proof generation service
    pub proof_service_url: String,

    /// Per-attempt limit for a proof request; proving can take minutes
    pub proof_service_timeout: Duration,

    pub retry: RetryPolicy,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Config {
            host: env::var("MINT_API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_var("MINT_API_PORT", "3001")?,
            proof_service_url: env::var("PROOF_SERVICE_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:8084".to_string()),
            proof_service_timeout: Duration::from_secs(parse_var(
                "PROOF_SERVICE_TIMEOUT_SECS",
                "600",
            )?),
            retry: RetryPolicy {
                max_attempts: parse_var("PROOF_SERVICE_MAX_ATTEMPTS", "4")?,
                base_delay: Duration::from_millis(parse_var("PROOF_SERVICE_BACKOFF_MS", "250")?),
                ..RetryPolicy::default()
            },
        };

        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.port == 0 {
            anyhow::bail!("MINT_API_PORT must be greater than 0");
        }
        if !self.proof_service_url.starts_with("http://")
            && !self.proof_service_url.starts_with("https://")
        {
            anyhow::bail!(
                "PROOF_SERVICE_URL must be an http(s) URL, got {}",
                self.proof_service_url
            );
        }
        if self.proof_service_timeout.is_zero() {
            anyhow::bail!("PROOF_SERVICE_TIMEOUT_SECS must be greater than 0");
        }
        if self.retry.max_attempts == 0 {
            anyhow::bail!("PROOF_SERVICE_MAX_ATTEMPTS must be at least 1");
        }

        Ok(())
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T>(key: &str, default: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = env::var(key).unwrap_or_else(|_| default.to_string());
    raw.parse()
        .map_err(|e| anyhow::anyhow!("Invalid {}: {} ({})", key, raw, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config {
            host: "127.0.0.1".to_string(),
            port: 3001,
            proof_service_url: "http://127.0.0.1:8084".to_string(),
            proof_service_timeout: Duration::from_secs(600),
            retry: RetryPolicy::default(),
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(config().validate().is_ok());
        assert_eq!(config().address(), "127.0.0.1:3001");
    }

    #[test]
    fn test_rejects_bad_proof_service_url() {
        let config = Config {
            proof_service_url: "127.0.0.1:8084".to_string(),
            ..config()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("PROOF_SERVICE_URL"));
    }

    #[test]
    fn test_rejects_zero_attempts() {
        let mut config = config();
        config.retry.max_attempts = 0;
        assert!(config.validate().is_err());
    }
}
