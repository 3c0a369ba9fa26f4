// # HTTP IP Resolver
//
// This crate provides the HTTP-based public IP resolver for cdu.
//
// ## Architecture
//
// Fetches the current IP from a primary "what is my IP" service (e.g.,
// api.ipify.org) and, when that service cannot be reached at all, from a
// secondary one (e.g., icanhazip.com). Both answer with the address as plain
// text in the response body.
//
// ## Fallback Rules
//
// - Transport failure on the primary (refused, DNS failure, reset, timeout)
//   → try the secondary
// - HTTP error status from the primary → fail, the secondary is not tried
// - No retries beyond the single fallback; the daemon retries next cycle
//
// The body is trimmed but not validated as an IP literal.

use cdu_core::config::IpLookupConfig;
use cdu_core::traits::IpResolver;
use cdu_core::{Error, Result};

use std::time::Duration;

/// Why a single endpoint lookup failed
#[derive(Debug)]
enum LookupError {
    /// The endpoint could not be reached or the body could not be read
    Unreachable(String),
    /// The endpoint answered with a non-success status
    Status(String),
}

/// HTTP-based public IP resolver with one fallback endpoint
pub struct HttpIpResolver {
    /// Endpoint tried first
    primary_url: String,

    /// Endpoint tried when the primary is unreachable
    secondary_url: String,

    /// HTTP client
    client: reqwest::Client,
}

impl std::fmt::Debug for HttpIpResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpIpResolver")
            .field("primary_url", &self.primary_url)
            .field("secondary_url", &self.secondary_url)
            .finish()
    }
}

impl HttpIpResolver {
    /// Create a resolver from configuration
    pub fn new(config: &IpLookupConfig) -> Result<Self> {
        config.validate()?;
        Self::with_endpoints(
            config.primary_url.clone(),
            config.secondary_url.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// Create a resolver with explicit endpoints and request timeout
    pub fn with_endpoints(
        primary_url: impl Into<String>,
        secondary_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            primary_url: primary_url.into(),
            secondary_url: secondary_url.into(),
            client,
        })
    }

    /// Fetch the IP text from one endpoint
    async fn fetch_ip(&self, url: &str) -> std::result::Result<String, LookupError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| LookupError::Unreachable(format!("Request to {} failed: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(LookupError::Status(format!(
                "{} answered with HTTP {}",
                url,
                response.status()
            )));
        }

        let ip_text = response.text().await.map_err(|e| {
            LookupError::Unreachable(format!("Failed to read response from {}: {}", url, e))
        })?;

        Ok(ip_text.trim().to_string())
    }
}

#[async_trait::async_trait]
impl IpResolver for HttpIpResolver {
    async fn resolve(&self) -> Result<String> {
        match self.fetch_ip(&self.primary_url).await {
            Ok(ip) => Ok(ip),
            Err(LookupError::Status(msg)) => Err(Error::network(msg)),
            Err(LookupError::Unreachable(primary_err)) => {
                tracing::warn!("{}; falling back to {}", primary_err, self.secondary_url);

                match self.fetch_ip(&self.secondary_url).await {
                    Ok(ip) => Ok(ip),
                    Err(LookupError::Status(msg)) | Err(LookupError::Unreachable(msg)) => {
                        Err(Error::network(format!("{}; {}", primary_err, msg)))
                    }
                }
            }
        }
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
