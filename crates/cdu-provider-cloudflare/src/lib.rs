// # Cloudflare DNS API Adapter
//
// This crate implements the cdu `DnsApi` / `DnsSession` traits over the
// Cloudflare v4 REST API.
//
// ## Behavior
//
// - One HTTP request per trait call, no retries (the daemon retries next cycle)
// - HTTP timeout configured (30 seconds)
// - Status codes mapped onto the cdu error taxonomy (401/403 → Auth)
// - Dry-run mode: lookups are performed, record updates are only logged
//
// ## Security Requirements
//
// - API token NEVER appears in logs or Debug output
// - Provider MUST fail fast if token is empty
// - The token is checked by the first real request (zone lookup); a 401/403
//   there surfaces as Auth
//
// ## API Reference
//
// - Cloudflare API v4: https://developers.cloudflare.com/api/
// - List Zones: GET `/zones?name=...`
// - List DNS Records: GET `/zones/:zone_id/dns_records?name=...&type=A|AAAA`
// - Patch DNS Record: PATCH `/zones/:zone_id/dns_records/:record_id`

use async_trait::async_trait;
use cdu_core::traits::{DnsApi, DnsRecord, DnsSession, RecordType, Zone};
use cdu_core::{Error, Result};
use serde_json::Value;
use std::time::Duration;

/// Cloudflare API base URL
const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

const PROVIDER: &str = "cloudflare";

/// Cloudflare API client
///
/// Holds the HTTP client and endpoint; credentials are bound per session by
/// [`DnsApi::authenticate`].
///
/// # Dry-Run Mode
///
/// When `dry_run` is true, sessions will:
/// - Perform all GET requests (zone lookup, record lookup)
/// - Log the intended PATCH payload
/// - **NOT** actually modify DNS records
#[derive(Debug, Clone)]
pub struct CloudflareApi {
    /// API base URL (overridable for testing)
    base_url: String,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// Dry-run mode: if true, perform GET requests but skip PATCH updates
    dry_run: bool,
}

impl CloudflareApi {
    /// Create a client for the production Cloudflare API
    pub fn new() -> Result<Self> {
        Self::with_base_url(CLOUDFLARE_API_BASE)
    }

    /// Create a client for an alternative API endpoint
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        // Build HTTP client with timeout
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
            dry_run: false,
        })
    }

    /// Enable or disable dry-run mode
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Whether record updates are only logged
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }
}

#[async_trait]
impl DnsApi for CloudflareApi {
    /// Open a session bound to `api_token`
    ///
    /// No request is made here. User and account owned tokens verify at
    /// different endpoints, so the token is only judged by the zone lookup.
    async fn authenticate(&self, api_token: &str) -> Result<Box<dyn DnsSession>> {
        if api_token.is_empty() {
            return Err(Error::config("Cloudflare API token cannot be empty"));
        }

        Ok(Box::new(CloudflareSession {
            base_url: self.base_url.clone(),
            client: self.client.clone(),
            api_token: api_token.to_string(),
            dry_run: self.dry_run,
        }))
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}

/// Authenticated Cloudflare session
///
/// # Security
///
/// The Debug implementation intentionally does NOT expose the API token.
struct CloudflareSession {
    base_url: String,
    client: reqwest::Client,
    /// ⚠️ NEVER log this value
    api_token: String,
    dry_run: bool,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for CloudflareSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareSession")
            .field("base_url", &self.base_url)
            .field("api_token", &"<REDACTED>")
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl CloudflareSession {
    /// Send an authenticated request and return the decoded response body
    ///
    /// `context` names the operation in error messages.
    async fn send(&self, request: reqwest::RequestBuilder, context: &str) -> Result<Value> {
        let response = request
            .bearer_auth(&self.api_token)
            .send()
            .await
            .map_err(|e| Error::provider(PROVIDER, format!("HTTP request failed: {}", e)))?;

        // Handle specific HTTP status codes
        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());

            // Map HTTP status codes to specific errors
            return match status.as_u16() {
                401 | 403 => Err(Error::auth(format!(
                    "Invalid API token or insufficient permissions. Status: {}",
                    status
                ))),
                429 => Err(Error::provider(
                    PROVIDER,
                    format!("Rate limit exceeded. Please retry later. Status: {}", status),
                )),
                500..=599 => Err(Error::provider(
                    PROVIDER,
                    format!("Cloudflare server error (transient): {} - {}", status, error_text),
                )),
                _ => Err(Error::provider(
                    PROVIDER,
                    format!("{} failed: {} - {}", context, status, error_text),
                )),
            };
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| Error::provider(PROVIDER, format!("Failed to parse response: {}", e)))?;

        if json["success"].as_bool() == Some(false) {
            let message = json["errors"][0]["message"]
                .as_str()
                .unwrap_or("unknown error");
            return Err(Error::provider(
                PROVIDER,
                format!("{} failed: {}", context, message),
            ));
        }

        Ok(json)
    }
}

/// Entries of a list response's `result` array
fn results(json: &Value) -> Result<&[Value]> {
    json["result"]
        .as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| {
            Error::provider(PROVIDER, "Invalid response format: result is not an array")
        })
}

fn string_field(value: &Value, field: &str) -> Result<String> {
    value[field].as_str().map(str::to_string).ok_or_else(|| {
        Error::provider(
            PROVIDER,
            format!("Invalid response format: {} is not a string", field),
        )
    })
}

#[async_trait]
impl DnsSession for CloudflareSession {
    /// # API Call
    ///
    /// ```http
    /// GET /zones?name=example.com
    /// Authorization: Bearer <token>
    /// ```
    async fn find_zone_by_name(&self, name: &str) -> Result<Option<Zone>> {
        tracing::debug!("Looking up zone ID for: {}", name);

        let url = format!("{}/zones", self.base_url);
        let json = self
            .send(self.client.get(&url).query(&[("name", name)]), "Zone lookup")
            .await?;

        let Some(zone) = results(&json)?.first() else {
            return Ok(None);
        };

        let zone = Zone {
            id: string_field(zone, "id")?,
            name: string_field(zone, "name")?,
        };
        tracing::debug!("Found zone ID: {}", zone.id);
        Ok(Some(zone))
    }

    /// # API Call
    ///
    /// ```http
    /// GET /zones/:zone_id/dns_records?name=home.example.com&type=A
    /// Authorization: Bearer <token>
    /// ```
    async fn find_record_by_name(
        &self,
        zone: &Zone,
        name: &str,
        record_type: Option<RecordType>,
    ) -> Result<Option<DnsRecord>> {
        tracing::debug!("Looking up record ID: {} (zone: {})", name, zone.name);

        let url = format!("{}/zones/{}/dns_records", self.base_url, zone.id);
        let mut request = self.client.get(&url).query(&[("name", name)]);
        if let Some(record_type) = record_type {
            request = request.query(&[("type", record_type.as_str())]);
        }
        let json = self.send(request, "Record lookup").await?;

        // The type is also checked locally: a name can carry A, AAAA and TXT
        let wanted = record_type.map(|t| t.as_str());
        let Some(record) = results(&json)?
            .iter()
            .find(|r| wanted.is_none_or(|t| r["type"].as_str().is_none_or(|rt| rt == t)))
        else {
            return Ok(None);
        };

        let record = DnsRecord {
            id: string_field(record, "id")?,
            name: string_field(record, "name")?,
            content: string_field(record, "content")?,
            proxied: record["proxied"].as_bool().unwrap_or(false),
        };
        tracing::debug!("Found record ID: {}", record.id);
        Ok(Some(record))
    }

    /// # API Call
    ///
    /// ```http
    /// PATCH /zones/:zone_id/dns_records/:record_id
    /// {
    ///   "content": "203.0.113.5",
    ///   "proxied": true
    /// }
    /// ```
    async fn update_content(
        &self,
        zone: &Zone,
        record: &DnsRecord,
        content: &str,
        proxied: bool,
    ) -> Result<()> {
        let url = format!(
            "{}/zones/{}/dns_records/{}",
            self.base_url, zone.id, record.id
        );
        let payload = serde_json::json!({
            "content": content,
            "proxied": proxied,
        });

        // In dry-run mode, log the intended update and return success
        if self.dry_run {
            tracing::info!(
                "[DRY-RUN] Would send PATCH request to {} with payload: {}",
                url,
                payload
            );
            return Ok(());
        }

        tracing::debug!(
            "Updating DNS record: {} -> {} (was: {})",
            record.name,
            content,
            record.content
        );

        self.send(self.client.patch(&url).json(&payload), "Record update")
            .await?;
        Ok(())
    }
}
