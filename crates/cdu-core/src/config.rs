//! Configuration types for cdu
//!
//! These structures are built once at startup (by the binary, from the
//! environment and command line) and handed to the updater and daemon.
//! Nothing in the core reads the process environment.

use serde::{Deserialize, Serialize};

/// Default primary "what is my IP" endpoint
pub const DEFAULT_PRIMARY_IP_URL: &str = "https://api.ipify.org";

/// Default secondary "what is my IP" endpoint
pub const DEFAULT_SECONDARY_IP_URL: &str = "https://icanhazip.com";

/// Provider credentials and the zone they operate on
///
/// # Security
///
/// The Debug implementation intentionally does NOT expose the API token.
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    /// Provider API token
    /// ⚠️ NEVER log this value
    pub api_token: String,

    /// Zone name (e.g., "example.com")
    pub zone: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_token", &"<REDACTED>")
            .field("zone", &self.zone)
            .finish()
    }
}

impl Credentials {
    /// Create new credentials
    pub fn new(api_token: impl Into<String>, zone: impl Into<String>) -> Self {
        Self {
            api_token: api_token.into(),
            zone: zone.into(),
        }
    }

    /// Validate the credentials
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.api_token.trim().is_empty() {
            return Err(crate::Error::config("API token cannot be empty"));
        }
        if self.zone.trim().is_empty() {
            return Err(crate::Error::config("Zone name cannot be empty"));
        }
        Ok(())
    }
}

/// Public IP lookup configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpLookupConfig {
    /// Endpoint tried first
    #[serde(default = "default_primary_url")]
    pub primary_url: String,

    /// Endpoint tried when the primary cannot be reached
    #[serde(default = "default_secondary_url")]
    pub secondary_url: String,

    /// Per-request timeout (in seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for IpLookupConfig {
    fn default() -> Self {
        Self {
            primary_url: default_primary_url(),
            secondary_url: default_secondary_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl IpLookupConfig {
    /// Validate the lookup configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        for url in [&self.primary_url, &self.secondary_url] {
            if !url.starts_with("https://") && !url.starts_with("http://") {
                return Err(crate::Error::config(format!(
                    "IP lookup URL must use HTTP or HTTPS scheme. Got: {}",
                    url
                )));
            }
        }
        if self.timeout_secs == 0 {
            return Err(crate::Error::config("IP lookup timeout must be > 0"));
        }
        Ok(())
    }
}

fn default_primary_url() -> String {
    DEFAULT_PRIMARY_IP_URL.to_string()
}

fn default_secondary_url() -> String {
    DEFAULT_SECONDARY_IP_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    5
}

/// Daemon configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Record names updated every cycle, in order
    pub records: Vec<String>,

    /// Sleep between cycles (in seconds)
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Capacity of the daemon event channel
    ///
    /// When full, new events are dropped (with a warning log).
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl DaemonConfig {
    /// Create a configuration with default interval and channel capacity
    pub fn new(records: Vec<String>) -> Self {
        Self {
            records,
            interval_secs: default_interval_secs(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }

    /// Set the interval between cycles
    pub fn with_interval_secs(mut self, interval_secs: u64) -> Self {
        self.interval_secs = interval_secs;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.interval_secs == 0 {
            return Err(crate::Error::config("Poll interval must be > 0"));
        }
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }
        Ok(())
    }
}

fn default_interval_secs() -> u64 {
    60
}

fn default_event_channel_capacity() -> usize {
    1000
}

/// Split a comma separated record list, trimming names and dropping blanks
pub fn parse_record_names(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
