//! Error types for cdu
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for cdu operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for cdu
#[derive(Error, Debug)]
pub enum Error {
    /// Public IP lookup failed
    #[error("Network error: {0}")]
    Network(String),

    /// The provider has no zone with the configured name
    #[error("Zone not found: {zone}")]
    ZoneNotFound {
        /// Zone name that was looked up
        zone: String,
    },

    /// The provider has no record with the requested name in the zone
    #[error("Record not found: {record} (zone: {zone})")]
    RecordNotFound {
        /// Zone the record was looked up in
        zone: String,
        /// Record name that was looked up
        record: String,
    },

    /// The provider rejected the API token
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Missing or unusable configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Any other provider-side failure
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a network error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Create a "zone not found" error
    pub fn zone_not_found(zone: impl Into<String>) -> Self {
        Self::ZoneNotFound { zone: zone.into() }
    }

    /// Create a "record not found" error
    pub fn record_not_found(zone: impl Into<String>, record: impl Into<String>) -> Self {
        Self::RecordNotFound {
            zone: zone.into(),
            record: record.into(),
        }
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Auth(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Short label for the error category, used in log lines
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Network(_) => "network",
            Self::ZoneNotFound { .. } => "zone_not_found",
            Self::RecordNotFound { .. } => "record_not_found",
            Self::Auth(_) => "auth",
            Self::Config(_) => "config",
            Self::Provider { .. } => "provider",
            Self::Other(_) => "other",
        }
    }

    /// Whether the daemon loop must stop instead of retrying next cycle
    ///
    /// Only configuration problems qualify: retrying cannot fix them.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
