//! Record updater
//!
//! Applies one IP address to a batch of named records in one zone.
//!
//! ## Update Flow
//!
//! 1. Open one authenticated session
//! 2. Resolve the zone by name, once per batch
//! 3. For each name, in order: resolve the record of the IP's address type,
//!    compute the proxy flag, push the new content
//! 4. Return one result per name, in input order
//!
//! The batch is fail-fast: the first error aborts the remaining names and no
//! results are returned for the batch.

use crate::config::Credentials;
use crate::error::{Error, Result};
use crate::traits::{DnsApi, DnsSession, RecordType, Zone};
use std::sync::Arc;
use tracing::debug;

/// Result of applying an IP address to one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateResult {
    /// The record name, as requested
    pub name: String,
    /// The IP address written to the record
    pub applied_ip: String,
    /// The proxy flag written to the record
    pub proxied: bool,
}

/// Whether a record should be routed through the provider's proxy
///
/// Wildcard records are never proxied, every other record is.
pub fn is_proxied(record_name: &str) -> bool {
    !record_name.contains('*')
}

/// Pushes IP addresses to DNS records through a [`DnsApi`]
pub struct RecordUpdater {
    api: Arc<dyn DnsApi>,
    credentials: Credentials,
}

impl std::fmt::Debug for RecordUpdater {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordUpdater")
            .field("provider", &self.api.provider_name())
            .field("credentials", &self.credentials)
            .finish()
    }
}

impl RecordUpdater {
    /// Create a new updater
    ///
    /// # Parameters
    ///
    /// - `api`: Provider API client
    /// - `credentials`: Token and zone name used for every batch
    pub fn new(api: Arc<dyn DnsApi>, credentials: Credentials) -> Self {
        Self { api, credentials }
    }

    /// The zone this updater operates on
    pub fn zone(&self) -> &str {
        &self.credentials.zone
    }

    /// Update a single record
    pub async fn update(&self, name: &str, ip: &str) -> Result<UpdateResult> {
        let mut results = self.update_many(&[name.to_string()], ip).await?;
        results
            .pop()
            .ok_or_else(|| Error::Other(format!("no result for record {}", name)))
    }

    /// Update every record in `names` to `ip`
    ///
    /// # Returns
    ///
    /// - `Ok(results)`: One result per name, in the same order as `names`
    /// - `Err(Error)`: The first failure; records after it were not touched
    pub async fn update_many(&self, names: &[String], ip: &str) -> Result<Vec<UpdateResult>> {
        if names.is_empty() {
            debug!("No records requested, skipping provider session");
            return Ok(Vec::new());
        }

        let session = self.api.authenticate(&self.credentials.api_token).await?;

        let zone = session
            .find_zone_by_name(&self.credentials.zone)
            .await?
            .ok_or_else(|| Error::zone_not_found(&self.credentials.zone))?;

        debug!("Zone found: {} ({})", zone.name, zone.id);

        // Unparseable IPs go out unfiltered so the provider rejects the content
        let record_type = RecordType::for_ip(ip);

        let mut results = Vec::with_capacity(names.len());
        for name in names {
            results.push(
                self.apply(session.as_ref(), &zone, name, record_type, ip)
                    .await?,
            );
        }

        Ok(results)
    }

    async fn apply(
        &self,
        session: &dyn DnsSession,
        zone: &Zone,
        name: &str,
        record_type: Option<RecordType>,
        ip: &str,
    ) -> Result<UpdateResult> {
        let record = session
            .find_record_by_name(zone, name, record_type)
            .await?
            .ok_or_else(|| Error::record_not_found(&zone.name, name))?;

        let proxied = is_proxied(name);
        debug!(
            "Updating record {} ({}) -> {} (proxied: {})",
            name, record.id, ip, proxied
        );

        session.update_content(zone, &record, ip, proxied).await?;

        Ok(UpdateResult {
            name: name.to_string(),
            applied_ip: ip.to_string(),
            proxied,
        })
    }
}
