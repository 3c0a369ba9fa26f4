// # DNS API Traits
//
// Defines the capability the record updater needs from a DNS provider's API
// client: authenticate, find a zone by name, find a record by name inside a
// zone, and replace a record's content.
//
// ## Implementations
//
// - Cloudflare: `cdu-provider-cloudflare` crate
//
// ## Usage
//
// ```rust,ignore
// use cdu_core::DnsApi;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let api = /* DnsApi implementation */;
//
//     let session = api.authenticate("token").await?;
//     let zone = session.find_zone_by_name("example.com").await?.unwrap();
//     let record = session
//         .find_record_by_name(&zone, "home.example.com", Some(RecordType::A))
//         .await?
//         .unwrap();
//     session.update_content(&zone, &record, "203.0.113.5", true).await?;
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::net::IpAddr;

/// Address record type matching an IP literal's family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordType {
    /// IPv4 address record
    A,
    /// IPv6 address record
    Aaaa,
}

impl RecordType {
    /// Record type for `ip`, or `None` when it is not an IP literal
    pub fn for_ip(ip: &str) -> Option<Self> {
        match ip.parse::<IpAddr>().ok()? {
            IpAddr::V4(_) => Some(Self::A),
            IpAddr::V6(_) => Some(Self::Aaaa),
        }
    }

    /// DNS name of the type ("A", "AAAA")
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A => "A",
            Self::Aaaa => "AAAA",
        }
    }
}

/// Handle to a zone resolved on the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Zone {
    /// The zone ID (provider-specific)
    pub id: String,
    /// The zone name
    pub name: String,
}

/// Handle to a DNS record resolved inside a zone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsRecord {
    /// The record ID (provider-specific)
    pub id: String,
    /// The record name
    pub name: String,
    /// The record content as currently stored by the provider
    pub content: String,
    /// Whether the provider currently proxies the record
    pub proxied: bool,
}

/// Entry point of a provider API client
///
/// # Thread Safety
///
/// Implementations must be thread-safe and usable across async tasks.
#[async_trait]
pub trait DnsApi: Send + Sync {
    /// Open an authenticated session
    ///
    /// # Returns
    ///
    /// - `Ok(session)`: A session bound to the token. Providers may defer the
    ///   token check to the first session call, which then fails with `Auth`
    /// - `Err(Error::Auth)`: The provider rejected the token
    /// - `Err(Error)`: Any other failure reaching the provider
    async fn authenticate(&self, api_token: &str) -> Result<Box<dyn DnsSession>, crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}

/// Authenticated session with a provider
///
/// Every method is a single request that blocks until the provider answers.
/// Sessions hold no state beyond the credentials they were opened with.
#[async_trait]
pub trait DnsSession: Send + Sync {
    /// Look up a zone by its name
    ///
    /// Returns `Ok(None)` when the provider has no matching zone.
    async fn find_zone_by_name(&self, name: &str) -> Result<Option<Zone>, crate::Error>;

    /// Look up a record by its name inside `zone`
    ///
    /// With `record_type` set, only records of that type match; with `None`
    /// the first record carrying `name` is returned whatever its type.
    /// Returns `Ok(None)` when the zone has no matching record.
    async fn find_record_by_name(
        &self,
        zone: &Zone,
        name: &str,
        record_type: Option<RecordType>,
    ) -> Result<Option<DnsRecord>, crate::Error>;

    /// Replace the content of `record` and set its proxy flag
    async fn update_content(
        &self,
        zone: &Zone,
        record: &DnsRecord,
        content: &str,
        proxied: bool,
    ) -> Result<(), crate::Error>;
}
