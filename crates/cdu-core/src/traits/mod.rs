//! Core traits for cdu
//!
//! This module defines the abstract interfaces the update protocol depends on.
//!
//! - [`IpResolver`]: Discover the current public IP address
//! - [`DnsApi`] / [`DnsSession`]: Find zones and records, update record content

pub mod dns_api;
pub mod ip_resolver;

pub use dns_api::{DnsApi, DnsRecord, DnsSession, RecordType, Zone};
pub use ip_resolver::IpResolver;
