// # IP Resolver Trait
//
// Defines the interface for discovering the caller's current public IP.
//
// ## Implementations
//
// - HTTP lookup with fallback endpoint: `cdu-ip-http` crate
//
// ## Usage
//
// ```rust,ignore
// use cdu_core::IpResolver;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let resolver = /* IpResolver implementation */;
//
//     let ip = resolver.resolve().await?;
//     println!("public IP: {}", ip);
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

/// Trait for public IP resolver implementations
///
/// The resolver is called exactly once per update cycle; the value it
/// returns is used for every record in that cycle.
///
/// # Contract
///
/// - Returns the address as text, trimmed of surrounding whitespace
/// - Performs no caching: every call does a fresh lookup
/// - Does not validate that the text is a well-formed IP literal; a bad
///   value surfaces later as a provider-side rejection
/// - Fails with [`crate::Error::Network`] when no endpoint could answer
#[async_trait]
pub trait IpResolver: Send + Sync {
    /// Resolve the current public IP address
    async fn resolve(&self) -> Result<String, crate::Error>;

    /// Name of the resolver (for logging/debugging)
    fn name(&self) -> &'static str {
        "ip-resolver"
    }
}
