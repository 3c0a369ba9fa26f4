// # cdu-core
//
// Core library for the cdu dynamic DNS updater.
//
// ## Architecture Overview
//
// This library owns the update protocol and the loop that drives it:
// - **IpResolver**: Trait for discovering the current public IP address
// - **DnsApi / DnsSession**: Trait seam around the DNS provider's API client
// - **RecordUpdater**: Pushes one IP to a batch of named records in one zone
// - **Scheduler**: Runs a cycle now, then every interval, until cancelled
// - **Daemon**: One update cycle (resolve IP, update records, report) and the
//   long-running loop around it
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Protocol logic is separate from HTTP adapters
// 2. **Sequential Cycles**: One IP per cycle, records updated strictly in order
// 3. **Fail-Fast Batches**: The first failing record aborts the rest of the cycle
// 4. **Survivable Loop**: A failed cycle is logged, never fatal to the daemon
// 5. **Stateless**: Nothing is cached or persisted between cycles

pub mod config;
pub mod daemon;
pub mod error;
pub mod scheduler;
pub mod traits;
pub mod updater;

// Re-export core types for convenience
pub use config::{Credentials, DaemonConfig, IpLookupConfig, parse_record_names};
pub use daemon::{Daemon, DaemonEvent};
pub use error::{Error, Result};
pub use scheduler::{Scheduler, SchedulerExit, StopReason};
pub use traits::{DnsApi, DnsRecord, DnsSession, IpResolver, RecordType, Zone};
pub use updater::{RecordUpdater, UpdateResult, is_proxied};
