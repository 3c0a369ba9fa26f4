//! Update cycle and daemon loop
//!
//! The Daemon is responsible for:
//! - Resolving the public IP once per cycle via IpResolver
//! - Applying it to every configured record via RecordUpdater
//! - Reporting each applied record and each failed cycle
//! - Repeating on a fixed interval without dying on a failed cycle
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐
//! │ IpResolver  │─── ip ───┐
//! └─────────────┘          │
//!                          ▼
//!                   ┌──────────────┐        ┌───────────────┐
//!                   │    Daemon    │──────▶ │ RecordUpdater │──▶ DnsApi
//!                   └──────────────┘        └───────────────┘
//!                          │
//!              ┌───────────┴───────────┐
//!              ▼                       ▼
//!       ┌─────────────┐         ┌─────────────┐
//!       │  Scheduler  │         │   Events    │
//!       │ (interval)  │         │  (report)   │
//!       └─────────────┘         └─────────────┘
//! ```
//!
//! ## Cycle Flow
//!
//! 1. Resolve the public IP (one lookup for the whole batch)
//! 2. Call `RecordUpdater::update_many()` with every configured record
//! 3. Log `name: ip` for each applied record
//! 4. On failure, log the error kind and zone and abandon the cycle

use crate::config::DaemonConfig;
use crate::error::{Error, Result};
use crate::scheduler::{Scheduler, StopReason};
use crate::traits::IpResolver;
use crate::updater::{RecordUpdater, UpdateResult};
use std::future::Future;
use std::ops::ControlFlow;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, error, info, warn};

/// Events emitted by the Daemon
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DaemonEvent {
    /// Daemon loop started
    Started {
        records: Vec<String>,
    },

    /// Update cycle started
    CycleStarted {
        cycle: usize,
    },

    /// A record now points at `ip`
    RecordApplied {
        name: String,
        ip: String,
    },

    /// Every record in the cycle was applied
    CycleSucceeded {
        cycle: usize,
        records: usize,
        elapsed_ms: u128,
    },

    /// The cycle was abandoned
    CycleFailed {
        cycle: usize,
        kind: &'static str,
        error: String,
    },

    /// Daemon is about to sleep until the next cycle
    Sleeping {
        secs: u64,
    },

    /// Daemon loop stopped
    Stopped {
        reason: String,
    },
}

/// Dynamic DNS daemon
///
/// Owns one resolver, one updater and the list of record names. The same
/// cycle logic backs both the single-shot [`Daemon::run_once`] and the
/// long-running [`Daemon::run`].
///
/// ## Failure Handling
///
/// A failed cycle is logged and reported, then the loop sleeps and tries
/// again. Only errors for which [`Error::is_fatal`] holds stop the loop.
pub struct Daemon {
    /// Public IP lookup
    resolver: Box<dyn IpResolver>,

    /// Record updater bound to one zone
    updater: RecordUpdater,

    /// Record names updated each cycle, in order
    records: Vec<String>,

    /// Sleep between cycles
    interval: Duration,

    /// Event sender for external reporting
    event_tx: mpsc::Sender<DaemonEvent>,
}

impl Daemon {
    /// Create a new daemon
    ///
    /// # Returns
    ///
    /// A tuple of (daemon, event_receiver) where event_receiver yields daemon events
    pub fn new(
        resolver: Box<dyn IpResolver>,
        updater: RecordUpdater,
        config: DaemonConfig,
    ) -> Result<(Self, mpsc::Receiver<DaemonEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.event_channel_capacity);

        let daemon = Self {
            resolver,
            updater,
            records: config.records,
            interval: Duration::from_secs(config.interval_secs),
            event_tx: tx,
        };

        Ok((daemon, rx))
    }

    /// Record names updated each cycle
    pub fn records(&self) -> &[String] {
        &self.records
    }

    /// Run exactly one update cycle
    ///
    /// The failure, if any, is logged and then returned to the caller.
    pub async fn run_once(&self) -> Result<Vec<UpdateResult>> {
        self.run_cycle(1).await
    }

    /// Run the daemon loop until SIGINT/SIGTERM
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Clean shutdown
    /// - `Err(Error)`: A fatal error stopped the loop
    pub async fn run(&self) -> Result<()> {
        self.run_with_shutdown(shutdown_signal()).await
    }

    /// Run the daemon loop until `shutdown` resolves
    ///
    /// Production code uses [`Daemon::run`]; this entry point lets embedders
    /// and tests supply their own cancellation signal.
    pub async fn run_with_shutdown<S>(&self, shutdown: S) -> Result<()>
    where
        S: Future<Output = ()>,
    {
        info!("starting");
        self.emit_event(DaemonEvent::Started {
            records: self.records.clone(),
        });

        let scheduler = Scheduler::new(self.interval);
        let exit = scheduler
            .run(
                shutdown,
                |cycle| self.loop_cycle(cycle),
                |interval| {
                    info!("sleeping {} seconds", interval.as_secs());
                    self.emit_event(DaemonEvent::Sleeping {
                        secs: interval.as_secs(),
                    });
                },
            )
            .await;

        match exit.reason {
            StopReason::Shutdown => {
                info!("Shutdown signal received after {} cycle(s)", exit.cycles);
                self.emit_event(DaemonEvent::Stopped {
                    reason: "Shutdown signal".to_string(),
                });
                Ok(())
            }
            StopReason::MaxCycles => {
                self.emit_event(DaemonEvent::Stopped {
                    reason: "Cycle limit reached".to_string(),
                });
                Ok(())
            }
            StopReason::CycleRequested(err) => {
                self.emit_event(DaemonEvent::Stopped {
                    reason: format!("Fatal {} error", err.kind()),
                });
                Err(err)
            }
        }
    }

    /// One loop iteration: swallow recoverable failures, stop on fatal ones
    async fn loop_cycle(&self, cycle: usize) -> ControlFlow<Error> {
        match self.run_cycle(cycle).await {
            Ok(_) => ControlFlow::Continue(()),
            Err(e) if e.is_fatal() => {
                error!("stopping: fatal {} error: {}", e.kind(), e);
                ControlFlow::Break(e)
            }
            Err(_) => ControlFlow::Continue(()),
        }
    }

    /// Resolve the IP, apply it to every record, report the outcome
    async fn run_cycle(&self, cycle: usize) -> Result<Vec<UpdateResult>> {
        self.emit_event(DaemonEvent::CycleStarted { cycle });
        let started = Instant::now();

        match self.apply_current_ip().await {
            Ok(results) => {
                for result in &results {
                    info!("{}: {}", result.name, result.applied_ip);
                    self.emit_event(DaemonEvent::RecordApplied {
                        name: result.name.clone(),
                        ip: result.applied_ip.clone(),
                    });
                }

                let elapsed_ms = started.elapsed().as_millis();
                info!("done in {}ms", elapsed_ms);
                self.emit_event(DaemonEvent::CycleSucceeded {
                    cycle,
                    records: results.len(),
                    elapsed_ms,
                });
                Ok(results)
            }
            Err(e) => {
                error!(
                    "cycle {} failed [{}] (zone: {}): {}",
                    cycle,
                    e.kind(),
                    self.updater.zone(),
                    e
                );
                self.emit_event(DaemonEvent::CycleFailed {
                    cycle,
                    kind: e.kind(),
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    async fn apply_current_ip(&self) -> Result<Vec<UpdateResult>> {
        let ip = self.resolver.resolve().await?;
        debug!("public IP address: {} (via {})", ip, self.resolver.name());

        self.updater.update_many(&self.records, &ip).await
    }

    /// Emit a daemon event
    fn emit_event(&self, event: DaemonEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                warn!(
                    "Event channel full, dropping event. Consider increasing event_channel_capacity."
                );
            }
            Err(TrySendError::Closed(event)) => {
                debug!("Event receiver dropped, discarding {:?}", event);
            }
        }
    }
}

/// Wait for SIGTERM or SIGINT
#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    let (mut sigterm, mut sigint) = match (
        signal(SignalKind::terminate()),
        signal(SignalKind::interrupt()),
    ) {
        (Ok(term), Ok(int)) => (term, int),
        (Err(e), _) | (_, Err(e)) => {
            warn!("Failed to set up signal handlers ({}), falling back to CTRL-C", e);
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to wait for CTRL-C: {}", e);
                std::future::pending::<()>().await;
            }
            return;
        }
    };

    tokio::select! {
        _ = sigterm.recv() => info!("Received SIGTERM"),
        _ = sigint.recv() => info!("Received SIGINT"),
    }
}

/// Wait for CTRL-C
#[cfg(not(unix))]
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to wait for CTRL-C: {}", e);
        std::future::pending::<()>().await;
    }
}
