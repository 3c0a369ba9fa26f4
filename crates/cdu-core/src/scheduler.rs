//! Interval scheduler
//!
//! Runs a cycle immediately, then again after every interval, until a
//! cancellation signal fires, the cycle asks to stop, or an optional cycle
//! limit is reached. The sleep always starts after the cycle has finished,
//! so cycles never overlap.

use std::future::Future;
use std::ops::ControlFlow;
use std::time::Duration;
use tracing::debug;

/// Why a scheduler run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason<B = ()> {
    /// The cancellation signal fired
    Shutdown,
    /// The configured cycle limit was reached
    MaxCycles,
    /// A cycle returned `ControlFlow::Break`, carrying its value
    CycleRequested(B),
}

/// Outcome of [`Scheduler::run`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerExit<B = ()> {
    /// Why the run ended
    pub reason: StopReason<B>,
    /// Number of cycles that ran to completion
    pub cycles: usize,
}

/// Fixed-interval cycle scheduler
#[derive(Debug, Clone)]
pub struct Scheduler {
    interval: Duration,
    max_cycles: Option<usize>,
}

impl Scheduler {
    /// Create a scheduler that runs forever
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            max_cycles: None,
        }
    }

    /// Stop after `max_cycles` completed cycles
    pub fn with_max_cycles(mut self, max_cycles: usize) -> Self {
        self.max_cycles = Some(max_cycles);
        self
    }

    /// Interval slept between cycles
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run `cycle` until `shutdown` resolves
    ///
    /// The cycle receives its 1-based cycle number and returns
    /// `ControlFlow::Break(value)` to end the run. `on_sleep` is invoked
    /// right before each sleep so callers can report it.
    ///
    /// # Cancellation
    ///
    /// `shutdown` is raced against both the running cycle and the sleep;
    /// an interrupted cycle is dropped and not counted.
    pub async fn run<B, S, C, Fut, L>(
        &self,
        shutdown: S,
        mut cycle: C,
        mut on_sleep: L,
    ) -> SchedulerExit<B>
    where
        S: Future<Output = ()>,
        C: FnMut(usize) -> Fut,
        Fut: Future<Output = ControlFlow<B>>,
        L: FnMut(Duration),
    {
        tokio::pin!(shutdown);
        let mut cycles = 0;

        loop {
            let flow = tokio::select! {
                flow = cycle(cycles + 1) => flow,
                _ = &mut shutdown => {
                    return SchedulerExit { reason: StopReason::Shutdown, cycles };
                }
            };
            cycles += 1;

            if let ControlFlow::Break(value) = flow {
                return SchedulerExit {
                    reason: StopReason::CycleRequested(value),
                    cycles,
                };
            }

            if self.max_cycles.is_some_and(|max| cycles >= max) {
                debug!("Cycle limit reached after {} cycle(s)", cycles);
                return SchedulerExit {
                    reason: StopReason::MaxCycles,
                    cycles,
                };
            }

            on_sleep(self.interval);

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = &mut shutdown => {
                    return SchedulerExit { reason: StopReason::Shutdown, cycles };
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_runs_bounded_number_of_cycles() {
        let count = Arc::new(AtomicUsize::new(0));
        let scheduler = Scheduler::new(Duration::from_secs(60)).with_max_cycles(3);

        let counter = count.clone();
        let exit = scheduler
            .run(
                std::future::pending(),
                move |_| {
                    let counter = counter.clone();
                    async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                        ControlFlow::<()>::Continue(())
                    }
                },
                |_| {},
            )
            .await;

        assert_eq!(exit.reason, StopReason::MaxCycles);
        assert_eq!(exit.cycles, 3);
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_cycle_runs_immediately_and_sleeps_between() {
        let start = tokio::time::Instant::now();
        let stamps = Arc::new(std::sync::Mutex::new(Vec::new()));
        let scheduler = Scheduler::new(Duration::from_secs(60)).with_max_cycles(2);

        let recorded = stamps.clone();
        scheduler
            .run(
                std::future::pending(),
                move |_| {
                    recorded.lock().unwrap().push(start.elapsed());
                    async { ControlFlow::<()>::Continue(()) }
                },
                |_| {},
            )
            .await;

        let stamps = stamps.lock().unwrap();
        assert_eq!(stamps[0], Duration::ZERO);
        assert_eq!(stamps[1], Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_interrupts_sleep() {
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
        let scheduler = Scheduler::new(Duration::from_secs(3600));

        let handle = tokio::spawn(async move {
            scheduler
                .run(
                    async {
                        let _ = shutdown_rx.await;
                    },
                    |_| async { ControlFlow::<()>::Continue(()) },
                    |_| {},
                )
                .await
        });

        tokio::time::sleep(Duration::from_secs(10)).await;
        shutdown_tx.send(()).unwrap();

        let exit = handle.await.unwrap();
        assert_eq!(exit.reason, StopReason::Shutdown);
        assert_eq!(exit.cycles, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cycle_can_stop_the_loop() {
        let scheduler = Scheduler::new(Duration::from_secs(1));
        let mut sleeps = Vec::new();

        let exit = scheduler
            .run(
                std::future::pending(),
                |n| async move {
                    if n == 2 {
                        ControlFlow::Break("stop")
                    } else {
                        ControlFlow::Continue(())
                    }
                },
                |interval| sleeps.push(interval),
            )
            .await;

        assert_eq!(exit.reason, StopReason::CycleRequested("stop"));
        assert_eq!(exit.cycles, 2);
        assert_eq!(sleeps, vec![Duration::from_secs(1)]);
    }
}
