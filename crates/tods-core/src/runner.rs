//! Wall-clock driver for a ticking world.
//!
//! [`run_ticker`] sleeps for the configured interval, measures how much
//! time really passed, and feeds that to a [`Tick`] target, until a
//! [`TickerControl`] asks it to stop. Elapsed time is measured against the
//! loop's start, so sub-millisecond remainders are never lost.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info};

/// Something that advances when time passes.
pub trait Tick: Send {
    /// Advance by `elapsed_ms` milliseconds.
    fn tick(&mut self, elapsed_ms: u64);
}

/// Shared stop flag and tick counter for a running ticker.
#[derive(Debug, Default)]
pub struct TickerControl {
    stop_requested: AtomicBool,
    ticks: AtomicU64,
}

impl TickerControl {
    /// Create a control in the running state.
    pub const fn new() -> Self {
        Self {
            stop_requested: AtomicBool::new(false),
            ticks: AtomicU64::new(0),
        }
    }

    /// Ask the ticker to stop after its current tick.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
    }

    /// Whether a stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    /// Number of ticks executed so far.
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Acquire)
    }

    fn record_tick(&self) -> u64 {
        self.ticks.fetch_add(1, Ordering::AcqRel).saturating_add(1)
    }
}

/// Tick `target` every `interval` until `control` requests a stop.
///
/// Returns the number of ticks executed by this call.
pub async fn run_ticker<T>(target: &mut T, interval: Duration, control: &TickerControl) -> u64
where
    T: Tick + ?Sized,
{
    let interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
    info!(interval_ms, "Ticker starting");

    let started = Instant::now();
    let mut reported_ms: u64 = 0;
    let mut total: u64 = 0;

    while !control.is_stop_requested() {
        tokio::time::sleep(interval).await;

        let now_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let elapsed_ms = now_ms.saturating_sub(reported_ms);
        reported_ms = now_ms;

        target.tick(elapsed_ms);
        total = total.saturating_add(1);
        let tick = control.record_tick();
        debug!(tick, elapsed_ms, "Tick");
    }

    info!(total_ticks = total, "Ticker stopped");
    total
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    struct Counter {
        elapsed: Vec<u64>,
        stop_after: usize,
        control: Arc<TickerControl>,
    }

    impl Tick for Counter {
        fn tick(&mut self, elapsed_ms: u64) {
            self.elapsed.push(elapsed_ms);
            if self.elapsed.len() >= self.stop_after {
                self.control.request_stop();
            }
        }
    }

    #[tokio::test]
    async fn ticker_runs_until_stopped() {
        let control = Arc::new(TickerControl::new());
        let mut counter = Counter {
            elapsed: Vec::new(),
            stop_after: 3,
            control: Arc::clone(&control),
        };

        let ticks = run_ticker(&mut counter, Duration::from_millis(5), &control).await;

        assert_eq!(ticks, 3);
        assert_eq!(control.ticks(), 3);
        assert_eq!(counter.elapsed.len(), 3);
        assert!(counter.elapsed.iter().sum::<u64>() >= 15);
    }

    #[tokio::test]
    async fn stopped_control_never_ticks() {
        let control = TickerControl::new();
        control.request_stop();
        let mut counter = Counter {
            elapsed: Vec::new(),
            stop_after: 1,
            control: Arc::new(TickerControl::new()),
        };

        let ticks = run_ticker(&mut counter, Duration::from_millis(5), &control).await;
        assert_eq!(ticks, 0);
        assert!(counter.elapsed.is_empty());
    }
}
