//! Throughput sampling for monotonic counters
//!
//! Reads one or more cumulative counters, waits for the sampling window,
//! reads them again and divides the deltas by the time that actually
//! elapsed between the two reads.

use std::fmt;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::units::format_size;

/// Default sampling window
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(1);

// ─────────────────────────────────────────────────────────────────
// Clock
// ─────────────────────────────────────────────────────────────────

/// Time source used by the sampler
pub trait Clock {
    /// Current instant
    fn now(&self) -> Instant;

    /// Block the calling thread for `duration`
    fn sleep(&self, duration: Duration);
}

/// Wall clock backed by `Instant` and `thread::sleep`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

// ─────────────────────────────────────────────────────────────────
// Rate
// ─────────────────────────────────────────────────────────────────

/// Average rate over one sampling window, in bytes per second
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rate {
    pub bytes_per_sec: f64,
}

impl Rate {
    /// Compute a rate from two counter readings and the elapsed time
    pub fn between(start: u64, end: u64, elapsed: Duration) -> Self {
        let secs = elapsed.as_secs_f64();
        if secs <= 0.0 {
            return Self { bytes_per_sec: 0.0 };
        }
        let delta = end as f64 - start as f64;
        Self {
            bytes_per_sec: delta / secs,
        }
    }

    /// A negative rate means the counter went backwards (reset or wrap)
    pub fn is_anomalous(&self) -> bool {
        self.bytes_per_sec < 0.0
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_anomalous() {
            write!(f, "anomalous (counter reset)")
        } else {
            write!(f, "{}/s", format_size(self.bytes_per_sec))
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Sampler
// ─────────────────────────────────────────────────────────────────

/// Measures counter throughput over a fixed window
#[derive(Debug, Clone)]
pub struct RateSampler<C: Clock = SystemClock> {
    clock: C,
    window: Duration,
}

impl RateSampler<SystemClock> {
    /// Create a sampler on the wall clock
    pub fn new(window: Duration) -> Self {
        Self::with_clock(SystemClock, window)
    }
}

impl Default for RateSampler<SystemClock> {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}

impl<C: Clock> RateSampler<C> {
    /// Create a sampler on a custom clock
    pub fn with_clock(clock: C, window: Duration) -> Self {
        Self { clock, window }
    }

    /// Nominal sampling window
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Sample a single counter
    pub fn sample_rate<F, E>(&self, mut read: F) -> Result<Rate, E>
    where
        F: FnMut() -> Result<u64, E>,
    {
        let [rate] = self.sample_rates(|| read().map(|value| [value]))?;
        Ok(rate)
    }

    /// Sample `N` counters within the same window.
    ///
    /// `read` is called exactly twice. A failure on either call is
    /// returned as-is; there is no retry.
    pub fn sample_rates<F, E, const N: usize>(&self, mut read: F) -> Result<[Rate; N], E>
    where
        F: FnMut() -> Result<[u64; N], E>,
    {
        let start_values = read()?;
        let start_time = self.clock.now();

        self.clock.sleep(self.window);

        let end_values = read()?;
        let elapsed = self.clock.now().saturating_duration_since(start_time);

        let mut rates = [Rate { bytes_per_sec: 0.0 }; N];
        for (i, rate) in rates.iter_mut().enumerate() {
            *rate = Rate::between(start_values[i], end_values[i], elapsed);
        }
        Ok(rates)
    }
}
