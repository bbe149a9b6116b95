//! Named call timer.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::histogram::{quantile, LogBuckets};

/// Aggregated durations of every call recorded under one metric name.
///
/// Recording is lock-free: counters are plain atomics and the duration
/// distribution is kept in power-of-two buckets.
pub struct Timer {
    count: AtomicU64,
    total_ns: AtomicU64,
    min_ns: AtomicU64,
    max_ns: AtomicU64,
    buckets: LogBuckets,
    created: Instant,
}

impl Timer {
    pub(crate) fn new() -> Self {
        Self {
            count: AtomicU64::new(0),
            total_ns: AtomicU64::new(0),
            min_ns: AtomicU64::new(u64::MAX),
            max_ns: AtomicU64::new(0),
            buckets: LogBuckets::new(),
            created: Instant::now(),
        }
    }

    /// Start a measurement.
    #[must_use]
    pub fn start(self: &Arc<Self>) -> TimerHandle {
        TimerHandle { timer: Arc::clone(self), started: Instant::now() }
    }

    /// Record one call of the given duration.
    pub fn record(&self, elapsed: Duration) {
        let ns = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
        self.count.fetch_add(1, Ordering::Relaxed);
        self.total_ns.fetch_add(ns, Ordering::Relaxed);
        self.min_ns.fetch_min(ns, Ordering::Relaxed);
        self.max_ns.fetch_max(ns, Ordering::Relaxed);
        self.buckets.record(ns);
    }

    /// Number of recorded calls.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    /// Sum of all recorded durations.
    #[must_use]
    pub fn total(&self) -> Duration {
        Duration::from_nanos(self.total_ns.load(Ordering::Relaxed))
    }

    #[allow(clippy::cast_precision_loss)]
    pub(crate) fn snapshot(&self, name: &str) -> TimerSnapshot {
        let count = self.count();
        let total_ns = self.total_ns.load(Ordering::Relaxed);
        let counts = self.buckets.load();
        let max_ns = self.max_ns.load(Ordering::Relaxed);
        let min_ns = if count == 0 { 0 } else { self.min_ns.load(Ordering::Relaxed) };
        // Bucket bounds overshoot; never report a quantile above the real max.
        let q = |p: f64| quantile(&counts, p).map_or(0, |v| v.clamp(min_ns, max_ns));
        let uptime = self.created.elapsed().as_secs_f64();

        TimerSnapshot {
            name: name.to_string(),
            count,
            mean_rate: if uptime > 0.0 { count as f64 / uptime } else { 0.0 },
            min_ns,
            max_ns,
            mean_ns: if count == 0 { 0.0 } else { total_ns as f64 / count as f64 },
            p50_ns: q(0.50),
            p95_ns: q(0.95),
            p99_ns: q(0.99),
            total_ns,
        }
    }
}

/// A running measurement, stopped exactly once.
pub struct TimerHandle {
    timer: Arc<Timer>,
    started: Instant,
}

impl TimerHandle {
    /// Stop the measurement and record it into its timer.
    pub fn stop(self) -> Duration {
        let elapsed = self.started.elapsed();
        self.timer.record(elapsed);
        elapsed
    }
}

/// Point-in-time view of a timer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimerSnapshot {
    pub name: String,
    pub count: u64,
    /// Calls per second since the timer was created.
    pub mean_rate: f64,
    pub min_ns: u64,
    pub max_ns: u64,
    pub mean_ns: f64,
    pub p50_ns: u64,
    pub p95_ns: u64,
    pub p99_ns: u64,
    pub total_ns: u64,
}
