//! Named distribution of captured numeric values.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use super::histogram::{bucket_upper_bound, rank_for, LogBuckets, BUCKET_COUNT};

/// Distribution of `i64` samples (captured method arguments).
///
/// Negative and non-negative values are bucketed separately by magnitude so
/// quantiles stay meaningful for signed inputs.
pub struct Distribution {
    count: AtomicU64,
    sum: AtomicI64,
    min: AtomicI64,
    max: AtomicI64,
    negative: LogBuckets,
    positive: LogBuckets,
}

impl Distribution {
    pub(crate) fn new() -> Self {
        Self {
            count: AtomicU64::new(0),
            sum: AtomicI64::new(0),
            min: AtomicI64::new(i64::MAX),
            max: AtomicI64::new(i64::MIN),
            negative: LogBuckets::new(),
            positive: LogBuckets::new(),
        }
    }

    /// Record one sample.
    pub fn update(&self, value: i64) {
        self.count.fetch_add(1, Ordering::Relaxed);
        // Wrapping add; a mean over i64::MAX-scale inputs is not meaningful anyway.
        self.sum.fetch_add(value, Ordering::Relaxed);
        self.min.fetch_min(value, Ordering::Relaxed);
        self.max.fetch_max(value, Ordering::Relaxed);
        if value < 0 {
            self.negative.record(value.unsigned_abs());
        } else {
            self.positive.record(value.unsigned_abs());
        }
    }

    /// Number of samples recorded.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    fn quantile(
        &self,
        negative: &[u64; BUCKET_COUNT],
        positive: &[u64; BUCKET_COUNT],
        q: f64,
    ) -> Option<i64> {
        let total: u64 = negative.iter().sum::<u64>() + positive.iter().sum::<u64>();
        if total == 0 {
            return None;
        }
        let rank = rank_for(q, total);
        let mut seen = 0u64;
        // Most negative first: largest magnitudes of the negative side.
        for (index, count) in negative.iter().enumerate().rev() {
            seen += count;
            if seen >= rank {
                let magnitude = i64::try_from(bucket_upper_bound(index)).unwrap_or(i64::MAX);
                return Some(-magnitude);
            }
        }
        for (index, count) in positive.iter().enumerate() {
            seen += count;
            if seen >= rank {
                return Some(i64::try_from(bucket_upper_bound(index)).unwrap_or(i64::MAX));
            }
        }
        Some(self.max.load(Ordering::Relaxed))
    }

    #[allow(clippy::cast_precision_loss)]
    pub(crate) fn snapshot(&self, name: &str) -> DistributionSnapshot {
        let count = self.count();
        let (min, max) = if count == 0 {
            (0, 0)
        } else {
            (self.min.load(Ordering::Relaxed), self.max.load(Ordering::Relaxed))
        };
        let negative = self.negative.load();
        let positive = self.positive.load();
        let q = |p: f64| self.quantile(&negative, &positive, p).map_or(0, |v| v.clamp(min, max));

        DistributionSnapshot {
            name: name.to_string(),
            count,
            min,
            max,
            mean: if count == 0 {
                0.0
            } else {
                self.sum.load(Ordering::Relaxed) as f64 / count as f64
            },
            p50: q(0.50),
            p95: q(0.95),
            p99: q(0.99),
        }
    }
}

/// Point-in-time view of a distribution.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DistributionSnapshot {
    pub name: String,
    pub count: u64,
    pub min: i64,
    pub max: i64,
    pub mean: f64,
    pub p50: i64,
    pub p95: i64,
    pub p99: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_tracks_extremes() {
        let dist = Distribution::new();
        for v in [42, 7, 100] {
            dist.update(v);
        }
        let snap = dist.snapshot("d");
        assert_eq!(snap.count, 3);
        assert_eq!(snap.min, 7);
        assert_eq!(snap.max, 100);
        assert!((snap.mean - 149.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_negative_values_order_before_positive() {
        let dist = Distribution::new();
        dist.update(-500);
        dist.update(3);
        dist.update(4);
        let snap = dist.snapshot("signed");
        assert_eq!(snap.min, -500);
        assert!(snap.p50 > 0);
        assert!(snap.p50 <= 4);
    }

    #[test]
    fn test_single_sample_quantiles_are_exact() {
        let dist = Distribution::new();
        dist.update(42);
        let snap = dist.snapshot("one");
        assert_eq!(snap.p50, 42);
        assert_eq!(snap.p99, 42);
    }
}
