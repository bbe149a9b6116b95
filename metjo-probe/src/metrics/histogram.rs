//! Lock-free power-of-two bucket counts used for quantile estimates.
//!
//! Bucket `i` holds values whose bit length is `i`: bucket 0 is exactly zero,
//! bucket 1 is `1`, bucket 2 is `2..=3`, bucket 3 is `4..=7`, and so on up to
//! bucket 64. A quantile is reported as the upper bound of the bucket holding
//! the requested rank, so estimates are within a factor of two.

use std::sync::atomic::{AtomicU64, Ordering};

pub(crate) const BUCKET_COUNT: usize = 65;

pub(crate) struct LogBuckets {
    counts: [AtomicU64; BUCKET_COUNT],
}

impl LogBuckets {
    pub(crate) fn new() -> Self {
        Self { counts: std::array::from_fn(|_| AtomicU64::new(0)) }
    }

    #[inline]
    pub(crate) fn record(&self, value: u64) {
        self.counts[bucket_index(value)].fetch_add(1, Ordering::Relaxed);
    }

    /// Per-bucket counts at this instant.
    pub(crate) fn load(&self) -> [u64; BUCKET_COUNT] {
        std::array::from_fn(|i| self.counts[i].load(Ordering::Relaxed))
    }
}

#[inline]
fn bucket_index(value: u64) -> usize {
    (u64::BITS - value.leading_zeros()) as usize
}

/// Largest value that falls into bucket `index`.
pub(crate) fn bucket_upper_bound(index: usize) -> u64 {
    match index {
        0 => 0,
        i if i >= 64 => u64::MAX,
        i => (1u64 << i) - 1,
    }
}

/// Number of observations at or below which `quantile` of `total` lies.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn rank_for(quantile: f64, total: u64) -> u64 {
    let rank = (quantile.clamp(0.0, 1.0) * total as f64).ceil() as u64;
    rank.max(1)
}

/// Estimate a quantile from an ascending walk over bucket counts.
///
/// Returns `None` when no observation was recorded.
pub(crate) fn quantile(counts: &[u64; BUCKET_COUNT], quantile: f64) -> Option<u64> {
    let total: u64 = counts.iter().sum();
    if total == 0 {
        return None;
    }
    let rank = rank_for(quantile, total);
    let mut seen = 0u64;
    for (index, count) in counts.iter().enumerate() {
        seen += count;
        if seen >= rank {
            return Some(bucket_upper_bound(index));
        }
    }
    Some(u64::MAX)
}
