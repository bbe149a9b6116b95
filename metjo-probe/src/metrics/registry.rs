//! Concurrent name-keyed metric store.

use dashmap::DashMap;
use log::debug;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

use super::distribution::{Distribution, DistributionSnapshot};
use super::timer::{Timer, TimerSnapshot};

/// Process-wide store of timers and distributions.
///
/// Lookups by `&str` never allocate; creation happens once per name and is
/// safe under concurrent lookup-or-create from any number of threads.
pub struct MetricRegistry {
    timers: DashMap<String, Arc<Timer>>,
    distributions: DashMap<String, Arc<Distribution>>,
    created: Instant,
}

impl MetricRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self { timers: DashMap::new(), distributions: DashMap::new(), created: Instant::now() }
    }

    /// Look up or create the timer registered under `name`.
    pub fn timer(&self, name: &str) -> Arc<Timer> {
        if let Some(timer) = self.timers.get(name) {
            return Arc::clone(timer.value());
        }
        let mut created = false;
        let metric = self
            .timers
            .entry(name.to_owned())
            .or_insert_with(|| {
                created = true;
                Arc::new(Timer::new())
            })
            .clone();
        // Logged after the shard lock is released.
        if created {
            debug!("Registered timer {name}");
        }
        metric
    }

    /// Look up or create the distribution registered under `name`.
    pub fn distribution(&self, name: &str) -> Arc<Distribution> {
        if let Some(dist) = self.distributions.get(name) {
            return Arc::clone(dist.value());
        }
        let mut created = false;
        let metric = self
            .distributions
            .entry(name.to_owned())
            .or_insert_with(|| {
                created = true;
                Arc::new(Distribution::new())
            })
            .clone();
        // Logged after the shard lock is released.
        if created {
            debug!("Registered distribution {name}");
        }
        metric
    }

    /// Existing timer without creating one.
    #[must_use]
    pub fn find_timer(&self, name: &str) -> Option<Arc<Timer>> {
        self.timers.get(name).map(|t| Arc::clone(t.value()))
    }

    /// Existing distribution without creating one.
    #[must_use]
    pub fn find_distribution(&self, name: &str) -> Option<Arc<Distribution>> {
        self.distributions.get(name).map(|d| Arc::clone(d.value()))
    }

    /// Point-in-time view of every metric, sorted by name.
    #[must_use]
    pub fn snapshot(&self) -> RegistrySnapshot {
        let mut timers: Vec<TimerSnapshot> =
            self.timers.iter().map(|entry| entry.value().snapshot(entry.key())).collect();
        timers.sort_unstable_by(|a, b| a.name.cmp(&b.name));

        let mut distributions: Vec<DistributionSnapshot> =
            self.distributions.iter().map(|entry| entry.value().snapshot(entry.key())).collect();
        distributions.sort_unstable_by(|a, b| a.name.cmp(&b.name));

        RegistrySnapshot {
            uptime_secs: self.created.elapsed().as_secs_f64(),
            timers,
            distributions,
        }
    }
}

impl Default for MetricRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Serialisable view of a registry, as written by the JSON reporter.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RegistrySnapshot {
    pub uptime_secs: f64,
    pub timers: Vec<TimerSnapshot>,
    pub distributions: Vec<DistributionSnapshot>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_timer_lookup_returns_same_instance() {
        let registry = MetricRegistry::new();
        let a = registry.timer("app::Orders::place");
        let b = registry.timer("app::Orders::place");
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_find_does_not_create() {
        let registry = MetricRegistry::new();
        assert!(registry.find_timer("missing").is_none());
        assert!(registry.find_distribution("missing").is_none());
        assert!(registry.snapshot().timers.is_empty());
    }

    #[test]
    fn test_snapshot_sorted_by_name() {
        let registry = MetricRegistry::new();
        registry.timer("b").record(Duration::from_millis(1));
        registry.timer("a").record(Duration::from_millis(2));
        registry.distribution("size").update(42);

        let snap = registry.snapshot();
        let names: Vec<&str> = snap.timers.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(snap.distributions[0].name, "size");
        assert_eq!(snap.distributions[0].count, 1);
    }

    #[test]
    fn test_concurrent_lookup_or_create() {
        let registry = Arc::new(MetricRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        registry.timer("shared").record(Duration::from_nanos(5));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(registry.find_timer("shared").unwrap().count(), 8000);
        assert_eq!(registry.snapshot().timers.len(), 1);
    }
}
