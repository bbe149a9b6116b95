//! Metrics backend: named timers and value distributions.
//!
//! The dispatcher only needs "look up or create a named timer" and "look up
//! or create a named distribution"; export is the reporters' business.

mod distribution;
mod histogram;
mod registry;
mod timer;

pub use distribution::{Distribution, DistributionSnapshot};
pub use registry::{MetricRegistry, RegistrySnapshot};
pub use timer::{Timer, TimerHandle, TimerSnapshot};
