//! Method selection: which functions get probes, under which metric name.

pub mod candidate;
pub mod pattern;
pub mod selector;

pub use candidate::{is_automatically_derived, is_naked, skip_reason, timed_marker};
pub use pattern::{matches, FilterSet};
pub use selector::MethodSelector;
