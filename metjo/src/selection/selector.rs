//! Per-function instrumentation decision.
//!
//! ```text
//! fq name ──► #[timed]? ──yes──► instrument (fq or bare metric name)
//!                 │ no
//!                 ▼
//!        includes ∧ ¬excludes ──► instrument as fq / skip
//!                 │
//!                 ▼
//!      captures_for(fq) non-empty ──► captures_parameters
//! ```

use log::{debug, info};
use metjo_probe::{CaptureTable, MethodKey, MetricRegistry, ProfilerConfig};

use super::pattern::FilterSet;
use crate::domain::{InstrumentationDecision, PatternError, TimedMarker};

pub struct MethodSelector {
    includes: FilterSet,
    excludes: FilterSet,
    captures: CaptureTable,
}

impl MethodSelector {
    #[must_use]
    pub fn new(includes: FilterSet, excludes: FilterSet, captures: CaptureTable) -> Self {
        Self { includes, excludes, captures }
    }

    /// Selector for the patterns and parameter captures of `config`.
    ///
    /// The capture table is built against a private registry: only the
    /// presence of captures matters at rewrite time.
    ///
    /// # Errors
    /// Returns an error if the include or exclude patterns cannot be compiled.
    pub fn from_config(config: &ProfilerConfig) -> Result<Self, PatternError> {
        let includes = FilterSet::new(config.includes.iter().cloned())?;
        let excludes = FilterSet::new(config.excludes.iter().cloned())?;
        let captures = CaptureTable::build(&config.parameters, &MetricRegistry::new());
        Ok(Self::new(includes, excludes, captures))
    }

    #[must_use]
    pub fn includes(&self) -> &FilterSet {
        &self.includes
    }

    #[must_use]
    pub fn excludes(&self) -> &FilterSet {
        &self.excludes
    }

    /// Decide whether and how to instrument `key`. A marker wins over both
    /// pattern lists.
    #[must_use]
    pub fn decide(&self, key: MethodKey, marker: Option<TimedMarker>) -> InstrumentationDecision {
        let fq = key.fully_qualified_name();
        let (should_instrument, metric_name) = match marker {
            Some(TimedMarker::Relative) => (true, key.method_name().to_string()),
            Some(TimedMarker::Absolute) => (true, fq.to_string()),
            None => {
                (self.includes.matches(fq) && !self.excludes.matches(fq), fq.to_string())
            }
        };
        let captures_parameters = !self.captures.captures_for(&key).is_empty();

        if should_instrument {
            info!("Instrumenting method: {fq} as {metric_name}");
        } else {
            debug!("Not instrumenting method: {fq}");
        }

        InstrumentationDecision {
            key,
            should_instrument,
            metric_name,
            captures_parameters,
            forced_by_marker: marker.is_some(),
        }
    }
}
