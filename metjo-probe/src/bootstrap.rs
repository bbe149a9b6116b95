//! Runtime startup: configuration to installed dispatcher.
//!
//! An instrumented program calls [`init_from_env`] (or [`init`] with its own
//! configuration) once at startup and keeps the returned handle alive for as
//! long as it wants measurements. Dropping the handle stops recording and
//! flushes a final report.

use log::{info, warn};
use std::sync::Arc;

use crate::capture::CaptureTable;
use crate::config::{ProfilerConfig, CONFIG_ENV_VAR};
use crate::dispatcher::ProbeDispatcher;
use crate::errors::ProbeError;
use crate::metrics::{MetricRegistry, RegistrySnapshot};
use crate::probe::install;
use crate::reporter::{make_reporter, ScheduledReporter};

/// Owns the running profiler.
pub struct ProfilerHandle {
    dispatcher: Arc<ProbeDispatcher>,
    reporter: Option<ScheduledReporter>,
}

impl ProfilerHandle {
    #[must_use]
    pub fn dispatcher(&self) -> &Arc<ProbeDispatcher> {
        &self.dispatcher
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<MetricRegistry> {
        self.dispatcher.registry()
    }

    /// Current metrics, independent of the reporter schedule.
    #[must_use]
    pub fn snapshot(&self) -> RegistrySnapshot {
        self.dispatcher.registry().snapshot()
    }

    /// Whether a reporter is exporting measurements.
    #[must_use]
    pub fn is_exporting(&self) -> bool {
        self.reporter.is_some()
    }

    /// Stop arming probes and flush the reporter.
    pub fn shutdown(mut self) {
        self.finish();
    }

    fn finish(&mut self) {
        self.dispatcher.disable();
        if let Some(reporter) = self.reporter.take() {
            info!("Stopping {} reporter", reporter.name());
            reporter.stop();
        }
    }
}

impl Drop for ProfilerHandle {
    fn drop(&mut self) {
        self.finish();
    }
}

/// Build the registry, capture table, reporter and dispatcher, and install
/// the dispatcher for this process.
///
/// A reporter that cannot be created is logged; measurements are still
/// collected and reachable through [`ProfilerHandle::snapshot`].
///
/// # Errors
/// Returns [`ProbeError::AlreadyInstalled`] if a dispatcher was installed
/// before, including by an earlier, already shut down handle.
pub fn init(config: &ProfilerConfig) -> Result<ProfilerHandle, ProbeError> {
    let registry = Arc::new(MetricRegistry::new());
    let captures = Arc::new(CaptureTable::build(&config.parameters, &registry));
    let capture_count = captures.len();
    let dispatcher = Arc::new(ProbeDispatcher::new(Arc::clone(&registry), captures));
    install(Arc::clone(&dispatcher))?;

    let reporter = match config.reporter.as_deref() {
        None => {
            info!("No reporter configured; metrics will not be exported");
            None
        }
        Some(name) => match make_reporter(name, &config.properties, registry) {
            Ok(reporter) => Some(reporter),
            Err(e) => {
                warn!("{e}; metrics will not be exported");
                None
            }
        },
    };

    info!("metjo profiling enabled ({capture_count} method(s) with parameter captures)");
    Ok(ProfilerHandle { dispatcher, reporter })
}

/// [`init`] from the file named by `METJO_CONFIG`.
///
/// Returns `None` (profiling disabled) when the variable is unset, the file
/// is unusable, or a dispatcher is already installed.
#[must_use]
pub fn init_from_env() -> Option<ProfilerHandle> {
    let config = match ProfilerConfig::from_env() {
        Ok(Some(config)) => config,
        Ok(None) => {
            info!("{CONFIG_ENV_VAR} is not set; profiling disabled");
            return None;
        }
        Err(e) => {
            warn!("{e}; profiling disabled");
            return None;
        }
    };
    match init(&config) {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!("{e}; profiling disabled");
            None
        }
    }
}
