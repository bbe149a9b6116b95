//! Periodic export of the metric registry.
//!
//! A [`Reporter`] turns a [`RegistrySnapshot`] into output; a
//! [`ScheduledReporter`] runs one on a background thread every `period` and
//! once more when stopped, so the last measurements are not lost at shutdown.
//!
//! Backends are picked by name from a fixed set:
//!
//! | name      | output                                         |
//! |-----------|------------------------------------------------|
//! | `console` | text report to stderr, stdout or a file        |
//! | `json`    | snapshot rewritten as JSON to `path`           |

pub mod console;
pub mod json;

pub use console::{ConsoleReporter, TimeUnit};
pub use json::JsonReporter;

use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use log::{debug, warn};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crate::config::Properties;
use crate::errors::{ConfigError, ProbeError, ReportError};
use crate::metrics::{MetricRegistry, RegistrySnapshot};

/// Reporting interval when `period` is not configured.
pub const DEFAULT_PERIOD: Duration = Duration::from_secs(20);

/// Name of the background export thread.
pub const REPORTER_THREAD_NAME: &str = "metjo-reporter";

/// Sink for registry snapshots.
pub trait Reporter: Send {
    /// Backend name, used in diagnostics.
    fn name(&self) -> &'static str;

    /// Write one snapshot.
    ///
    /// # Errors
    /// Returns an error if the snapshot cannot be written.
    fn report(&mut self, snapshot: &RegistrySnapshot) -> Result<(), ReportError>;
}

/// Build the named backend and start it on `registry`.
///
/// # Errors
/// [`ConfigError::UnknownReporter`] for a name outside the supported set,
/// [`ConfigError::InvalidProperty`] when a required property is missing, or a
/// [`ReportError`] if the output cannot be opened or the thread not spawned.
pub fn make_reporter(
    name: &str,
    properties: &Properties,
    registry: Arc<MetricRegistry>,
) -> Result<ScheduledReporter, ProbeError> {
    let reporter: Box<dyn Reporter> = match name {
        "console" => Box::new(ConsoleReporter::from_properties(properties)?),
        "json" => Box::new(JsonReporter::from_properties(properties)?),
        other => return Err(ConfigError::UnknownReporter(other.to_string()).into()),
    };
    let period = period_property(properties);
    Ok(ScheduledReporter::start(reporter, registry, period)?)
}

/// `period` in seconds; invalid values fall back to [`DEFAULT_PERIOD`].
pub fn period_property(properties: &Properties) -> Duration {
    let Some(value) = properties.get("period") else {
        return DEFAULT_PERIOD;
    };
    let seconds = value
        .as_f64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse::<f64>().ok()))
        .filter(|s| *s > 0.0)
        .and_then(|s| Duration::try_from_secs_f64(s).ok());

    match seconds {
        Some(period) => period,
        None => {
            warn!(
                "{}",
                ConfigError::InvalidProperty {
                    key: "period".to_string(),
                    reason: format!("expected a positive number of seconds, got {value:?}"),
                }
            );
            DEFAULT_PERIOD
        }
    }
}

/// String-valued property, warning when present with another type.
pub(crate) fn string_property(properties: &Properties, key: &str) -> Option<String> {
    let value = properties.get(key)?;
    if let Some(s) = value.as_str() {
        return Some(s.to_string());
    }
    warn!(
        "{}",
        ConfigError::InvalidProperty {
            key: key.to_string(),
            reason: format!("expected a string, got {value:?}"),
        }
    );
    None
}

/// A reporter running on its own thread.
///
/// Stopping (explicitly or on drop) triggers a final report and joins the
/// thread.
pub struct ScheduledReporter {
    name: &'static str,
    period: Duration,
    stop_tx: Option<Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl ScheduledReporter {
    /// Spawn the export thread.
    ///
    /// # Errors
    /// Returns an error if the thread cannot be spawned.
    pub fn start(
        reporter: Box<dyn Reporter>,
        registry: Arc<MetricRegistry>,
        period: Duration,
    ) -> Result<Self, ReportError> {
        let name = reporter.name();
        let (stop_tx, stop_rx) = bounded::<()>(1);

        let worker = std::thread::Builder::new()
            .name(REPORTER_THREAD_NAME.to_string())
            .spawn(move || {
                let mut reporter = reporter;
                loop {
                    match stop_rx.recv_timeout(period) {
                        Err(RecvTimeoutError::Timeout) => emit(reporter.as_mut(), &registry),
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                            emit(reporter.as_mut(), &registry);
                            break;
                        }
                    }
                }
            })?;

        debug!("Started {name} reporter every {period:?}");
        Ok(Self { name, period, stop_tx: Some(stop_tx), worker: Some(worker) })
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Flush one last report and join the thread.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("{} reporter thread panicked", self.name);
            }
        }
    }
}

impl Drop for ScheduledReporter {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn emit(reporter: &mut dyn Reporter, registry: &MetricRegistry) {
    if let Err(e) = reporter.report(&registry.snapshot()) {
        warn!("{} reporter failed: {e}", reporter.name());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recording(Arc<Mutex<Vec<usize>>>);

    impl Reporter for Recording {
        fn name(&self) -> &'static str {
            "recording"
        }

        fn report(&mut self, snapshot: &RegistrySnapshot) -> Result<(), ReportError> {
            self.0.lock().unwrap().push(snapshot.timers.len());
            Ok(())
        }
    }

    fn props(yaml: &str) -> Properties {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_period_property() {
        assert_eq!(period_property(&Properties::new()), DEFAULT_PERIOD);
        assert_eq!(period_property(&props("period: 5")), Duration::from_secs(5));
        assert_eq!(period_property(&props("period: 0.5")), Duration::from_millis(500));
        assert_eq!(period_property(&props("period: \"2\"")), Duration::from_secs(2));
        assert_eq!(period_property(&props("period: -3")), DEFAULT_PERIOD);
        assert_eq!(period_property(&props("period: soon")), DEFAULT_PERIOD);
    }

    #[test]
    fn test_period_out_of_range_defaults() {
        assert_eq!(period_property(&props("period: 1e30")), DEFAULT_PERIOD);
        assert_eq!(period_property(&props("period: .inf")), DEFAULT_PERIOD);
        assert_eq!(period_property(&props("period: .nan")), DEFAULT_PERIOD);
    }

    #[test]
    fn test_unknown_reporter() {
        let result = make_reporter("wavefront", &Properties::new(), Arc::new(MetricRegistry::new()));
        assert!(matches!(result, Err(ProbeError::Config(ConfigError::UnknownReporter(name))) if name == "wavefront"));
    }

    #[test]
    fn test_stop_flushes_final_report() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let registry = Arc::new(MetricRegistry::new());
        registry.timer("app::f").record(Duration::from_millis(1));

        let scheduled = ScheduledReporter::start(
            Box::new(Recording(Arc::clone(&seen))),
            Arc::clone(&registry),
            Duration::from_secs(3600),
        )
        .unwrap();
        assert_eq!(scheduled.name(), "recording");
        scheduled.stop();

        assert_eq!(*seen.lock().unwrap(), vec![1]);
    }

    #[test]
    fn test_reports_every_period() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let scheduled = ScheduledReporter::start(
            Box::new(Recording(Arc::clone(&seen))),
            Arc::new(MetricRegistry::new()),
            Duration::from_millis(10),
        )
        .unwrap();
        std::thread::sleep(Duration::from_millis(100));
        drop(scheduled);

        assert!(seen.lock().unwrap().len() >= 2);
    }
}
