//! A logger that is itself instrumented must not recurse into the dispatcher.
//!
//! The registry logs when it creates a timer and the dispatcher warns about
//! unmatched exits; both happen with the latch held, so the logger's own
//! probe has to come back unarmed.

use log::{Level, LevelFilter, Log, Metadata, Record};
use metjo_probe::{init, probe_entry, probe_exit, ProbeDispatcher, ProfilerConfig};
use std::sync::Mutex;

struct InstrumentedLogger {
    seen: Mutex<Vec<(String, bool)>>,
}

impl Log for InstrumentedLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Debug
    }

    fn log(&self, record: &Record) {
        let guard = probe_entry("logger::log", "logger::InstrumentedLogger::log", &[], false);
        let message = record.args().to_string();
        self.seen.lock().unwrap().push((message, guard.is_armed()));
    }

    fn flush(&self) {}
}

static LOGGER: InstrumentedLogger = InstrumentedLogger { seen: Mutex::new(Vec::new()) };

fn armed_for(prefix: &str) -> Vec<bool> {
    LOGGER
        .seen
        .lock()
        .unwrap()
        .iter()
        .filter(|(message, _)| message.starts_with(prefix))
        .map(|(_, armed)| *armed)
        .collect()
}

fn work() -> u32 {
    let __metjo_guard = probe_entry("app::work", "app::work", &[], false);
    7
}

#[test]
fn test_logging_inside_dispatcher_is_not_instrumented() {
    log::set_logger(&LOGGER).unwrap();
    log::set_max_level(LevelFilter::Debug);

    let handle = init(&ProfilerConfig::default()).unwrap();
    let stats = handle.dispatcher().stats();

    // First call creates the timer, which logs from inside the dispatcher.
    assert_eq!(work(), 7);
    let registrations = armed_for("Registered timer app::work");
    assert_eq!(registrations, vec![false]);
    assert!(stats.reentrant_suppressed() >= 1);
    assert_eq!(ProbeDispatcher::current_depth(), 0);

    // Unmatched exit warns from inside the dispatcher as well.
    probe_exit();
    assert_eq!(stats.unmatched_exits(), 1);
    assert_eq!(armed_for("Method exit without matching entry"), vec![false]);
    assert_eq!(ProbeDispatcher::current_depth(), 0);

    // A logger call made outside the dispatcher is an ordinary measured call.
    log::info!("plain message");
    assert_eq!(armed_for("plain message"), vec![true]);
    assert_eq!(ProbeDispatcher::current_depth(), 0);

    let snapshot = handle.snapshot();
    let work_timer = snapshot.timers.iter().find(|t| t.name == "app::work").unwrap();
    assert_eq!(work_timer.count, 1);
    assert_eq!(stats.timers_started(), stats.timers_stopped());
}
