//! Probe dispatcher: the hot path behind every instrumented call.
//!
//! Each thread owns a [`ThreadCallState`] holding the stack of running
//! measurements and a reentrancy latch. Per thread the dispatcher moves
//! `Idle -> Armed -> Idle`; an entry that arrives while the latch is held
//! (the dispatcher, the registry or a logger called back into instrumented
//! code) is suppressed instead of recursing.
//!
//! ```text
//!   on_entry ──► latch held? ──yes──► suppressed (no timer)
//!                    │ no
//!                    ▼
//!            latch ─► timer(metric).start() ─► push ─► captures ─► unlatch
//!
//!   on_exit ───► latch ─► pop ─► stop ─► unlatch
//!                          └─ empty ─► warn + count (no-op)
//! ```
//!
//! The per-thread state is shared by every dispatcher running on that thread;
//! timer handles carry their own timer, so entries and exits pair by position
//! alone.

use log::{debug, warn};
use std::cell::{Cell, RefCell};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::arg::ProbeArg;
use crate::capture::CaptureTable;
use crate::errors::DispatchError;
use crate::metrics::{MetricRegistry, TimerHandle};

/// Per-thread call nesting and reentrancy flag.
///
/// Created lazily on the first probe of a thread and dropped with it. The
/// stack is only borrowed for a single push or pop, never across a registry
/// or logging call.
pub struct ThreadCallState {
    call_stack: RefCell<Vec<TimerHandle>>,
    in_probe: Cell<bool>,
}

impl ThreadCallState {
    fn new() -> Self {
        Self { call_stack: RefCell::new(Vec::with_capacity(32)), in_probe: Cell::new(false) }
    }

    fn push(&self, handle: TimerHandle) {
        self.call_stack.borrow_mut().push(handle);
    }

    fn pop(&self) -> Option<TimerHandle> {
        self.call_stack.borrow_mut().pop()
    }

    fn depth(&self) -> usize {
        self.call_stack.borrow().len()
    }
}

thread_local! {
    static CALL_STATE: ThreadCallState = ThreadCallState::new();
}

/// Holds the reentrancy latch; restores the previous value on drop, so the
/// flag is reset on every exit path including unwinding.
struct ProbeLatch<'a> {
    flag: &'a Cell<bool>,
    previous: bool,
}

impl<'a> ProbeLatch<'a> {
    fn engage(flag: &'a Cell<bool>) -> Self {
        let previous = flag.replace(true);
        Self { flag, previous }
    }
}

impl Drop for ProbeLatch<'_> {
    fn drop(&mut self) {
        self.flag.set(self.previous);
    }
}

/// Bookkeeping counters, readable from any thread.
#[derive(Debug, Default)]
pub struct DispatchStats {
    timers_started: AtomicU64,
    timers_stopped: AtomicU64,
    reentrant_suppressed: AtomicU64,
    unmatched_exits: AtomicU64,
}

impl DispatchStats {
    #[must_use]
    pub fn timers_started(&self) -> u64 {
        self.timers_started.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn timers_stopped(&self) -> u64 {
        self.timers_stopped.load(Ordering::Relaxed)
    }

    /// Entries dropped because the thread was already inside the dispatcher.
    #[must_use]
    pub fn reentrant_suppressed(&self) -> u64 {
        self.reentrant_suppressed.load(Ordering::Relaxed)
    }

    /// Exits that found no running measurement.
    #[must_use]
    pub fn unmatched_exits(&self) -> u64 {
        self.unmatched_exits.load(Ordering::Relaxed)
    }
}

/// Routes probe calls into the metric registry.
pub struct ProbeDispatcher {
    registry: Arc<MetricRegistry>,
    captures: Arc<CaptureTable>,
    enabled: AtomicBool,
    stats: DispatchStats,
}

impl ProbeDispatcher {
    #[must_use]
    pub fn new(registry: Arc<MetricRegistry>, captures: Arc<CaptureTable>) -> Self {
        Self { registry, captures, enabled: AtomicBool::new(true), stats: DispatchStats::default() }
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<MetricRegistry> {
        &self.registry
    }

    #[must_use]
    pub fn captures(&self) -> &CaptureTable {
        &self.captures
    }

    #[must_use]
    pub fn stats(&self) -> &DispatchStats {
        &self.stats
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Stop arming new measurements. Running ones still complete.
    pub fn disable(&self) {
        self.enabled.store(false, Ordering::Release);
    }

    /// Entry probe. Returns `true` if a measurement was started, in which
    /// case exactly one [`on_exit`](Self::on_exit) must follow on this thread.
    pub fn on_entry(
        &self,
        metric_name: &str,
        full_name: &str,
        args: &[ProbeArg],
        has_captures: bool,
    ) -> bool {
        CALL_STATE
            .try_with(|state| self.enter(state, metric_name, full_name, args, has_captures))
            .unwrap_or(false)
    }

    fn enter(
        &self,
        state: &ThreadCallState,
        metric_name: &str,
        full_name: &str,
        args: &[ProbeArg],
        has_captures: bool,
    ) -> bool {
        if state.in_probe.get() {
            self.stats.reentrant_suppressed.fetch_add(1, Ordering::Relaxed);
            return false;
        }
        if !self.is_enabled() {
            return false;
        }

        let _latch = ProbeLatch::engage(&state.in_probe);
        let handle = self.registry.timer(metric_name).start();
        state.push(handle);
        self.stats.timers_started.fetch_add(1, Ordering::Relaxed);

        if has_captures {
            self.record_captures(full_name, args);
        }
        true
    }

    /// Feed numeric arguments into their distributions. Non-numeric values
    /// and indices past the end of `args` are skipped.
    fn record_captures(&self, full_name: &str, args: &[ProbeArg]) {
        for capture in self.captures.captures_for_name(full_name) {
            if let Some(value) = args.get(capture.parameter_index).and_then(ProbeArg::as_i64) {
                capture.distribution.update(value);
            }
        }
    }

    /// Exit probe: stop the innermost running measurement of this thread.
    ///
    /// # Errors
    /// [`DispatchError::ExitWithoutEntry`] if nothing is running (logged and
    /// counted, the stack is left untouched), or
    /// [`DispatchError::ThreadStateUnavailable`] during thread teardown.
    pub fn on_exit(&self) -> Result<Duration, DispatchError> {
        let result = CALL_STATE
            .try_with(|state| {
                let _latch = ProbeLatch::engage(&state.in_probe);
                let outcome = state.pop().map(TimerHandle::stop).ok_or(DispatchError::ExitWithoutEntry);
                if outcome.is_err() {
                    self.stats.unmatched_exits.fetch_add(1, Ordering::Relaxed);
                    warn!("{}", DispatchError::ExitWithoutEntry);
                }
                outcome
            })
            .unwrap_or_else(|_| {
                debug!("{}", DispatchError::ThreadStateUnavailable);
                Err(DispatchError::ThreadStateUnavailable)
            });

        if result.is_ok() {
            self.stats.timers_stopped.fetch_add(1, Ordering::Relaxed);
        }
        result
    }

    /// Running measurements on the calling thread.
    #[must_use]
    pub fn current_depth() -> usize {
        CALL_STATE.try_with(ThreadCallState::depth).unwrap_or(0)
    }
}
