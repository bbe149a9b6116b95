//! Process-wide probe entry points called from instrumented code.
//!
//! The instrumenter rewrites every selected function to start with
//!
//! ```ignore
//! let __metjo_guard = ::metjo_probe::probe_entry("metric", "crate::m::f", &[], false);
//! ```
//!
//! and the guard's `Drop` is the exit probe, so it runs on fall-through,
//! early `return`, `?` and panic unwinding alike. Until a dispatcher is
//! installed every probe is inert.

use std::marker::PhantomData;
use std::sync::{Arc, OnceLock};

use crate::arg::ProbeArg;
use crate::dispatcher::ProbeDispatcher;
use crate::errors::ProbeError;

static DISPATCHER: OnceLock<Arc<ProbeDispatcher>> = OnceLock::new();

/// Install the process-wide dispatcher. Can only happen once per process.
///
/// # Errors
/// Returns [`ProbeError::AlreadyInstalled`] if a dispatcher is already set.
pub fn install(dispatcher: Arc<ProbeDispatcher>) -> Result<(), ProbeError> {
    DISPATCHER.set(dispatcher).map_err(|_| ProbeError::AlreadyInstalled)
}

/// The installed dispatcher, if any.
#[must_use]
pub fn installed() -> Option<&'static Arc<ProbeDispatcher>> {
    DISPATCHER.get()
}

/// Entry probe. Keep the returned guard alive for the whole function body.
#[must_use = "dropping the guard immediately ends the measurement"]
#[inline]
pub fn probe_entry(
    metric_name: &str,
    full_name: &str,
    args: &[ProbeArg],
    has_captures: bool,
) -> ProbeGuard {
    let armed = DISPATCHER
        .get()
        .is_some_and(|dispatcher| dispatcher.on_entry(metric_name, full_name, args, has_captures));
    ProbeGuard { armed, _not_send: PhantomData }
}

/// Exit probe. Bookkeeping errors are logged by the dispatcher and swallowed.
#[inline]
pub fn probe_exit() {
    if let Some(dispatcher) = DISPATCHER.get() {
        let _ = dispatcher.on_exit();
    }
}

/// Pairs one entry with its exit.
///
/// Only a guard whose entry actually started a measurement runs the exit
/// probe, so suppressed (reentrant or disabled) entries never produce an
/// unmatched exit. Not `Send`: the exit must happen on the entry thread.
pub struct ProbeGuard {
    armed: bool,
    _not_send: PhantomData<*const ()>,
}

impl ProbeGuard {
    /// Whether the entry started a measurement.
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.armed
    }
}

impl Drop for ProbeGuard {
    fn drop(&mut self) {
        if self.armed {
            probe_exit();
        }
    }
}

impl std::fmt::Debug for ProbeGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProbeGuard").field("armed", &self.armed).finish()
    }
}
