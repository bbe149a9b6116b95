//! # metjo-probe - Runtime for metjo-instrumented code
//!
//! Every function the `metjo` instrumenter selects starts with a call to
//! [`probe_entry`]; the returned [`ProbeGuard`] runs the exit probe when it is
//! dropped. This crate is what those calls land in.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │              Instrumented program (any thread)              │
//! │   let __metjo_guard = probe_entry(metric, fq, &args, caps); │
//! └───────────────────────┬─────────────────────────────────────┘
//!                         │ entry / drop of guard
//!                         ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  ProbeDispatcher                                            │
//! │   • per-thread call stack + reentrancy latch (thread_local) │
//! │   • CaptureTable: fq name ─► [(index, distribution)]        │
//! └───────────────────────┬─────────────────────────────────────┘
//!                         │ lookup-or-create by name
//!                         ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  MetricRegistry (DashMap)   Timer / Distribution (atomics)  │
//! └───────────────────────┬─────────────────────────────────────┘
//!                         │ snapshot every period
//!                         ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  ScheduledReporter ─► console | json                        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Structure
//!
//! - [`config`]: YAML configuration shared with the instrumenter
//! - [`method`]: [`MethodKey`], the identity of an instrumentable function
//! - [`capture`]: parameter capture specs
//! - [`metrics`]: timers, distributions and the registry
//! - [`dispatcher`]: the per-thread state machine behind the probes
//! - [`reporter`]: periodic export
//! - [`bootstrap`]: startup from `METJO_CONFIG`
//!
//! ## Typical Usage
//!
//! ```ignore
//! fn main() {
//!     let _profiler = metjo_probe::init_from_env();
//!     run();
//! }
//! ```
//!
//! Functions can opt in explicitly with [`timed`]:
//!
//! ```ignore
//! #[metjo_probe::timed(relative)]
//! fn handle(&self, job: u32) { /* ... */ }
//! ```

pub mod arg;
pub mod bootstrap;
pub mod capture;
pub mod config;
pub mod dispatcher;
pub mod errors;
pub mod method;
pub mod metrics;
pub mod probe;
pub mod reporter;

pub use arg::ProbeArg;
pub use bootstrap::{init, init_from_env, ProfilerHandle};
pub use capture::{CaptureSpec, CaptureTable};
pub use config::{ParameterSpec, ProfilerConfig, Properties, CONFIG_ENV_VAR};
pub use dispatcher::{DispatchStats, ProbeDispatcher};
pub use errors::{ConfigError, DispatchError, ProbeError, ReportError};
pub use method::{MethodKey, PATH_SEPARATOR};
pub use metrics::{MetricRegistry, RegistrySnapshot};
pub use probe::{install, installed, probe_entry, probe_exit, ProbeGuard};

pub use metjo_macros::timed;
