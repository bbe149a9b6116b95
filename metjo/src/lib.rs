//! # metjo - Method-Level Instrumentation Profiler for Rust
//!
//! metjo decides, per function, whether to wrap it with timing probes,
//! rewrites the function body to call into the `metjo-probe` runtime on entry
//! and exit, and leaves the measurements to the runtime's metrics registry
//! and reporters.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Source tree (src/**/*.rs)                    │
//! └───────────────────────┬─────────────────────────────────────────┘
//!                         │ one file = one module path
//!                         ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      metjo (This Crate)                         │
//! │                                                                 │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐         │
//! │  │  Candidate   │──▶│   Method     │──▶│    Code      │         │
//! │  │ classifier   │   │  Selector    │   │  Injector    │         │
//! │  └──────────────┘   └──────┬───────┘   └──────┬───────┘         │
//! │                            │                  │                 │
//! │                   FilterSet + CaptureTable    ▼ prettyplease    │
//! └───────────────────────────────────────────────┬─────────────────┘
//!                                                 │ instrumented tree
//!                                                 ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │        Instrumented program linked with metjo-probe             │
//! │   probe_entry ─► ProbeDispatcher ─► MetricRegistry ─► reporter  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Structure
//!
//! - [`selection`]: which functions get probes
//!   - `pattern`: include/exclude globs compiled into a regex set
//!   - `candidate`: functions that can never be rewritten, `#[timed]` markers
//!   - `selector`: the per-function decision and metric name
//!
//! - [`injection`]: rewriting
//!   - `injector`: the entry probe statement for one function
//!   - `transformer`: one file, parsed with `syn`, printed with `prettyplease`
//!   - `tree`: a whole source directory
//!
//! - [`analysis`]: ranking exported snapshots by total time
//!
//! - [`cli`]: command-line argument parsing
//!
//! - [`domain`]: decisions, outcomes and errors
//!
//! ## Selection Rules
//!
//! 1. A `#[timed]` marker always instruments, under the fully-qualified name
//!    or, with `#[timed(relative)]`, the bare function name
//! 2. Otherwise a function is instrumented iff it matches an include pattern
//!    and no exclude pattern
//! 3. `const fn`, `async fn`, empty or missing bodies and
//!    `#[automatically_derived]` impls are never rewritten
//!
//! ## Typical Usage
//!
//! ```bash
//! # Instrument a crate's sources into a separate tree
//! metjo instrument --config metjo.yaml --crate-name shop --src src --out target/metjo/src
//!
//! # See what would happen to one file
//! metjo explain --config metjo.yaml src/orders.rs
//!
//! # Rank the methods of a json reporter snapshot
//! metjo report metrics.json --top 10
//! ```

pub mod analysis;
pub mod cli;
pub mod domain;
pub mod injection;
pub mod selection;
