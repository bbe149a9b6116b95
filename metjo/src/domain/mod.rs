//! Domain model for metjo
//!
//! This module contains the instrumentation decision types and errors that provide:
//! - One decision value per candidate function, consumed by the injector
//! - Structured error handling per function, per file and per tree

pub mod errors;
pub mod types;

// Re-export common types for convenience
pub use types::{FunctionOutcome, FunctionReport, InstrumentationDecision, SkipReason, TimedMarker};

pub use errors::{InstrumentError, PatternError, TransformError, TreeError};
