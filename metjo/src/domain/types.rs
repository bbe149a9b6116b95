//! Instrumentation decision types

use metjo_probe::MethodKey;
use std::fmt;

/// Naming requested by a `#[timed]` marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimedMarker {
    /// Metric named after the fully-qualified function name.
    Absolute,
    /// Metric named after the bare function name.
    Relative,
}

/// Why a candidate function is never rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Trait method without a default body, or a foreign function.
    NoBody,
    /// `{}`: nothing to measure.
    EmptyBody,
    /// Probes cannot run in const context.
    ConstFn,
    /// Per-thread probes cannot follow a future across `.await` points.
    AsyncFn,
    /// Inside an `#[automatically_derived]` impl.
    Synthesized,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::NoBody => "no body",
            Self::EmptyBody => "empty body",
            Self::ConstFn => "const fn",
            Self::AsyncFn => "async fn",
            Self::Synthesized => "compiler-generated",
        };
        f.write_str(text)
    }
}

/// Outcome of the selector for one function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstrumentationDecision {
    pub key: MethodKey,
    pub should_instrument: bool,
    pub metric_name: String,
    pub captures_parameters: bool,
    /// Selected by a `#[timed]` marker rather than by patterns.
    pub forced_by_marker: bool,
}

/// What happened to one function during a transform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FunctionOutcome {
    Instrumented { metric_name: String, captures_parameters: bool },
    NotSelected,
    Skipped(SkipReason),
    AlreadyInstrumented,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionReport {
    pub key: MethodKey,
    pub outcome: FunctionOutcome,
}

impl fmt::Display for FunctionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            FunctionOutcome::Instrumented { metric_name, captures_parameters } => {
                write!(f, "instrument  {} as {metric_name}", self.key)?;
                if *captures_parameters {
                    write!(f, " (captures parameters)")?;
                }
                Ok(())
            }
            FunctionOutcome::NotSelected => write!(f, "skip        {} (not selected)", self.key),
            FunctionOutcome::Skipped(reason) => write!(f, "skip        {} ({reason})", self.key),
            FunctionOutcome::AlreadyInstrumented => {
                write!(f, "keep        {} (already instrumented)", self.key)
            }
            FunctionOutcome::Failed(error) => write!(f, "fail        {}: {error}", self.key),
        }
    }
}
