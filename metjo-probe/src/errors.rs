//! Structured error types for the probe runtime
//!
//! Using thiserror for automatic Display implementation and error chaining.
//! None of these ever escape into the instrumented program: configuration
//! problems are warned and skipped, dispatch problems are reported and
//! swallowed by the probe entry points.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid parameter capture '{spec}': {reason}. Skipping")]
    InvalidCaptureSpec { spec: String, reason: &'static str },

    #[error("Unknown reporter '{0}'")]
    UnknownReporter(String),

    #[error("Invalid value for reporter property '{key}': {reason}")]
    InvalidProperty { key: String, reason: String },
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DispatchError {
    #[error("Method exit without matching entry")]
    ExitWithoutEntry,

    #[error("Thread call state is no longer available (thread is shutting down)")]
    ThreadStateUnavailable,
}

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to write report: {0}")]
    WriteFailed(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("A probe dispatcher is already installed for this process")]
    AlreadyInstalled,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Report(#[from] ReportError),
}
