//! Profiler configuration model
//!
//! The same YAML document drives both halves of metjo: the instrumenter reads
//! `includes`, `excludes` and `parameters` to decide what to rewrite, and the
//! runtime reads `reporter`, `properties` and `parameters` to decide where the
//! measurements go.
//!
//! ```yaml
//! reporter: console
//! properties:
//!   period: 20
//!   output: stderr
//! includes: ["app::service::*"]
//! excludes: ["app::service::internal::*"]
//! parameters:
//!   - name: order-size
//!     parameter: app::service::Orders::place.1
//! ```

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use crate::errors::ConfigError;

/// Environment variable naming the configuration file.
pub const CONFIG_ENV_VAR: &str = "METJO_CONFIG";

/// Backend-specific key/value settings.
pub type Properties = HashMap<String, serde_yaml::Value>;

/// One `{name, parameter}` capture entry.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ParameterSpec {
    /// Name of the distribution the captured values feed.
    pub name: String,
    /// `"<fullyQualifiedMethod>.<parameterIndex>"`
    pub parameter: String,
}

/// Resolved profiler configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProfilerConfig {
    /// Reporter backend name (`console`, `json`).
    pub reporter: Option<String>,
    /// Reporter properties; keys the backend does not know are ignored.
    pub properties: Properties,
    /// Include globs. Empty means nothing is instrumented by pattern.
    pub includes: Vec<String>,
    /// Exclude globs; they win over includes.
    pub excludes: Vec<String>,
    /// Parameter capture specs.
    pub parameters: Vec<ParameterSpec>,
}

impl ProfilerConfig {
    /// Parse a YAML document.
    ///
    /// An empty document yields the default configuration.
    ///
    /// # Errors
    /// Returns an error if the document is not valid YAML or has the wrong shape.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Load the configuration from a YAML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        Self::from_yaml(&content)
    }

    /// Load the configuration named by `METJO_CONFIG`.
    ///
    /// Returns `Ok(None)` when the variable is not set.
    ///
    /// # Errors
    /// Returns an error if the named file cannot be read or parsed.
    pub fn from_env() -> Result<Option<Self>, ConfigError> {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => Self::from_path(path).map(Some),
            None => Ok(None),
        }
    }
}
