//! Capture spec table: which method parameters feed which distributions.
//!
//! Built once from the `parameters` configuration entries before any code is
//! transformed or any probe fires, then only read.

use log::warn;
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::ParameterSpec;
use crate::errors::ConfigError;
use crate::method::MethodKey;
use crate::metrics::{Distribution, MetricRegistry};

/// Binding of one parameter position to a named distribution.
#[derive(Clone)]
pub struct CaptureSpec {
    pub method: MethodKey,
    pub parameter_index: usize,
    /// Distribution name as configured.
    pub name: String,
    pub distribution: Arc<Distribution>,
}

impl std::fmt::Debug for CaptureSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureSpec")
            .field("method", &self.method)
            .field("parameter_index", &self.parameter_index)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Split `"<fqMethod>.<index>"` on its last `.`.
///
/// # Errors
/// Returns [`ConfigError::InvalidCaptureSpec`] if there is no `.`, the method
/// part is empty, or the suffix is not a non-negative integer.
pub fn parse_specifier(specifier: &str) -> Result<(MethodKey, usize), ConfigError> {
    let invalid = |reason| ConfigError::InvalidCaptureSpec { spec: specifier.to_string(), reason };

    let (method, index) =
        specifier.rsplit_once('.').ok_or_else(|| invalid("expected <method>.<index>"))?;
    if method.trim().is_empty() {
        return Err(invalid("method name is empty"));
    }
    let index = index
        .trim()
        .parse::<usize>()
        .map_err(|_| invalid("last part of parameter specifier must be a non-negative integer"))?;

    Ok((MethodKey::parse(method.trim()), index))
}

/// Read-only lookup from fully-qualified method name to its capture specs.
#[derive(Debug, Default)]
pub struct CaptureTable {
    by_method: HashMap<String, Vec<CaptureSpec>>,
}

impl CaptureTable {
    /// Build the table, creating each distribution in `registry`.
    ///
    /// Malformed entries are logged and skipped; several entries for the same
    /// method accumulate in encounter order.
    pub fn build(entries: &[ParameterSpec], registry: &MetricRegistry) -> Self {
        let mut by_method: HashMap<String, Vec<CaptureSpec>> = HashMap::new();

        for entry in entries {
            let (method, parameter_index) = match parse_specifier(&entry.parameter) {
                Ok(parsed) => parsed,
                Err(e) => {
                    warn!("{e}");
                    continue;
                }
            };
            let spec = CaptureSpec {
                parameter_index,
                name: entry.name.clone(),
                distribution: registry.distribution(&entry.name),
                method,
            };
            by_method
                .entry(spec.method.fully_qualified_name().to_string())
                .or_default()
                .push(spec);
        }

        Self { by_method }
    }

    /// Capture specs registered for `method`, empty if none.
    #[must_use]
    pub fn captures_for(&self, method: &MethodKey) -> &[CaptureSpec] {
        self.captures_for_name(method.fully_qualified_name())
    }

    /// Capture specs registered under a fully-qualified name, empty if none.
    #[must_use]
    pub fn captures_for_name(&self, fully_qualified_name: &str) -> &[CaptureSpec] {
        self.by_method.get(fully_qualified_name).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_method.is_empty()
    }

    /// Number of methods with at least one capture.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_method.len()
    }
}
