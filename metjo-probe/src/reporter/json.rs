//! JSON snapshot reporter.
//!
//! Each report replaces the file at `path` with the full registry snapshot,
//! written to a sibling temporary file first so readers never see a partial
//! document. `metjo report <path>` ranks the result.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::{string_property, Reporter};
use crate::config::Properties;
use crate::errors::{ConfigError, ProbeError, ReportError};
use crate::metrics::RegistrySnapshot;

pub struct JsonReporter {
    path: PathBuf,
}

impl JsonReporter {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Build from reporter properties; `path` is required.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidProperty`] if `path` is missing.
    pub fn from_properties(properties: &Properties) -> Result<Self, ProbeError> {
        let path = string_property(properties, "path").ok_or_else(|| ConfigError::InvalidProperty {
            key: "path".to_string(),
            reason: "the json reporter needs an output file".to_string(),
        })?;
        Ok(Self::new(path))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Reporter for JsonReporter {
    fn name(&self) -> &'static str {
        "json"
    }

    fn report(&mut self, snapshot: &RegistrySnapshot) -> Result<(), ReportError> {
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        let mut writer = BufWriter::new(File::create(&tmp)?);
        serde_json::to_writer_pretty(&mut writer, snapshot)?;
        writer.flush()?;
        drop(writer);

        std::fs::rename(&tmp, &self.path)
            .map_err(|e| ReportError::WriteFailed(format!("{}: {e}", self.path.display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::MetricRegistry;
    use std::time::Duration;

    #[test]
    fn test_missing_path_is_rejected() {
        let result = JsonReporter::from_properties(&Properties::new());
        assert!(matches!(
            result,
            Err(ProbeError::Config(ConfigError::InvalidProperty { ref key, .. })) if key == "path"
        ));
    }

    #[test]
    fn test_writes_parseable_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.json");
        let registry = MetricRegistry::new();
        registry.timer("app::f").record(Duration::from_micros(5));

        let mut reporter = JsonReporter::new(&path);
        reporter.report(&registry.snapshot()).unwrap();
        registry.timer("app::f").record(Duration::from_micros(5));
        reporter.report(&registry.snapshot()).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let snapshot: RegistrySnapshot = serde_json::from_str(&content).unwrap();
        assert_eq!(snapshot.timers[0].name, "app::f");
        assert_eq!(snapshot.timers[0].count, 2);
        assert!(!dir.path().join("metrics.json.tmp").exists());
    }
}
