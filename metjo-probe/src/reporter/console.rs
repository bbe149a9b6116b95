//! Human-readable text report.
//!
//! ```text
//! metjo, uptime 40.0s ===============================================
//!
//! -- Timers --------------------------------------------------------
//! app::service::Orders::place
//!              count = 120
//!          mean rate = 3.00 calls/second
//!                min = 0.02 milliseconds
//!                max = 4.10 milliseconds
//!               mean = 0.35 milliseconds
//!             median = 0.25 milliseconds
//!               95% <= 1.02 milliseconds
//!               99% <= 2.04 milliseconds
//! ```

use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use log::warn;

use super::{string_property, Reporter};
use crate::config::Properties;
use crate::errors::{ConfigError, ProbeError, ReportError};
use crate::metrics::RegistrySnapshot;

const LINE_WIDTH: usize = 80;

/// Unit used to print durations and rates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Nanoseconds,
    Microseconds,
    Milliseconds,
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl TimeUnit {
    /// Parse `MILLISECONDS`-style names, case-insensitively.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_uppercase().as_str() {
            "NANOSECONDS" => Some(Self::Nanoseconds),
            "MICROSECONDS" => Some(Self::Microseconds),
            "MILLISECONDS" => Some(Self::Milliseconds),
            "SECONDS" => Some(Self::Seconds),
            "MINUTES" => Some(Self::Minutes),
            "HOURS" => Some(Self::Hours),
            "DAYS" => Some(Self::Days),
            _ => None,
        }
    }

    /// Nanoseconds in one unit.
    #[must_use]
    pub fn nanos(self) -> f64 {
        match self {
            Self::Nanoseconds => 1.0,
            Self::Microseconds => 1e3,
            Self::Milliseconds => 1e6,
            Self::Seconds => 1e9,
            Self::Minutes => 60e9,
            Self::Hours => 3_600e9,
            Self::Days => 86_400e9,
        }
    }

    #[must_use]
    pub fn plural(self) -> &'static str {
        match self {
            Self::Nanoseconds => "nanoseconds",
            Self::Microseconds => "microseconds",
            Self::Milliseconds => "milliseconds",
            Self::Seconds => "seconds",
            Self::Minutes => "minutes",
            Self::Hours => "hours",
            Self::Days => "days",
        }
    }

    fn singular(self) -> &'static str {
        let plural = self.plural();
        &plural[..plural.len() - 1]
    }
}

enum Output {
    Stderr,
    Stdout,
    File { path: PathBuf, writer: BufWriter<File> },
}

/// Text reporter in the classic metrics-library layout.
pub struct ConsoleReporter {
    output: Output,
    duration_unit: TimeUnit,
    rate_unit: TimeUnit,
}

impl ConsoleReporter {
    /// Build from reporter properties: `output`, `durationTimeUnit` and
    /// `rateTimeUnit`. Invalid unit names are warned and defaulted.
    ///
    /// # Errors
    /// Returns an error if `output` names a file that cannot be created.
    pub fn from_properties(properties: &Properties) -> Result<Self, ProbeError> {
        let output = match string_property(properties, "output").as_deref() {
            None | Some("stderr") => Output::Stderr,
            Some("stdout") => Output::Stdout,
            Some(path) => {
                let path = PathBuf::from(path);
                let file = File::create(&path).map_err(ReportError::Io)?;
                Output::File { path, writer: BufWriter::new(file) }
            }
        };
        Ok(Self {
            output,
            duration_unit: unit_property(properties, "durationTimeUnit", TimeUnit::Milliseconds),
            rate_unit: unit_property(properties, "rateTimeUnit", TimeUnit::Seconds),
        })
    }

    /// Report destination as configured.
    #[must_use]
    pub fn destination(&self) -> String {
        match &self.output {
            Output::Stderr => "stderr".to_string(),
            Output::Stdout => "stdout".to_string(),
            Output::File { path, .. } => path.display().to_string(),
        }
    }

    /// Render one snapshot.
    #[must_use]
    pub fn render(&self, snapshot: &RegistrySnapshot) -> String {
        render(snapshot, self.duration_unit, self.rate_unit)
    }
}

impl Reporter for ConsoleReporter {
    fn name(&self) -> &'static str {
        "console"
    }

    fn report(&mut self, snapshot: &RegistrySnapshot) -> Result<(), ReportError> {
        let text = self.render(snapshot);
        match &mut self.output {
            Output::Stderr => std::io::stderr().lock().write_all(text.as_bytes())?,
            Output::Stdout => std::io::stdout().lock().write_all(text.as_bytes())?,
            Output::File { writer, .. } => {
                writer.write_all(text.as_bytes())?;
                writer.flush()?;
            }
        }
        Ok(())
    }
}

fn unit_property(properties: &Properties, key: &str, default: TimeUnit) -> TimeUnit {
    let Some(name) = string_property(properties, key) else {
        return default;
    };
    TimeUnit::from_name(&name).unwrap_or_else(|| {
        warn!(
            "{}",
            ConfigError::InvalidProperty {
                key: key.to_string(),
                reason: format!("unknown time unit '{name}', using {}", default.plural()),
            }
        );
        default
    })
}

/// Render a snapshot as text.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn render(snapshot: &RegistrySnapshot, duration_unit: TimeUnit, rate_unit: TimeUnit) -> String {
    let mut out = String::new();
    let header = format!("metjo, uptime {:.1}s ", snapshot.uptime_secs);
    let _ = writeln!(out, "{header}{}", "=".repeat(LINE_WIDTH.saturating_sub(header.len())));
    let _ = writeln!(out);

    let duration = |ns: f64| format!("{:.2} {}", ns / duration_unit.nanos(), duration_unit.plural());

    if !snapshot.timers.is_empty() {
        section(&mut out, "Timers");
        for t in &snapshot.timers {
            let rate = t.mean_rate * rate_unit.nanos() / 1e9;
            let _ = writeln!(out, "{}", t.name);
            let _ = writeln!(out, "{:>20} = {}", "count", t.count);
            let _ = writeln!(out, "{:>20} = {rate:.2} calls/{}", "mean rate", rate_unit.singular());
            let _ = writeln!(out, "{:>20} = {}", "min", duration(t.min_ns as f64));
            let _ = writeln!(out, "{:>20} = {}", "max", duration(t.max_ns as f64));
            let _ = writeln!(out, "{:>20} = {}", "mean", duration(t.mean_ns));
            let _ = writeln!(out, "{:>20} = {}", "median", duration(t.p50_ns as f64));
            let _ = writeln!(out, "{:>20} <= {}", "95%", duration(t.p95_ns as f64));
            let _ = writeln!(out, "{:>20} <= {}", "99%", duration(t.p99_ns as f64));
            let _ = writeln!(out);
        }
    }

    if !snapshot.distributions.is_empty() {
        section(&mut out, "Histograms");
        for d in &snapshot.distributions {
            let _ = writeln!(out, "{}", d.name);
            let _ = writeln!(out, "{:>20} = {}", "count", d.count);
            let _ = writeln!(out, "{:>20} = {}", "min", d.min);
            let _ = writeln!(out, "{:>20} = {}", "max", d.max);
            let _ = writeln!(out, "{:>20} = {:.2}", "mean", d.mean);
            let _ = writeln!(out, "{:>20} = {}", "median", d.p50);
            let _ = writeln!(out, "{:>20} <= {}", "95%", d.p95);
            let _ = writeln!(out, "{:>20} <= {}", "99%", d.p99);
            let _ = writeln!(out);
        }
    }
    out
}

fn section(out: &mut String, title: &str) {
    let head = format!("-- {title} ");
    let _ = writeln!(out, "{head}{}", "-".repeat(LINE_WIDTH.saturating_sub(head.len())));
}
