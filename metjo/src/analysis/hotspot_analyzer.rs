//! Hotspot analysis for recorded metrics.
//!
//! This module ranks the timers of a registry snapshot (as written by the
//! `json` reporter) by total time spent, to show where an instrumented
//! program spends its wall-clock time.
//!
//! # Display
//!
//! ```text
//! METHOD                              CALLS     TOTAL      MEAN       P99   SHARE
//! acme::service::Orders::place          120   42.10ms    0.35ms    2.04ms   61.2%  ██████░░░░
//! acme::db::Pool::checkout              480   18.40ms    0.04ms    0.13ms   26.7%  ███░░░░░░░
//! ```
//!
//! Timers are inclusive: a caller's total contains its instrumented callees,
//! so shares are relative to the sum of all timers and may double count
//! nested time.

// Percentage calculations intentionally convert u64 to f64
#![allow(clippy::cast_precision_loss)]

use metjo_probe::RegistrySnapshot;
use std::fmt::Write as _;
use std::path::Path;

/// Width of the share bar in the text table.
const BAR_WIDTH: usize = 10;

/// One timer ranked by total time.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodHotspot {
    /// Metric name (fully-qualified or bare, as instrumented).
    pub name: String,
    pub count: u64,
    pub total_ns: u64,
    pub mean_ns: f64,
    pub p99_ns: u64,
    /// Share of the summed total time (0.0 - 100.0).
    pub percentage: f64,
}

/// Rank timers by total time (descending). Timers that never ran are left out.
#[must_use]
pub fn analyze_hotspots(snapshot: &RegistrySnapshot) -> Vec<MethodHotspot> {
    let grand_total: u64 = snapshot.timers.iter().map(|t| t.total_ns).sum();

    let mut hotspots: Vec<MethodHotspot> = snapshot
        .timers
        .iter()
        .filter(|t| t.count > 0)
        .map(|t| MethodHotspot {
            name: t.name.clone(),
            count: t.count,
            total_ns: t.total_ns,
            mean_ns: t.mean_ns,
            p99_ns: t.p99_ns,
            percentage: if grand_total > 0 {
                (t.total_ns as f64 / grand_total as f64) * 100.0
            } else {
                0.0
            },
        })
        .collect();

    // Ties broken by name so the table is stable across runs.
    hotspots.sort_unstable_by(|a, b| b.total_ns.cmp(&a.total_ns).then_with(|| a.name.cmp(&b.name)));
    hotspots
}

/// Read a snapshot written by the `json` reporter.
///
/// # Errors
/// Returns an error if the file cannot be read or is not a snapshot.
pub fn load_snapshot(path: &Path) -> anyhow::Result<RegistrySnapshot> {
    use anyhow::Context;

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid snapshot {}", path.display()))
}

/// Render the first `top` hotspots as a text table.
#[must_use]
pub fn format_hotspots(hotspots: &[MethodHotspot], top: usize) -> String {
    let shown = &hotspots[..top.min(hotspots.len())];
    let width = shown.iter().map(|h| h.name.len()).max().unwrap_or(0).max("METHOD".len());

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<width$}  {:>8}  {:>10}  {:>10}  {:>10}  {:>6}",
        "METHOD", "CALLS", "TOTAL", "MEAN", "P99", "SHARE"
    );
    for h in shown {
        let _ = writeln!(
            out,
            "{:<width$}  {:>8}  {:>10}  {:>10}  {:>10}  {:>5.1}%  {}",
            h.name,
            h.count,
            millis(h.total_ns as f64),
            millis(h.mean_ns),
            millis(h.p99_ns as f64),
            h.percentage,
            bar(h.percentage),
        );
    }
    out
}

fn millis(ns: f64) -> String {
    format!("{:.2}ms", ns / 1e6)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn bar(percentage: f64) -> String {
    let filled = ((percentage / 100.0) * BAR_WIDTH as f64).round().clamp(0.0, BAR_WIDTH as f64) as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled))
}
