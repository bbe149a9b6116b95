//! Analysis logic for recorded metrics
//!
//! This module contains pure business logic for ranking exported snapshots,
//! separated from the CLI presentation.

pub mod hotspot_analyzer;

pub use hotspot_analyzer::{analyze_hotspots, format_hotspots, load_snapshot, MethodHotspot};
