//! CLI argument definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "metjo",
    about = "Method-level timing probes for Rust sources",
    after_help = "\
EXAMPLES:
    metjo instrument --config metjo.yaml --crate-name shop --src src --out build/src
    metjo explain --config metjo.yaml --module shop::orders src/orders.rs
    metjo report metrics.json --top 10"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Rewrite a source tree with entry/exit probes
    Instrument {
        /// Profiler configuration (YAML)
        #[arg(short, long, env = "METJO_CONFIG", value_name = "FILE")]
        config: PathBuf,

        /// Root module name used in fully-qualified function names
        #[arg(long, default_value = "crate")]
        crate_name: String,

        /// Source directory to read
        #[arg(long, value_name = "DIR")]
        src: PathBuf,

        /// Directory to write the instrumented tree to
        #[arg(long, value_name = "DIR")]
        out: PathBuf,
    },

    /// Show the instrumentation decision for every function of one file
    Explain {
        /// Profiler configuration (YAML)
        #[arg(short, long, env = "METJO_CONFIG", value_name = "FILE")]
        config: PathBuf,

        /// Module path of the file (default: derived from the file name)
        #[arg(long, value_name = "PATH")]
        module: Option<String>,

        /// Root module name used when the module path is derived
        #[arg(long, default_value = "crate")]
        crate_name: String,

        /// Source root the module path is derived from (default: the last
        /// `src` directory in FILE's path)
        #[arg(long, value_name = "DIR")]
        src: Option<PathBuf>,

        /// Rust source file
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Rank the timers of a JSON snapshot by total time
    Report {
        /// Snapshot written by the json reporter
        #[arg(value_name = "SNAPSHOT")]
        snapshot: PathBuf,

        /// Number of methods to show
        #[arg(long, default_value = "20")]
        top: usize,
    },
}
