//! # metjo - Main Entry Point
//!
//! Supports three subcommands:
//! - **instrument**: rewrite a source tree with probes (`--src DIR --out DIR`)
//! - **explain**: dry-run the selection for one file
//! - **report**: rank the timers of a JSON snapshot

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::path::Path;

use metjo::analysis::{analyze_hotspots, format_hotspots, load_snapshot};
use metjo::cli::{Args, Command};
use metjo::injection::{instrument_tree, module_path_for, relative_to_source_root, Transformer};
use metjo_probe::ProfilerConfig;

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;
const EXIT_USAGE: i32 = 2;

fn main() {
    env_logger::init();
    let args = Args::parse();
    std::process::exit(match run(args) {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            let code = exit_code_for(&e);
            eprintln!("error: {e:#}");
            code
        }
    });
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    let msg = err.to_string().to_lowercase();
    if msg.contains("invalid argument") {
        EXIT_USAGE
    } else {
        EXIT_ERROR
    }
}

fn run(args: Args) -> Result<()> {
    match args.command {
        Command::Instrument { config, crate_name, src, out } => {
            instrument(&config, &crate_name, &src, &out)
        }
        Command::Explain { config, module, crate_name, src, file } => {
            explain(&config, module, &crate_name, src.as_deref(), &file)
        }
        Command::Report { snapshot, top } => {
            let snapshot = load_snapshot(&snapshot)?;
            print!("{}", format_hotspots(&analyze_hotspots(&snapshot), top));
            Ok(())
        }
    }
}

fn load_transformer(config: &Path) -> Result<Transformer> {
    let config = ProfilerConfig::from_path(config)?;
    info!(
        "{} include(s), {} exclude(s), {} parameter capture(s)",
        config.includes.len(),
        config.excludes.len(),
        config.parameters.len()
    );
    Ok(Transformer::from_config(&config)?)
}

fn instrument(config: &Path, crate_name: &str, src: &Path, out: &Path) -> Result<()> {
    if !src.is_dir() {
        anyhow::bail!("Invalid argument: --src {} is not a directory", src.display());
    }
    let transformer = load_transformer(config)?;
    let summary = instrument_tree(src, out, crate_name, &transformer)
        .with_context(|| format!("Failed to instrument {}", src.display()))?;

    println!(
        "instrumented {} function(s) in {}/{} file(s) -> {}",
        summary.instrumented_functions,
        summary.rewritten,
        summary.sources,
        out.display()
    );
    for failure in &summary.failed_functions {
        println!("  {failure}");
    }
    if summary.has_failures() {
        for path in &summary.failed_files {
            eprintln!("  could not parse {} (copied unchanged)", path.display());
        }
        anyhow::bail!("{} file(s) could not be parsed", summary.failed_files.len());
    }
    Ok(())
}

fn explain(
    config: &Path,
    module: Option<String>,
    crate_name: &str,
    src: Option<&Path>,
    file: &Path,
) -> Result<()> {
    let module = match module {
        Some(module) => module,
        None => {
            let relative = relative_to_source_root(file, src);
            module_path_for(&relative, crate_name).with_context(|| {
                format!("Invalid argument: {} is not a .rs file, pass --module", file.display())
            })?
        }
    };
    let transformer = load_transformer(config)?;
    let source = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let transformed = transformer.transform(&module, &source)?;

    for function in &transformed.functions {
        println!("{function}");
    }
    println!(
        "{} of {} function(s) would be instrumented",
        transformed.instrumented_count(),
        transformed.functions.len()
    );
    Ok(())
}
