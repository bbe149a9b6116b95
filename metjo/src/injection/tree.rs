//! Whole source tree instrumentation.
//!
//! Every file under the source directory lands at the same relative path
//! under the output directory: rewritten when the transform instrumented
//! something, copied verbatim otherwise. A file that fails to parse is copied
//! too, so the output tree still builds, and is counted as a failure.

use log::{info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::module_path::module_path_for;
use super::transformer::Transformer;
use crate::domain::{FunctionReport, TreeError};

/// Counts for one `instrument_tree` run.
#[derive(Debug, Default)]
pub struct TreeSummary {
    /// Rust sources seen.
    pub sources: usize,
    /// Sources written with probes.
    pub rewritten: usize,
    /// Functions that received a probe.
    pub instrumented_functions: usize,
    /// Functions whose rewrite failed and were left untouched.
    pub failed_functions: Vec<FunctionReport>,
    /// Sources that could not be parsed.
    pub failed_files: Vec<PathBuf>,
    /// Non-Rust files copied along.
    pub other_files: usize,
}

impl TreeSummary {
    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.failed_files.is_empty()
    }
}

/// Instrument every `.rs` file under `src_dir` into `out_dir`.
///
/// # Errors
/// Returns an error if `out_dir` lies inside `src_dir`, or if the tree cannot
/// be walked, read or written. Unparseable files are not errors; they are
/// copied and listed in [`TreeSummary::failed_files`].
pub fn instrument_tree(
    src_dir: &Path,
    out_dir: &Path,
    crate_name: &str,
    transformer: &Transformer,
) -> Result<TreeSummary, TreeError> {
    let src_abs = canonical(src_dir)?;
    let out_abs = resolve_target(out_dir)?;
    if out_abs.starts_with(&src_abs) {
        return Err(TreeError::OutputInsideSource { src: src_abs, out: out_abs });
    }
    fs::create_dir_all(&out_abs).map_err(|source| io_error(&out_abs, source))?;

    let mut summary = TreeSummary::default();
    for entry in WalkDir::new(&src_abs).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let relative = path.strip_prefix(&src_abs).unwrap_or(path);
        let dest = out_abs.join(relative);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(|source| io_error(parent, source))?;
        }

        let Some(module_path) = module_path_for(relative, crate_name) else {
            fs::copy(path, &dest).map_err(|source| io_error(path, source))?;
            summary.other_files += 1;
            continue;
        };

        summary.sources += 1;
        let original = fs::read_to_string(path).map_err(|source| io_error(path, source))?;
        match transformer.transform(&module_path, &original) {
            Ok(transformed) => {
                summary.instrumented_functions += transformed.instrumented_count();
                summary.failed_functions.extend(transformed.failures().cloned());
                let output = match &transformed.source {
                    Some(rewritten) => {
                        summary.rewritten += 1;
                        rewritten.as_str()
                    }
                    None => original.as_str(),
                };
                fs::write(&dest, output).map_err(|source| io_error(&dest, source))?;
            }
            Err(e) => {
                warn!("{e}; copying {} unchanged", relative.display());
                fs::write(&dest, &original).map_err(|source| io_error(&dest, source))?;
                summary.failed_files.push(relative.to_path_buf());
            }
        }
    }

    info!(
        "Instrumented {} function(s) in {} of {} source file(s)",
        summary.instrumented_functions, summary.rewritten, summary.sources
    );
    Ok(summary)
}

fn canonical(path: &Path) -> Result<PathBuf, TreeError> {
    path.canonicalize().map_err(|source| io_error(path, source))
}

/// Absolute form of a directory that may not exist yet: the nearest existing
/// ancestor is canonicalized and the missing tail appended.
fn resolve_target(path: &Path) -> Result<PathBuf, TreeError> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().map_err(|source| io_error(path, source))?.join(path)
    };
    for ancestor in absolute.ancestors() {
        if ancestor.exists() {
            let resolved = canonical(ancestor)?;
            return Ok(match absolute.strip_prefix(ancestor) {
                Ok(tail) if !tail.as_os_str().is_empty() => resolved.join(tail),
                _ => resolved,
            });
        }
    }
    Ok(absolute)
}

fn io_error(path: &Path, source: std::io::Error) -> TreeError {
    TreeError::Io { path: path.to_path_buf(), source }
}
