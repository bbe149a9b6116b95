//! Structured error types for metjo
//!
//! Using thiserror for automatic Display implementation and error chaining.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PatternError {
    #[error("Failed to compile patterns [{patterns}]: {source}")]
    Compile {
        patterns: String,
        #[source]
        source: regex::Error,
    },
}

/// A single function could not be rewritten. The function is left untouched.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum InstrumentError {
    #[error("{function} cannot be instrumented: {reason}")]
    UnsupportedShape { function: String, reason: &'static str },

    #[error("{0} already carries an entry probe")]
    AlreadyInstrumented(String),

    #[error("{function} declares `{ident}`, which is reserved for the entry probe")]
    ReservedIdentifier { function: String, ident: String },
}

/// A whole file could not be processed.
#[derive(Error, Debug)]
pub enum TransformError {
    #[error("Failed to parse {module}: {source}")]
    Parse {
        module: String,
        #[source]
        source: syn::Error,
    },
}

#[derive(Error, Debug)]
pub enum TreeError {
    #[error("Output directory {out} must not be inside source directory {src}")]
    OutputInsideSource { src: PathBuf, out: PathBuf },

    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Walk(#[from] walkdir::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instrument_error_names_function() {
        let err = InstrumentError::ReservedIdentifier {
            function: "crate::io::read".to_string(),
            ident: "__metjo_guard".to_string(),
        };
        assert!(err.to_string().contains("crate::io::read"));
        assert!(err.to_string().contains("__metjo_guard"));
    }

    #[test]
    fn test_transform_error_names_module() {
        let source = syn::parse_file("fn broken(").unwrap_err();
        let err = TransformError::Parse { module: "crate::broken".to_string(), source };
        assert!(err.to_string().starts_with("Failed to parse crate::broken"));
    }
}
