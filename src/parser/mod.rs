pub mod ast;
mod common;
mod python;
pub mod xml;

pub use python::{PythonParseResult, PythonParser};

use std::path::PathBuf;
use thiserror::Error;

/// Per-artifact parse failure.
///
/// Never aborts a run: the offending artifact's symbols and references are
/// simply absent, and the failure is reported upward as a diagnostic.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("malformed source in {path}: {reason}")]
    Malformed { path: PathBuf, reason: String },

    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid XML in {path}: {reason}")]
    Xml { path: PathBuf, reason: String },
}

impl ParseError {
    pub fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Malformed {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn xml(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Xml {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
