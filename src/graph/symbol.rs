use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Location in source code
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Location {
    /// File path
    pub file: PathBuf,
    /// Line number (1-indexed)
    pub line: usize,
}

impl Location {
    pub fn new(file: PathBuf, line: usize) -> Self {
        Self { file, line }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.file.display(), self.line)
    }
}

/// Kind of declared symbol on a model
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Field,
    Method,
}

impl SymbolKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            SymbolKind::Field => "field",
            SymbolKind::Method => "method",
        }
    }
}

/// Canonical identity of a declared field or method.
///
/// All physical declarations of the same (model, name) pair collapse into one
/// identity; augmenting modules attach extra locations to it rather than
/// creating a second symbol.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SymbolId {
    /// Canonical model name (e.g., "res.partner")
    pub model: String,
    /// Field or method name
    pub name: String,
    /// Field vs method namespace
    pub kind: SymbolKind,
}

impl SymbolId {
    pub fn field(model: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            name: name.into(),
            kind: SymbolKind::Field,
        }
    }

    pub fn method(model: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            name: name.into(),
            kind: SymbolKind::Method,
        }
    }
}

impl std::fmt::Display for SymbolId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}.{}", self.kind.display_name(), self.model, self.name)
    }
}
