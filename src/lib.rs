//! deadfield - dead field and method detection for Odoo-style addons
//!
//! This library statically finds model fields and methods that nothing
//! declarative or imperative in an addons tree ever uses.
//!
//! # Architecture
//!
//! The analysis pipeline consists of:
//! 1. **Module Discovery** - Find addon modules via manifests, imports and data lists
//! 2. **Parsing** - Parse Python model files (tree-sitter) and XML data files
//! 3. **Registry Building** - Merge declarations into canonical models with
//!    inheritance and delegation links
//! 4. **Reference Extraction** - Collect usage references from views,
//!    automation records and method bodies
//! 5. **Resolution** - Resolve references through the inheritance closure into
//!    a usage graph
//! 6. **Liveness Analysis** - Judge every symbol and report the dead ones

pub mod analysis;
pub mod config;
pub mod discovery;
pub mod extract;
pub mod graph;
pub mod parser;
pub mod registry;
pub mod report;

pub use analysis::{AnalysisSummary, ReachabilityAnalyzer, SymbolVerdict};
pub use config::Config;
pub use discovery::{FileStats, FileType, ModuleFinder, SourceFile};
pub use graph::{
    Confidence, GraphBuilder, Location, ParallelGraphBuilder, SymbolId, SymbolKind, UsageGraph,
    UsageKind,
};
pub use registry::ModelRegistry;
pub use report::{ReportFormat, Reporter};
