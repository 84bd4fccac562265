mod json;
mod terminal;

pub use json::JsonReporter;
pub use terminal::TerminalReporter;

use crate::analysis::SymbolVerdict;
use crate::graph::RawUsage;
use miette::Result;
use std::path::PathBuf;

/// Output format for reports
#[derive(Debug, Clone, Default)]
pub enum ReportFormat {
    #[default]
    Terminal,
    Json,
}

/// Reporter for outputting analysis results
pub struct Reporter {
    format: ReportFormat,
    output_path: Option<PathBuf>,
    include_used: bool,
    show_dangling: bool,
}

impl Reporter {
    pub fn new(format: ReportFormat, output_path: Option<PathBuf>) -> Self {
        Self {
            format,
            output_path,
            include_used: false,
            show_dangling: false,
        }
    }

    pub fn include_used(mut self, include: bool) -> Self {
        self.include_used = include;
        self
    }

    pub fn show_dangling(mut self, show: bool) -> Self {
        self.show_dangling = show;
        self
    }

    /// Report the verdicts and any dangling references
    pub fn report(&self, verdicts: &[SymbolVerdict], dangling: &[RawUsage]) -> Result<()> {
        match &self.format {
            ReportFormat::Terminal => TerminalReporter::new()
                .include_used(self.include_used)
                .show_dangling(self.show_dangling)
                .report(verdicts, dangling),
            ReportFormat::Json => JsonReporter::new(self.output_path.clone())
                .include_used(self.include_used)
                .show_dangling(self.show_dangling)
                .report(verdicts, dangling),
        }
    }
}
