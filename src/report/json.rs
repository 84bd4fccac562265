use crate::analysis::{AnalysisSummary, SymbolVerdict};
use crate::graph::RawUsage;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::path::PathBuf;

/// JSON reporter for programmatic output
pub struct JsonReporter {
    output_path: Option<PathBuf>,
    include_used: bool,
    show_dangling: bool,
}

impl JsonReporter {
    pub fn new(output_path: Option<PathBuf>) -> Self {
        Self {
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

    pub fn report(&self, verdicts: &[SymbolVerdict], dangling: &[RawUsage]) -> Result<()> {
        let report = JsonReport::build(verdicts, dangling, self.include_used, self.show_dangling);
        let json = serde_json::to_string_pretty(&report).into_diagnostic()?;

        if let Some(path) = &self.output_path {
            std::fs::write(path, &json).into_diagnostic()?;
            println!("Report written to: {}", path.display());
        } else {
            println!("{json}");
        }

        Ok(())
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    version: &'static str,
    summary: AnalysisSummary,
    symbols: Vec<&'a SymbolVerdict>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    dangling: Vec<JsonDangling>,
}

#[derive(Serialize)]
struct JsonDangling {
    target: String,
    file: String,
    line: usize,
}

impl<'a> JsonReport<'a> {
    fn build(
        verdicts: &'a [SymbolVerdict],
        dangling: &[RawUsage],
        include_used: bool,
        show_dangling: bool,
    ) -> Self {
        let symbols: Vec<&SymbolVerdict> = verdicts
            .iter()
            .filter(|v| include_used || v.is_dead())
            .collect();
        let dangling = if show_dangling {
            dangling
                .iter()
                .map(|u| JsonDangling {
                    target: u.target.clone(),
                    file: u.location.file.display().to_string(),
                    line: u.location.line,
                })
                .collect()
        } else {
            Vec::new()
        };
        Self {
            version: env!("CARGO_PKG_VERSION"),
            summary: AnalysisSummary::from_verdicts(verdicts),
            symbols,
            dangling,
        }
    }
}
