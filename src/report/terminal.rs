use crate::analysis::{AnalysisSummary, SymbolVerdict};
use crate::graph::{Confidence, RawUsage};
use colored::Colorize;
use miette::Result;
use std::collections::BTreeMap;

/// Terminal reporter with colored output, grouped by model
pub struct TerminalReporter {
    include_used: bool,
    show_dangling: bool,
    show_confidence: bool,
}

impl TerminalReporter {
    pub fn new() -> Self {
        Self {
            include_used: false,
            show_dangling: false,
            show_confidence: true,
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

    #[allow(dead_code)] // Builder pattern method for future use
    pub fn with_confidence(mut self, show: bool) -> Self {
        self.show_confidence = show;
        self
    }

    pub fn report(&self, verdicts: &[SymbolVerdict], dangling: &[RawUsage]) -> Result<()> {
        let dead: Vec<&SymbolVerdict> = verdicts.iter().filter(|v| v.is_dead()).collect();

        if dead.is_empty() && !self.include_used {
            println!("{}", "No dead fields or methods found!".green().bold());
            self.print_summary(verdicts, dangling);
            return Ok(());
        }

        println!();
        println!(
            "{}",
            format!("Found {} dead symbols:", dead.len()).yellow().bold()
        );
        println!();

        if self.show_confidence {
            self.print_legend();
        }

        let mut by_model: BTreeMap<&str, Vec<&SymbolVerdict>> = BTreeMap::new();
        let shown: Vec<&SymbolVerdict> = if self.include_used {
            verdicts.iter().collect()
        } else {
            dead.clone()
        };
        for verdict in shown {
            by_model
                .entry(verdict.symbol.model.as_str())
                .or_default()
                .push(verdict);
        }

        for (model, items) in &by_model {
            println!("{}", model.cyan().bold());
            for verdict in items {
                self.print_verdict(verdict);
            }
            println!();
        }

        if self.show_dangling && !dangling.is_empty() {
            self.print_dangling(dangling);
        }

        self.print_summary(verdicts, dangling);
        Ok(())
    }

    fn print_legend(&self) {
        println!("{}", "Confidence Legend:".dimmed());
        println!(
            "  {} {}    {} {}",
            "◉".red().bold(),
            "High (safe to act on)".dimmed(),
            "◌".yellow(),
            "Low (needs review)".dimmed()
        );
        println!();
    }

    fn print_verdict(&self, verdict: &SymbolVerdict) {
        let indicator = match verdict.confidence {
            Confidence::High => "◉".red().bold(),
            Confidence::Low => "◌".yellow(),
        };

        let declared = verdict
            .declared_at
            .first()
            .map(|l| l.to_string())
            .unwrap_or_default();

        if verdict.is_dead() {
            println!(
                "  {} {} {} {}",
                indicator,
                verdict.symbol.kind.display_name().magenta(),
                verdict.symbol.name.bold(),
                format!("({declared})").dimmed()
            );
            if verdict.declared_at.len() > 1 {
                for extra in &verdict.declared_at[1..] {
                    println!("      {} {}", "also declared at".dimmed(), extra);
                }
            }
        } else {
            println!(
                "  {} {} {} {}",
                "✓".green(),
                verdict.symbol.kind.display_name().dimmed(),
                verdict.symbol.name.dimmed(),
                format!("({} usages)", verdict.usage_locations.len()).dimmed()
            );
        }
    }

    fn print_dangling(&self, dangling: &[RawUsage]) {
        println!(
            "{}",
            format!("{} references resolved to no declaration:", dangling.len())
                .yellow()
                .bold()
        );
        for usage in dangling {
            println!(
                "  {} {} {}",
                "?".yellow(),
                usage.target,
                format!("({})", usage.location).dimmed()
            );
        }
        println!();
    }

    fn print_summary(&self, verdicts: &[SymbolVerdict], dangling: &[RawUsage]) {
        let summary = AnalysisSummary::from_verdicts(verdicts);
        println!("{}", "Summary:".bold());
        println!(
            "  {} fields declared, {} dead",
            summary.total_fields, summary.dead_fields
        );
        println!(
            "  {} methods declared, {} dead",
            summary.total_methods, summary.dead_methods
        );
        println!(
            "  {} high confidence dead, {:.1}% of all symbols unused",
            summary.high_confidence_dead,
            summary.unused_percentage()
        );
        if !dangling.is_empty() && !self.show_dangling {
            println!(
                "  {}",
                format!(
                    "{} dangling references (run with --show-dangling to list)",
                    dangling.len()
                )
                .dimmed()
            );
        }
    }
}

impl Default for TerminalReporter {
    fn default() -> Self {
        Self::new()
    }
}
