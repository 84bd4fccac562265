//! Liveness analysis over the resolved usage graph.

mod reachability;

pub use reachability::ReachabilityAnalyzer;

use crate::graph::{Confidence, Location, SymbolId, SymbolKind};
use serde::Serialize;

/// Final verdict for one canonical symbol
#[derive(Debug, Clone, Serialize)]
pub struct SymbolVerdict {
    /// The symbol being judged
    pub symbol: SymbolId,

    /// Whether any usage counting toward liveness reaches the symbol
    pub used: bool,

    /// Confidence in the verdict.
    ///
    /// A used verdict is high confidence when at least one counting edge had a
    /// statically known receiver. An unused verdict is high confidence only
    /// when no edge of any kind touches the symbol; a symbol kept alive solely
    /// by write edges or name-matched noise stays low confidence.
    pub confidence: Confidence,

    /// Every declaration site of the symbol
    pub declared_at: Vec<Location>,

    /// Reference sites that contributed to liveness, sorted and deduplicated.
    /// Empty when the symbol is unused.
    pub usage_locations: Vec<Location>,
}

impl SymbolVerdict {
    pub fn is_dead(&self) -> bool {
        !self.used
    }
}

/// Aggregate counts over a set of verdicts
#[derive(Debug, Default, Clone, Serialize)]
pub struct AnalysisSummary {
    pub total_fields: usize,
    pub total_methods: usize,
    pub dead_fields: usize,
    pub dead_methods: usize,
    pub high_confidence_dead: usize,
}

impl AnalysisSummary {
    pub fn from_verdicts(verdicts: &[SymbolVerdict]) -> Self {
        let mut summary = Self::default();
        for verdict in verdicts {
            match verdict.symbol.kind {
                SymbolKind::Field => {
                    summary.total_fields += 1;
                    if verdict.is_dead() {
                        summary.dead_fields += 1;
                    }
                }
                SymbolKind::Method => {
                    summary.total_methods += 1;
                    if verdict.is_dead() {
                        summary.dead_methods += 1;
                    }
                }
            }
            if verdict.is_dead() && verdict.confidence == Confidence::High {
                summary.high_confidence_dead += 1;
            }
        }
        summary
    }

    pub fn total(&self) -> usize {
        self.total_fields + self.total_methods
    }

    pub fn dead(&self) -> usize {
        self.dead_fields + self.dead_methods
    }

    /// Share of declared symbols with no liveness, as a percentage
    pub fn unused_percentage(&self) -> f64 {
        if self.total() == 0 {
            return 0.0;
        }
        self.dead() as f64 * 100.0 / self.total() as f64
    }
}
