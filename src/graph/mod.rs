mod builder;
mod parallel_builder;
mod reference;
mod symbol;

pub use builder::GraphBuilder;
pub use parallel_builder::ParallelGraphBuilder;
pub use reference::{Confidence, RawUsage, Receiver, UsageEdge, UsageKind};
pub use symbol::{Location, SymbolId, SymbolKind};

use std::collections::HashMap;

/// The merged usage graph: canonical symbols as keys, resolved usage edges as
/// values, plus the raw references that matched nothing anywhere.
///
/// Pure data aggregation; resolution happens in the builders by replaying raw
/// references through the model registry.
#[derive(Debug, Default)]
pub struct UsageGraph {
    /// Multimap keyed by resolved target identity
    edges: HashMap<SymbolId, Vec<UsageEdge>>,

    /// References whose target name matched no declaration even after the full
    /// inheritance/delegation search. Surfaced as diagnostics, never fatal.
    dangling: Vec<RawUsage>,

    edge_count: usize,
}

impl UsageGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a resolved edge. Append-only; liveness is a set-union so
    /// insertion order only affects location attribution, which follows
    /// extraction order deterministically.
    pub fn add_edge(&mut self, edge: UsageEdge) {
        self.edge_count += 1;
        self.edges.entry(edge.symbol.clone()).or_default().push(edge);
    }

    /// Record a reference that resolved to nothing
    pub fn add_dangling(&mut self, usage: RawUsage) {
        self.dangling.push(usage);
    }

    /// All edges reaching a canonical symbol
    pub fn edges_for(&self, symbol: &SymbolId) -> &[UsageEdge] {
        self.edges.get(symbol).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_referenced(&self, symbol: &SymbolId) -> bool {
        !self.edges_for(symbol).is_empty()
    }

    pub fn dangling(&self) -> &[RawUsage] {
        &self.dangling
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn symbol_count(&self) -> usize {
        self.edges.len()
    }

    /// Merge another graph into this one (parallel collection)
    pub fn merge(&mut self, other: UsageGraph) {
        for (symbol, edges) in other.edges {
            self.edge_count += edges.len();
            self.edges.entry(symbol).or_default().extend(edges);
        }
        self.dangling.extend(other.dangling);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn edge(model: &str, name: &str, kind: UsageKind) -> UsageEdge {
        UsageEdge {
            symbol: SymbolId::field(model, name),
            kind,
            confidence: Confidence::High,
            location: Location::new(PathBuf::from("test.py"), 1),
        }
    }

    #[test]
    fn test_multimap_accumulates_edges() {
        let mut graph = UsageGraph::new();
        graph.add_edge(edge("res.partner", "email", UsageKind::FieldRead));
        graph.add_edge(edge("res.partner", "email", UsageKind::ViewFieldRead));

        let id = SymbolId::field("res.partner", "email");
        assert_eq!(graph.edges_for(&id).len(), 2);
        assert_eq!(graph.edge_count(), 2);
        assert!(graph.is_referenced(&id));
    }

    #[test]
    fn test_unreferenced_symbol_has_no_edges() {
        let graph = UsageGraph::new();
        let id = SymbolId::field("res.partner", "score");
        assert!(graph.edges_for(&id).is_empty());
        assert!(!graph.is_referenced(&id));
    }

    #[test]
    fn test_merge() {
        let mut a = UsageGraph::new();
        a.add_edge(edge("a.model", "x", UsageKind::FieldRead));
        let mut b = UsageGraph::new();
        b.add_edge(edge("a.model", "x", UsageKind::FieldWrite));
        b.add_edge(edge("b.model", "y", UsageKind::FieldRead));

        a.merge(b);
        assert_eq!(a.edge_count(), 3);
        assert_eq!(a.edges_for(&SymbolId::field("a.model", "x")).len(), 2);
    }
}
