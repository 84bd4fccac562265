use super::SymbolVerdict;
use crate::graph::{Confidence, Location, SymbolId, UsageEdge, UsageGraph};
use crate::registry::ModelRegistry;
use tracing::debug;

/// Analyzer deciding liveness of every declared symbol.
///
/// Liveness is a set union: a symbol is used when at least one edge whose kind
/// counts for its namespace reaches it. Fields only assigned and never read
/// stay dead; writes performed by configured automation count as liveness
/// since the automation exists to populate the field.
pub struct ReachabilityAnalyzer;

impl ReachabilityAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Judge every symbol in the registry against the usage graph.
    ///
    /// Output ordering is deterministic: models in name order, fields before
    /// methods, names in order within each group.
    pub fn analyze(&self, registry: &ModelRegistry, graph: &UsageGraph) -> Vec<SymbolVerdict> {
        let mut verdicts = Vec::new();

        for model in registry.models() {
            for field in model.fields.values() {
                let symbol = SymbolId::field(&model.name, &field.name);
                let edges = graph.edges_for(&symbol);
                let counting: Vec<&UsageEdge> =
                    edges.iter().filter(|e| e.kind.counts_for_field()).collect();
                verdicts.push(self.verdict(symbol, &field.locations, edges, counting));
            }
            for method in model.methods.values() {
                let symbol = SymbolId::method(&model.name, &method.name);
                let edges = graph.edges_for(&symbol);
                let counting: Vec<&UsageEdge> = edges
                    .iter()
                    .filter(|e| e.kind.counts_for_method())
                    .collect();
                verdicts.push(self.verdict(symbol, &method.locations, edges, counting));
            }
        }

        debug!(
            "Judged {} symbols, {} dead",
            verdicts.len(),
            verdicts.iter().filter(|v| v.is_dead()).count()
        );
        verdicts
    }

    fn verdict(
        &self,
        symbol: SymbolId,
        declared_at: &[Location],
        all_edges: &[UsageEdge],
        counting: Vec<&UsageEdge>,
    ) -> SymbolVerdict {
        let used = !counting.is_empty();
        let confidence = if used {
            if counting.iter().any(|e| e.confidence == Confidence::High) {
                Confidence::High
            } else {
                Confidence::Low
            }
        } else if all_edges.is_empty() {
            // Nothing anywhere even mentions the name with this receiver.
            Confidence::High
        } else {
            // Touched by writes or name matches only; a human should look.
            Confidence::Low
        };

        let mut usage_locations: Vec<Location> =
            counting.iter().map(|e| e.location.clone()).collect();
        usage_locations.sort();
        usage_locations.dedup();

        SymbolVerdict {
            symbol,
            used,
            confidence,
            declared_at: declared_at.to_vec(),
            usage_locations,
        }
    }
}

impl Default for ReachabilityAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{SymbolKind, UsageKind};
    use crate::registry::{FieldDecl, FieldKind, MethodDecl, ModelDecl};
    use std::path::PathBuf;

    fn loc(line: usize) -> Location {
        Location::new(PathBuf::from("models/partner.py"), line)
    }

    fn registry() -> ModelRegistry {
        let mut registry = ModelRegistry::new();
        registry.register(ModelDecl {
            name: "res.partner".to_string(),
            parents: vec![],
            delegates: vec![],
            fields: vec![
                FieldDecl {
                    name: "email".to_string(),
                    kind: FieldKind::Stored,
                    comodel: None,
                    inverse_name: None,
                    related: None,
                    compute: None,
                    inverse: None,
                    location: loc(3),
                },
                FieldDecl {
                    name: "score".to_string(),
                    kind: FieldKind::Stored,
                    comodel: None,
                    inverse_name: None,
                    related: None,
                    compute: None,
                    inverse: None,
                    location: loc(4),
                },
            ],
            methods: vec![MethodDecl {
                name: "action_check".to_string(),
                location: loc(6),
            }],
        });
        registry
    }

    fn edge(symbol: SymbolId, kind: UsageKind, confidence: Confidence, line: usize) -> UsageEdge {
        UsageEdge {
            symbol,
            kind,
            confidence,
            location: Location::new(PathBuf::from("views/partner.xml"), line),
        }
    }

    #[test]
    fn test_untouched_symbol_is_dead_high_confidence() {
        let registry = registry();
        let graph = UsageGraph::new();
        let verdicts = ReachabilityAnalyzer::new().analyze(&registry, &graph);

        let score = verdicts
            .iter()
            .find(|v| v.symbol.name == "score")
            .unwrap();
        assert!(score.is_dead());
        assert_eq!(score.confidence, Confidence::High);
        assert!(score.usage_locations.is_empty());
    }

    #[test]
    fn test_read_field_is_used_high_confidence() {
        let registry = registry();
        let mut graph = UsageGraph::new();
        let email = SymbolId::field("res.partner", "email");
        graph.add_edge(edge(email.clone(), UsageKind::ViewFieldRead, Confidence::High, 10));
        graph.add_edge(edge(email, UsageKind::FieldRead, Confidence::Low, 12));

        let verdicts = ReachabilityAnalyzer::new().analyze(&registry, &graph);
        let email = verdicts.iter().find(|v| v.symbol.name == "email").unwrap();
        assert!(email.used);
        assert_eq!(email.confidence, Confidence::High);
        assert_eq!(email.usage_locations.len(), 2);
    }

    #[test]
    fn test_write_only_field_is_dead_low_confidence() {
        let registry = registry();
        let mut graph = UsageGraph::new();
        graph.add_edge(edge(
            SymbolId::field("res.partner", "score"),
            UsageKind::FieldWrite,
            Confidence::High,
            20,
        ));

        let verdicts = ReachabilityAnalyzer::new().analyze(&registry, &graph);
        let score = verdicts.iter().find(|v| v.symbol.name == "score").unwrap();
        assert!(score.is_dead());
        assert_eq!(score.confidence, Confidence::Low);
        assert!(score.usage_locations.is_empty());
    }

    #[test]
    fn test_action_write_makes_field_live() {
        let registry = registry();
        let mut graph = UsageGraph::new();
        graph.add_edge(edge(
            SymbolId::field("res.partner", "score"),
            UsageKind::ActionFieldWrite,
            Confidence::High,
            7,
        ));

        let verdicts = ReachabilityAnalyzer::new().analyze(&registry, &graph);
        let score = verdicts.iter().find(|v| v.symbol.name == "score").unwrap();
        assert!(score.used);
        assert_eq!(score.confidence, Confidence::High);
    }

    #[test]
    fn test_method_used_only_at_low_confidence() {
        let registry = registry();
        let mut graph = UsageGraph::new();
        graph.add_edge(edge(
            SymbolId::method("res.partner", "action_check"),
            UsageKind::MethodCall,
            Confidence::Low,
            30,
        ));

        let verdicts = ReachabilityAnalyzer::new().analyze(&registry, &graph);
        let method = verdicts
            .iter()
            .find(|v| v.symbol.kind == SymbolKind::Method)
            .unwrap();
        assert!(method.used);
        assert_eq!(method.confidence, Confidence::Low);
    }

    #[test]
    fn test_deterministic_ordering() {
        let registry = registry();
        let graph = UsageGraph::new();
        let verdicts = ReachabilityAnalyzer::new().analyze(&registry, &graph);

        let names: Vec<&str> = verdicts.iter().map(|v| v.symbol.name.as_str()).collect();
        assert_eq!(names, vec!["email", "score", "action_check"]);
    }
}
