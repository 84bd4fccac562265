//! Canonical model registry.
//!
//! Merges per-file model declarations into canonical models. A model name can
//! be declared many times across modules (augmentation); every physical
//! declaration of the same (model, field) or (model, method) pair is the same
//! logical symbol and accumulates source locations under one identity.

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use tracing::debug;

use crate::graph::{Location, RawUsage, SymbolId, SymbolKind, UsageKind};

/// Declared kind of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Plain stored column
    Stored,
    /// Computed or related derived value
    Computed,
    /// Many2one / One2many / Many2many link to another model
    Relational,
}

/// One physical field declaration, as parsed from a model file
#[derive(Debug, Clone)]
pub struct FieldDecl {
    pub name: String,
    pub kind: FieldKind,
    /// Target model of a relational field, when syntactically evident
    pub comodel: Option<String>,
    /// Inverse field name of a One2many
    pub inverse_name: Option<String>,
    /// Dotted path of a related field
    pub related: Option<String>,
    /// Compute method named by string
    pub compute: Option<String>,
    /// Inverse method named by string
    pub inverse: Option<String>,
    pub location: Location,
}

/// One physical method declaration
#[derive(Debug, Clone)]
pub struct MethodDecl {
    pub name: String,
    pub location: Location,
}

/// One physical model declaration (one class in one file)
#[derive(Debug, Clone)]
pub struct ModelDecl {
    pub name: String,
    /// Augmentation parents (`_inherit`)
    pub parents: Vec<String>,
    /// Delegation targets (`_inherits`)
    pub delegates: Vec<String>,
    pub fields: Vec<FieldDecl>,
    pub methods: Vec<MethodDecl>,
}

/// Canonical field: all physical declarations of (model, name) merged
#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub kind: FieldKind,
    pub comodel: Option<String>,
    pub inverse_name: Option<String>,
    pub related: Option<String>,
    pub compute: Option<String>,
    pub inverse: Option<String>,
    /// Every declaration site, in registration order
    pub locations: Vec<Location>,
}

impl Field {
    fn merge(&mut self, decl: FieldDecl) {
        // A redeclaration narrows or completes the original: keep whatever
        // attributes are already known, fill in the ones it adds.
        if self.comodel.is_none() {
            self.comodel = decl.comodel;
        }
        if self.inverse_name.is_none() {
            self.inverse_name = decl.inverse_name;
        }
        if self.related.is_none() {
            self.related = decl.related;
        }
        if self.compute.is_none() {
            self.compute = decl.compute;
        }
        if self.inverse.is_none() {
            self.inverse = decl.inverse;
        }
        if self.kind == FieldKind::Stored && decl.kind != FieldKind::Stored {
            self.kind = decl.kind;
        }
        self.locations.push(decl.location);
    }
}

/// Canonical method: overrides across augmenting modules share one identity
#[derive(Debug, Clone)]
pub struct Method {
    pub name: String,
    pub locations: Vec<Location>,
}

/// Canonical model
#[derive(Debug, Clone)]
pub struct Model {
    pub name: String,
    pub fields: BTreeMap<String, Field>,
    pub methods: BTreeMap<String, Method>,
    pub parents: Vec<String>,
    pub delegates: Vec<String>,
}

impl Model {
    fn new(name: String) -> Self {
        Self {
            name,
            fields: BTreeMap::new(),
            methods: BTreeMap::new(),
            parents: Vec::new(),
            delegates: Vec::new(),
        }
    }
}

/// Kind of model-to-model link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LinkKind {
    /// Augmentation / extension edge (child -> parent)
    Parent,
    /// Composition-style delegation edge (delegating -> delegate)
    Delegate,
}

/// Registry of canonical models, fields and methods.
///
/// Built once per analysis run, then immutable. Resolution walks the explicit
/// parent/delegate adjacency; delegation is a last-resort fallback so a local
/// or inherited declaration always wins over a delegated one.
#[derive(Debug, Default)]
pub struct ModelRegistry {
    models: BTreeMap<String, Model>,
    links: DiGraph<String, LinkKind>,
    node_map: HashMap<String, NodeIndex>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one physical model declaration, creating or augmenting the
    /// canonical model. The registry only grows.
    pub fn register(&mut self, decl: ModelDecl) {
        let node = self.ensure_node(&decl.name);

        for parent in &decl.parents {
            if parent == &decl.name {
                continue;
            }
            let parent_node = self.ensure_node(parent);
            self.ensure_link(node, parent_node, LinkKind::Parent);
        }
        for delegate in &decl.delegates {
            if delegate == &decl.name {
                continue;
            }
            let delegate_node = self.ensure_node(delegate);
            self.ensure_link(node, delegate_node, LinkKind::Delegate);
        }

        let model = self
            .models
            .entry(decl.name.clone())
            .or_insert_with(|| Model::new(decl.name.clone()));

        for parent in decl.parents {
            if parent != model.name && !model.parents.contains(&parent) {
                model.parents.push(parent);
            }
        }
        for delegate in decl.delegates {
            if delegate != model.name && !model.delegates.contains(&delegate) {
                model.delegates.push(delegate);
            }
        }

        for field in decl.fields {
            match model.fields.get_mut(&field.name) {
                Some(existing) => existing.merge(field),
                None => {
                    model.fields.insert(
                        field.name.clone(),
                        Field {
                            name: field.name.clone(),
                            kind: field.kind,
                            comodel: field.comodel,
                            inverse_name: field.inverse_name,
                            related: field.related,
                            compute: field.compute,
                            inverse: field.inverse,
                            locations: vec![field.location],
                        },
                    );
                }
            }
        }

        for method in decl.methods {
            model
                .methods
                .entry(method.name.clone())
                .and_modify(|m| m.locations.push(method.location.clone()))
                .or_insert_with(|| Method {
                    name: method.name,
                    locations: vec![method.location],
                });
        }
    }

    /// Resolve a symbol name against a model, searching the model itself, then
    /// its parent closure in breadth order, then delegates as a fallback.
    ///
    /// `None` is the unresolved-symbol outcome: not an error, the caller
    /// records it as a dangling reference.
    pub fn resolve(&self, model: &str, name: &str, kind: SymbolKind) -> Option<SymbolId> {
        if let Some(owner) = self.search(model, name, kind, false) {
            return Some(owner);
        }
        self.search(model, name, kind, true)
    }

    fn search(
        &self,
        start: &str,
        name: &str,
        kind: SymbolKind,
        follow_delegates: bool,
    ) -> Option<SymbolId> {
        let start_node = *self.node_map.get(start)?;
        let mut visited: HashSet<NodeIndex> = HashSet::new();
        let mut queue = VecDeque::new();
        queue.push_back(start_node);
        visited.insert(start_node);

        // Augmentation graphs are not guaranteed acyclic, hence the visited set.
        while let Some(node) = queue.pop_front() {
            let model_name = &self.links[node];
            if let Some(model) = self.models.get(model_name) {
                let found = match kind {
                    SymbolKind::Field => model.fields.contains_key(name),
                    SymbolKind::Method => model.methods.contains_key(name),
                };
                if found {
                    return Some(SymbolId {
                        model: model_name.clone(),
                        name: name.to_string(),
                        kind,
                    });
                }
            }
            for edge in self.links.edges(node) {
                let follow = match edge.weight() {
                    LinkKind::Parent => true,
                    LinkKind::Delegate => follow_delegates,
                };
                if follow && visited.insert(edge.target()) {
                    queue.push_back(edge.target());
                }
            }
        }
        None
    }

    /// Look up the canonical field reachable from a model, through the same
    /// search order as `resolve`.
    pub fn field(&self, model: &str, name: &str) -> Option<&Field> {
        let id = self.resolve(model, name, SymbolKind::Field)?;
        self.models.get(&id.model)?.fields.get(name)
    }

    /// Target model of a (possibly inherited) relational field
    pub fn field_comodel(&self, model: &str, name: &str) -> Option<&str> {
        self.field(model, name)?.comodel.as_deref()
    }

    /// Whether a method name resolves from a model
    pub fn method_exists(&self, model: &str, name: &str) -> bool {
        self.resolve(model, name, SymbolKind::Method).is_some()
    }

    /// All canonical symbols with the given name, across every model.
    ///
    /// Used to fan out references whose receiver model is unknown; deliberately
    /// matches direct declarations only, so one ambiguous reference produces
    /// one candidate edge per declaring model.
    pub fn candidates(&self, name: &str, kind: SymbolKind) -> Vec<SymbolId> {
        self.models
            .values()
            .filter(|model| match kind {
                SymbolKind::Field => model.fields.contains_key(name),
                SymbolKind::Method => model.methods.contains_key(name),
            })
            .map(|model| SymbolId {
                model: model.name.clone(),
                name: name.to_string(),
                kind,
            })
            .collect()
    }

    pub fn get(&self, model: &str) -> Option<&Model> {
        self.models.get(model)
    }

    pub fn contains(&self, model: &str) -> bool {
        self.models.contains_key(model)
    }

    /// Canonical models in deterministic (name) order
    pub fn models(&self) -> impl Iterator<Item = &Model> {
        self.models.values()
    }

    pub fn model_count(&self) -> usize {
        self.models.len()
    }

    pub fn symbol_count(&self) -> usize {
        self.models
            .values()
            .map(|m| m.fields.len() + m.methods.len())
            .sum()
    }

    /// Complete the registry after all declarations are registered.
    ///
    /// Fills in comodels that relational fields inherit from a parent
    /// declaration, resolves `related` dotted chains (which also yields usage
    /// references for every field the chain traverses), and marks compute and
    /// inverse methods named by string as used.
    ///
    /// Must run before any reference resolution: resolution requires the
    /// complete inheritance closure.
    pub fn finalize(&mut self) -> Vec<RawUsage> {
        self.propagate_relational_comodels();
        let mut usages = self.resolve_related_chains();
        usages.extend(self.compute_method_usages());
        usages
    }

    /// A relational field redeclared without its comodel (e.g. to change a
    /// default) inherits the comodel from the parent declaration.
    fn propagate_relational_comodels(&mut self) {
        for _ in 0..10 {
            let mut updates: Vec<(String, String, String)> = Vec::new();
            for model in self.models.values() {
                for field in model.fields.values() {
                    if field.kind != FieldKind::Relational || field.comodel.is_some() {
                        continue;
                    }
                    for parent in &model.parents {
                        if let Some(comodel) = self.field_comodel(parent, &field.name) {
                            updates.push((
                                model.name.clone(),
                                field.name.clone(),
                                comodel.to_string(),
                            ));
                            break;
                        }
                    }
                }
            }
            if updates.is_empty() {
                break;
            }
            for (model, field, comodel) in updates {
                if let Some(f) = self
                    .models
                    .get_mut(&model)
                    .and_then(|m| m.fields.get_mut(&field))
                {
                    f.comodel = Some(comodel);
                }
            }
        }
    }

    /// Walk `related="a.b.c"` chains: the chain determines the related field's
    /// own comodel, and every hop is a read of the traversed field.
    fn resolve_related_chains(&mut self) -> Vec<RawUsage> {
        // Fixpoint first: a related chain may pass through another related
        // field whose comodel is itself still pending.
        for _ in 0..10 {
            let mut updates: Vec<(String, String, String)> = Vec::new();
            for model in self.models.values() {
                for field in model.fields.values() {
                    if field.comodel.is_some() {
                        continue;
                    }
                    let Some(related) = &field.related else {
                        continue;
                    };
                    let mut current = model.name.clone();
                    let mut target_comodel = None;
                    for hop in related.split('.') {
                        match self.field(&current, hop).and_then(|f| f.comodel.clone()) {
                            Some(next) => {
                                target_comodel = Some(next.clone());
                                current = next;
                            }
                            None => {
                                target_comodel = None;
                                break;
                            }
                        }
                    }
                    if let Some(comodel) = target_comodel {
                        updates.push((model.name.clone(), field.name.clone(), comodel));
                    }
                }
            }
            if updates.is_empty() {
                break;
            }
            for (model, field, comodel) in updates {
                if let Some(f) = self
                    .models
                    .get_mut(&model)
                    .and_then(|m| m.fields.get_mut(&field))
                {
                    f.comodel = Some(comodel);
                }
            }
        }

        // Then emit the hop reads for every chain, resolved or not.
        let mut usages = Vec::new();
        for model in self.models.values() {
            for field in model.fields.values() {
                let Some(related) = &field.related else {
                    continue;
                };
                let location = match field.locations.first() {
                    Some(loc) => loc.clone(),
                    None => continue,
                };
                let mut current = Some(model.name.clone());
                for hop in related.split('.') {
                    let Some(model_name) = current else { break };
                    usages.push(RawUsage::known(
                        model_name.clone(),
                        hop,
                        UsageKind::FieldRead,
                        location.clone(),
                    ));
                    current = self
                        .field(&model_name, hop)
                        .and_then(|f| f.comodel.clone());
                }
            }
        }
        usages
    }

    /// Compute/inverse methods named by string are reached by the framework
    /// whenever their field is, so they are used by construction.
    fn compute_method_usages(&self) -> Vec<RawUsage> {
        let mut usages = Vec::new();
        for model in self.models.values() {
            for field in model.fields.values() {
                let location = match field.locations.first() {
                    Some(loc) => loc.clone(),
                    None => continue,
                };
                for target in [&field.compute, &field.inverse].into_iter().flatten() {
                    if self.method_exists(&model.name, target) {
                        usages.push(RawUsage::known(
                            model.name.clone(),
                            target.clone(),
                            UsageKind::MethodCall,
                            location.clone(),
                        ));
                    } else {
                        debug!(
                            "compute target {} not declared on {}",
                            target, model.name
                        );
                    }
                }
            }
        }
        usages
    }

    fn ensure_node(&mut self, name: &str) -> NodeIndex {
        if let Some(&node) = self.node_map.get(name) {
            return node;
        }
        let node = self.links.add_node(name.to_string());
        self.node_map.insert(name.to_string(), node);
        node
    }

    fn ensure_link(&mut self, from: NodeIndex, to: NodeIndex, kind: LinkKind) {
        let exists = self
            .links
            .edges_connecting(from, to)
            .any(|e| *e.weight() == kind);
        if !exists {
            self.links.add_edge(from, to, kind);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn loc(line: usize) -> Location {
        Location::new(PathBuf::from("models/test.py"), line)
    }

    fn stored(name: &str, line: usize) -> FieldDecl {
        FieldDecl {
            name: name.to_string(),
            kind: FieldKind::Stored,
            comodel: None,
            inverse_name: None,
            related: None,
            compute: None,
            inverse: None,
            location: loc(line),
        }
    }

    fn relational(name: &str, comodel: Option<&str>, line: usize) -> FieldDecl {
        FieldDecl {
            name: name.to_string(),
            kind: FieldKind::Relational,
            comodel: comodel.map(|s| s.to_string()),
            inverse_name: None,
            related: None,
            compute: None,
            inverse: None,
            location: loc(line),
        }
    }

    fn model(name: &str, parents: &[&str], fields: Vec<FieldDecl>) -> ModelDecl {
        ModelDecl {
            name: name.to_string(),
            parents: parents.iter().map(|s| s.to_string()).collect(),
            delegates: Vec::new(),
            fields,
            methods: Vec::new(),
        }
    }

    #[test]
    fn test_redeclaration_merges_into_one_symbol() {
        let mut registry = ModelRegistry::new();
        registry.register(model("res.partner", &[], vec![stored("email", 3)]));
        registry.register(model("res.partner", &[], vec![stored("email", 9)]));

        let partner = registry.get("res.partner").unwrap();
        assert_eq!(partner.fields.len(), 1);
        assert_eq!(partner.fields["email"].locations.len(), 2);
    }

    #[test]
    fn test_resolve_through_parent_chain() {
        let mut registry = ModelRegistry::new();
        registry.register(model("base.model", &[], vec![stored("x", 1)]));
        registry.register(model("child.model", &["base.model"], vec![]));

        let id = registry
            .resolve("child.model", "x", SymbolKind::Field)
            .unwrap();
        assert_eq!(id.model, "base.model");
    }

    #[test]
    fn test_local_declaration_wins_over_parent() {
        let mut registry = ModelRegistry::new();
        registry.register(model("base.model", &[], vec![stored("x", 1)]));
        registry.register(model("child.model", &["base.model"], vec![stored("x", 5)]));

        let id = registry
            .resolve("child.model", "x", SymbolKind::Field)
            .unwrap();
        assert_eq!(id.model, "child.model");
    }

    #[test]
    fn test_delegation_is_last_resort() {
        let mut registry = ModelRegistry::new();
        registry.register(model("delegate.model", &[], vec![stored("y", 1)]));
        registry.register(ModelDecl {
            name: "composite.model".to_string(),
            parents: vec!["parent.model".to_string()],
            delegates: vec!["delegate.model".to_string()],
            fields: vec![],
            methods: vec![],
        });
        registry.register(model("parent.model", &[], vec![]));

        // Only the delegate declares `y`: resolvable through the delegating model.
        let id = registry
            .resolve("composite.model", "y", SymbolKind::Field)
            .unwrap();
        assert_eq!(id.model, "delegate.model");

        // A parent declaration beats the delegate.
        registry.register(model("parent.model", &[], vec![stored("y", 7)]));
        let id = registry
            .resolve("composite.model", "y", SymbolKind::Field)
            .unwrap();
        assert_eq!(id.model, "parent.model");
    }

    #[test]
    fn test_inheritance_cycle_is_guarded() {
        let mut registry = ModelRegistry::new();
        registry.register(model("a.model", &["b.model"], vec![]));
        registry.register(model("b.model", &["a.model"], vec![stored("z", 2)]));

        let id = registry.resolve("a.model", "z", SymbolKind::Field).unwrap();
        assert_eq!(id.model, "b.model");
        assert!(registry.resolve("a.model", "missing", SymbolKind::Field).is_none());
    }

    #[test]
    fn test_unresolved_symbol_is_none() {
        let mut registry = ModelRegistry::new();
        registry.register(model("res.partner", &[], vec![]));
        assert!(registry
            .resolve("res.partner", "nope", SymbolKind::Field)
            .is_none());
        assert!(registry
            .resolve("unknown.model", "nope", SymbolKind::Field)
            .is_none());
    }

    #[test]
    fn test_candidates_by_name() {
        let mut registry = ModelRegistry::new();
        registry.register(model("a.model", &[], vec![stored("amount", 1)]));
        registry.register(model("b.model", &[], vec![stored("amount", 2)]));

        let candidates = registry.candidates("amount", SymbolKind::Field);
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].model, "a.model");
        assert_eq!(candidates[1].model, "b.model");
    }

    #[test]
    fn test_relational_comodel_propagation() {
        let mut registry = ModelRegistry::new();
        registry.register(model(
            "base.model",
            &[],
            vec![relational("partner_id", Some("res.partner"), 1)],
        ));
        // Redeclared without a comodel, e.g. to attach a domain.
        registry.register(model(
            "child.model",
            &["base.model"],
            vec![relational("partner_id", None, 4)],
        ));
        registry.finalize();

        assert_eq!(
            registry.field_comodel("child.model", "partner_id"),
            Some("res.partner")
        );
    }

    #[test]
    fn test_related_chain_emits_hop_reads() {
        let mut registry = ModelRegistry::new();
        registry.register(model("res.partner", &[], vec![stored("name", 1)]));
        registry.register(model(
            "sale.order",
            &[],
            vec![
                relational("partner_id", Some("res.partner"), 2),
                FieldDecl {
                    related: Some("partner_id.name".to_string()),
                    kind: FieldKind::Computed,
                    ..stored("partner_name", 3)
                },
            ],
        ));

        let usages = registry.finalize();
        let targets: Vec<(&str, &str)> = usages
            .iter()
            .filter_map(|u| match &u.receiver {
                crate::graph::Receiver::Known(m) => Some((m.as_str(), u.target.as_str())),
                crate::graph::Receiver::Unknown => None,
            })
            .collect();
        assert!(targets.contains(&("sale.order", "partner_id")));
        assert!(targets.contains(&("res.partner", "name")));
    }
}
