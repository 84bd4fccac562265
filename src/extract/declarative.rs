//! Reference extraction from declarative descriptor records.
//!
//! View architectures bind `<field>` and `<button>` elements to the view's
//! model; relational fields carrying an inline subview rebind their subtree to
//! the comodel. Server action and cron records embed Python snippets, which
//! are handed to the imperative extractor with the framework's ambient
//! bindings in place.

use super::ImperativeExtractor;
use crate::graph::{Confidence, Location, RawUsage, Receiver, SymbolKind, UsageKind};
use crate::parser::ast::{Descriptor, DescriptorKind, DescriptorNode};
use crate::parser::PythonParser;
use crate::registry::ModelRegistry;
use regex::Regex;
use std::path::Path;
use tracing::warn;

/// Attributes holding Python-ish expressions over the bound model's fields
const EXPRESSION_ATTRS: &[&str] = &[
    "attrs",
    "domain",
    "context",
    "filter_domain",
    "invisible",
    "readonly",
    "required",
    "column_invisible",
];

/// Names that appear in view expressions without being fields
const EXPRESSION_KEYWORDS: &[&str] = &[
    "True", "False", "None", "and", "or", "not", "in", "if", "else", "for", "parent", "context",
    "uid", "active_id", "active_ids", "active_model", "context_today", "datetime", "time",
];

/// Extractor for declarative reference sites
pub struct DeclarativeExtractor<'a> {
    registry: &'a ModelRegistry,
    identifier: Regex,
    scan_expressions: bool,
}

impl<'a> DeclarativeExtractor<'a> {
    pub fn new(registry: &'a ModelRegistry) -> Self {
        Self {
            registry,
            identifier: Regex::new(r"[A-Za-z_][A-Za-z0-9_]*").unwrap(),
            scan_expressions: true,
        }
    }

    /// Enable or disable the heuristic attribute-expression scan
    pub fn scan_expressions(mut self, enabled: bool) -> Self {
        self.scan_expressions = enabled;
        self
    }

    /// Extract references from one descriptor record
    pub fn extract(&self, descriptor: &Descriptor, parser: &mut PythonParser) -> Vec<RawUsage> {
        let Some(model) = descriptor.model.as_deref() else {
            warn!(
                "Descriptor at {} has no resolvable model, skipping",
                descriptor.location
            );
            return Vec::new();
        };

        let mut usages = Vec::new();
        match descriptor.kind {
            DescriptorKind::View => {
                if let Some(arch) = &descriptor.arch {
                    self.walk_arch(model, arch, &descriptor.location.file, &mut usages);
                }
            }
            DescriptorKind::ServerAction | DescriptorKind::Cron => {
                if let Some(snippet) = &descriptor.code {
                    match parser.parse_snippet(
                        &descriptor.location.file,
                        &snippet.source,
                        snippet.line,
                    ) {
                        Ok(stmts) => {
                            let imperative = ImperativeExtractor::new(self.registry);
                            usages.extend(imperative.extract_snippet(
                                model,
                                &descriptor.location.file,
                                &stmts,
                            ));
                        }
                        Err(e) => warn!("Skipping embedded code: {e}"),
                    }
                }
            }
        }
        usages
    }

    fn walk_arch(&self, model: &str, node: &DescriptorNode, file: &Path, usages: &mut Vec<RawUsage>) {
        for child in &node.children {
            self.element(model, child, file, usages);
        }
    }

    fn element(&self, model: &str, node: &DescriptorNode, file: &Path, usages: &mut Vec<RawUsage>) {
        let location = Location::new(file.to_path_buf(), node.line);
        self.attr_expressions(model, node, &location, usages);

        match node.tag.as_str() {
            "field" => {
                let Some(name) = node.attr("name") else {
                    return;
                };
                usages.push(RawUsage::known(
                    model,
                    name,
                    UsageKind::ViewFieldRead,
                    location,
                ));
                if !node.children.is_empty() {
                    // An inline subview: the nested arch binds to the comodel.
                    // Without a comodel the subtree cannot be bound to anything.
                    let Some(field) = self.registry.field(model, name) else {
                        return;
                    };
                    let Some(comodel) = field.comodel.clone() else {
                        return;
                    };
                    if let Some(inverse) = field.inverse_name.clone() {
                        // The framework reads the One2many's inverse column to
                        // assemble the subview's records.
                        usages.push(RawUsage::known(
                            comodel.clone(),
                            inverse,
                            UsageKind::ViewFieldRead,
                            Location::new(file.to_path_buf(), node.line),
                        ));
                    }
                    self.walk_arch(&comodel, node, file, usages);
                }
            }
            "button" => {
                if node.attr("type") == Some("object") {
                    if let Some(name) = node.attr("name") {
                        usages.push(RawUsage::known(
                            model,
                            name,
                            UsageKind::ViewButtonCall,
                            location,
                        ));
                    }
                }
                self.walk_arch(model, node, file, usages);
            }
            _ => self.walk_arch(model, node, file, usages),
        }
    }

    /// Scan attribute expressions (`attrs`, `domain`, modifier conditions) for
    /// identifiers matching fields of the bound model. Bare-name matching is
    /// heuristic, so these references carry low confidence even though the
    /// receiver is the view's own model.
    fn attr_expressions(
        &self,
        model: &str,
        node: &DescriptorNode,
        location: &Location,
        usages: &mut Vec<RawUsage>,
    ) {
        if !self.scan_expressions {
            return;
        }
        for (key, value) in &node.attrs {
            if !EXPRESSION_ATTRS.contains(&key.as_str()) {
                continue;
            }
            for m in self.identifier.find_iter(value) {
                let name = m.as_str();
                if EXPRESSION_KEYWORDS.contains(&name) {
                    continue;
                }
                if self.registry.resolve(model, name, SymbolKind::Field).is_none() {
                    continue;
                }
                usages.push(RawUsage {
                    target: name.to_string(),
                    kind: UsageKind::ViewFieldRead,
                    receiver: Receiver::Known(model.to_string()),
                    location: location.clone(),
                    confidence: Confidence::Low,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::xml::XmlParser;
    use crate::registry::{FieldDecl, FieldKind, MethodDecl, ModelDecl};
    use std::path::PathBuf;

    fn loc() -> Location {
        Location::new(PathBuf::from("models/test.py"), 1)
    }

    fn field(name: &str, comodel: Option<&str>) -> FieldDecl {
        FieldDecl {
            name: name.to_string(),
            kind: if comodel.is_some() {
                FieldKind::Relational
            } else {
                FieldKind::Stored
            },
            comodel: comodel.map(String::from),
            inverse_name: None,
            related: None,
            compute: None,
            inverse: None,
            location: loc(),
        }
    }

    fn registry() -> ModelRegistry {
        let mut registry = ModelRegistry::new();
        registry.register(ModelDecl {
            name: "sale.order".to_string(),
            parents: vec![],
            delegates: vec![],
            fields: vec![
                field("state", None),
                FieldDecl {
                    inverse_name: Some("order_id".to_string()),
                    ..field("line_ids", Some("sale.order.line"))
                },
            ],
            methods: vec![MethodDecl {
                name: "action_confirm".to_string(),
                location: loc(),
            }],
        });
        registry.register(ModelDecl {
            name: "sale.order.line".to_string(),
            parents: vec![],
            delegates: vec![],
            fields: vec![field("price", None), field("order_id", Some("sale.order"))],
            methods: vec![],
        });
        registry
    }

    fn extract(xml: &str) -> Vec<RawUsage> {
        let descriptors = XmlParser::new()
            .parse(&PathBuf::from("views/sale_views.xml"), xml)
            .unwrap();
        let registry = registry();
        let extractor = DeclarativeExtractor::new(&registry);
        let mut parser = PythonParser::new();
        descriptors
            .iter()
            .flat_map(|d| extractor.extract(d, &mut parser))
            .collect()
    }

    fn has(usages: &[RawUsage], model: &str, target: &str, kind: UsageKind) -> bool {
        usages.iter().any(|u| {
            u.target == target
                && u.kind == kind
                && u.receiver == Receiver::Known(model.to_string())
        })
    }

    #[test]
    fn test_view_fields_and_buttons() {
        let usages = extract(
            r#"<odoo>
    <record id="view_order_form" model="ir.ui.view">
        <field name="model">sale.order</field>
        <field name="arch" type="xml">
            <form>
                <field name="state"/>
                <button name="action_confirm" type="object"/>
                <button name="%(action_report)d" type="action"/>
            </form>
        </field>
    </record>
</odoo>"#,
        );

        assert!(has(&usages, "sale.order", "state", UsageKind::ViewFieldRead));
        assert!(has(
            &usages,
            "sale.order",
            "action_confirm",
            UsageKind::ViewButtonCall
        ));
        // Action buttons reference window actions, not methods.
        assert!(!usages.iter().any(|u| u.kind == UsageKind::ViewButtonCall
            && u.target.contains("action_report")));
    }

    #[test]
    fn test_subview_binds_comodel() {
        let usages = extract(
            r#"<odoo>
    <record id="view_order_form" model="ir.ui.view">
        <field name="model">sale.order</field>
        <field name="arch" type="xml">
            <form>
                <field name="line_ids">
                    <tree>
                        <field name="price"/>
                    </tree>
                </field>
            </form>
        </field>
    </record>
</odoo>"#,
        );

        assert!(has(&usages, "sale.order", "line_ids", UsageKind::ViewFieldRead));
        assert!(has(
            &usages,
            "sale.order.line",
            "price",
            UsageKind::ViewFieldRead
        ));
        // The inverse column is read to assemble the subview.
        assert!(has(
            &usages,
            "sale.order.line",
            "order_id",
            UsageKind::ViewFieldRead
        ));
    }

    #[test]
    fn test_attrs_expression_identifiers_are_low_confidence() {
        let usages = extract(
            r#"<odoo>
    <record id="view_order_form" model="ir.ui.view">
        <field name="model">sale.order</field>
        <field name="arch" type="xml">
            <form>
                <group invisible="state != 'draft'">
                    <button name="action_confirm" type="object"/>
                </group>
            </form>
        </field>
    </record>
</odoo>"#,
        );

        let state = usages
            .iter()
            .find(|u| u.target == "state" && u.kind == UsageKind::ViewFieldRead)
            .unwrap();
        assert_eq!(state.confidence, Confidence::Low);
    }

    #[test]
    fn test_server_action_code_is_extracted() {
        let usages = extract(
            r#"<odoo>
    <record id="action_reset" model="ir.actions.server">
        <field name="model_id" ref="model_sale_order"/>
        <field name="state">code</field>
        <field name="code">records.write({'state': 'draft'})</field>
    </record>
</odoo>"#,
        );

        assert!(has(
            &usages,
            "sale.order",
            "state",
            UsageKind::ActionFieldWrite
        ));
    }

    #[test]
    fn test_cron_code_method_call() {
        let usages = extract(
            r#"<odoo>
    <record id="cron_confirm" model="ir.cron">
        <field name="model_id" ref="model_sale_order"/>
        <field name="code">model.action_confirm()</field>
    </record>
</odoo>"#,
        );

        assert!(has(
            &usages,
            "sale.order",
            "action_confirm",
            UsageKind::CronMethodCall
        ));
    }

    #[test]
    fn test_unbound_descriptor_yields_nothing() {
        let usages = extract(
            r#"<odoo>
    <record id="view_inherit" model="ir.ui.view">
        <field name="inherit_id" ref="base.view_order_form"/>
        <field name="arch" type="xml">
            <field name="state" position="after"/>
        </field>
    </record>
</odoo>"#,
        );
        assert!(usages.is_empty());
    }
}
