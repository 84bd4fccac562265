//! Python front-end: extracts model declarations and lowered method bodies
//! from Odoo model files using tree-sitter.

use super::ast::{Decorator, DecoratorArg, Expr, MethodBody, Stmt};
use super::common::{
    child_by_field, children_of_kind, named_children, node_line, node_text, string_or_name,
    string_value,
};
use super::ParseError;
use crate::graph::Location;
use crate::registry::{FieldDecl, FieldKind, MethodDecl, ModelDecl};
use std::path::Path;
use tracing::{debug, warn};
use tree_sitter::{Node, Parser as TsParser};

/// Methods the framework always invokes; never dead-code candidates.
const FRAMEWORK_METHODS: &[&str] = &["create", "write", "default_get", "unlink", "copy"];

/// Decorators marking methods the framework invokes on its own.
const FRAMEWORK_DECORATORS: &[&str] = &[
    "depends",
    "constrains",
    "onchange",
    "ondelete",
    "model_create_multi",
];

/// Name prefixes of methods wired to fields by convention.
const FRAMEWORK_PREFIXES: &[&str] = &["_compute", "_inverse", "_default"];

const RELATIONAL_CLASSES: &[&str] = &["Many2one", "One2many", "Many2many"];

/// Result of parsing one Python model file
#[derive(Debug, Default)]
pub struct PythonParseResult {
    /// Model declarations, one per model class
    pub models: Vec<ModelDecl>,
    /// Lowered method bodies for every method, candidates or not
    pub bodies: Vec<MethodBody>,
}

/// Python source parser using tree-sitter
pub struct PythonParser {
    parser: TsParser,
}

impl PythonParser {
    pub fn new() -> Self {
        let mut parser = TsParser::new();
        parser
            .set_language(&tree_sitter_python::language())
            .expect("Failed to load Python grammar");
        Self { parser }
    }

    /// Parse a model file into declarations and method bodies
    pub fn parse(&mut self, path: &Path, contents: &str) -> Result<PythonParseResult, ParseError> {
        let tree = self
            .parser
            .parse(contents, None)
            .ok_or_else(|| ParseError::malformed(path, "tree-sitter returned no tree"))?;

        let mut result = PythonParseResult::default();
        let root = tree.root_node();

        for node in named_children(root) {
            let class = match node.kind() {
                "class_definition" => Some(node),
                "decorated_definition" => child_by_field(node, "definition")
                    .filter(|def| def.kind() == "class_definition"),
                _ => None,
            };
            if let Some(class) = class {
                self.extract_class(path, class, contents, &mut result);
            }
        }

        debug!(
            "Parsed {}: {} models, {} method bodies",
            path.display(),
            result.models.len(),
            result.bodies.len()
        );
        Ok(result)
    }

    /// Parse an embedded code snippet (server action / cron body) into
    /// statements. `start_line` is the line of the snippet's first line in
    /// the enclosing file, so locations point into the XML.
    pub fn parse_snippet(
        &mut self,
        path: &Path,
        contents: &str,
        start_line: usize,
    ) -> Result<Vec<Stmt>, ParseError> {
        let trimmed = dedent(contents);
        let tree = self
            .parser
            .parse(&trimmed, None)
            .ok_or_else(|| ParseError::malformed(path, "tree-sitter returned no tree"))?;
        let lowerer = Lowerer {
            source: &trimmed,
            offset: start_line.saturating_sub(1),
        };
        Ok(lowerer.lower_block(tree.root_node()))
    }

    /// Extract the `data` file list from a `__manifest__.py` dict literal
    pub fn manifest_data(&mut self, contents: &str) -> Vec<String> {
        let Some(tree) = self.parser.parse(contents, None) else {
            return Vec::new();
        };
        let mut data = Vec::new();
        collect_manifest_data(tree.root_node(), contents, &mut data);
        data
    }

    /// Module names pulled in by `from . import x, y` in an `__init__.py`
    pub fn init_imports(&mut self, contents: &str) -> Vec<String> {
        let Some(tree) = self.parser.parse(contents, None) else {
            return Vec::new();
        };
        let mut names = Vec::new();
        for node in named_children(tree.root_node()) {
            if node.kind() != "import_from_statement" {
                continue;
            }
            let relative = child_by_field(node, "module_name")
                .map(|m| node_text(m, contents).starts_with('.'))
                .unwrap_or(false);
            if !relative {
                continue;
            }
            let mut cursor = node.walk();
            for name in node.children_by_field_name("name", &mut cursor) {
                match name.kind() {
                    "dotted_name" => names.push(node_text(name, contents).to_string()),
                    "aliased_import" => {
                        if let Some(original) = child_by_field(name, "name") {
                            names.push(node_text(original, contents).to_string());
                        }
                    }
                    _ => {}
                }
            }
        }
        names
    }

    fn extract_class(
        &self,
        path: &Path,
        class: Node,
        source: &str,
        result: &mut PythonParseResult,
    ) {
        let Some(block) = child_by_field(class, "body") else {
            return;
        };

        let Some(identity) = model_identity(block, source) else {
            warn!(
                "Class at {}:{} does not correspond to a model",
                path.display(),
                class.start_position().row + 1
            );
            return;
        };

        let mut decl = ModelDecl {
            name: identity.name.clone(),
            parents: identity.parents,
            delegates: identity.delegates,
            fields: Vec::new(),
            methods: Vec::new(),
        };

        let lowerer = Lowerer { source, offset: 0 };

        for stmt in named_children(block) {
            match stmt.kind() {
                "expression_statement" => {
                    if let Some(assign) = named_children(stmt)
                        .into_iter()
                        .find(|c| c.kind() == "assignment")
                    {
                        if let Some(field) = extract_field(path, assign, source) {
                            decl.fields.push(field);
                        }
                    }
                }
                "function_definition" => {
                    self.extract_method(path, stmt, &[], source, &identity.name, &mut decl, result, &lowerer);
                }
                "decorated_definition" => {
                    let decorators = extract_decorators(stmt, source);
                    if let Some(def) = child_by_field(stmt, "definition")
                        .filter(|d| d.kind() == "function_definition")
                    {
                        self.extract_method(
                            path,
                            def,
                            &decorators,
                            source,
                            &identity.name,
                            &mut decl,
                            result,
                            &lowerer,
                        );
                    }
                }
                _ => {}
            }
        }

        result.models.push(decl);
    }

    #[allow(clippy::too_many_arguments)]
    fn extract_method(
        &self,
        path: &Path,
        def: Node,
        decorators: &[Decorator],
        source: &str,
        model: &str,
        decl: &mut ModelDecl,
        result: &mut PythonParseResult,
        lowerer: &Lowerer,
    ) {
        let Some(name_node) = child_by_field(def, "name") else {
            return;
        };
        let name = node_text(name_node, source).to_string();
        let location = Location::new(path.to_path_buf(), node_line(def, 0));

        if is_candidate(&name, decorators) {
            decl.methods.push(MethodDecl {
                name: name.clone(),
                location: location.clone(),
            });
        }

        let body = child_by_field(def, "body")
            .map(|block| lowerer.lower_block(block))
            .unwrap_or_default();

        result.bodies.push(MethodBody {
            model: model.to_string(),
            method: name,
            decorators: decorators.to_vec(),
            body,
            location,
        });
    }
}

impl Default for PythonParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Methods reached only through explicit calls are candidates; framework
/// hooks and convention-wired compute/inverse/default methods are not.
fn is_candidate(name: &str, decorators: &[Decorator]) -> bool {
    if FRAMEWORK_METHODS.contains(&name) {
        return false;
    }
    if FRAMEWORK_PREFIXES.iter().any(|p| name.starts_with(p)) {
        return false;
    }
    if decorators
        .iter()
        .any(|d| FRAMEWORK_DECORATORS.contains(&d.name.as_str()))
    {
        return false;
    }
    true
}

struct ModelIdentity {
    name: String,
    parents: Vec<String>,
    delegates: Vec<String>,
}

/// Determine the model a class declares from its `_name` / `_inherit` /
/// `_inherits` assignments. A class with `_inherit` and no `_name` augments
/// the inherited model itself.
fn model_identity(block: Node, source: &str) -> Option<ModelIdentity> {
    let mut name_node = None;
    let mut inherit_node = None;
    let mut inherits_node = None;

    for stmt in named_children(block) {
        if stmt.kind() != "expression_statement" {
            continue;
        }
        for assign in named_children(stmt) {
            if assign.kind() != "assignment" {
                continue;
            }
            let Some(left) = child_by_field(assign, "left") else {
                continue;
            };
            if left.kind() != "identifier" {
                continue;
            }
            let Some(right) = child_by_field(assign, "right") else {
                continue;
            };
            match node_text(left, source) {
                "_name" => name_node = Some(right),
                "_inherit" => inherit_node = Some(right),
                "_inherits" => inherits_node = Some(right),
                _ => {}
            }
        }
    }

    let mut parents = Vec::new();
    let mut delegates = Vec::new();

    if let Some(inherits) = inherits_node {
        if inherits.kind() == "dictionary" {
            for pair in children_of_kind(inherits, "pair") {
                if let Some(key) = child_by_field(pair, "key").and_then(|k| string_value(k, source))
                {
                    delegates.push(key);
                }
            }
        }
    }

    let name = match (name_node, inherit_node) {
        (Some(name), inherit) => {
            // `_name = model('x')` and similar dynamic names are unsupported.
            let name = string_value(name, source)?;
            if let Some(inherit) = inherit {
                parents.extend(inherit_values(inherit, source));
            }
            name
        }
        (None, Some(inherit)) => {
            let values = inherit_values(inherit, source);
            if values.len() == 1 {
                values.into_iter().next()?
            } else {
                return None;
            }
        }
        (None, None) => return None,
    };

    parents.retain(|p| p != &name);
    Some(ModelIdentity {
        name,
        parents,
        delegates,
    })
}

fn inherit_values(node: Node, source: &str) -> Vec<String> {
    match node.kind() {
        "string" => string_value(node, source).into_iter().collect(),
        "list" => named_children(node)
            .into_iter()
            .filter_map(|e| string_value(e, source))
            .collect(),
        _ => Vec::new(),
    }
}

/// Extract a `name = fields.Kind(...)` declaration
fn extract_field(path: &Path, assign: Node, source: &str) -> Option<FieldDecl> {
    let left = child_by_field(assign, "left")?;
    if left.kind() != "identifier" {
        return None;
    }
    let right = child_by_field(assign, "right")?;
    if right.kind() != "call" {
        return None;
    }
    let func = child_by_field(right, "function")?;
    if func.kind() != "attribute" {
        return None;
    }
    let object = child_by_field(func, "object")?;
    if object.kind() != "identifier" || node_text(object, source) != "fields" {
        return None;
    }
    let field_class = node_text(child_by_field(func, "attribute")?, source);

    let name = node_text(left, source).to_string();
    let relational = RELATIONAL_CLASSES.contains(&field_class);

    let mut comodel = None;
    let mut inverse_name = None;
    let mut related = None;
    let mut compute = None;
    let mut inverse = None;

    if let Some(arguments) = child_by_field(right, "arguments") {
        let mut positional = 0usize;
        for arg in named_children(arguments) {
            if arg.kind() == "keyword_argument" {
                let Some(key) = child_by_field(arg, "name") else {
                    continue;
                };
                let Some(value) = child_by_field(arg, "value") else {
                    continue;
                };
                match node_text(key, source) {
                    "comodel_name" => comodel = string_or_name(value, source),
                    "inverse_name" => inverse_name = string_or_name(value, source),
                    "related" => related = string_value(value, source),
                    "compute" => compute = string_value(value, source),
                    "inverse" => inverse = string_value(value, source),
                    _ => {}
                }
            } else if arg.kind() != "comment" {
                if relational {
                    match positional {
                        0 => comodel = comodel.or_else(|| string_or_name(arg, source)),
                        1 if field_class == "One2many" => {
                            inverse_name = inverse_name.or_else(|| string_or_name(arg, source));
                        }
                        _ => {}
                    }
                }
                positional += 1;
            }
        }
    }

    let kind = if relational {
        FieldKind::Relational
    } else if compute.is_some() || related.is_some() {
        FieldKind::Computed
    } else {
        FieldKind::Stored
    };

    Some(FieldDecl {
        name,
        kind,
        comodel,
        inverse_name,
        related,
        compute,
        inverse,
        location: Location::new(path.to_path_buf(), node_line(assign, 0)),
    })
}

/// Decorators of a decorated definition, keeping their trailing name and any
/// string/name arguments.
fn extract_decorators(decorated: Node, source: &str) -> Vec<Decorator> {
    let mut decorators = Vec::new();
    for node in children_of_kind(decorated, "decorator") {
        let Some(expr) = named_children(node).into_iter().next() else {
            continue;
        };
        let (name_node, args_node) = match expr.kind() {
            "call" => (child_by_field(expr, "function"), child_by_field(expr, "arguments")),
            _ => (Some(expr), None),
        };
        let Some(name_node) = name_node else { continue };
        let name = match name_node.kind() {
            "attribute" => child_by_field(name_node, "attribute")
                .map(|a| node_text(a, source).to_string()),
            "identifier" => Some(node_text(name_node, source).to_string()),
            _ => None,
        };
        let Some(name) = name else { continue };

        let mut args = Vec::new();
        if let Some(arguments) = args_node {
            for arg in named_children(arguments) {
                match arg.kind() {
                    "string" => {
                        if let Some(value) = string_value(arg, source) {
                            args.push(DecoratorArg::Str(value));
                        }
                    }
                    "identifier" => {
                        args.push(DecoratorArg::Name(node_text(arg, source).to_string()));
                    }
                    _ => {}
                }
            }
        }
        decorators.push(Decorator { name, args });
    }
    decorators
}

fn collect_manifest_data(node: Node, source: &str, data: &mut Vec<String>) {
    if node.kind() == "dictionary" {
        for pair in children_of_kind(node, "pair") {
            let is_data = child_by_field(pair, "key")
                .and_then(|k| string_value(k, source))
                .map(|k| k == "data")
                .unwrap_or(false);
            if !is_data {
                continue;
            }
            if let Some(list) = child_by_field(pair, "value").filter(|v| v.kind() == "list") {
                for entry in named_children(list) {
                    if let Some(value) = string_value(entry, source) {
                        data.push(value);
                    }
                }
            }
            return;
        }
    }
    for child in named_children(node) {
        collect_manifest_data(child, source, data);
    }
}

/// Strip common leading indentation so embedded snippets parse as modules
fn dedent(code: &str) -> String {
    let indent = code
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);
    code.lines()
        .map(|line| if line.len() >= indent { &line[indent..] } else { line })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Lowers tree-sitter nodes into the owned statement/expression trees
struct Lowerer<'a> {
    source: &'a str,
    offset: usize,
}

impl<'a> Lowerer<'a> {
    fn lower_block(&self, block: Node) -> Vec<Stmt> {
        named_children(block)
            .into_iter()
            .filter_map(|stmt| self.lower_stmt(stmt))
            .collect()
    }

    fn lower_stmt(&self, node: Node) -> Option<Stmt> {
        match node.kind() {
            "expression_statement" => {
                let child = named_children(node).into_iter().next()?;
                match child.kind() {
                    "assignment" => self.lower_assignment(child, false),
                    "augmented_assignment" => self.lower_assignment(child, true),
                    _ => Some(Stmt::Expr(self.lower_expr(child))),
                }
            }
            "for_statement" => {
                let target = child_by_field(node, "left").and_then(|left| {
                    (left.kind() == "identifier")
                        .then(|| node_text(left, self.source).to_string())
                });
                let iter = self.lower_expr(child_by_field(node, "right")?);
                let body = child_by_field(node, "body")
                    .map(|b| self.lower_block(b))
                    .unwrap_or_default();
                let orelse = children_of_kind(node, "else_clause")
                    .into_iter()
                    .filter_map(|e| child_by_field(e, "body"))
                    .flat_map(|b| self.lower_block(b))
                    .collect();
                Some(Stmt::For {
                    target,
                    iter,
                    body,
                    orelse,
                })
            }
            "if_statement" => {
                let test = self.lower_expr(child_by_field(node, "condition")?);
                let body = child_by_field(node, "consequence")
                    .map(|b| self.lower_block(b))
                    .unwrap_or_default();
                let mut orelse = Vec::new();
                let mut cursor = node.walk();
                for alt in node.children_by_field_name("alternative", &mut cursor) {
                    match alt.kind() {
                        "elif_clause" => {
                            if let Some(stmt) = self.lower_elif(alt) {
                                orelse.push(stmt);
                            }
                        }
                        "else_clause" => {
                            if let Some(block) = child_by_field(alt, "body") {
                                orelse.extend(self.lower_block(block));
                            }
                        }
                        _ => {}
                    }
                }
                Some(Stmt::If { test, body, orelse })
            }
            "while_statement" => Some(Stmt::While {
                test: self.lower_expr(child_by_field(node, "condition")?),
                body: child_by_field(node, "body")
                    .map(|b| self.lower_block(b))
                    .unwrap_or_default(),
            }),
            "with_statement" => {
                let items = descendants_of_kind(node, "with_item")
                    .into_iter()
                    .filter_map(|item| child_by_field(item, "value"))
                    .map(|v| self.lower_expr(v))
                    .collect();
                Some(Stmt::With {
                    items,
                    body: child_by_field(node, "body")
                        .map(|b| self.lower_block(b))
                        .unwrap_or_default(),
                })
            }
            "return_statement" => Some(Stmt::Return {
                value: named_children(node)
                    .into_iter()
                    .next()
                    .map(|v| self.lower_expr(v)),
            }),
            "try_statement" => {
                let body = child_by_field(node, "body")
                    .map(|b| self.lower_block(b))
                    .unwrap_or_default();
                let handlers = children_of_kind(node, "except_clause")
                    .into_iter()
                    .map(|clause| {
                        named_children(clause)
                            .into_iter()
                            .rev()
                            .find(|c| c.kind() == "block")
                            .map(|b| self.lower_block(b))
                            .unwrap_or_default()
                    })
                    .collect();
                let orelse = children_of_kind(node, "else_clause")
                    .into_iter()
                    .filter_map(|e| child_by_field(e, "body"))
                    .flat_map(|b| self.lower_block(b))
                    .collect();
                let finalbody = children_of_kind(node, "finally_clause")
                    .into_iter()
                    .flat_map(|f| {
                        named_children(f)
                            .into_iter()
                            .filter(|c| c.kind() == "block")
                            .flat_map(|b| self.lower_block(b))
                            .collect::<Vec<_>>()
                    })
                    .collect();
                Some(Stmt::Try {
                    body,
                    handlers,
                    orelse,
                    finalbody,
                })
            }
            "raise_statement" | "assert_statement" | "delete_statement" => {
                let items: Vec<Expr> = named_children(node)
                    .into_iter()
                    .map(|c| self.lower_expr(c))
                    .collect();
                if items.is_empty() {
                    None
                } else {
                    let line = node_line(node, self.offset);
                    Some(Stmt::Expr(Expr::Group { items, line }))
                }
            }
            _ => None,
        }
    }

    fn lower_elif(&self, clause: Node) -> Option<Stmt> {
        Some(Stmt::If {
            test: self.lower_expr(child_by_field(clause, "condition")?),
            body: child_by_field(clause, "consequence")
                .map(|b| self.lower_block(b))
                .unwrap_or_default(),
            orelse: Vec::new(),
        })
    }

    fn lower_assignment(&self, node: Node, augmented: bool) -> Option<Stmt> {
        let left = child_by_field(node, "left")?;
        let mut targets = match left.kind() {
            "pattern_list" | "tuple_pattern" => named_children(left)
                .into_iter()
                .map(|t| self.lower_expr(t))
                .collect(),
            _ => vec![self.lower_expr(left)],
        };

        // Chained assignment: a = b = value
        let mut right = child_by_field(node, "right")?;
        while right.kind() == "assignment" {
            if let Some(inner_left) = child_by_field(right, "left") {
                targets.push(self.lower_expr(inner_left));
            }
            right = child_by_field(right, "right")?;
        }

        Some(Stmt::Assign {
            targets,
            value: self.lower_expr(right),
            augmented,
        })
    }

    fn lower_expr(&self, node: Node) -> Expr {
        let line = node_line(node, self.offset);
        match node.kind() {
            "identifier" => Expr::Name {
                id: node_text(node, self.source).to_string(),
                line,
            },
            "attribute" => {
                let object = child_by_field(node, "object")
                    .map(|o| self.lower_expr(o))
                    .unwrap_or(Expr::Literal { line });
                let attr = child_by_field(node, "attribute")
                    .map(|a| node_text(a, self.source).to_string())
                    .unwrap_or_default();
                Expr::Attribute {
                    object: Box::new(object),
                    attr,
                    line,
                }
            }
            "call" => {
                let func = child_by_field(node, "function")
                    .map(|f| self.lower_expr(f))
                    .unwrap_or(Expr::Literal { line });
                let mut args = Vec::new();
                let mut kwargs = Vec::new();
                if let Some(arguments) = child_by_field(node, "arguments") {
                    for arg in named_children(arguments) {
                        if arg.kind() == "keyword_argument" {
                            let name = child_by_field(arg, "name")
                                .map(|n| node_text(n, self.source).to_string())
                                .unwrap_or_default();
                            let value = child_by_field(arg, "value")
                                .map(|v| self.lower_expr(v))
                                .unwrap_or(Expr::Literal { line });
                            kwargs.push((name, value));
                        } else if arg.kind() != "comment" {
                            args.push(self.lower_expr(arg));
                        }
                    }
                }
                Expr::Call {
                    func: Box::new(func),
                    args,
                    kwargs,
                    line,
                }
            }
            "subscript" => {
                let object = child_by_field(node, "value")
                    .map(|v| self.lower_expr(v))
                    .unwrap_or(Expr::Literal { line });
                let index = child_by_field(node, "subscript")
                    .map(|s| self.lower_expr(s))
                    .unwrap_or(Expr::Literal { line });
                Expr::Subscript {
                    object: Box::new(object),
                    index: Box::new(index),
                    line,
                }
            }
            "string" => {
                let interpolations: Vec<Expr> = descendants_of_kind(node, "interpolation")
                    .into_iter()
                    .filter_map(|i| named_children(i).into_iter().next())
                    .map(|e| self.lower_expr(e))
                    .collect();
                if interpolations.is_empty() {
                    Expr::Str {
                        value: string_value(node, self.source).unwrap_or_default(),
                        line,
                    }
                } else {
                    Expr::Group {
                        items: interpolations,
                        line,
                    }
                }
            }
            "concatenated_string" => {
                let value = children_of_kind(node, "string")
                    .into_iter()
                    .filter_map(|s| string_value(s, self.source))
                    .collect::<String>();
                Expr::Str { value, line }
            }
            "lambda" => {
                let params = child_by_field(node, "parameters")
                    .map(|p| lambda_params(p, self.source))
                    .unwrap_or_default();
                let body = child_by_field(node, "body")
                    .map(|b| self.lower_expr(b))
                    .unwrap_or(Expr::Literal { line });
                Expr::Lambda {
                    params,
                    body: Box::new(body),
                    line,
                }
            }
            "list_comprehension"
            | "set_comprehension"
            | "generator_expression"
            | "dictionary_comprehension" => {
                let element = child_by_field(node, "body")
                    .map(|b| self.lower_expr(b))
                    .unwrap_or(Expr::Literal { line });
                let clauses = children_of_kind(node, "for_in_clause");
                let mut conditions: Vec<Expr> = children_of_kind(node, "if_clause")
                    .into_iter()
                    .filter_map(|c| named_children(c).into_iter().next())
                    .map(|e| self.lower_expr(e))
                    .collect();
                let (target, iter) = match clauses.first() {
                    Some(first) => {
                        let target = child_by_field(*first, "left").and_then(|l| {
                            (l.kind() == "identifier")
                                .then(|| node_text(l, self.source).to_string())
                        });
                        let iter = child_by_field(*first, "right")
                            .map(|r| self.lower_expr(r))
                            .unwrap_or(Expr::Literal { line });
                        (target, iter)
                    }
                    None => (None, Expr::Literal { line }),
                };
                for extra in clauses.iter().skip(1) {
                    if let Some(right) = child_by_field(*extra, "right") {
                        conditions.push(self.lower_expr(right));
                    }
                }
                Expr::Comprehension {
                    element: Box::new(element),
                    target,
                    iter: Box::new(iter),
                    conditions,
                    line,
                }
            }
            "parenthesized_expression" => {
                let children = named_children(node);
                if children.len() == 1 {
                    self.lower_expr(children[0])
                } else {
                    self.lower_group(node, line)
                }
            }
            "true" | "false" | "none" | "integer" | "float" | "ellipsis" => {
                Expr::Literal { line }
            }
            _ => self.lower_group(node, line),
        }
    }

    fn lower_group(&self, node: Node, line: usize) -> Expr {
        let items: Vec<Expr> = named_children(node)
            .into_iter()
            .filter(|c| c.kind() != "comment")
            .map(|c| self.lower_expr(c))
            .collect();
        if items.is_empty() {
            Expr::Literal { line }
        } else {
            Expr::Group { items, line }
        }
    }
}

fn lambda_params(parameters: Node, source: &str) -> Vec<String> {
    named_children(parameters)
        .into_iter()
        .filter_map(|p| match p.kind() {
            "identifier" => Some(node_text(p, source).to_string()),
            "default_parameter" => child_by_field(p, "name")
                .map(|n| node_text(n, source).to_string()),
            _ => None,
        })
        .collect()
}

/// Depth-first descendants of a kind, not recursing into matches
fn descendants_of_kind<'a>(node: Node<'a>, kind: &str) -> Vec<Node<'a>> {
    let mut found = Vec::new();
    let mut stack = vec![node];
    while let Some(current) = stack.pop() {
        for child in named_children(current) {
            if child.kind() == kind {
                found.push(child);
            } else {
                stack.push(child);
            }
        }
    }
    found
}
