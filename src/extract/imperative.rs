//! Reference extraction from lowered Python method bodies and embedded
//! automation snippets.
//!
//! The collector walks statements tracking which local names are known to hold
//! recordsets of a specific model. Accesses through a known receiver become
//! high-confidence references; accesses through receivers that cannot be
//! traced become unknown-receiver references, which the resolution phase fans
//! out by name at low confidence. Accesses through plain values (strings,
//! numbers, dicts) are ignored entirely.

use super::dotted_field_reads;
use crate::graph::{Location, RawUsage, UsageKind};
use crate::parser::ast::{Decorator, DecoratorArg, Expr, MethodBody, Stmt};
use crate::registry::ModelRegistry;
use std::path::Path;

/// Attribute names that are framework plumbing, never fields
const ATTR_SKIP: &[&str] = &[
    "env", "id", "ids", "cr", "uid", "su", "user", "company", "context", "pool", "registry",
    "create_date", "write_date", "create_uid", "write_uid", "display_name",
    "_name", "_context", "_origin", "_fields", "_table",
];

/// Method names that belong to the ORM or to Python builtins; calling them
/// references no user-defined method.
const METHOD_SKIP: &[&str] = &[
    "browse", "search", "search_count", "search_read", "name_search", "new", "exists", "ensure_one",
    "sudo", "with_context", "with_user", "with_company", "with_env", "with_prefetch", "mapped",
    "filtered", "sorted", "read", "read_group", "create", "write", "update", "unlink", "copy",
    "name_get", "default_get", "fields_get", "ref", "get", "keys", "values", "items",
    "setdefault", "pop", "append", "extend", "insert", "remove", "add", "join", "split",
    "strip", "lstrip", "rstrip", "format", "replace", "startswith", "endswith", "lower",
    "upper", "commit", "rollback", "execute", "flush_model", "invalidate_recordset",
];

/// ORM methods returning a recordset of the same model as their receiver
const CHAIN_METHODS: &[&str] = &[
    "browse", "search", "new", "exists", "sudo", "with_context", "with_user", "with_company",
    "with_env", "with_prefetch", "copy",
];

/// Decorators whose string arguments are dotted field paths
const FIELD_PATH_DECORATORS: &[&str] = &["depends", "onchange", "constrains"];

/// What kind of site a body was extracted from; automation sites map to their
/// own usage kinds so liveness can treat them differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyContext {
    Method,
    Automation,
}

#[derive(Debug, Clone, Copy)]
enum Access {
    Read,
    Write,
    Call,
}

/// What a traced expression is known to evaluate to
#[derive(Debug, Clone)]
enum Prov {
    /// A recordset of this model
    Model(String),
    /// Something opaque that may still be a recordset
    Unknown,
    /// A plain value that cannot carry fields or methods
    Scalar,
}

/// Extractor for imperative reference sites
pub struct ImperativeExtractor<'a> {
    registry: &'a ModelRegistry,
}

impl<'a> ImperativeExtractor<'a> {
    pub fn new(registry: &'a ModelRegistry) -> Self {
        Self { registry }
    }

    /// Extract references from one method body. `self` is bound to the
    /// owning model; dotted paths in depends/onchange/constrains decorators
    /// count as reads of every hop.
    pub fn extract_body(&self, body: &MethodBody) -> Vec<RawUsage> {
        let mut collector = Collector {
            registry: self.registry,
            file: &body.location.file,
            context: BodyContext::Method,
            model: body.model.clone(),
            bindings: vec![("self".to_string(), Prov::Model(body.model.clone()))],
            usages: Vec::new(),
        };
        collector.decorator_reads(&body.decorators, &body.location);
        collector.scan_block(&body.body);
        collector.usages
    }

    /// Extract references from an automation snippet (server action or cron
    /// code), where the framework binds `model`, `record` and `records` to the
    /// configured model.
    pub fn extract_snippet(&self, model: &str, file: &Path, stmts: &[Stmt]) -> Vec<RawUsage> {
        let bindings = ["model", "record", "records"]
            .iter()
            .map(|name| (name.to_string(), Prov::Model(model.to_string())))
            .collect();
        let mut collector = Collector {
            registry: self.registry,
            file,
            context: BodyContext::Automation,
            model: model.to_string(),
            bindings,
            usages: Vec::new(),
        };
        collector.scan_block(stmts);
        collector.usages
    }
}

struct Collector<'a> {
    registry: &'a ModelRegistry,
    file: &'a Path,
    context: BodyContext,
    model: String,
    bindings: Vec<(String, Prov)>,
    usages: Vec<RawUsage>,
}

impl Collector<'_> {
    fn usage_kind(&self, access: Access) -> UsageKind {
        match (self.context, access) {
            (_, Access::Read) => UsageKind::FieldRead,
            (BodyContext::Method, Access::Write) => UsageKind::FieldWrite,
            (BodyContext::Automation, Access::Write) => UsageKind::ActionFieldWrite,
            (BodyContext::Method, Access::Call) => UsageKind::MethodCall,
            (BodyContext::Automation, Access::Call) => UsageKind::CronMethodCall,
        }
    }

    fn location(&self, line: usize) -> Location {
        Location::new(self.file.to_path_buf(), line)
    }

    fn emit_known(&mut self, model: &str, target: &str, access: Access, line: usize) {
        let kind = self.usage_kind(access);
        self.usages
            .push(RawUsage::known(model, target, kind, self.location(line)));
    }

    fn emit_unknown(&mut self, target: &str, access: Access, line: usize) {
        let kind = self.usage_kind(access);
        self.usages
            .push(RawUsage::unknown(target, kind, self.location(line)));
    }

    fn decorator_reads(&mut self, decorators: &[Decorator], location: &Location) {
        for decorator in decorators {
            let dotted = FIELD_PATH_DECORATORS.contains(&decorator.name.as_str());
            for arg in &decorator.args {
                match arg {
                    DecoratorArg::Str(path) if dotted => {
                        let model = self.model.clone();
                        dotted_field_reads(
                            self.registry,
                            &model,
                            path,
                            UsageKind::FieldRead,
                            location,
                            &mut self.usages,
                        );
                    }
                    DecoratorArg::Name(target) => {
                        // A bare name handed to a decorator references a
                        // method the framework will call on this model.
                        let model = self.model.clone();
                        self.usages.push(RawUsage::known(
                            model,
                            target,
                            UsageKind::MethodCall,
                            location.clone(),
                        ));
                    }
                    _ => {}
                }
            }
        }
    }

    fn lookup(&self, name: &str) -> Prov {
        self.bindings
            .iter()
            .rev()
            .find(|(bound, _)| bound == name)
            .map(|(_, prov)| prov.clone())
            .unwrap_or(Prov::Unknown)
    }

    fn bind(&mut self, name: &str, prov: Prov) {
        self.bindings.push((name.to_string(), prov));
    }

    fn scan_block(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            self.scan_stmt(stmt);
        }
    }

    fn scan_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Assign {
                targets,
                value,
                augmented,
            } => {
                let prov = self.scan_expr(value);
                for target in targets {
                    match target {
                        Expr::Name { id, .. } => self.bind(id, prov.clone()),
                        Expr::Attribute { object, attr, line } => {
                            let base = self.scan_expr(object);
                            if *augmented {
                                self.attribute_access(base.clone(), attr, Access::Read, *line);
                            }
                            self.attribute_access(base, attr, Access::Write, *line);
                        }
                        other => {
                            self.scan_expr(other);
                        }
                    }
                }
            }
            Stmt::Expr(expr) => {
                self.scan_expr(expr);
            }
            Stmt::For {
                target,
                iter,
                body,
                orelse,
            } => {
                let prov = self.scan_expr(iter);
                if let Some(name) = target {
                    // Iterating a recordset yields records of the same model.
                    self.bind(name, prov);
                }
                self.scan_block(body);
                self.scan_block(orelse);
            }
            Stmt::If { test, body, orelse } => {
                self.scan_expr(test);
                self.scan_block(body);
                self.scan_block(orelse);
            }
            Stmt::While { test, body } => {
                self.scan_expr(test);
                self.scan_block(body);
            }
            Stmt::With { items, body } => {
                for item in items {
                    self.scan_expr(item);
                }
                self.scan_block(body);
            }
            Stmt::Return { value } => {
                if let Some(value) = value {
                    self.scan_expr(value);
                }
            }
            Stmt::Try {
                body,
                handlers,
                orelse,
                finalbody,
            } => {
                self.scan_block(body);
                for handler in handlers {
                    self.scan_block(handler);
                }
                self.scan_block(orelse);
                self.scan_block(finalbody);
            }
        }
    }

    /// Walk an expression, emitting references, and report what it holds
    fn scan_expr(&mut self, expr: &Expr) -> Prov {
        match expr {
            Expr::Name { id, .. } => self.lookup(id),
            Expr::Str { .. } | Expr::Literal { .. } => Prov::Scalar,
            Expr::Attribute { object, attr, line } => {
                let base = self.scan_expr(object);
                self.attribute_access(base, attr, Access::Read, *line)
            }
            Expr::Call {
                func,
                args,
                kwargs,
                line,
            } => self.scan_call(func, args, kwargs, *line),
            Expr::Subscript { object, index, .. } => {
                if let Some(model) = env_model(object, index) {
                    return Prov::Model(model);
                }
                let base = self.scan_expr(object);
                self.scan_expr(index);
                // Indexing a recordset yields a record of the same model.
                base
            }
            Expr::Lambda { params, body, .. } => {
                let depth = self.bindings.len();
                for param in params {
                    self.bind(param, Prov::Unknown);
                }
                self.scan_expr(body);
                self.bindings.truncate(depth);
                Prov::Scalar
            }
            Expr::Comprehension {
                element,
                target,
                iter,
                conditions,
                ..
            } => {
                let prov = self.scan_expr(iter);
                let depth = self.bindings.len();
                if let Some(name) = target {
                    self.bind(name, prov);
                }
                for condition in conditions {
                    self.scan_expr(condition);
                }
                let element_prov = self.scan_expr(element);
                self.bindings.truncate(depth);
                element_prov
            }
            Expr::Group { items, .. } => {
                // `a or b`, `a if c else b`: any recordset operand decides.
                let mut found = None;
                for item in items {
                    let prov = self.scan_expr(item);
                    if found.is_none() {
                        if let Prov::Model(_) = prov {
                            found = Some(prov);
                        }
                    }
                }
                found.unwrap_or(Prov::Scalar)
            }
        }
    }

    fn attribute_access(&mut self, base: Prov, attr: &str, access: Access, line: usize) -> Prov {
        match base {
            Prov::Model(model) => {
                if ATTR_SKIP.contains(&attr) {
                    return Prov::Unknown;
                }
                self.emit_known(&model, attr, access, line);
                match self.registry.field_comodel(&model, attr) {
                    Some(comodel) => Prov::Model(comodel.to_string()),
                    None => Prov::Scalar,
                }
            }
            Prov::Unknown => {
                if ATTR_SKIP.contains(&attr) || attr.starts_with("__") {
                    return Prov::Unknown;
                }
                if let Access::Call = access {
                    if METHOD_SKIP.contains(&attr) {
                        return Prov::Unknown;
                    }
                }
                self.emit_unknown(attr, access, line);
                Prov::Unknown
            }
            Prov::Scalar => Prov::Scalar,
        }
    }

    fn scan_call(
        &mut self,
        func: &Expr,
        args: &[Expr],
        kwargs: &[(String, Expr)],
        line: usize,
    ) -> Prov {
        let Expr::Attribute { object, attr, .. } = func else {
            self.scan_expr(func);
            self.scan_args(args, kwargs);
            return Prov::Unknown;
        };

        let base = if is_super_call(object) {
            Prov::Model(self.model.clone())
        } else {
            self.scan_expr(object)
        };

        match base {
            Prov::Model(model) => match attr.as_str() {
                "write" | "update" | "create" => {
                    for arg in args {
                        self.scan_expr(arg);
                        self.dict_key_writes(&model, arg);
                    }
                    self.scan_args(&[], kwargs);
                    Prov::Model(model)
                }
                "mapped" => {
                    if let Some(Expr::Str { value, .. }) = args.first() {
                        let location = self.location(line);
                        let landed = dotted_field_reads(
                            self.registry,
                            &model,
                            value,
                            UsageKind::FieldRead,
                            &location,
                            &mut self.usages,
                        );
                        return landed.map(Prov::Model).unwrap_or(Prov::Scalar);
                    }
                    self.scan_callable_args(&model, args, kwargs);
                    Prov::Unknown
                }
                "filtered" | "sorted" => {
                    if let Some(Expr::Str { value, .. }) = args.first() {
                        let location = self.location(line);
                        dotted_field_reads(
                            self.registry,
                            &model,
                            value,
                            UsageKind::FieldRead,
                            &location,
                            &mut self.usages,
                        );
                    }
                    self.scan_callable_args(&model, args, kwargs);
                    Prov::Model(model)
                }
                chained if CHAIN_METHODS.contains(&chained) => {
                    self.scan_args(args, kwargs);
                    Prov::Model(model)
                }
                skipped if METHOD_SKIP.contains(&skipped) => {
                    self.scan_args(args, kwargs);
                    Prov::Unknown
                }
                method => {
                    self.emit_known(&model, method, Access::Call, line);
                    self.scan_args(args, kwargs);
                    Prov::Unknown
                }
            },
            Prov::Unknown => {
                self.attribute_access(Prov::Unknown, attr, Access::Call, line);
                self.scan_args(args, kwargs);
                Prov::Unknown
            }
            Prov::Scalar => {
                self.scan_args(args, kwargs);
                Prov::Scalar
            }
        }
    }

    fn scan_args(&mut self, args: &[Expr], kwargs: &[(String, Expr)]) {
        for arg in args {
            self.scan_expr(arg);
        }
        for (_, value) in kwargs {
            self.scan_expr(value);
        }
    }

    /// Scan callback arguments to recordset combinators, binding the callback
    /// parameter to the receiver model.
    fn scan_callable_args(&mut self, model: &str, args: &[Expr], kwargs: &[(String, Expr)]) {
        let callback = |collector: &mut Self, expr: &Expr| match expr {
            Expr::Lambda { params, body, .. } => {
                let depth = collector.bindings.len();
                for (i, param) in params.iter().enumerate() {
                    let prov = if i == 0 {
                        Prov::Model(model.to_string())
                    } else {
                        Prov::Unknown
                    };
                    collector.bind(param, prov);
                }
                collector.scan_expr(body);
                collector.bindings.truncate(depth);
            }
            other => {
                collector.scan_expr(other);
            }
        };
        for arg in args {
            callback(self, arg);
        }
        for (_, value) in kwargs {
            callback(self, value);
        }
    }

    /// String keys of dict literals passed to write/create/update are field
    /// assignments on the receiver model.
    fn dict_key_writes(&mut self, model: &str, expr: &Expr) {
        let Expr::Group { items, .. } = expr else {
            return;
        };
        for item in items {
            match item {
                Expr::Group { items: pair, .. } if pair.len() == 2 => {
                    if let Expr::Str { value, line } = &pair[0] {
                        let (value, line) = (value.clone(), *line);
                        self.emit_known(model, &value, Access::Write, line);
                    } else {
                        self.dict_key_writes(model, item);
                    }
                }
                // create() also accepts a list of dicts
                nested @ Expr::Group { .. } => self.dict_key_writes(model, nested),
                _ => {}
            }
        }
    }
}

/// `self.env['model.name']` or `env['model.name']`
fn env_model(object: &Expr, index: &Expr) -> Option<String> {
    let is_env = match object {
        Expr::Attribute { attr, .. } => attr == "env",
        Expr::Name { id, .. } => id == "env",
        _ => false,
    };
    if !is_env {
        return None;
    }
    match index {
        Expr::Str { value, .. } => Some(value.clone()),
        _ => None,
    }
}

/// `super().method(...)` receivers resolve against the current model
fn is_super_call(object: &Expr) -> bool {
    matches!(
        object,
        Expr::Call { func, .. } if matches!(&**func, Expr::Name { id, .. } if id == "super")
    )
}
