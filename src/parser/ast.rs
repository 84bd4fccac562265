//! Owned syntax trees handed from the parsing front-ends to the extractors.
//!
//! Method bodies are lowered from the concrete Python parse tree into a small
//! expression/statement tree that keeps only what reference extraction needs;
//! descriptor trees keep the XML element structure of a record.

use crate::graph::Location;

/// A lowered Python expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Bare identifier
    Name { id: String, line: usize },

    /// `object.attr`
    Attribute {
        object: Box<Expr>,
        attr: String,
        line: usize,
    },

    /// `func(args...)`
    Call {
        func: Box<Expr>,
        args: Vec<Expr>,
        kwargs: Vec<(String, Expr)>,
        line: usize,
    },

    /// `object[index]`
    Subscript {
        object: Box<Expr>,
        index: Box<Expr>,
        line: usize,
    },

    /// String literal
    Str { value: String, line: usize },

    /// `lambda params: body`
    Lambda {
        params: Vec<String>,
        body: Box<Expr>,
        line: usize,
    },

    /// List/set/generator comprehension, flattened to one clause
    Comprehension {
        element: Box<Expr>,
        target: Option<String>,
        iter: Box<Expr>,
        conditions: Vec<Expr>,
        line: usize,
    },

    /// Any compound expression whose own shape does not matter for extraction
    /// (binary/boolean operators, comparisons, collections, conditionals);
    /// children are still walked.
    Group { items: Vec<Expr>, line: usize },

    /// Numbers, booleans, None and anything else inert
    Literal { line: usize },
}

impl Expr {
    pub fn line(&self) -> usize {
        match self {
            Expr::Name { line, .. }
            | Expr::Attribute { line, .. }
            | Expr::Call { line, .. }
            | Expr::Subscript { line, .. }
            | Expr::Str { line, .. }
            | Expr::Lambda { line, .. }
            | Expr::Comprehension { line, .. }
            | Expr::Group { line, .. }
            | Expr::Literal { line } => *line,
        }
    }
}

/// A lowered Python statement
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `targets = value` (also augmented assignment, which reads and writes)
    Assign {
        targets: Vec<Expr>,
        value: Expr,
        augmented: bool,
    },

    /// Bare expression statement
    Expr(Expr),

    /// `for target in iter: body else: orelse`
    For {
        target: Option<String>,
        iter: Expr,
        body: Vec<Stmt>,
        orelse: Vec<Stmt>,
    },

    /// `if test: body else: orelse` (elif chains flattened into orelse)
    If {
        test: Expr,
        body: Vec<Stmt>,
        orelse: Vec<Stmt>,
    },

    /// `while test: body`
    While { test: Expr, body: Vec<Stmt> },

    /// `with items: body`
    With { items: Vec<Expr>, body: Vec<Stmt> },

    /// `return value`
    Return { value: Option<Expr> },

    /// `try: body except: handlers else: orelse finally: finalbody`
    Try {
        body: Vec<Stmt>,
        handlers: Vec<Vec<Stmt>>,
        orelse: Vec<Stmt>,
        finalbody: Vec<Stmt>,
    },
}

/// A decorator argument that matters for extraction
#[derive(Debug, Clone, PartialEq)]
pub enum DecoratorArg {
    /// String argument, e.g. a dotted field path in `@api.depends('a.b')`
    Str(String),
    /// Bare name argument, e.g. a method reference
    Name(String),
}

/// A decorator on a method definition
#[derive(Debug, Clone, PartialEq)]
pub struct Decorator {
    /// Trailing name of the decorator (`depends` for `@api.depends(...)`)
    pub name: String,
    pub args: Vec<DecoratorArg>,
}

/// One parsed method body, tagged with its owning model.
///
/// Bodies are extracted for every method, including framework hooks that are
/// not dead-code candidates themselves; their references still count.
#[derive(Debug, Clone)]
pub struct MethodBody {
    pub model: String,
    pub method: String,
    pub decorators: Vec<Decorator>,
    pub body: Vec<Stmt>,
    pub location: Location,
}

/// Kind of declarative descriptor record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorKind {
    /// `ir.ui.view`
    View,
    /// `ir.actions.server`
    ServerAction,
    /// `ir.cron`
    Cron,
}

/// One element of a descriptor tree
#[derive(Debug, Clone, Default)]
pub struct DescriptorNode {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<DescriptorNode>,
    pub text: String,
    pub line: usize,
}

impl DescriptorNode {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// An embedded Python snippet and the line its element starts on
#[derive(Debug, Clone)]
pub struct Snippet {
    pub source: String,
    pub line: usize,
}

/// A parsed descriptor record, tagged with its bound model (or none)
#[derive(Debug, Clone)]
pub struct Descriptor {
    pub kind: DescriptorKind,
    /// Bound model name; descriptors without a resolvable model are skipped
    pub model: Option<String>,
    /// View architecture subtree (views only)
    pub arch: Option<DescriptorNode>,
    /// Embedded Python snippet (server actions and cron only)
    pub code: Option<Snippet>,
    pub location: Location,
}
