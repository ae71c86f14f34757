//! Syntax tree of override scripts.

use serde::Serialize;

use crate::value::Value;

/// A parsed override script.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Script {
    /// Statements in source order.
    pub statements: Vec<Statement>,
}

/// One imported name of a `from ... import` statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportName {
    /// Name inside the module.
    pub name: String,
    /// Local binding, if renamed with `as`.
    pub alias: Option<String>,
}

/// A statement, tagged with its 1-based source line.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Statement {
    /// `import a.b` or `import a.b as c`.
    Import {
        /// Dotted module path.
        module: String,
        /// Local binding, if renamed with `as`.
        alias: Option<String>,
        /// Source line.
        line: usize,
    },
    /// `from a.b import C, D as E`.
    FromImport {
        /// Dotted module path.
        module: String,
        /// Imported names.
        names: Vec<ImportName>,
        /// Source line.
        line: usize,
    },
    /// `target = value`.
    Assign {
        /// Attribute or item being assigned.
        target: Expr,
        /// Assigned expression.
        value: Expr,
        /// Source line.
        line: usize,
    },
    /// A bare call, such as `config.c.retarget(Cls)`.
    Call {
        /// The call expression.
        expr: Expr,
        /// Source line.
        line: usize,
    },
}

impl Statement {
    /// Source line of the statement.
    #[must_use]
    pub const fn line(&self) -> usize {
        match self {
            Self::Import { line, .. }
            | Self::FromImport { line, .. }
            | Self::Assign { line, .. }
            | Self::Call { line, .. } => *line,
        }
    }
}

/// An expression.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
    /// A literal scalar: `None`, `True`, a number or a string.
    Literal(Value),
    /// A bare name.
    Name(String),
    /// `[a, b]`.
    List(Vec<Expr>),
    /// `(a, b)`.
    Tuple(Vec<Expr>),
    /// `{k: v}`.
    Dict(Vec<(Expr, Expr)>),
    /// `-x`.
    Neg(Box<Expr>),
    /// `value.name`.
    Attribute {
        /// The object.
        value: Box<Expr>,
        /// The attribute.
        name: String,
    },
    /// `value[index]`.
    Subscript {
        /// The container.
        value: Box<Expr>,
        /// The index or key.
        index: Box<Expr>,
    },
    /// `func(args, key=value)`.
    Call {
        /// The callee.
        func: Box<Expr>,
        /// Positional arguments.
        args: Vec<Expr>,
        /// Keyword arguments.
        kwargs: Vec<(String, Expr)>,
    },
}
