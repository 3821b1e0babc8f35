//! AST node types for the binding expression language.
//!
//! The parser turns an expression string into an [`Expr`] tree; the
//! evaluator walks that tree against a scope. Nothing here executes code,
//! which keeps expressions confined to what the grammar can express.
use serde_json::Value;

// ─── Operators ────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
    Plus,
    TypeOf,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    StrictEq,
    StrictNe,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
    Nullish,
}

// ─── Expressions ──────────────────────────────────────────────────────────────

/// A parsed expression.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// `null`, booleans, numbers and strings.
    Literal(Value),
    Undefined,
    Ident(String),
    Array(Vec<Expr>),
    /// `object.name` / `object?.name`
    Member {
        object: Box<Expr>,
        property: String,
        optional: bool,
    },
    /// `object[index]` / `object?.[index]`
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
        optional: bool,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    /// Single-parameter arrow function. Only valid as a call argument.
    Lambda {
        param: String,
        body: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Logical {
        op: LogicalOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Conditional {
        test: Box<Expr>,
        consequent: Box<Expr>,
        alternate: Box<Expr>,
    },
}

impl Expr {
    /// Dotted name for a plain member chain (`Math.max`, `user.name`).
    /// Returns `None` for anything involving calls or computed access.
    pub fn dotted_name(&self) -> Option<String> {
        match self {
            Expr::Ident(name) => Some(name.clone()),
            Expr::Member {
                object, property, ..
            } => object.dotted_name().map(|base| format!("{}.{}", base, property)),
            _ => None,
        }
    }
}
