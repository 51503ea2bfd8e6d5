//! AST node definitions for Locks.
//!
//! A program is a flat list of top-level statements — variable
//! declarations, function declarations, and ordinary statements all share
//! one namespace at the top level (`main`, in bytecode terms). There is no
//! module system, no types beyond the five runtime value kinds, and no
//! user-defined structures: this is a tiny C-like scripting language, not
//! a general-purpose one.

use lockc_util::Span;

pub type Program = Vec<Stmt>;

#[derive(Debug, Clone)]
pub enum Stmt {
    VarDecl { name: String, init: Option<Expr>, span: Span },
    FunDecl { name: String, params: Vec<String>, body: Vec<Stmt>, span: Span },
    Expr(Expr),
    Assign { target: AssignTarget, value: Expr, span: Span },
    Block(Vec<Stmt>, Span),
    If { cond: Expr, then_branch: Vec<Stmt>, else_branch: Option<Vec<Stmt>>, span: Span },
    While { cond: Expr, body: Vec<Stmt>, span: Span },
    Return { value: Option<Expr>, span: Span },
    Break(Span),
    Continue(Span),
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::VarDecl { span, .. }
            | Stmt::FunDecl { span, .. }
            | Stmt::Assign { span, .. }
            | Stmt::Block(_, span)
            | Stmt::If { span, .. }
            | Stmt::While { span, .. }
            | Stmt::Return { span, .. }
            | Stmt::Break(span)
            | Stmt::Continue(span) => *span,
            Stmt::Expr(e) => e.span(),
        }
    }
}

/// The left-hand side of an assignment statement: a bare name or one level
/// of array subscript (`a[i] = v`; `a[i][j] = v` assigns through a nested
/// index expression evaluated down to the innermost array).
#[derive(Debug, Clone)]
pub enum AssignTarget {
    Name(String),
    Index { target: Box<Expr>, index: Box<Expr> },
}

#[derive(Debug, Clone)]
pub enum Expr {
    Integer(i64, Span),
    Double(f64, String, Span),
    Str(String, Span),
    Bool(bool, Span),
    Nil(Span),
    Array(Vec<Expr>, Span),
    Identifier(String, Span),
    Unary { op: UnOp, expr: Box<Expr>, span: Span },
    Binary { op: BinOp, left: Box<Expr>, right: Box<Expr>, span: Span },
    Logical { op: LogicOp, left: Box<Expr>, right: Box<Expr>, span: Span },
    Index { target: Box<Expr>, index: Box<Expr>, span: Span },
    Call { callee: String, args: Vec<Expr>, span: Span },
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Integer(_, s)
            | Expr::Double(_, _, s)
            | Expr::Str(_, s)
            | Expr::Bool(_, s)
            | Expr::Nil(s)
            | Expr::Array(_, s)
            | Expr::Identifier(_, s)
            | Expr::Unary { span: s, .. }
            | Expr::Binary { span: s, .. }
            | Expr::Logical { span: s, .. }
            | Expr::Index { span: s, .. }
            | Expr::Call { span: s, .. } => *s,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Negate,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicOp {
    And,
    Or,
}
