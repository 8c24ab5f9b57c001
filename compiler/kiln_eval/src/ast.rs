//! Constructed Kiln code.
//!
//! Global references hold the [`Glob`] they resolved to at construction
//! time, so a constructed call to `at_runtime::dispatch` owns the dispatch
//! function that was bound when the call was parsed.

use std::fmt;
use std::rc::Rc;

use kiln_ir::{Name, Span};

use crate::stash::Glob;

#[derive(Debug)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Expr { kind, span }
    }
}

#[derive(Debug)]
pub enum ExprKind {
    Nil,
    Bool(bool),
    Int(i64),
    Str(Name),
    List(Vec<Expr>),
    /// A lexical variable.
    Local(Name),
    /// A global, resolved while the unit was constructed.
    Global(Rc<Glob>),
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    /// `fn(params) { body }`, capturing the enclosing lexicals.
    Closure(Rc<FunctionDef>),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Mul,
    Div,
    Mod,
    Add,
    Sub,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Eq,
    NotEq,
    And,
    Or,
}

impl BinaryOp {
    pub fn as_symbol(self) -> &'static str {
        match self {
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_symbol())
    }
}

#[derive(Debug)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

impl Stmt {
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Stmt { kind, span }
    }
}

#[derive(Debug)]
pub enum StmtKind {
    Let { name: Name, value: Expr },
    AssignLocal { name: Name, value: Expr },
    AssignGlobal { glob: Rc<Glob>, value: Expr },
    Expr(Expr),
    Return(Option<Expr>),
    Block(Block),
    If {
        cond: Expr,
        then_branch: Block,
        else_branch: Option<Block>,
    },
    While { cond: Expr, body: Block },
}

/// A braced statement list, or a whole unit.
#[derive(Debug, Default)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

/// Body and parameters of a `sub` or `fn`.
#[derive(Debug)]
pub struct FunctionDef {
    /// `None` for closures.
    pub name: Option<Name>,
    pub params: Vec<Name>,
    pub body: Block,
    pub span: Span,
}
