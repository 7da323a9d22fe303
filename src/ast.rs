use crate::span::{SourceMap, Span};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }
}

pub type Expr = Spanned<ExprKind>;
pub type Stmt = Spanned<StmtKind>;

#[derive(Debug, PartialEq)]
pub struct Program {
    pub functions: Vec<Function>,
    pub top_level: Vec<TopLevel>,
    pub span: Span,
    pub source_maps: HashMap<String, SourceMap>,
    pub entry_file: String,
}

/// A statement written outside any `def`, tagged with the file it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct TopLevel {
    pub stmt: Stmt,
    pub file: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: String,
    pub params: Vec<Spanned<String>>,
    /// `None` for a bare declaration such as `def f(a);`.
    pub body: Option<Vec<Stmt>>,
    pub span: Span,
    pub file: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Eq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl BinaryOp {
    /// Operators whose result is a truth value rather than a number.
    pub fn is_comparison(self) -> bool {
        !self.is_arithmetic()
    }

    pub fn is_arithmetic(self) -> bool {
        matches!(self, BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod)
    }

    pub fn is_equality(self) -> bool {
        matches!(self, BinaryOp::Eq | BinaryOp::NotEq)
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Negate,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    Break,
    Continue,
}

/// One piece of a string literal or `@(...)` body before name resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    Text(String),
    /// `$name` or `${name}`; `raw` is the text as written.
    Var { name: String, raw: String, span: Span },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Int(i64),
    Fractional(f64),
    Str(Vec<Segment>),
    Bool(bool),
    Var(String),
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        expr: Box<Expr>,
    },
    Call {
        name: String,
        args: Vec<Expr>,
    },
    Extern(Vec<Segment>),
    Pipe(Box<Expr>, Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Elif {
    pub cond: Expr,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    Assign {
        name: String,
        value: Expr,
    },
    If {
        cond: Expr,
        then_body: Vec<Stmt>,
        elifs: Vec<Elif>,
        else_body: Option<Vec<Stmt>>,
    },
    For {
        var: String,
        lower: Expr,
        upper: Option<Expr>,
        body: Vec<Stmt>,
    },
    Return(Expr),
    LoopControl(LoopControl),
    Import(String),
    Expr(Expr),
}

impl Program {
    /// Zeroes every span so debug dumps do not depend on source layout.
    pub fn strip_spans(&mut self) {
        self.span = Span::default();
        for f in &mut self.functions {
            f.span = Span::default();
            for p in &mut f.params {
                p.span = Span::default();
            }
            if let Some(body) = &mut f.body {
                strip_block(body);
            }
        }
        for t in &mut self.top_level {
            strip_stmt(&mut t.stmt);
        }
    }
}

fn strip_block(body: &mut [Stmt]) {
    for s in body {
        strip_stmt(s);
    }
}

fn strip_stmt(s: &mut Stmt) {
    s.span = Span::default();
    match &mut s.node {
        StmtKind::Assign { value, .. } => strip_expr(value),
        StmtKind::If { cond, then_body, elifs, else_body } => {
            strip_expr(cond);
            strip_block(then_body);
            for e in elifs {
                strip_expr(&mut e.cond);
                strip_block(&mut e.body);
            }
            if let Some(b) = else_body {
                strip_block(b);
            }
        }
        StmtKind::For { lower, upper, body, .. } => {
            strip_expr(lower);
            if let Some(u) = upper {
                strip_expr(u);
            }
            strip_block(body);
        }
        StmtKind::Return(e) | StmtKind::Expr(e) => strip_expr(e),
        StmtKind::LoopControl(_) | StmtKind::Import(_) => {}
    }
}

fn strip_segments(segments: &mut [Segment]) {
    for seg in segments {
        if let Segment::Var { span, .. } = seg {
            *span = Span::default();
        }
    }
}

fn strip_expr(e: &mut Expr) {
    e.span = Span::default();
    match &mut e.node {
        ExprKind::Str(segs) | ExprKind::Extern(segs) => strip_segments(segs),
        ExprKind::Binary { left, right, .. } | ExprKind::Pipe(left, right) => {
            strip_expr(left);
            strip_expr(right);
        }
        ExprKind::Unary { expr, .. } => strip_expr(expr),
        ExprKind::Call { args, .. } => {
            for a in args {
                strip_expr(a);
            }
        }
        ExprKind::Int(_) | ExprKind::Fractional(_) | ExprKind::Bool(_) | ExprKind::Var(_) => {}
    }
}
