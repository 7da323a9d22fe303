//! Typed intermediate representation consumed by the code generators.
//!
//! Built once by [`crate::lower`] and borrowed by the emitter; nothing here
//! is mutated after construction.

pub use crate::ast::{BinaryOp, LoopControl, UnaryOp};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Type {
    Undef,
    Integer,
    Fractional,
    String,
    Boolean,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub global: bool,
}

impl Variable {
    pub fn local(name: impl Into<String>) -> Self {
        Variable {
            name: name.into(),
            global: false,
        }
    }

    pub fn global(name: impl Into<String>) -> Self {
        Variable {
            name: name.into(),
            global: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Module {
    pub functions: Vec<Function>,
    pub globals: Vec<Assignment>,
    /// Name of the entry function, called once at the end of an executable.
    pub main: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: String,
    pub params: Vec<Variable>,
    pub body: Option<Block>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    pub stmts: Vec<Stmt>,
}

impl Block {
    pub fn new(stmts: Vec<Stmt>) -> Self {
        Block { stmts }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub var: Variable,
    pub value: Expr,
}

/// A condition and the block it guards.
#[derive(Debug, Clone, PartialEq)]
pub struct PredicatedBlock {
    pub cond: Expr,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Assign(Assignment),
    If {
        branch: PredicatedBlock,
        elifs: Vec<PredicatedBlock>,
        else_body: Option<Block>,
    },
    For {
        var: Variable,
        lower: Expr,
        /// Present for `lower .. upper` ranges; absent when iterating `lower`.
        upper: Option<Expr>,
        body: Block,
    },
    Return(Expr),
    LoopControl(LoopControl),
    Import(String),
    /// A call, external command or pipeline run for its side effect.
    Expr(Expr),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoOp {
    Pipe,
    Output,
    Input,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    pub args: Vec<Expr>,
}

impl FunctionCall {
    pub fn new(name: impl Into<String>, args: Vec<Expr>) -> Self {
        FunctionCall {
            name: name.into(),
            args,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    Text(String),
    Var(Variable),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct InterpolatedString {
    pub segments: Vec<Segment>,
}

impl InterpolatedString {
    pub fn new(segments: Vec<Segment>) -> Self {
        InterpolatedString { segments }
    }

    pub fn text(s: impl Into<String>) -> Self {
        InterpolatedString {
            segments: vec![Segment::Text(s.into())],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Call(FunctionCall),
    Extern(InterpolatedString),
    Io {
        op: IoOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Int(i64),
    Fractional(f64),
    Str(InterpolatedString),
    Bool(bool),
    Var(Variable),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub ty: Type,
}

impl Expr {
    pub fn new(kind: ExprKind, ty: Type) -> Self {
        Expr { kind, ty }
    }

    pub fn int(v: i64) -> Self {
        Expr::new(ExprKind::Int(v), Type::Integer)
    }

    pub fn fractional(v: f64) -> Self {
        Expr::new(ExprKind::Fractional(v), Type::Fractional)
    }

    pub fn boolean(v: bool) -> Self {
        Expr::new(ExprKind::Bool(v), Type::Boolean)
    }

    pub fn string(s: InterpolatedString) -> Self {
        Expr::new(ExprKind::Str(s), Type::String)
    }

    pub fn var(v: Variable, ty: Type) -> Self {
        Expr::new(ExprKind::Var(v), ty)
    }

    pub fn call(call: FunctionCall, ty: Type) -> Self {
        Expr::new(ExprKind::Call(call), ty)
    }

    pub fn external(body: InterpolatedString) -> Self {
        Expr::new(ExprKind::Extern(body), Type::String)
    }

    pub fn binary(op: BinaryOp, left: Expr, right: Expr, ty: Type) -> Self {
        Expr::new(
            ExprKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            ty,
        )
    }

    pub fn unary(op: UnaryOp, operand: Expr, ty: Type) -> Self {
        Expr::new(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            ty,
        )
    }

    pub fn io(op: IoOp, left: Expr, right: Expr) -> Self {
        Expr::new(
            ExprKind::Io {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            Type::String,
        )
    }

    /// True for `==`, `<`, `&&` and the other operators that test rather
    /// than compute.
    pub fn is_comparison(&self) -> bool {
        matches!(&self.kind, ExprKind::Binary { op, .. } if op.is_comparison())
    }
}
