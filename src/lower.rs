use crate::ast::{self, ExprKind, StmtKind, UnaryOp};
use crate::ir::{self, Type};
use crate::span::{Diagnostic, Span};
use crate::suggest::suggest;
use std::collections::HashMap;

const ENTRY: &str = "main";

#[derive(Clone, Debug, Default)]
pub struct LowerOptions {
    /// Libraries do not need an entry function.
    pub compile_as_library: bool,
}

#[derive(Debug)]
struct Signature {
    arity: usize,
    ret: Type,
}

struct LoweringContext<'p> {
    program: &'p ast::Program,
    /// File the code being lowered came from, for diagnostics.
    file: &'p str,
    signatures: HashMap<String, Signature>,
    globals: HashMap<String, Type>,
    /// `None` while lowering global initializers.
    locals: Option<HashMap<String, Type>>,
    loop_depth: usize,
    ret: Option<Type>,
}

impl<'p> LoweringContext<'p> {
    fn error(&self, msg: impl Into<String>, span: Span) -> Diagnostic {
        Diagnostic {
            msg: msg.into(),
            span,
            sm: self.program.source_maps.get(self.file).cloned(),
            file: Some(self.file.to_string()),
            help: None,
        }
    }

    fn lookup(&self, name: &str) -> Option<(ir::Variable, Type)> {
        if let Some(ty) = self.locals.as_ref().and_then(|l| l.get(name)) {
            return Some((ir::Variable::local(name), *ty));
        }
        self.globals
            .get(name)
            .map(|ty| (ir::Variable::global(name), *ty))
    }

    /// Resolves an assignment target: an existing local, then a global,
    /// otherwise a new local of the current function.
    fn bind(&mut self, name: &str, ty: Type) -> ir::Variable {
        if let Some(locals) = self.locals.as_mut() {
            if let Some(slot) = locals.get_mut(name) {
                *slot = ty;
                return ir::Variable::local(name);
            }
            if !self.globals.contains_key(name) {
                locals.insert(name.to_string(), ty);
                return ir::Variable::local(name);
            }
        }
        self.globals.insert(name.to_string(), ty);
        ir::Variable::global(name)
    }

    fn undefined_variable(&self, name: &str, span: Span) -> Diagnostic {
        let mut known: Vec<&str> = self.globals.keys().map(String::as_str).collect();
        if let Some(locals) = &self.locals {
            known.extend(locals.keys().map(String::as_str));
        }
        let err = self.error(format!("undefined variable '{}'", name), span);
        match suggest(name, known) {
            Some(s) => err.with_help(format!("did you mean '{}'?", s)),
            None => err,
        }
    }

    fn lower_block(&mut self, body: &[ast::Stmt]) -> Result<ir::Block, Diagnostic> {
        let stmts = body
            .iter()
            .map(|s| self.lower_stmt(s))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ir::Block::new(stmts))
    }

    fn lower_stmt(&mut self, stmt: &ast::Stmt) -> Result<ir::Stmt, Diagnostic> {
        match &stmt.node {
            StmtKind::Assign { name, value } => {
                let value = self.lower_expr(value)?;
                let var = self.bind(name, value.ty);
                Ok(ir::Stmt::Assign(ir::Assignment { var, value }))
            }
            StmtKind::If {
                cond,
                then_body,
                elifs,
                else_body,
            } => {
                let branch = ir::PredicatedBlock {
                    cond: self.lower_expr(cond)?,
                    body: self.lower_block(then_body)?,
                };
                let mut lowered_elifs = Vec::with_capacity(elifs.len());
                for elif in elifs {
                    lowered_elifs.push(ir::PredicatedBlock {
                        cond: self.lower_expr(&elif.cond)?,
                        body: self.lower_block(&elif.body)?,
                    });
                }
                let else_body = match else_body {
                    Some(b) => Some(self.lower_block(b)?),
                    None => None,
                };
                Ok(ir::Stmt::If {
                    branch,
                    elifs: lowered_elifs,
                    else_body,
                })
            }
            StmtKind::For {
                var,
                lower,
                upper,
                body,
            } => {
                let lower = self.lower_expr(lower)?;
                let upper = match upper {
                    Some(u) => Some(self.lower_expr(u)?),
                    None => None,
                };
                let item_ty = if upper.is_some() { Type::Integer } else { Type::String };
                let var = self.bind(var, item_ty);
                self.loop_depth += 1;
                let body = self.lower_block(body);
                self.loop_depth -= 1;
                Ok(ir::Stmt::For {
                    var,
                    lower,
                    upper,
                    body: body?,
                })
            }
            StmtKind::Return(value) => {
                let value = self.lower_expr(value)?;
                if matches!(self.ret, None | Some(Type::Undef)) {
                    self.ret = Some(value.ty);
                }
                Ok(ir::Stmt::Return(value))
            }
            StmtKind::LoopControl(ctl) => {
                if self.loop_depth == 0 {
                    let word = match ctl {
                        ast::LoopControl::Break => "break",
                        ast::LoopControl::Continue => "continue",
                    };
                    return Err(self.error(format!("'{}' outside of a loop", word), stmt.span));
                }
                Ok(ir::Stmt::LoopControl(*ctl))
            }
            StmtKind::Import(module) => Ok(ir::Stmt::Import(module.clone())),
            StmtKind::Expr(e) => {
                if !matches!(e.node, ExprKind::Call { .. } | ExprKind::Extern(_) | ExprKind::Pipe(..)) {
                    return Err(self
                        .error("expression result is unused", e.span)
                        .with_help("only calls, external commands and pipelines can be used as statements"));
                }
                Ok(ir::Stmt::Expr(self.lower_expr(e)?))
            }
        }
    }

    fn lower_segments(&self, segments: &[ast::Segment]) -> ir::InterpolatedString {
        let mut out: Vec<ir::Segment> = Vec::with_capacity(segments.len());
        for seg in segments {
            // `$HOME` and friends are left for the shell to expand.
            let lowered = match seg {
                ast::Segment::Text(t) => ir::Segment::Text(t.clone()),
                ast::Segment::Var { name, raw, .. } => match self.lookup(name) {
                    Some((var, _)) => ir::Segment::Var(var),
                    None => ir::Segment::Text(raw.clone()),
                },
            };
            if let (Some(ir::Segment::Text(prev)), ir::Segment::Text(t)) = (out.last_mut(), &lowered) {
                prev.push_str(t);
                continue;
            }
            out.push(lowered);
        }
        ir::InterpolatedString::new(out)
    }

    fn lower_expr(&mut self, e: &ast::Expr) -> Result<ir::Expr, Diagnostic> {
        let lowered = match &e.node {
            ExprKind::Int(v) => ir::Expr::int(*v),
            ExprKind::Fractional(v) => ir::Expr::fractional(*v),
            ExprKind::Bool(b) => ir::Expr::boolean(*b),
            ExprKind::Str(segments) => ir::Expr::string(self.lower_segments(segments)),
            ExprKind::Extern(segments) => ir::Expr::external(self.lower_segments(segments)),
            ExprKind::Var(name) => match self.lookup(name) {
                Some((var, ty)) => ir::Expr::var(var, ty),
                None => return Err(self.undefined_variable(name, e.span)),
            },
            ExprKind::Binary { op, left, right } => {
                let left = self.lower_expr(left)?;
                let right = self.lower_expr(right)?;
                let ty = if op.is_comparison() {
                    Type::Boolean
                } else if left.ty == Type::Fractional || right.ty == Type::Fractional {
                    Type::Fractional
                } else {
                    Type::Integer
                };
                ir::Expr::binary(*op, left, right, ty)
            }
            ExprKind::Unary { op, expr } => {
                let operand = self.lower_expr(expr)?;
                match (op, operand.kind) {
                    (UnaryOp::Negate, ir::ExprKind::Int(v)) => ir::Expr::int(v.wrapping_neg()),
                    (UnaryOp::Negate, ir::ExprKind::Fractional(v)) => ir::Expr::fractional(-v),
                    (op, kind) => {
                        let operand = ir::Expr::new(kind, operand.ty);
                        let ty = match op {
                            UnaryOp::Not => Type::Boolean,
                            UnaryOp::Negate if operand.ty == Type::Undef => Type::Integer,
                            UnaryOp::Negate => operand.ty,
                        };
                        ir::Expr::unary(*op, operand, ty)
                    }
                }
            }
            ExprKind::Call { name, args } => {
                let Some(sig) = self.signatures.get(name) else {
                    let err = self.error(format!("undefined function '{}'", name), e.span);
                    let known = self.signatures.keys().map(String::as_str);
                    return Err(match suggest(name, known) {
                        Some(s) => err.with_help(format!("did you mean '{}'?", s)),
                        None => err.with_help("use @( ... ) to run an external command"),
                    });
                };
                if sig.arity != args.len() {
                    return Err(self.error(
                        format!(
                            "function '{}' expects {} argument{}, got {}",
                            name,
                            sig.arity,
                            if sig.arity == 1 { "" } else { "s" },
                            args.len()
                        ),
                        e.span,
                    ));
                }
                let ret = sig.ret;
                let args = args
                    .iter()
                    .map(|a| self.lower_expr(a))
                    .collect::<Result<Vec<_>, _>>()?;
                ir::Expr::call(ir::FunctionCall::new(name.as_str(), args), ret)
            }
            ExprKind::Pipe(left, right) => {
                let left = self.lower_expr(left)?;
                let right = self.lower_expr(right)?;
                ir::Expr::io(ir::IoOp::Pipe, left, right)
            }
        };
        Ok(lowered)
    }
}

/// Lower a whole program with default options.
pub fn lower(p: &ast::Program) -> Result<ir::Module, Diagnostic> {
    lower_with_options(p, &LowerOptions::default())
}

/// Resolves names, splits global initializers from the entry body and
/// infers expression types.
///
/// Top-level assignments name globals. The leading run of them is emitted
/// before the entry call; every other loose top-level statement becomes the
/// body of a synthesized `main`. A user-written `main` is the entry only when
/// there are no loose statements.
pub fn lower_with_options(p: &ast::Program, opts: &LowerOptions) -> Result<ir::Module, Diagnostic> {
    let mut ctx = LoweringContext {
        program: p,
        file: &p.entry_file,
        signatures: HashMap::new(),
        globals: HashMap::new(),
        locals: None,
        loop_depth: 0,
        ret: None,
    };

    let mut hoisted = Vec::new();
    let mut entry_body = Vec::new();
    let mut in_prefix = true;
    for t in &p.top_level {
        match &t.stmt.node {
            StmtKind::Assign { name, .. } => {
                ctx.globals.insert(name.clone(), Type::Undef);
                if in_prefix {
                    hoisted.push(t);
                } else {
                    entry_body.push(t);
                }
            }
            StmtKind::Import(_) => entry_body.push(t),
            _ => {
                in_prefix = false;
                entry_body.push(t);
            }
        }
    }

    for f in &p.functions {
        if ctx.signatures.contains_key(&f.name) {
            ctx.file = f.file.as_str();
            return Err(ctx.error(format!("function '{}' is defined more than once", f.name), f.span));
        }
        ctx.signatures.insert(
            f.name.clone(),
            Signature {
                arity: f.params.len(),
                ret: Type::Undef,
            },
        );
    }

    let loose = entry_body
        .iter()
        .any(|t| !matches!(t.stmt.node, StmtKind::Import(_)));
    let user_main = p.functions.iter().find(|f| f.name == ENTRY);
    if loose {
        if let Some(f) = user_main {
            ctx.file = f.file.as_str();
            return Err(ctx
                .error("'main' cannot be defined alongside top-level statements", f.span)
                .with_help("move the top-level statements into main()"));
        }
    }
    let synthesize = loose || (user_main.is_none() && !opts.compile_as_library);

    let mut globals = Vec::with_capacity(hoisted.len());
    for t in hoisted {
        let StmtKind::Assign { name, value } = &t.stmt.node else {
            continue;
        };
        ctx.file = t.file.as_str();
        let value = ctx.lower_expr(value)?;
        ctx.globals.insert(name.clone(), value.ty);
        globals.push(ir::Assignment {
            var: ir::Variable::global(name.as_str()),
            value,
        });
    }

    let mut functions = Vec::with_capacity(p.functions.len() + 1);
    for f in &p.functions {
        ctx.file = f.file.as_str();
        let params: Vec<ir::Variable> = f.params.iter().map(|p| ir::Variable::local(p.node.as_str())).collect();
        let body = match &f.body {
            Some(body) => {
                ctx.locals = Some(f.params.iter().map(|p| (p.node.clone(), Type::Undef)).collect());
                ctx.loop_depth = 0;
                ctx.ret = None;
                let block = ctx.lower_block(body)?;
                if let (Some(sig), Some(ret)) = (ctx.signatures.get_mut(&f.name), ctx.ret) {
                    sig.ret = ret;
                }
                Some(block)
            }
            None => None,
        };
        tracing::trace!(function = %f.name, has_body = body.is_some(), "lowered function");
        functions.push(ir::Function {
            name: f.name.clone(),
            params,
            body,
        });
    }

    let main = if synthesize {
        ctx.locals = Some(HashMap::new());
        ctx.loop_depth = 0;
        ctx.ret = None;
        let mut stmts = Vec::with_capacity(entry_body.len());
        for t in entry_body {
            ctx.file = t.file.as_str();
            stmts.push(ctx.lower_stmt(&t.stmt)?);
        }
        functions.push(ir::Function {
            name: ENTRY.to_string(),
            params: Vec::new(),
            body: Some(ir::Block::new(stmts)),
        });
        Some(ENTRY.to_string())
    } else {
        user_main.filter(|f| f.body.is_some()).map(|f| f.name.clone())
    };

    tracing::debug!(
        functions = functions.len(),
        globals = globals.len(),
        entry = main.as_deref().unwrap_or("<none>"),
        "lowered program"
    );

    Ok(ir::Module {
        functions,
        globals,
        main,
    })
}
