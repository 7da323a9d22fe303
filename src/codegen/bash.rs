use super::context::{EmitState, Flags};
use super::{CodeGenerator, shebang};
use crate::error::CompileError;
use crate::ir::*;
use crate::target::TargetShell;

/// Single-pass bash emitter. One instance per compilation; the output
/// buffer is only handed back once the whole module has been visited.
pub struct BashEmitter {
    out: String,
    flags: Flags,
    /// Parameters of the function whose body block is about to be visited.
    pending_args: Option<Vec<String>>,
    compile_as_library: bool,
}

type EmitResult = Result<(), CompileError>;

impl EmitState for BashEmitter {
    fn flags(&self) -> &Flags {
        &self.flags
    }

    fn flags_mut(&mut self) -> &mut Flags {
        &mut self.flags
    }
}

impl CodeGenerator for BashEmitter {
    fn target(&self) -> TargetShell {
        TargetShell::Bash
    }

    fn generate(&mut self, module: &Module) -> Result<String, CompileError> {
        self.out.clear();
        self.flags = Flags::default();
        self.pending_args = None;

        tracing::debug!(
            functions = module.functions.len(),
            globals = module.globals.len(),
            library = self.compile_as_library,
            "emitting bash"
        );

        self.out.push_str(shebang(TargetShell::Bash));
        self.out.push('\n');
        if let Err(e) = self.visit_module(module) {
            self.out.clear();
            return Err(e.with_target(TargetShell::Bash));
        }
        Ok(std::mem::take(&mut self.out))
    }
}

impl BashEmitter {
    pub fn new(compile_as_library: bool) -> Self {
        BashEmitter {
            out: String::new(),
            flags: Flags::default(),
            pending_args: None,
            compile_as_library,
        }
    }

    fn write_indent(&mut self) {
        for _ in 0..self.flags.indent {
            self.out.push_str("    ");
        }
    }

    fn visit_module(&mut self, module: &Module) -> EmitResult {
        for f in &module.functions {
            self.visit_function(f)?;
        }
        for g in &module.globals {
            self.visit_assignment(g)?;
            self.out.push_str(";\n");
        }
        if self.compile_as_library {
            return Ok(());
        }

        let Some(main) = &module.main else {
            return Err(CompileError::malformed("executable module has no entry function"));
        };
        if !module.functions.iter().any(|f| &f.name == main && f.body.is_some()) {
            return Err(CompileError::malformed(format!(
                "entry function '{}' is not defined in the module",
                main
            )));
        }
        let entry = FunctionCall::new(main.as_str(), Vec::new());
        self.visit_call(&entry)?;
        self.out.push_str(";\n");
        Ok(())
    }

    fn visit_function(&mut self, f: &Function) -> EmitResult {
        let Some(body) = &f.body else {
            return Ok(());
        };
        tracing::trace!(function = %f.name, params = f.params.len(), "emitting function");
        self.out.push_str(&format!("function {} () ", f.name));
        self.pending_args = Some(f.params.iter().map(|p| p.name.clone()).collect());
        self.visit_block(body)
    }

    fn visit_block(&mut self, block: &Block) -> EmitResult {
        let braces = self.flags.block_braces;
        if braces {
            self.out.push_str("{\n");
        }
        let args = self.pending_args.take();
        {
            let mut inner = self.indented();
            for (i, name) in args.iter().flatten().enumerate() {
                inner.write_indent();
                inner.out.push_str(&format!("local {}=\"${}\";\n", name, i + 1));
            }

            let mut emitted = 0;
            for stmt in &block.stmts {
                if matches!(stmt, Stmt::Import(_)) {
                    continue;
                }
                inner.write_indent();
                inner.visit_stmt(stmt)?;
                inner.out.push_str(";\n");
                emitted += 1;
            }
            // bash rejects a function or branch with no commands.
            if emitted == 0 {
                inner.write_indent();
                inner.out.push_str(": # Empty function\n");
            }
        }
        if braces {
            self.out.push_str("}\n\n");
        }
        Ok(())
    }

    fn visit_stmt(&mut self, stmt: &Stmt) -> EmitResult {
        match stmt {
            Stmt::Assign(a) => self.visit_assignment(a),
            Stmt::If {
                branch,
                elifs,
                else_body,
            } => self.visit_if(branch, elifs, else_body.as_ref()),
            Stmt::For {
                var,
                lower,
                upper,
                body,
            } => self.visit_for(var, lower, upper.as_ref(), body),
            Stmt::Return(value) => {
                // Quote external output so multi-word results survive `echo`.
                let external = matches!(value.kind, ExprKind::Extern(_));
                self.out.push_str("echo ");
                if external {
                    self.out.push('"');
                }
                self.call_wrap(true).visit_expr(value)?;
                if external {
                    self.out.push('"');
                }
                self.out.push_str("; exit");
                Ok(())
            }
            Stmt::LoopControl(LoopControl::Break) => {
                self.out.push_str("break");
                Ok(())
            }
            Stmt::LoopControl(LoopControl::Continue) => {
                self.out.push_str("continue");
                Ok(())
            }
            Stmt::Import(_) => Ok(()),
            Stmt::Expr(e) => match &e.kind {
                ExprKind::Io { op, left, right } => {
                    let token = redirection_token(*op)?;
                    let mut bare = self.call_wrap(false);
                    bare.visit_expr(left)?;
                    bare.out.push_str(&format!(" {} ", token));
                    bare.visit_expr(right)
                }
                _ => self.visit_expr(e),
            },
        }
    }

    fn visit_assignment(&mut self, a: &Assignment) -> EmitResult {
        if !a.var.global {
            self.out.push_str("local ");
        }
        self.out.push_str(&a.var.name);
        self.out.push('=');
        self.call_wrap(true).visit_expr(&a.value)
    }

    /// Writes the test between `[[ ` and ` ]]`. Comparisons are already
    /// predicates; anything else holds `0`/`1` text and needs ` -eq 1`.
    fn visit_condition(&mut self, cond: &Expr) -> EmitResult {
        if cond.is_comparison() {
            self.call_wrap(true).comparison_wrap(false).visit_expr(cond)
        } else {
            self.call_wrap(true).visit_expr(cond)?;
            self.out.push_str(" -eq 1");
            Ok(())
        }
    }

    fn visit_if(
        &mut self,
        branch: &PredicatedBlock,
        elifs: &[PredicatedBlock],
        else_body: Option<&Block>,
    ) -> EmitResult {
        self.out.push_str("if [[ ");
        self.visit_condition(&branch.cond)?;
        self.out.push_str(" ]]; then\n");

        {
            let mut body = self.block_braces(false);
            body.visit_block(&branch.body)?;
            for elif in elifs {
                body.write_indent();
                body.out.push_str("elif [[ ");
                body.visit_condition(&elif.cond)?;
                body.out.push_str(" ]]; then\n");
                body.visit_block(&elif.body)?;
            }
            if let Some(else_body) = else_body {
                body.write_indent();
                body.out.push_str("else\n");
                body.visit_block(else_body)?;
            }
        }

        self.write_indent();
        self.out.push_str("fi");
        Ok(())
    }

    fn visit_for(&mut self, var: &Variable, lower: &Expr, upper: Option<&Expr>, body: &Block) -> EmitResult {
        self.out.push_str(&format!("for {} in ", var.name));
        match upper {
            Some(upper) => {
                self.out.push_str("$(seq ");
                let mut bounds = self.call_wrap(true);
                bounds.visit_expr(lower)?;
                bounds.out.push(' ');
                bounds.visit_expr(upper)?;
                bounds.out.push(')');
            }
            // Unquoted so the value is word-split into items.
            None => self.call_wrap(true).quoting(false).visit_expr(lower)?,
        }
        self.out.push_str("; do\n");
        self.block_braces(false).visit_block(body)?;
        self.write_indent();
        self.out.push_str("done");
        Ok(())
    }

    fn visit_expr(&mut self, e: &Expr) -> EmitResult {
        match &e.kind {
            ExprKind::Binary { op, left, right } => self.visit_binary(*op, left, right),
            ExprKind::Unary { op, operand } => self.visit_unary(*op, operand),
            ExprKind::Call(call) => self.visit_call(call),
            ExprKind::Extern(body) => {
                let wrap = self.flags.functioncall_wrap;
                if wrap {
                    self.out.push_str("$(");
                }
                self.quoting(false).visit_interpolated(body);
                if wrap {
                    self.out.push(')');
                }
                Ok(())
            }
            ExprKind::Io { op, left, right } => {
                let token = redirection_token(*op)?;
                self.out.push_str("$(");
                {
                    let mut inner = self.call_wrap(false);
                    inner.visit_expr(left)?;
                    inner.out.push_str(&format!(" {} ", token));
                    inner.visit_expr(right)?;
                }
                self.out.push(')');
                Ok(())
            }
            ExprKind::Int(v) => {
                self.out.push_str(&v.to_string());
                Ok(())
            }
            ExprKind::Fractional(v) => {
                self.out.push_str(&fractional_text(*v));
                Ok(())
            }
            ExprKind::Str(s) => {
                self.out.push('"');
                self.quoting(false).visit_interpolated(s);
                self.out.push('"');
                Ok(())
            }
            ExprKind::Bool(b) => {
                self.out.push_str(if *b { "1" } else { "0" });
                Ok(())
            }
            ExprKind::Var(v) => {
                self.visit_variable(v, false);
                Ok(())
            }
        }
    }

    fn visit_variable(&mut self, v: &Variable, braced: bool) {
        let quote = self.flags.quote_variable;
        if quote {
            self.out.push('"');
        }
        if braced {
            self.out.push_str(&format!("${{{}}}", v.name));
        } else {
            self.out.push_str(&format!("${}", v.name));
        }
        if quote {
            self.out.push('"');
        }
    }

    fn visit_interpolated(&mut self, s: &InterpolatedString) {
        for (i, seg) in s.segments.iter().enumerate() {
            match seg {
                Segment::Text(text) => self.out.push_str(text),
                Segment::Var(v) => {
                    // `${a}b` must not collapse into `$ab`.
                    let braced = matches!(
                        s.segments.get(i + 1),
                        Some(Segment::Text(next)) if next.starts_with(|c: char| c.is_ascii_alphanumeric() || c == '_')
                    );
                    self.visit_variable(v, braced);
                }
            }
        }
    }

    fn visit_binary(&mut self, op: BinaryOp, left: &Expr, right: &Expr) -> EmitResult {
        let string = string_operands(op, left, right);
        let token = binary_token(op, string);
        // `[[ ]]` has no string `<=`/`>=`; test the opposite and negate.
        let negated = string && matches!(op, BinaryOp::Le | BinaryOp::Ge);
        let arithmetic = op.is_arithmetic();
        let wrap = op.is_comparison() && self.flags.comparison_wrap;

        if wrap {
            self.out.push_str("$([[ ");
        }
        if arithmetic {
            self.out.push_str("$((");
        }
        if negated {
            self.out.push_str("! ");
        }
        {
            // Operands of `&&`/`||` share the enclosing `[[ ]]`; everywhere
            // else a nested comparison has to become a 0/1 value.
            let mut inner = self.scoped(|f| {
                f.comparison_wrap = !op.is_logical();
                f.quote_variable = string && !arithmetic;
            });
            inner.visit_operand(op, left)?;
            inner.out.push_str(&format!(" {} ", token));
            inner.visit_operand(op, right)?;
        }
        if arithmetic {
            self.out.push_str("))");
        }
        if wrap {
            self.out.push_str(" ]] && echo 1 || echo 0)");
        }
        Ok(())
    }

    fn visit_operand(&mut self, op: BinaryOp, operand: &Expr) -> EmitResult {
        if !op.is_logical() {
            return self.visit_expr(operand);
        }
        let nested_logical = matches!(&operand.kind, ExprKind::Binary { op, .. } if op.is_logical());
        if nested_logical {
            self.out.push_str("( ");
            self.visit_expr(operand)?;
            self.out.push_str(" )");
        } else {
            self.visit_expr(operand)?;
            if !operand.is_comparison() {
                self.out.push_str(" -eq 1");
            }
        }
        Ok(())
    }

    fn visit_unary(&mut self, op: UnaryOp, operand: &Expr) -> EmitResult {
        match op {
            UnaryOp::Negate => match operand.kind {
                ExprKind::Int(_) | ExprKind::Fractional(_) => {
                    self.out.push('-');
                    self.visit_expr(operand)
                }
                // Parenthesized so a negative value does not read as `--`.
                _ => {
                    self.out.push_str("$((-(");
                    self.quoting(false).call_wrap(true).visit_expr(operand)?;
                    self.out.push_str(")))");
                    Ok(())
                }
            },
            UnaryOp::Not => {
                self.out.push_str("$(! [[ ");
                self.comparison_wrap(false).visit_expr(operand)?;
                if !operand.is_comparison() {
                    self.out.push_str(" -eq 1");
                }
                self.out.push_str(" ]] && echo 1 || echo 0)");
                Ok(())
            }
        }
    }

    fn visit_call(&mut self, call: &FunctionCall) -> EmitResult {
        let wrap = self.flags.functioncall_wrap;
        if wrap {
            self.out.push_str("$(");
        }
        self.out.push_str(&call.name);
        for arg in &call.args {
            self.out.push(' ');
            let mut inner = self.call_wrap(true);
            // A nested call's output may contain spaces.
            let quote = matches!(arg.kind, ExprKind::Call(_)) && inner.flags.quote_variable;
            if quote {
                inner.out.push('"');
            }
            inner.visit_expr(arg)?;
            if quote {
                inner.out.push('"');
            }
        }
        if wrap {
            self.out.push(')');
        }
        Ok(())
    }
}

/// String operators when either side is a string. Equality also compares
/// text when a side is untyped (parameters, results of untyped calls), since
/// `-eq` would evaluate non-numeric words as arithmetic.
fn string_operands(op: BinaryOp, left: &Expr, right: &Expr) -> bool {
    let either = |ty: Type| left.ty == ty || right.ty == ty;
    either(Type::String) || (op.is_equality() && either(Type::Undef))
}

fn binary_token(op: BinaryOp, string: bool) -> &'static str {
    match (op, string) {
        (BinaryOp::Eq, true) => "==",
        (BinaryOp::Eq, false) => "-eq",
        (BinaryOp::NotEq, true) => "!=",
        (BinaryOp::NotEq, false) => "-ne",
        (BinaryOp::Lt, true) => "<",
        (BinaryOp::Lt, false) => "-lt",
        (BinaryOp::Le, true) => ">",
        (BinaryOp::Le, false) => "-le",
        (BinaryOp::Gt, true) => ">",
        (BinaryOp::Gt, false) => "-gt",
        (BinaryOp::Ge, true) => "<",
        (BinaryOp::Ge, false) => "-ge",
        (BinaryOp::And, _) => "&&",
        (BinaryOp::Or, _) => "||",
        (BinaryOp::Add, _) => "+",
        (BinaryOp::Sub, _) => "-",
        (BinaryOp::Mul, _) => "*",
        (BinaryOp::Div, _) => "/",
        (BinaryOp::Mod, _) => "%",
    }
}

fn redirection_token(op: IoOp) -> Result<&'static str, CompileError> {
    match op {
        IoOp::Pipe => Ok("|"),
        IoOp::Output => Err(CompileError::unimplemented("output redirection")),
        IoOp::Input => Err(CompileError::unimplemented("input redirection")),
    }
}

/// Whole values keep a decimal point so they still read as fractional.
fn fractional_text(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 {
        format!("{:.1}", v)
    } else {
        format!("{}", v)
    }
}
