mod common;
mod expr;
mod stmt;

use self::common::Parser;
use crate::ast::*;
use crate::lexer::{Token, TokenKind};
use crate::span::{Diagnostic, SourceMap, Span};
use std::collections::HashMap;

/// Parses one source file. Imports are left in place as `Import`
/// statements; the loader resolves them.
pub fn parse(tokens: &[Token], sm: &SourceMap, file: &str) -> Result<Program, Diagnostic> {
    let mut parser = Parser::new(tokens, sm, file);
    let mut functions: Vec<Function> = Vec::new();
    let mut top_level = Vec::new();

    let start_span = parser.current_span();

    while parser.peek().is_some() {
        if parser.peek_kind() == Some(&TokenKind::Def) {
            functions.push(parser.parse_function()?);
        } else {
            let stmt = parser.parse_stmt()?;
            top_level.push(TopLevel {
                stmt,
                file: file.to_string(),
            });
        }
    }

    let end_span = parser.previous_span();
    let span = if tokens.is_empty() {
        Span::default()
    } else {
        start_span.merge(end_span)
    };

    Ok(Program {
        functions,
        top_level,
        span,
        source_maps: HashMap::new(),
        entry_file: file.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;

    fn parse_src(src: &str) -> Result<Program, Diagnostic> {
        let sm = SourceMap::new(src.to_string());
        let tokens = lex(&sm, "t.bish")?;
        parse(&tokens, &sm, "t.bish")
    }

    fn parse_ok(src: &str) -> Program {
        let mut p = parse_src(src).unwrap();
        p.strip_spans();
        p
    }

    fn expr(node: ExprKind) -> Expr {
        Expr::new(node, Span::default())
    }

    fn int(v: i64) -> Expr {
        expr(ExprKind::Int(v))
    }

    fn var(name: &str) -> Expr {
        expr(ExprKind::Var(name.into()))
    }

    fn bin(op: BinaryOp, l: Expr, r: Expr) -> Expr {
        expr(ExprKind::Binary {
            op,
            left: Box::new(l),
            right: Box::new(r),
        })
    }

    fn only_stmt(p: &Program) -> &StmtKind {
        assert_eq!(p.top_level.len(), 1);
        &p.top_level[0].stmt.node
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        let p = parse_ok("x = 1 + 2 * 3;");
        assert_eq!(
            only_stmt(&p),
            &StmtKind::Assign {
                name: "x".into(),
                value: bin(BinaryOp::Add, int(1), bin(BinaryOp::Mul, int(2), int(3))),
            }
        );
    }

    #[test]
    fn comparison_binds_tighter_than_logical() {
        let p = parse_ok("a < 1 && b == 2;");
        assert_eq!(
            only_stmt(&p),
            &StmtKind::Expr(bin(
                BinaryOp::And,
                bin(BinaryOp::Lt, var("a"), int(1)),
                bin(BinaryOp::Eq, var("b"), int(2)),
            ))
        );
    }

    #[test]
    fn else_if_chain_collects_elifs() {
        let p = parse_ok("if (a) { f(); } else if (b) { g(); } else { h(); }");
        let StmtKind::If { elifs, else_body, .. } = only_stmt(&p) else {
            panic!("expected if");
        };
        assert_eq!(elifs.len(), 1);
        assert_eq!(elifs[0].cond, var("b"));
        assert_eq!(else_body.as_ref().map(Vec::len), Some(1));
    }

    #[test]
    fn for_range_and_collection_forms() {
        let p = parse_ok("for (i in 1 .. n) { } for (w in \"a b\") { }");
        let StmtKind::For { var: v, upper, .. } = &p.top_level[0].stmt.node else {
            panic!("expected for");
        };
        assert_eq!(v, "i");
        assert_eq!(upper.as_ref(), Some(&var("n")));
        let StmtKind::For { upper, .. } = &p.top_level[1].stmt.node else {
            panic!("expected for");
        };
        assert!(upper.is_none());
    }

    #[test]
    fn functions_are_split_from_top_level() {
        let p = parse_ok("def f(a, b) { return a + b; }\nf(1, 2);\ndef g();");
        assert_eq!(p.functions.len(), 2);
        assert_eq!(p.functions[0].name, "f");
        assert_eq!(p.functions[0].params.len(), 2);
        assert!(p.functions[1].body.is_none());
        assert_eq!(p.top_level.len(), 1);
    }

    #[test]
    fn import_statement_names_module() {
        let p = parse_ok("import util;");
        assert_eq!(only_stmt(&p), &StmtKind::Import("util".into()));
    }

    #[test]
    fn pipe_has_lowest_precedence() {
        let p = parse_ok("@(ls) | @(wc -l);");
        let StmtKind::Expr(e) = only_stmt(&p) else {
            panic!("expected expression statement");
        };
        assert!(matches!(e.node, ExprKind::Pipe(_, _)));
    }

    #[test]
    fn missing_semicolon_is_reported() {
        let err = parse_src("x = 1").unwrap_err();
        assert!(err.msg.contains("Expected ';'"), "{}", err.msg);
    }

    #[test]
    fn nested_def_is_rejected() {
        let err = parse_src("def f() { def g() { } }").unwrap_err();
        assert!(err.msg.contains("top level"));
    }

    #[test]
    fn duplicate_parameter_is_rejected() {
        let err = parse_src("def f(a, a) { }").unwrap_err();
        assert!(err.msg.contains("Duplicate parameter 'a'"));
    }
}
