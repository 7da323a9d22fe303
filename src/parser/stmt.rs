use super::common::{ParsResult, Parser};
use crate::ast::*;
use crate::lexer::TokenKind;

impl<'a> Parser<'a> {
    pub fn parse_stmt(&mut self) -> ParsResult<Stmt> {
        let start = self.current_span();
        let Some(kind) = self.peek_kind() else {
            return self.error("Expected statement, got end of file", start);
        };

        let node = match kind {
            TokenKind::Def => {
                return self.error("Functions can only be defined at the top level", start);
            }
            TokenKind::If => return self.parse_if(),
            TokenKind::For => return self.parse_for(),
            TokenKind::Import => {
                self.advance();
                let module = match self.peek_kind() {
                    Some(TokenKind::Ident(name)) | Some(TokenKind::String(name)) => name.clone(),
                    _ => return self.error("Expected module name after import", self.current_span()),
                };
                self.advance();
                self.expect(TokenKind::Semi)?;
                StmtKind::Import(module)
            }
            TokenKind::Return => {
                self.advance();
                if self.peek_kind() == Some(&TokenKind::Semi) {
                    return self.error("return requires a value", self.current_span());
                }
                let value = self.parse_expr()?;
                self.expect(TokenKind::Semi)?;
                StmtKind::Return(value)
            }
            TokenKind::Break | TokenKind::Continue => {
                let ctl = if *kind == TokenKind::Break {
                    LoopControl::Break
                } else {
                    LoopControl::Continue
                };
                self.advance();
                self.expect(TokenKind::Semi)?;
                StmtKind::LoopControl(ctl)
            }
            TokenKind::Ident(name) if self.peek_kind_at(1) == Some(&TokenKind::Equals) => {
                let name = name.clone();
                self.advance();
                self.advance();
                let value = self.parse_expr()?;
                self.expect(TokenKind::Semi)?;
                StmtKind::Assign { name, value }
            }
            _ => {
                let expr = self.parse_expr()?;
                self.expect(TokenKind::Semi)?;
                StmtKind::Expr(expr)
            }
        };
        Ok(Stmt::new(node, start.merge(self.previous_span())))
    }

    /// `{ stmt* }`
    pub fn parse_block(&mut self) -> ParsResult<Vec<Stmt>> {
        self.expect(TokenKind::LBrace)?;
        let mut body = Vec::new();
        while !self.match_kind(TokenKind::RBrace) {
            if self.peek().is_none() {
                return self.error("Expected '}' to close block, got end of file", self.current_span());
            }
            body.push(self.parse_stmt()?);
        }
        Ok(body)
    }

    fn parse_condition(&mut self) -> ParsResult<Expr> {
        self.expect(TokenKind::LParen)?;
        let cond = self.parse_expr()?;
        self.expect(TokenKind::RParen)?;
        Ok(cond)
    }

    fn parse_if(&mut self) -> ParsResult<Stmt> {
        let start = self.current_span();
        self.expect(TokenKind::If)?;
        let cond = self.parse_condition()?;
        let then_body = self.parse_block()?;

        let mut elifs = Vec::new();
        let mut else_body = None;
        while self.match_kind(TokenKind::Else) {
            if self.match_kind(TokenKind::If) {
                let cond = self.parse_condition()?;
                let body = self.parse_block()?;
                elifs.push(Elif { cond, body });
            } else {
                else_body = Some(self.parse_block()?);
                break;
            }
        }

        Ok(Stmt::new(
            StmtKind::If {
                cond,
                then_body,
                elifs,
                else_body,
            },
            start.merge(self.previous_span()),
        ))
    }

    /// `for (v in lower) {}` or `for (v in lower .. upper) {}`
    fn parse_for(&mut self) -> ParsResult<Stmt> {
        let start = self.current_span();
        self.expect(TokenKind::For)?;
        self.expect(TokenKind::LParen)?;
        let var = self.expect_ident("loop variable name")?;
        self.expect(TokenKind::In)?;
        let lower = self.parse_expr()?;
        let upper = if self.match_kind(TokenKind::DotDot) {
            Some(self.parse_expr()?)
        } else {
            None
        };
        self.expect(TokenKind::RParen)?;
        let body = self.parse_block()?;

        Ok(Stmt::new(
            StmtKind::For {
                var: var.node,
                lower,
                upper,
                body,
            },
            start.merge(self.previous_span()),
        ))
    }

    /// `def name(params) { body }` or the bodiless `def name(params);`
    pub fn parse_function(&mut self) -> ParsResult<Function> {
        let start = self.current_span();
        self.expect(TokenKind::Def)?;
        let name = self.expect_ident("function name")?;
        self.expect(TokenKind::LParen)?;
        let mut params: Vec<Spanned<String>> = Vec::new();
        if !self.match_kind(TokenKind::RParen) {
            loop {
                let p = self.expect_ident("parameter name")?;
                if params.iter().any(|q| q.node == p.node) {
                    return self.error(&format!("Duplicate parameter '{}'", p.node), p.span);
                }
                params.push(p);
                if !self.match_kind(TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::RParen)?;
        }

        let body = if self.match_kind(TokenKind::Semi) {
            None
        } else {
            Some(self.parse_block()?)
        };

        Ok(Function {
            name: name.node,
            params,
            body,
            span: start.merge(self.previous_span()),
            file: self.file.to_string(),
        })
    }
}
