use super::common::{ParsResult, Parser, describe};
use crate::ast::*;
use crate::lexer::TokenKind;
use crate::span::Span;

impl<'a> Parser<'a> {
    pub fn parse_expr(&mut self) -> ParsResult<Expr> {
        self.parse_pipe()
    }

    fn parse_pipe(&mut self) -> ParsResult<Expr> {
        let mut left = self.parse_or()?;
        while self.match_kind(TokenKind::Pipe) {
            let right = self.parse_or()?;
            let span = left.span.merge(right.span);
            left = Expr::new(ExprKind::Pipe(Box::new(left), Box::new(right)), span);
        }
        Ok(left)
    }

    fn parse_or(&mut self) -> ParsResult<Expr> {
        let mut left = self.parse_and()?;
        while self.match_kind(TokenKind::OrOr) {
            let right = self.parse_and()?;
            left = binary(BinaryOp::Or, left, right);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> ParsResult<Expr> {
        let mut left = self.parse_equality()?;
        while self.match_kind(TokenKind::AndAnd) {
            let right = self.parse_equality()?;
            left = binary(BinaryOp::And, left, right);
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> ParsResult<Expr> {
        let mut left = self.parse_relational()?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::EqEq) => BinaryOp::Eq,
                Some(TokenKind::NotEq) => BinaryOp::NotEq,
                _ => break,
            };
            self.advance();
            let right = self.parse_relational()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_relational(&mut self) -> ParsResult<Expr> {
        let mut left = self.parse_sum()?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Lt) => BinaryOp::Lt,
                Some(TokenKind::Le) => BinaryOp::Le,
                Some(TokenKind::Gt) => BinaryOp::Gt,
                Some(TokenKind::Ge) => BinaryOp::Ge,
                _ => break,
            };
            self.advance();
            let right = self.parse_sum()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_sum(&mut self) -> ParsResult<Expr> {
        let mut left = self.parse_term()?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Plus) => BinaryOp::Add,
                Some(TokenKind::Minus) => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_term()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_term(&mut self) -> ParsResult<Expr> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Star) => BinaryOp::Mul,
                Some(TokenKind::Slash) => BinaryOp::Div,
                Some(TokenKind::Percent) => BinaryOp::Mod,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> ParsResult<Expr> {
        let start = self.current_span();
        let op = match self.peek_kind() {
            Some(TokenKind::Minus) => UnaryOp::Negate,
            Some(TokenKind::Bang) => UnaryOp::Not,
            _ => return self.parse_primary(),
        };
        self.advance();
        let expr = self.parse_unary()?;
        let span = start.merge(expr.span);
        Ok(Expr::new(ExprKind::Unary { op, expr: Box::new(expr) }, span))
    }

    fn parse_primary(&mut self) -> ParsResult<Expr> {
        let Some(tok) = self.advance() else {
            return self.error("Expected expression, got end of file", self.current_span());
        };
        let span = tok.span;
        let node = match &tok.kind {
            TokenKind::Int(v) => ExprKind::Int(*v),
            TokenKind::Fractional(v) => ExprKind::Fractional(*v),
            TokenKind::True => ExprKind::Bool(true),
            TokenKind::False => ExprKind::Bool(false),
            // Skip the opening quote.
            TokenKind::String(raw) => ExprKind::Str(split_interpolation(raw, span.start + 1)),
            // Skip `@(` and any leading blanks the lexer trimmed.
            TokenKind::Extern(raw) => {
                let offset = self.sm.src()[span.start..span.end]
                    .find(raw.as_str())
                    .unwrap_or(2);
                ExprKind::Extern(split_interpolation(raw, span.start + offset))
            }
            TokenKind::LParen => {
                let inner = self.parse_expr()?;
                let close = self.expect(TokenKind::RParen)?;
                return Ok(Expr::new(inner.node, span.merge(close)));
            }
            TokenKind::Ident(name) => {
                if self.peek_kind() != Some(&TokenKind::LParen) {
                    ExprKind::Var(name.clone())
                } else {
                    self.advance();
                    let args = self.parse_call_args()?;
                    return Ok(Expr::new(
                        ExprKind::Call { name: name.clone(), args },
                        span.merge(self.previous_span()),
                    ));
                }
            }
            other => {
                return self.error(&format!("Expected expression, got {}", describe(other)), span);
            }
        };
        Ok(Expr::new(node, span))
    }

    /// Arguments after the opening paren, through the closing one.
    fn parse_call_args(&mut self) -> ParsResult<Vec<Expr>> {
        let mut args = Vec::new();
        if self.match_kind(TokenKind::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.parse_expr()?);
            if !self.match_kind(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RParen)?;
        Ok(args)
    }
}

fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    let span = left.span.merge(right.span);
    Expr::new(
        ExprKind::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        },
        span,
    )
}

/// Splits raw literal text into text and `$name` / `${name}` references.
/// A backslash-escaped `$` stays literal text. `base` is the byte offset of
/// `raw` in the source, used for variable spans.
pub(crate) fn split_interpolation(raw: &str, base: usize) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut text = String::new();
    let bytes = raw.as_bytes();
    let mut i = 0;

    while i < raw.len() {
        let c = bytes[i];
        if c == b'\\' && i + 1 < raw.len() {
            let next_len = raw[i + 1..].chars().next().map_or(1, char::len_utf8);
            text.push_str(&raw[i..i + 1 + next_len]);
            i += 1 + next_len;
            continue;
        }
        if c == b'$' {
            let braced = bytes.get(i + 1) == Some(&b'{');
            let name_start = if braced { i + 2 } else { i + 1 };
            let name_len = raw[name_start..]
                .bytes()
                .take_while(|b| b.is_ascii_alphanumeric() || *b == b'_')
                .count();
            let starts_ok = raw[name_start..]
                .bytes()
                .next()
                .is_some_and(|b| b.is_ascii_alphabetic() || b == b'_');
            let name_end = name_start + name_len;
            let closed = !braced || bytes.get(name_end) == Some(&b'}');
            if name_len > 0 && starts_ok && closed {
                let end = if braced { name_end + 1 } else { name_end };
                if !text.is_empty() {
                    segments.push(Segment::Text(std::mem::take(&mut text)));
                }
                segments.push(Segment::Var {
                    name: raw[name_start..name_end].to_string(),
                    raw: raw[i..end].to_string(),
                    span: Span::new(base + i, base + end),
                });
                i = end;
                continue;
            }
        }
        let ch_len = raw[i..].chars().next().map_or(1, char::len_utf8);
        text.push_str(&raw[i..i + ch_len]);
        i += ch_len;
    }
    if !text.is_empty() {
        segments.push(Segment::Text(text));
    }
    segments
}
