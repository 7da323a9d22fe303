use crate::ast::Spanned;
use crate::lexer::{Token, TokenKind};
use crate::span::{Diagnostic, SourceMap, Span};

pub(crate) struct Parser<'a> {
    pub tokens: &'a [Token],
    pub pos: usize,
    pub sm: &'a SourceMap,
    pub file: &'a str,
}

pub type ParsResult<T> = Result<T, Diagnostic>;

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token], sm: &'a SourceMap, file: &'a str) -> Self {
        Parser {
            tokens,
            pos: 0,
            sm,
            file,
        }
    }

    pub fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    pub fn peek_kind(&self) -> Option<&'a TokenKind> {
        self.peek().map(|t| &t.kind)
    }

    pub fn peek_kind_at(&self, offset: usize) -> Option<&'a TokenKind> {
        self.tokens.get(self.pos + offset).map(|t| &t.kind)
    }

    pub fn advance(&mut self) -> Option<&'a Token> {
        let t = self.tokens.get(self.pos);
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    pub fn error<T>(&self, msg: &str, span: Span) -> ParsResult<T> {
        Err(Diagnostic {
            msg: msg.to_string(),
            span,
            sm: Some(self.sm.clone()),
            file: Some(self.file.to_string()),
            help: None,
        })
    }

    pub fn previous_span(&self) -> Span {
        if self.pos > 0 {
            self.tokens[self.pos - 1].span
        } else {
            Span::new(0, 0)
        }
    }

    pub fn current_span(&self) -> Span {
        match (self.peek(), self.tokens.last()) {
            (Some(t), _) => t.span,
            // EOF: one char past the last token.
            (None, Some(last)) => Span::new(last.span.end, last.span.end + 1),
            (None, None) => Span::new(0, 0),
        }
    }

    pub fn expect(&mut self, kind: TokenKind) -> ParsResult<Span> {
        match self.peek() {
            Some(t) if t.kind == kind => {
                self.advance();
                Ok(t.span)
            }
            Some(t) => self.error(&format!("Expected {}, got {}", describe(&kind), describe(&t.kind)), t.span),
            None => self.error(&format!("Expected {}, got end of file", describe(&kind)), self.current_span()),
        }
    }

    pub fn expect_ident(&mut self, what: &str) -> ParsResult<Spanned<String>> {
        match self.peek() {
            Some(Token { kind: TokenKind::Ident(name), span }) => {
                self.advance();
                Ok(Spanned::new(name.clone(), *span))
            }
            _ => self.error(&format!("Expected {}", what), self.current_span()),
        }
    }

    pub fn match_kind(&mut self, kind: TokenKind) -> bool {
        if let Some(t) = self.peek() {
            if t.kind == kind {
                self.advance();
                return true;
            }
        }
        false
    }
}

/// Human-readable token name for "expected X, got Y" messages.
pub(crate) fn describe(kind: &TokenKind) -> String {
    let s = match kind {
        TokenKind::Def => "'def'",
        TokenKind::If => "'if'",
        TokenKind::Else => "'else'",
        TokenKind::For => "'for'",
        TokenKind::In => "'in'",
        TokenKind::Return => "'return'",
        TokenKind::Break => "'break'",
        TokenKind::Continue => "'continue'",
        TokenKind::Import => "'import'",
        TokenKind::True => "'true'",
        TokenKind::False => "'false'",
        TokenKind::Ident(name) => return format!("identifier '{}'", name),
        TokenKind::Int(v) => return format!("integer {}", v),
        TokenKind::Fractional(v) => return format!("number {}", v),
        TokenKind::String(_) => "string literal",
        TokenKind::Extern(_) => "external command",
        TokenKind::LParen => "'('",
        TokenKind::RParen => "')'",
        TokenKind::LBrace => "'{'",
        TokenKind::RBrace => "'}'",
        TokenKind::Comma => "','",
        TokenKind::Semi => "';'",
        TokenKind::Equals => "'='",
        TokenKind::EqEq => "'=='",
        TokenKind::NotEq => "'!='",
        TokenKind::Lt => "'<'",
        TokenKind::Le => "'<='",
        TokenKind::Gt => "'>'",
        TokenKind::Ge => "'>='",
        TokenKind::Plus => "'+'",
        TokenKind::Minus => "'-'",
        TokenKind::Star => "'*'",
        TokenKind::Slash => "'/'",
        TokenKind::Percent => "'%'",
        TokenKind::AndAnd => "'&&'",
        TokenKind::OrOr => "'||'",
        TokenKind::Bang => "'!'",
        TokenKind::Pipe => "'|'",
        TokenKind::DotDot => "'..'",
    };
    s.to_string()
}
