use crate::span::{Diagnostic, SourceMap, Span};

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Def,
    If,
    Else,
    For,
    In,
    Return,
    Break,
    Continue,
    Import,
    True,
    False,
    Ident(String),
    Int(i64),
    Fractional(f64),
    /// Raw string body between the quotes; escapes are kept as written.
    String(String),
    /// Raw command body of `@( ... )`.
    Extern(String),
    LParen,
    RParen,
    LBrace,
    RBrace,
    Comma,
    Semi,
    Equals,
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    AndAnd,
    OrOr,
    Bang,
    Pipe,
    DotDot,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    pos: usize,
    sm: &'a SourceMap,
    file: &'a str,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    fn new(sm: &'a SourceMap, file: &'a str) -> Self {
        Lexer {
            chars: sm.src().chars().peekable(),
            pos: 0,
            sm,
            file,
            tokens: Vec::new(),
        }
    }

    fn peek(&mut self) -> Option<&char> {
        self.chars.peek()
    }

    fn peek_second(&self) -> Option<char> {
        let mut la = self.chars.clone();
        la.next();
        la.next()
    }

    fn next(&mut self) -> Option<char> {
        let c = self.chars.next();
        if let Some(ch) = c {
            self.pos += ch.len_utf8();
        }
        c
    }

    fn push(&mut self, kind: TokenKind, start: usize) {
        self.tokens.push(Token {
            kind,
            span: Span::new(start, self.pos),
        });
    }

    /// Consumes one char, then a second one if it is `follow`.
    fn one_or_two(&mut self, start: usize, follow: char, single: TokenKind, double: TokenKind) {
        self.next();
        if self.peek() == Some(&follow) {
            self.next();
            self.push(double, start);
        } else {
            self.push(single, start);
        }
    }

    fn error<T>(&self, msg: &str, start: usize) -> Result<T, Diagnostic> {
        Err(Diagnostic {
            msg: msg.to_string(),
            span: Span::new(start, self.pos.max(start + 1)),
            sm: Some(self.sm.clone()),
            file: Some(self.file.to_string()),
            help: None,
        })
    }

    fn string(&mut self, start: usize) -> Result<(), Diagnostic> {
        self.next(); // opening quote
        let mut s = String::new();
        loop {
            match self.next() {
                Some('"') => break,
                Some('\\') => match self.next() {
                    Some(escaped) => {
                        s.push('\\');
                        s.push(escaped);
                    }
                    None => return self.error("Unexpected EOF in string escape", start),
                },
                Some(ch) => s.push(ch),
                None => return self.error("Unterminated string (missing closing quote)", start),
            }
        }
        self.push(TokenKind::String(s), start);
        Ok(())
    }

    /// `@( ... )`: everything up to the matching paren is kept verbatim.
    /// Parens inside single or double quotes do not count.
    fn extern_call(&mut self, start: usize) -> Result<(), Diagnostic> {
        self.next(); // @
        if self.peek() != Some(&'(') {
            return self.error("Expected '(' after '@'", start);
        }
        self.next();
        let mut body = String::new();
        let mut depth = 0usize;
        let mut quote: Option<char> = None;
        loop {
            let Some(ch) = self.next() else {
                return self.error("Unterminated external command (missing ')')", start);
            };
            match (quote, ch) {
                (Some(q), c) if c == q => quote = None,
                (Some(_), '\\') => {
                    body.push(ch);
                    if let Some(escaped) = self.next() {
                        body.push(escaped);
                    }
                    continue;
                }
                (Some(_), _) => {}
                (None, '\'' | '"') => quote = Some(ch),
                (None, '(') => depth += 1,
                (None, ')') if depth == 0 => break,
                (None, ')') => depth -= 1,
                (None, _) => {}
            }
            body.push(ch);
        }
        self.push(TokenKind::Extern(body.trim().to_string()), start);
        Ok(())
    }

    fn number(&mut self, start: usize) -> Result<(), Diagnostic> {
        let mut text = String::new();
        while let Some(&ch) = self.peek() {
            if !ch.is_ascii_digit() {
                break;
            }
            text.push(ch);
            self.next();
        }
        // `1..3` is a range, `1.5` a fractional.
        let fractional = self.peek() == Some(&'.')
            && self.peek_second().is_some_and(|c| c.is_ascii_digit());
        if fractional {
            text.push('.');
            self.next();
            while let Some(&ch) = self.peek() {
                if !ch.is_ascii_digit() {
                    break;
                }
                text.push(ch);
                self.next();
            }
            match text.parse::<f64>() {
                Ok(v) => self.push(TokenKind::Fractional(v), start),
                Err(_) => return self.error("Invalid fractional literal", start),
            }
        } else {
            match text.parse::<i64>() {
                Ok(v) => self.push(TokenKind::Int(v), start),
                Err(_) => return self.error("Integer literal out of range", start),
            }
        }
        Ok(())
    }

    fn word(&mut self, start: usize) {
        let mut ident = String::new();
        while let Some(&ch) = self.peek() {
            if !ch.is_ascii_alphanumeric() && ch != '_' {
                break;
            }
            ident.push(ch);
            self.next();
        }
        let kind = match ident.as_str() {
            "def" => TokenKind::Def,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "for" => TokenKind::For,
            "in" => TokenKind::In,
            "return" => TokenKind::Return,
            "break" => TokenKind::Break,
            "continue" => TokenKind::Continue,
            "import" => TokenKind::Import,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "and" => TokenKind::AndAnd,
            "or" => TokenKind::OrOr,
            "not" => TokenKind::Bang,
            _ => TokenKind::Ident(ident),
        };
        self.push(kind, start);
    }
}

pub fn lex(sm: &SourceMap, file: &str) -> Result<Vec<Token>, Diagnostic> {
    let mut lexer = Lexer::new(sm, file);

    while let Some(&c) = lexer.peek() {
        let start = lexer.pos;
        match c {
            ' ' | '\n' | '\t' | '\r' => {
                lexer.next();
            }
            '#' => {
                while let Some(&c) = lexer.peek() {
                    if c == '\n' {
                        break;
                    }
                    lexer.next();
                }
            }
            '(' => { lexer.next(); lexer.push(TokenKind::LParen, start); }
            ')' => { lexer.next(); lexer.push(TokenKind::RParen, start); }
            '{' => { lexer.next(); lexer.push(TokenKind::LBrace, start); }
            '}' => { lexer.next(); lexer.push(TokenKind::RBrace, start); }
            ',' => { lexer.next(); lexer.push(TokenKind::Comma, start); }
            ';' => { lexer.next(); lexer.push(TokenKind::Semi, start); }
            '+' => { lexer.next(); lexer.push(TokenKind::Plus, start); }
            '-' => { lexer.next(); lexer.push(TokenKind::Minus, start); }
            '*' => { lexer.next(); lexer.push(TokenKind::Star, start); }
            '/' => { lexer.next(); lexer.push(TokenKind::Slash, start); }
            '%' => { lexer.next(); lexer.push(TokenKind::Percent, start); }
            '=' => lexer.one_or_two(start, '=', TokenKind::Equals, TokenKind::EqEq),
            '!' => lexer.one_or_two(start, '=', TokenKind::Bang, TokenKind::NotEq),
            '<' => lexer.one_or_two(start, '=', TokenKind::Lt, TokenKind::Le),
            '>' => lexer.one_or_two(start, '=', TokenKind::Gt, TokenKind::Ge),
            '|' => lexer.one_or_two(start, '|', TokenKind::Pipe, TokenKind::OrOr),
            '&' => {
                lexer.next();
                if lexer.peek() == Some(&'&') {
                    lexer.next();
                    lexer.push(TokenKind::AndAnd, start);
                } else {
                    return lexer.error("Unexpected '&' (did you mean '&&'?)", start);
                }
            }
            '.' => {
                lexer.next();
                if lexer.peek() == Some(&'.') {
                    lexer.next();
                    lexer.push(TokenKind::DotDot, start);
                } else {
                    return lexer.error("Unexpected '.' (ranges are written 'a .. b')", start);
                }
            }
            '"' => lexer.string(start)?,
            '@' => lexer.extern_call(start)?,
            _ if c.is_ascii_digit() => lexer.number(start)?,
            _ if c.is_ascii_alphabetic() || c == '_' => lexer.word(start),
            _ => {
                lexer.next();
                return lexer.error(&format!("Unexpected character '{}'", c), start);
            }
        }
    }

    Ok(lexer.tokens)
}
