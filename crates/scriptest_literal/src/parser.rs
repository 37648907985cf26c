//! Parser for printed literal values
//!
//! Recursive descent over the token stream. The grammar (informally):
//!
//! ```text
//! value    := 'None' | 'True' | 'False' | number | strings | list | paren | brace | call
//! number   := ('+' | '-')* (INT | FLOAT | 'inf' | 'nan' | 'Infinity' | 'NaN')
//! strings  := STRING+ | BYTES+                  adjacent literals concatenate
//! list     := '[' (value (',' value)* ','?)? ']'
//! paren    := '(' ')' | '(' value ')' | '(' value ',' (value (',' value)* ','?)? ')'
//! brace    := '{' '}' | '{' value ':' value (',' value ':' value)* ','? '}' | '{' value (',' value)* ','? '}'
//! call     := ('set' | 'frozenset') '(' value? ')' | 'dict' '(' ')'
//! ```

use crate::ast::Literal;
use crate::diagnostics::{Span, SyntaxError};
use crate::lexer::{Token, TokenKind};

/// Containers nested deeper than this are rejected instead of overflowing the stack.
pub const MAX_DEPTH: usize = 256;

static EOF: Token = Token {
    kind: TokenKind::Eof,
    span: Span { start: 0, end: 0 },
};

const LITERAL_HINT: &str = "only literal values can be normalized: None, True, False, numbers, strings, bytes, lists, \
                            tuples, dicts and sets";

/// Parser state
pub struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, pos: 0, depth: 0 }
    }

    /// Parse exactly one value followed by end of input.
    pub fn parse(mut self) -> Result<Literal, SyntaxError> {
        let value = self.value()?;
        if !self.is_at_end() {
            return Err(SyntaxError::new(
                format!("Unexpected trailing input: found {}", self.peek().kind.describe()),
                self.peek().span,
            )
            .with_hint("the output must contain exactly one value"));
        }
        Ok(value)
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn is_at_end(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Eof)
    }

    fn peek(&self) -> &'a Token {
        self.tokens.get(self.pos).or(self.tokens.last()).unwrap_or(&EOF)
    }

    fn peek_next(&self) -> &'a Token {
        self.tokens.get(self.pos + 1).or(self.tokens.last()).unwrap_or(&EOF)
    }

    fn advance(&mut self) -> &'a Token {
        let token = self.peek();
        if !self.is_at_end() {
            self.pos += 1;
        }
        token
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.peek().kind) == std::mem::discriminant(kind)
    }

    fn match_token(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind, msg: &str) -> Result<&'a Token, SyntaxError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(SyntaxError::new(
                format!("{}, found {}", msg, self.peek().kind.describe()),
                self.peek().span,
            ))
        }
    }

    fn enter(&mut self, span: Span) -> Result<(), SyntaxError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(SyntaxError::new(
                format!("Nesting too deep (more than {MAX_DEPTH} levels)"),
                span,
            ));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    // ========================================================================
    // Values
    // ========================================================================

    fn value(&mut self) -> Result<Literal, SyntaxError> {
        let token = self.peek();
        match &token.kind {
            TokenKind::None => {
                self.advance();
                Ok(Literal::None)
            }
            TokenKind::True => {
                self.advance();
                Ok(Literal::Bool(true))
            }
            TokenKind::False => {
                self.advance();
                Ok(Literal::Bool(false))
            }
            TokenKind::Int(_) | TokenKind::Float(_) | TokenKind::Plus | TokenKind::Minus => self.number(),
            TokenKind::String(_) => self.strings(),
            TokenKind::Bytes(_) => self.byte_strings(),
            TokenKind::LBracket => self.nested(Self::list),
            TokenKind::LParen => self.nested(Self::paren),
            TokenKind::LBrace => self.nested(Self::brace),
            TokenKind::Ident(name) => match name.as_str() {
                "inf" | "Infinity" | "nan" | "NaN" => self.number(),
                "set" | "frozenset" | "dict" if matches!(self.peek_next().kind, TokenKind::LParen) => {
                    self.nested(Self::call)
                }
                _ => Err(SyntaxError::new(format!("Unexpected identifier '{name}'"), token.span).with_hint(LITERAL_HINT)),
            },
            other => Err(SyntaxError::new(
                format!("Expected a value, found {}", other.describe()),
                token.span,
            )),
        }
    }

    fn nested(&mut self, parse: fn(&mut Self) -> Result<Literal, SyntaxError>) -> Result<Literal, SyntaxError> {
        self.enter(self.peek().span)?;
        let result = parse(self);
        self.leave();
        result
    }

    /// Signed number; signs may repeat (`--1`).
    fn number(&mut self) -> Result<Literal, SyntaxError> {
        let mut negative = false;
        loop {
            if self.match_token(&TokenKind::Minus) {
                negative = !negative;
            } else if !self.match_token(&TokenKind::Plus) {
                break;
            }
        }

        let token = self.advance();
        let value = match &token.kind {
            TokenKind::Int(i) => Literal::Int(*i),
            TokenKind::Float(f) => Literal::Float(*f),
            TokenKind::Ident(name) if name == "inf" || name == "Infinity" => Literal::Float(f64::INFINITY),
            TokenKind::Ident(name) if name == "nan" || name == "NaN" => Literal::Float(f64::NAN),
            other => {
                return Err(SyntaxError::new(
                    format!("Expected a number after sign, found {}", other.describe()),
                    token.span,
                ));
            }
        };

        if !negative {
            return Ok(value);
        }
        Ok(match value {
            Literal::Int(i) => i.checked_neg().map(Literal::Int).unwrap_or(Literal::Float(-(i as f64))),
            Literal::Float(f) => Literal::Float(-f),
            other => other,
        })
    }

    fn strings(&mut self) -> Result<Literal, SyntaxError> {
        let mut value = String::new();
        while let TokenKind::String(part) = &self.peek().kind {
            value.push_str(part);
            self.advance();
        }
        if self.check(&TokenKind::Bytes(Vec::new())) {
            return Err(SyntaxError::new("Cannot mix bytes and non-bytes literals", self.peek().span));
        }
        Ok(Literal::Str(value))
    }

    fn byte_strings(&mut self) -> Result<Literal, SyntaxError> {
        let mut value = Vec::new();
        while let TokenKind::Bytes(part) = &self.peek().kind {
            value.extend_from_slice(part);
            self.advance();
        }
        if self.check(&TokenKind::String(String::new())) {
            return Err(SyntaxError::new("Cannot mix bytes and non-bytes literals", self.peek().span));
        }
        Ok(Literal::Bytes(value))
    }

    /// Comma-separated values up to `close`, allowing a trailing comma. The opening token is already consumed.
    fn items(&mut self, close: &TokenKind, what: &str) -> Result<Vec<Literal>, SyntaxError> {
        let mut items = Vec::new();
        while !self.check(close) {
            items.push(self.value()?);
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(close, &format!("Expected ',' or {} to close {what}", close.describe()))?;
        Ok(items)
    }

    fn list(&mut self) -> Result<Literal, SyntaxError> {
        self.advance();
        self.items(&TokenKind::RBracket, "list").map(Literal::List)
    }

    fn paren(&mut self) -> Result<Literal, SyntaxError> {
        self.advance();
        if self.match_token(&TokenKind::RParen) {
            return Ok(Literal::Tuple(Vec::new()));
        }

        let first = self.value()?;
        if self.match_token(&TokenKind::RParen) {
            // grouping, not a tuple
            return Ok(first);
        }
        self.expect(&TokenKind::Comma, "Expected ',' or ')' to close tuple")?;

        let mut items = vec![first];
        items.extend(self.items(&TokenKind::RParen, "tuple")?);
        Ok(Literal::Tuple(items))
    }

    fn brace(&mut self) -> Result<Literal, SyntaxError> {
        self.advance();
        if self.match_token(&TokenKind::RBrace) {
            return Ok(Literal::Dict(Vec::new()));
        }

        let first = self.value()?;
        if !self.match_token(&TokenKind::Colon) {
            // set display
            let mut items = vec![first];
            if self.match_token(&TokenKind::Comma) {
                items.extend(self.items(&TokenKind::RBrace, "set")?);
            } else {
                self.expect(&TokenKind::RBrace, "Expected ',' or '}' to close set")?;
            }
            return Ok(Literal::Set(items));
        }

        let mut entries = vec![(first, self.value()?)];
        while self.match_token(&TokenKind::Comma) {
            if self.check(&TokenKind::RBrace) {
                break;
            }
            let key = self.value()?;
            self.expect(&TokenKind::Colon, "Expected ':' after dict key")?;
            entries.push((key, self.value()?));
        }
        self.expect(&TokenKind::RBrace, "Expected ',' or '}' to close dict")?;
        Ok(Literal::Dict(entries))
    }

    /// `set(...)`, `frozenset(...)` and `dict()`, as printed for empty or frozen collections.
    fn call(&mut self) -> Result<Literal, SyntaxError> {
        let callee = self.advance();
        let name = match &callee.kind {
            TokenKind::Ident(name) => name.as_str(),
            _ => "",
        };
        self.advance(); // '('

        if self.match_token(&TokenKind::RParen) {
            return Ok(if name == "dict" {
                Literal::Dict(Vec::new())
            } else {
                Literal::Set(Vec::new())
            });
        }

        let argument = self.value()?;
        self.match_token(&TokenKind::Comma);
        self.expect(&TokenKind::RParen, &format!("Expected ')' to close {name}(...)"))?;

        match (name, argument) {
            ("dict", Literal::Dict(entries)) => Ok(Literal::Dict(entries)),
            ("dict", other) => Err(SyntaxError::new(
                format!("Expected a dict inside dict(...), found {}", other.type_name()),
                callee.span,
            )),
            (_, Literal::List(items) | Literal::Tuple(items) | Literal::Set(items)) => Ok(Literal::Set(items)),
            (_, Literal::Dict(entries)) => Ok(Literal::Set(entries.into_iter().map(|(k, _)| k).collect())),
            (_, other) => Err(SyntaxError::new(
                format!("Expected a collection inside {name}(...), found {}", other.type_name()),
                callee.span,
            )),
        }
    }
}

/// Convenience function to parse a token stream
#[tracing::instrument(skip_all, fields(token_count = tokens.len()))]
pub fn parse(tokens: &[Token]) -> Result<Literal, SyntaxError> {
    Parser::new(tokens).parse()
}
