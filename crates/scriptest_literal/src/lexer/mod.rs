//! Lexer for printed literal values
//!
//! Handles tokenization including:
//! - Keywords (`None`/`True`/`False` and their interchange spellings)
//! - Identifiers (`set`, `frozenset`, `inf`, `nan`, …; the parser decides which are meaningful)
//! - Numeric literals (decimal, hex/octal/binary, floats with exponents)
//! - String and byte-string literals in either quote style, with optional `r`/`b`/`u` prefixes
//! - Punctuation
//!
//! ## Module Structure
//!
//! - `tokens` - Token types (TokenKind, Token, keywords)
//! - `strings` - String/byte-string scanning and escapes
//! - `numbers` - Numeric literal scanning

mod numbers;
mod strings;
pub mod tokens;

pub use tokens::{Token, TokenKind};

use crate::diagnostics::{Span, SyntaxError};

/// Lexer for literal text.
///
/// Whitespace (including newlines) is insignificant everywhere outside strings.
pub struct Lexer<'a> {
    source: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    current_pos: usize,
    tokens: Vec<Token>,
    errors: Vec<SyntaxError>,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given text.
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            current_pos: 0,
            tokens: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Tokenize the entire input.
    ///
    /// Returns a vector of tokens on success, or every error found on failure.
    /// The token stream always ends with an `Eof` token.
    pub fn tokenize(mut self) -> Result<Vec<Token>, Vec<SyntaxError>> {
        while !self.is_at_end() {
            self.scan_token();
        }

        self.tokens
            .push(Token::new(TokenKind::Eof, Span::new(self.current_pos, self.current_pos)));

        if self.errors.is_empty() {
            Ok(self.tokens)
        } else {
            Err(self.errors)
        }
    }

    // ========================================================================
    // Core character handling
    // ========================================================================

    fn is_at_end(&mut self) -> bool {
        self.chars.peek().is_none()
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    fn peek_next(&self) -> Option<char> {
        let mut iter = self.source[self.current_pos..].chars();
        iter.next(); // skip current
        iter.next()
    }

    fn advance(&mut self) -> Option<char> {
        if let Some((pos, c)) = self.chars.next() {
            self.current_pos = pos + c.len_utf8();
            Some(c)
        } else {
            None
        }
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn add_token(&mut self, kind: TokenKind, start: usize) {
        self.tokens.push(Token::new(kind, Span::new(start, self.current_pos)));
    }

    fn error(&mut self, message: impl Into<String>, start: usize) {
        self.errors
            .push(SyntaxError::new(message, Span::new(start, self.current_pos)));
    }

    // ========================================================================
    // Main scanning dispatch
    // ========================================================================

    fn scan_token(&mut self) {
        let start = self.current_pos;

        let Some(c) = self.advance() else {
            return;
        };

        match c {
            ' ' | '\t' | '\n' | '\r' | '\x0c' => {}

            '+' => self.add_token(TokenKind::Plus, start),
            '-' => self.add_token(TokenKind::Minus, start),
            ',' => self.add_token(TokenKind::Comma, start),
            ':' => self.add_token(TokenKind::Colon, start),
            '(' => self.add_token(TokenKind::LParen, start),
            ')' => self.add_token(TokenKind::RParen, start),
            '[' => self.add_token(TokenKind::LBracket, start),
            ']' => self.add_token(TokenKind::RBracket, start),
            '{' => self.add_token(TokenKind::LBrace, start),
            '}' => self.add_token(TokenKind::RBrace, start),

            '"' | '\'' => self.scan_string(start, c, StringPrefix::default()),

            '0'..='9' => self.scan_number(start, c),

            _ if is_ident_start(c) => self.scan_identifier(start, c),

            _ => self.error(format!("Unexpected character '{}'", c.escape_debug()), start),
        }
    }

    // ========================================================================
    // Identifier scanning
    // ========================================================================

    fn scan_identifier(&mut self, start: usize, first: char) {
        let mut name = String::from(first);

        while let Some(c) = self.peek() {
            if is_ident_continue(c) {
                name.push(c);
                self.advance();
            } else {
                break;
            }
        }

        // `b'..'`, `r"..."`, `rb'..'`, …
        if let Some(quote @ ('"' | '\'')) = self.peek() {
            if let Some(prefix) = StringPrefix::parse(&name) {
                self.advance();
                self.scan_string(start, quote, prefix);
                return;
            }
        }

        let kind = tokens::keyword(&name).unwrap_or(TokenKind::Ident(name));
        self.add_token(kind, start);
    }
}

/// String prefix flags (`b`, `r`, and the no-op `u`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct StringPrefix {
    pub bytes: bool,
    pub raw: bool,
}

impl StringPrefix {
    fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "u" => Some(Self::default()),
            "b" => Some(Self { bytes: true, raw: false }),
            "r" => Some(Self { bytes: false, raw: true }),
            "br" | "rb" => Some(Self { bytes: true, raw: true }),
            _ => None,
        }
    }
}

// ============================================================================
// Helper functions
// ============================================================================

/// Check if a character can start an identifier (ASCII-only).
fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

/// Check if a character can continue an identifier (ASCII-only).
fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Convenience function to lex a source string.
///
/// This is a shorthand for `Lexer::new(source).tokenize()`.
#[tracing::instrument(skip_all, fields(source_len = source.len()))]
pub fn lex(source: &str) -> Result<Vec<Token>, Vec<SyntaxError>> {
    Lexer::new(source).tokenize()
}

// ============================================================================
// TESTS
// ============================================================================
