//! Token types for the literal lexer

use crate::diagnostics::Span;

/// Token types
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // ========== Keywords ==========
    None,  // None / null
    True,  // True / true
    False, // False / false

    // ========== Identifiers and Literals ==========
    Ident(String),
    /// Integer literal; values outside `i128` are lexed as [`TokenKind::Float`].
    Int(i128),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),

    // ========== Operators ==========
    Plus,  // +
    Minus, // -

    // ========== Punctuation ==========
    Comma,    // ,
    Colon,    // :
    LParen,   // (
    RParen,   // )
    LBracket, // [
    RBracket, // ]
    LBrace,   // {
    RBrace,   // }

    // ========== Special ==========
    Eof,
}

/// Keyword spellings. Both the interpreter's and the interchange spellings are accepted so already-strict text lexes
/// to the same tokens.
pub const KEYWORDS: &[(&str, TokenKind)] = &[
    ("None", TokenKind::None),
    ("null", TokenKind::None),
    ("True", TokenKind::True),
    ("true", TokenKind::True),
    ("False", TokenKind::False),
    ("false", TokenKind::False),
];

/// Look up a keyword by its exact spelling.
pub fn keyword(name: &str) -> Option<TokenKind> {
    KEYWORDS.iter().find(|(k, _)| *k == name).map(|(_, kind)| kind.clone())
}

/// A token with its source location
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

impl TokenKind {
    /// Short description used in "expected X, found Y" messages.
    pub fn describe(&self) -> String {
        match self {
            TokenKind::None => "'None'".to_string(),
            TokenKind::True => "'True'".to_string(),
            TokenKind::False => "'False'".to_string(),
            TokenKind::Ident(name) => format!("identifier '{name}'"),
            TokenKind::Int(_) | TokenKind::Float(_) => "number".to_string(),
            TokenKind::String(_) => "string".to_string(),
            TokenKind::Bytes(_) => "byte string".to_string(),
            TokenKind::Plus => "'+'".to_string(),
            TokenKind::Minus => "'-'".to_string(),
            TokenKind::Comma => "','".to_string(),
            TokenKind::Colon => "':'".to_string(),
            TokenKind::LParen => "'('".to_string(),
            TokenKind::RParen => "')'".to_string(),
            TokenKind::LBracket => "'['".to_string(),
            TokenKind::RBracket => "']'".to_string(),
            TokenKind::LBrace => "'{'".to_string(),
            TokenKind::RBrace => "'}'".to_string(),
            TokenKind::Eof => "end of input".to_string(),
        }
    }
}
