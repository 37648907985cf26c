//! Syntax frontend for the literal values printed by the interpreter harness: lexer, parser, AST, diagnostics.
//!
//! The harness prints its results with the interpreter's own literal syntax (single-quoted strings, `None`/`True`/
//! `False`, tuples in parentheses, sets in braces, trailing commas). This crate parses that syntax with a small
//! recursive-descent grammar and converts the result to a strict [`serde_json::Value`].
//!
//! ## Notes
//! - The grammar is a superset of JSON, so already-strict output parses to the same value.
//! - Tuples and sets become arrays; the tuple/list distinction is not preserved.
//! - Mapping keys are rendered to text: strings verbatim, any other literal as its compact JSON text.
//!
//! ## Examples
//! ```rust
//! let value = scriptest_literal::to_json("[{'test': 'a', 'passed': True, 'error': None,}]").unwrap();
//! assert_eq!(value, serde_json::json!([{"test": "a", "passed": true, "error": null}]));
//! ```

pub mod ast;
pub mod diagnostics;
pub mod lexer;
pub mod parser;

pub use ast::Literal;
pub use diagnostics::{LiteralError, Span, SyntaxError};

/// Parse `source` into a [`Literal`].
///
/// ## Errors
/// Returns a [`LiteralError`] carrying the source and the span of the first lexical or syntax error.
pub fn parse(source: &str) -> Result<Literal, LiteralError> {
    let tokens = lexer::lex(source).map_err(|errors| LiteralError::from_errors(source, errors))?;
    parser::parse(&tokens).map_err(|e| LiteralError::new(source, e))
}

/// Parse `source` and convert it to a strict JSON value.
pub fn to_json(source: &str) -> Result<serde_json::Value, LiteralError> {
    parse(source).map(|lit| lit.to_json())
}
