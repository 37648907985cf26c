//! Error reporting for literal parsing.
//!
//! The lexer and parser produce a plain [`SyntaxError`] (message + byte span). At the public API boundary it is
//! wrapped into a [`LiteralError`], which owns the source text so `miette` can render the offending span.

use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

/// Byte range into the parsed source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

impl From<Span> for SourceSpan {
    fn from(span: Span) -> Self {
        (span.start, span.end.saturating_sub(span.start)).into()
    }
}

/// A lexical or syntax error with location information.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntaxError {
    pub message: String,
    pub span: Span,
    pub hints: Vec<String>,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
            hints: Vec::new(),
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hints.push(hint.into());
        self
    }
}

/// Failure to parse a literal, with the source attached for rendering.
#[derive(Debug, Error, Diagnostic)]
#[error("{message} at offset {offset}")]
#[diagnostic(code(scriptest::literal::syntax))]
pub struct LiteralError {
    pub message: String,
    pub offset: usize,
    #[source_code]
    pub source_code: String,
    #[label("here")]
    pub span: SourceSpan,
    #[help]
    pub help: Option<String>,
}

impl LiteralError {
    pub fn new(source: &str, error: SyntaxError) -> Self {
        Self {
            offset: error.span.start,
            span: error.span.into(),
            help: (!error.hints.is_empty()).then(|| error.hints.join("\n")),
            message: error.message,
            source_code: source.to_string(),
        }
    }

    /// Report the first of several errors, noting how many follow.
    pub fn from_errors(source: &str, errors: Vec<SyntaxError>) -> Self {
        let more = errors.len().saturating_sub(1);
        let Some(first) = errors.into_iter().next() else {
            return Self::new(source, SyntaxError::new("invalid literal", Span::default()));
        };
        let first = match more {
            0 => first,
            1 => first.with_hint("1 more error after this one"),
            n => first.with_hint(format!("{n} more errors after this one")),
        };
        Self::new(source, first)
    }
}
