//! String scanning for the literal lexer
//!
//! Handles text and byte strings in either quote style, triple-quoted strings, raw strings, and the escape
//! sequences of both the interpreter's repr output and strict JSON (`\uXXXX` with surrogate pairs, `\/`).

use super::tokens::TokenKind;
use super::{Lexer, StringPrefix};

// ============================================================================
// Escape sequence handling
// ============================================================================

/// Result of processing an escape sequence
enum EscapeResult {
    /// A code point (text) or byte value (bytes)
    Code(u32),
    /// Unknown escape - preserve as-is (backslash + char)
    Unknown(char),
    /// Escaped newline (line continuation) - contributes nothing
    Continuation,
    /// Malformed escape
    Invalid(String),
    /// End of input during escape
    Eof,
}

/// Accumulates the decoded value of a text or byte string.
enum Buffer {
    Text(String),
    Bytes(Vec<u8>),
}

impl Buffer {
    fn push_char(&mut self, c: char) {
        match self {
            Buffer::Text(s) => s.push(c),
            Buffer::Bytes(b) => {
                let mut utf8 = [0u8; 4];
                b.extend_from_slice(c.encode_utf8(&mut utf8).as_bytes());
            }
        }
    }

    fn push_code(&mut self, code: u32) {
        match self {
            Buffer::Text(s) => s.push(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER)),
            // byte escapes are range-checked before they get here
            Buffer::Bytes(b) => b.push(code as u8),
        }
    }

    fn into_token(self) -> TokenKind {
        match self {
            Buffer::Text(s) => TokenKind::String(s),
            Buffer::Bytes(b) => TokenKind::Bytes(b),
        }
    }
}

impl<'a> Lexer<'a> {
    /// Process an escape sequence. Called after consuming the backslash.
    fn scan_escape(&mut self, bytes: bool) -> EscapeResult {
        let Some(c) = self.advance() else {
            return EscapeResult::Eof;
        };

        match c {
            'n' => EscapeResult::Code(0x0a),
            't' => EscapeResult::Code(0x09),
            'r' => EscapeResult::Code(0x0d),
            'a' => EscapeResult::Code(0x07),
            'b' => EscapeResult::Code(0x08),
            'f' => EscapeResult::Code(0x0c),
            'v' => EscapeResult::Code(0x0b),
            '\\' | '\'' | '"' | '/' => EscapeResult::Code(c as u32),
            '\n' => EscapeResult::Continuation,
            '0'..='7' => {
                let mut value = c.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match self.peek().and_then(|d| d.to_digit(8)) {
                        Some(d) => {
                            value = value * 8 + d;
                            self.advance();
                        }
                        None => break,
                    }
                }
                if bytes && value > 0xff {
                    EscapeResult::Invalid(format!("Octal escape out of range: \\{value:o}"))
                } else {
                    EscapeResult::Code(value)
                }
            }
            'x' => match self.read_hex(2) {
                Some(value) => EscapeResult::Code(value),
                None => EscapeResult::Invalid("Invalid hex escape: expected two hex digits after \\x".to_string()),
            },
            'u' if !bytes => match self.read_hex(4) {
                Some(high @ 0xD800..=0xDBFF) => EscapeResult::Code(self.low_surrogate_after(high)),
                Some(0xDC00..=0xDFFF) => EscapeResult::Code(char::REPLACEMENT_CHARACTER as u32),
                Some(value) => EscapeResult::Code(value),
                None => EscapeResult::Invalid("Invalid unicode escape: expected four hex digits after \\u".to_string()),
            },
            'U' if !bytes => match self.read_hex(8) {
                Some(value) if char::from_u32(value).is_some() => EscapeResult::Code(value),
                Some(value) => EscapeResult::Invalid(format!("Invalid code point: \\U{value:08x}")),
                None => EscapeResult::Invalid("Invalid unicode escape: expected eight hex digits after \\U".to_string()),
            },
            other => EscapeResult::Unknown(other),
        }
    }

    /// Read exactly `count` hex digits.
    fn read_hex(&mut self, count: usize) -> Option<u32> {
        let mut value = 0u32;
        for _ in 0..count {
            let digit = self.peek()?.to_digit(16)?;
            self.advance();
            value = value * 16 + digit;
        }
        Some(value)
    }

    /// Combine a high surrogate with an immediately following `\uDC00`-`\uDFFF` escape.
    /// A lone surrogate decodes to U+FFFD.
    fn low_surrogate_after(&mut self, high: u32) -> u32 {
        let rest = &self.source[self.current_pos..];
        let low = rest
            .strip_prefix("\\u")
            .and_then(|r| r.get(..4))
            .filter(|hex| hex.bytes().all(|b| b.is_ascii_hexdigit()))
            .and_then(|hex| u32::from_str_radix(hex, 16).ok())
            .filter(|low| (0xDC00..=0xDFFF).contains(low));

        match low {
            Some(low) => {
                for _ in 0..6 {
                    self.advance();
                }
                0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00)
            }
            None => char::REPLACEMENT_CHARACTER as u32,
        }
    }
}

// ============================================================================
// String scanning
// ============================================================================

impl<'a> Lexer<'a> {
    /// Scan a string body. The opening quote (and any prefix) has already been consumed.
    pub(super) fn scan_string(&mut self, start: usize, quote: char, prefix: StringPrefix) {
        let triple = if self.peek() == Some(quote) && self.peek_next() == Some(quote) {
            self.advance();
            self.advance();
            true
        } else {
            false
        };

        let mut value = if prefix.bytes {
            Buffer::Bytes(Vec::new())
        } else {
            Buffer::Text(String::new())
        };

        loop {
            match self.peek() {
                None => {
                    self.error("Unterminated string", start);
                    break;
                }
                Some(c) if c == quote => {
                    self.advance();
                    if !triple {
                        break;
                    }
                    // Need three quotes to close
                    if self.match_char(quote) {
                        if self.match_char(quote) {
                            break;
                        }
                        value.push_char(quote);
                    }
                    value.push_char(quote);
                }
                Some('\n') if !triple => {
                    self.error("Unterminated string (newline in single-quoted string)", start);
                    break;
                }
                Some('\\') if prefix.raw => {
                    self.advance();
                    value.push_char('\\');
                    // a raw string still cannot end in an odd backslash
                    if let Some(next) = self.peek() {
                        if next == quote || next == '\\' {
                            self.advance();
                            value.push_char(next);
                        }
                    }
                }
                Some('\\') => {
                    self.advance();
                    match self.scan_escape(prefix.bytes) {
                        EscapeResult::Code(code) => value.push_code(code),
                        EscapeResult::Unknown(c) => {
                            value.push_char('\\');
                            value.push_char(c);
                        }
                        EscapeResult::Continuation => {}
                        EscapeResult::Invalid(message) => self.error(message, start),
                        EscapeResult::Eof => {
                            self.error("Unterminated escape sequence", start);
                            break;
                        }
                    }
                }
                Some(c) => {
                    value.push_char(c);
                    self.advance();
                }
            }
        }

        self.add_token(value.into_token(), start);
    }
}

#[cfg(test)]
mod tests {
    use super::super::lex;
    use super::*;

    fn single(source: &str) -> TokenKind {
        let mut tokens = lex(source).unwrap();
        assert_eq!(tokens.len(), 2, "expected one token in {source:?}");
        tokens.remove(0).kind
    }

    fn text(source: &str) -> String {
        match single(source) {
            TokenKind::String(s) => s,
            other => panic!("expected string, got {other:?}"),
        }
    }

    #[test]
    fn test_both_quote_styles() {
        assert_eq!(text("'it\"s'"), "it\"s");
        assert_eq!(text("\"it's\""), "it's");
    }

    #[test]
    fn test_common_escapes() {
        assert_eq!(text(r"'a\nb\tc\\d\'e'"), "a\nb\tc\\d'e");
        assert_eq!(text(r#""\"quoted\"""#), "\"quoted\"");
        assert_eq!(text(r"'\x41\101\0'"), "AA\0");
    }

    #[test]
    fn test_unicode_escapes() {
        assert_eq!(text(r"'\u00e9'"), "é");
        assert_eq!(text(r"'\U0001f600'"), "😀");
        assert_eq!(text(r#""\ud83d\ude00""#), "😀");
    }

    #[test]
    fn test_lone_surrogate_becomes_replacement() {
        assert_eq!(text(r"'\ud800x'"), "\u{FFFD}x");
        assert_eq!(text(r"'\udc00'"), "\u{FFFD}");
    }

    #[test]
    fn test_json_slash_escape() {
        assert_eq!(text(r#""a\/b""#), "a/b");
    }

    #[test]
    fn test_unknown_escape_is_preserved() {
        assert_eq!(text(r"'\d+'"), "\\d+");
    }

    #[test]
    fn test_triple_quoted_string_may_span_lines() {
        assert_eq!(text("'''one\ntwo ''quoted'' '''"), "one\ntwo ''quoted'' ");
    }

    #[test]
    fn test_raw_string_keeps_backslashes() {
        assert_eq!(text(r"r'C:\temp\'x'"), "C:\\temp\\'x");
    }

    #[test]
    fn test_byte_string_escapes() {
        assert_eq!(single(r"b'\x00\xff\n'"), TokenKind::Bytes(vec![0x00, 0xff, b'\n']));
        // \u is not an escape in byte strings
        assert_eq!(single(r"b'\u0041'"), TokenKind::Bytes(b"\\u0041".to_vec()));
    }

    #[test]
    fn test_unterminated_string() {
        let errs = lex("'abc").unwrap_err();
        assert_eq!(errs[0].message, "Unterminated string");
    }

    #[test]
    fn test_newline_in_single_quoted_string() {
        let errs = lex("'abc\ndef'").unwrap_err();
        assert!(errs[0].message.contains("newline"));
    }

    #[test]
    fn test_bad_hex_escape() {
        let errs = lex(r"'\xZZ'").unwrap_err();
        assert!(errs[0].message.starts_with("Invalid hex escape"));
    }
}
