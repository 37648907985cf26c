//! Number scanning for the literal lexer
//!
//! Handles integer and floating-point literals. Signs are separate tokens; the parser folds them in.

use super::Lexer;
use super::tokens::TokenKind;

impl<'a> Lexer<'a> {
    pub(super) fn scan_number(&mut self, start: usize, first: char) {
        if first == '0' {
            let radix = match self.peek() {
                Some('x' | 'X') => Some(16),
                Some('o' | 'O') => Some(8),
                Some('b' | 'B') => Some(2),
                _ => None,
            };
            if let Some(radix) = radix {
                self.advance();
                self.scan_radix_int(start, radix);
                return;
            }
        }

        let mut value = String::from(first);
        let mut is_float = false;

        // Integer part
        self.push_digits(&mut value);

        // Decimal part
        if self.peek() == Some('.') && self.peek_next().is_some_and(|c| c.is_ascii_digit()) {
            is_float = true;
            value.push('.');
            self.advance();
            self.push_digits(&mut value);
        }

        // Exponent part
        if matches!(self.peek(), Some('e' | 'E')) {
            is_float = true;
            value.push('e');
            self.advance();
            if let Some(sign @ ('+' | '-')) = self.peek() {
                value.push(sign);
                self.advance();
            }
            if !self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.error(format!("Invalid float literal: {value} (missing exponent digits)"), start);
                return;
            }
            self.push_digits(&mut value);
        }

        if matches!(self.peek(), Some('j' | 'J')) {
            self.advance();
            self.error("Complex numbers are not supported", start);
            return;
        }

        if !is_float {
            if let Ok(i) = value.parse::<i128>() {
                self.add_token(TokenKind::Int(i), start);
                return;
            }
            // too wide for an integer; keep the magnitude
        }

        match value.parse::<f64>() {
            Ok(f) => self.add_token(TokenKind::Float(f), start),
            Err(_) => self.error(format!("Invalid number literal: {value}"), start),
        }
    }

    fn scan_radix_int(&mut self, start: usize, radix: u32) {
        let mut digits = String::new();
        while let Some(c) = self.peek() {
            if c == '_' {
                self.advance();
            } else if c.is_digit(radix) {
                digits.push(c);
                self.advance();
            } else {
                break;
            }
        }

        if digits.is_empty() {
            self.error("Invalid integer literal: missing digits after base prefix", start);
            return;
        }

        match i128::from_str_radix(&digits, radix) {
            Ok(i) => self.add_token(TokenKind::Int(i), start),
            Err(_) => self.error(format!("Integer literal too large: {}", &self.source[start..self.current_pos]), start),
        }
    }

    /// Push decimal digits, dropping `_` separators.
    fn push_digits(&mut self, value: &mut String) {
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() || c == '_' {
                if c != '_' {
                    value.push(c);
                }
                self.advance();
            } else {
                break;
            }
        }
    }
}
