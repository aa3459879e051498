//! Module `scanner` implements a one‑pass, streaming lexer for the Wick language.
//!
//! It transforms a `&str` into a sequence of [`Token`]s, skipping whitespace
//! and comments, and emitting exactly one `EOF` token at the end. Designed as a
//! `FusedIterator`, it can be chained safely with other iterator adapters.
//!
//! # Public API
//!
//! - `Scanner::new(src)` / `Scanner::with_line(src, first_line)`
//!   Create a lexer over the input. `with_line` lets a REPL keep numbering
//!   lines across inputs.
//!
//! - `impl Iterator for Scanner<'a>`
//!   Yields `Result<Token, WickError>`; an `Err` reports a lexical error with
//!   line information and scanning resumes with the next character.
//!
//! - [`scan_tokens`] drains a scanner, routing errors to a
//!   [`Diagnostics`] sink. The result always ends with `EOF`.
//!
//! # Token Recognition
//!
//! - Single‑character tokens: `(`, `)`, `{`, `}`, `,`, `.`, `+`, `;`, `*`, `%`, `?`, `:`.
//! - Two‑character operators: `!=`, `==`, `<=`, `>=`, `->`.
//! - String literals: `"` … `"`, multi‑line, unterminated strings are errors.
//! - Numeric literals: integer and optional fractional part.
//! - Identifiers/keywords resolved via a perfect‑hash `KEYWORDS` map.
//! - Comments: `//` to end of line (skipped with `memchr`) and `/* … */`.

use crate::diagnostics::Diagnostics;
use crate::error::{Result, WickError};
use crate::token::{Literal, Token, TokenKind};
use log::{debug, info};
use memchr::memchr;
use phf::phf_map;
use std::iter::FusedIterator;
use std::rc::Rc;

// ─────────────────────────────────────────────────────────────────────────────
// Static keyword map (compile‑time perfect hash)
// ─────────────────────────────────────────────────────────────────────────────

static KEYWORDS: phf::Map<&'static [u8], TokenKind> = phf_map! {
    b"and"        => TokenKind::AND,
    b"const"      => TokenKind::CONST,
    b"else"       => TokenKind::ELSE,
    b"false"      => TokenKind::FALSE,
    b"for"        => TokenKind::FOR,
    b"from"       => TokenKind::FROM,
    b"if"         => TokenKind::IF,
    b"lambda"     => TokenKind::LAMBDA,
    b"mod"        => TokenKind::PERCENT,
    b"nil"        => TokenKind::NIL,
    b"or"         => TokenKind::OR,
    b"private"    => TokenKind::PRIVATE,
    b"prototype"  => TokenKind::PROTOTYPE,
    b"public"     => TokenKind::PUBLIC,
    b"return"     => TokenKind::RETURN,
    b"subroutine" => TokenKind::SUBROUTINE,
    b"this"       => TokenKind::THIS,
    b"true"       => TokenKind::TRUE,
    b"var"        => TokenKind::VAR,
    b"while"      => TokenKind::WHILE,
};

/// A single pass **scanner / lexer** that converts source text into a
/// sequence of [`Token`]s.
pub struct Scanner<'a> {
    src: &'a str,
    bytes: &'a [u8],
    start: usize,        // index of the *first* byte of the current lexeme
    curr: usize,         // index *one past* the last byte examined
    line: usize,         // 1‑based line counter (\n increments)
    column: usize,       // characters consumed on the current line
    token_line: usize,   // line where the current lexeme starts
    token_column: usize, // 1‑based column where the current lexeme starts
    pending: Option<(TokenKind, Option<Literal>)>,
    finished: bool,
}

impl<'a> Scanner<'a> {
    /// Create a new lexer over `src`, starting at line 1.
    #[inline]
    pub fn new(src: &'a str) -> Self {
        Self::with_line(src, 1)
    }

    /// Create a new lexer whose first line is numbered `first_line`.
    pub fn with_line(src: &'a str, first_line: usize) -> Self {
        info!(
            "Scanner created over {} bytes starting at line {}",
            src.len(),
            first_line
        );

        Self {
            src,
            bytes: src.as_bytes(),
            start: 0,
            curr: 0,
            line: first_line,
            column: 0,
            token_line: first_line,
            token_column: 1,
            pending: None,
            finished: false,
        }
    }

    // ───────────────────────────── primitive helpers ────────────────────────

    #[inline(always)]
    fn is_at_end(&self) -> bool {
        self.curr >= self.bytes.len()
    }

    /// Advance one byte and return it, keeping line and column current.
    /// Higher‑level code always guards with [`is_at_end`](Self::is_at_end).
    #[inline(always)]
    fn advance(&mut self) -> u8 {
        let b = self.bytes[self.curr];
        self.curr += 1;

        if b == b'\n' {
            self.line += 1;
            self.column = 0;
        } else if b & 0xC0 != 0x80 {
            // Count characters, not UTF‑8 continuation bytes.
            self.column += 1;
        }

        b
    }

    /// Peek at the current byte without consuming it.  Returns `0` past EOF.
    #[inline(always)]
    fn peek(&self) -> u8 {
        self.bytes.get(self.curr).copied().unwrap_or(0)
    }

    #[inline(always)]
    fn peek_next(&self) -> u8 {
        self.bytes.get(self.curr + 1).copied().unwrap_or(0)
    }

    /// Conditionally consume a byte **iff** it matches `expected`.
    #[inline(always)]
    fn match_byte(&mut self, expected: u8) -> bool {
        if !self.is_at_end() && self.peek() == expected {
            self.advance();
            true
        } else {
            false
        }
    }

    #[inline(always)]
    fn emit(&mut self, kind: TokenKind) {
        self.pending = Some((kind, None));
    }

    // ───────────────────────────── core lexing ─────────────────────────────

    /// Scan a *single* lexeme starting at `self.curr`. Tokens are stored in
    /// `self.pending`; whitespace and comments leave it `None`.
    fn scan_token(&mut self) -> Result<()> {
        let b = self.advance();

        match b {
            b'(' => self.emit(TokenKind::LEFT_PAREN),
            b')' => self.emit(TokenKind::RIGHT_PAREN),
            b'{' => self.emit(TokenKind::LEFT_BRACE),
            b'}' => self.emit(TokenKind::RIGHT_BRACE),
            b',' => self.emit(TokenKind::COMMA),
            b'.' => self.emit(TokenKind::DOT),
            b'+' => self.emit(TokenKind::PLUS),
            b';' => self.emit(TokenKind::SEMICOLON),
            b'*' => self.emit(TokenKind::STAR),
            b'%' => self.emit(TokenKind::PERCENT),
            b'?' => self.emit(TokenKind::QUESTION),
            b':' => self.emit(TokenKind::COLON),

            b'-' => {
                let kind = if self.match_byte(b'>') {
                    TokenKind::ARROW
                } else {
                    TokenKind::MINUS
                };

                self.emit(kind);
            }

            b'!' => {
                let kind = if self.match_byte(b'=') {
                    TokenKind::BANG_EQUAL
                } else {
                    TokenKind::BANG
                };

                self.emit(kind);
            }

            b'=' => {
                let kind = if self.match_byte(b'=') {
                    TokenKind::EQUAL_EQUAL
                } else {
                    TokenKind::EQUAL
                };

                self.emit(kind);
            }

            b'<' => {
                let kind = if self.match_byte(b'=') {
                    TokenKind::LESS_EQUAL
                } else {
                    TokenKind::LESS
                };

                self.emit(kind);
            }

            b'>' => {
                let kind = if self.match_byte(b'=') {
                    TokenKind::GREATER_EQUAL
                } else {
                    TokenKind::GREATER
                };

                self.emit(kind);
            }

            b' ' | b'\r' | b'\t' | b'\n' => {}

            b'/' => {
                if self.match_byte(b'/') {
                    // Fast‑forward to the next newline; the newline itself is
                    // consumed by the next call so line tracking stays in one place.
                    match memchr(b'\n', &self.bytes[self.curr..]) {
                        Some(pos) => self.curr += pos,
                        None => self.curr = self.bytes.len(),
                    }
                } else if self.match_byte(b'*') {
                    return self.skip_block_comment();
                } else {
                    self.emit(TokenKind::SLASH);
                }
            }

            b'"' => return self.parse_string(),

            b'0'..=b'9' => self.parse_number(),

            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.parse_identifier(),

            _ => {
                // Consume the rest of a multi‑byte character so the next
                // lexeme starts on a character boundary.
                let c: char = self.src[self.start..].chars().next().unwrap_or('\u{FFFD}');

                for _ in 1..c.len_utf8() {
                    self.advance();
                }

                return Err(WickError::lex(
                    self.token_line,
                    format!("Unexpected character: {}", c),
                ));
            }
        }

        Ok(())
    }

    fn skip_block_comment(&mut self) -> Result<()> {
        while !self.is_at_end() {
            if self.peek() == b'*' && self.peek_next() == b'/' {
                self.advance();
                self.advance();
                return Ok(());
            }

            self.advance();
        }

        Err(WickError::lex(self.token_line, "Unterminated block comment."))
    }

    /// Parse a double‑quoted string literal. On return `self.curr` points
    /// **past** the closing `"`.
    fn parse_string(&mut self) -> Result<()> {
        while !self.is_at_end() && self.peek() != b'"' {
            self.advance();
        }

        if self.is_at_end() {
            return Err(WickError::lex(self.token_line, "Unterminated string."));
        }

        self.advance(); // closing quote

        let contents: &str = &self.src[self.start + 1..self.curr - 1];

        self.pending = Some((TokenKind::STRING, Some(Literal::Str(Rc::from(contents)))));

        Ok(())
    }

    /// Parse a numeric literal (`123`, `3.14`).  Fractions are optional.
    fn parse_number(&mut self) {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        if self.peek() == b'.' && self.peek_next().is_ascii_digit() {
            self.advance(); // "."

            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        // Only ASCII digits and one dot were consumed, so this always parses.
        let n: f64 = self.src[self.start..self.curr].parse::<f64>().unwrap_or(0.0);

        self.pending = Some((TokenKind::NUMBER, Some(Literal::Number(n))));
    }

    /// Parse an identifier and decide whether it is a keyword.
    fn parse_identifier(&mut self) {
        while {
            let c: u8 = self.peek();
            c.is_ascii_alphanumeric() || c == b'_'
        } {
            self.advance();
        }

        let kind: TokenKind = KEYWORDS
            .get(&self.bytes[self.start..self.curr])
            .copied()
            .unwrap_or(TokenKind::IDENTIFIER);

        self.emit(kind);
    }
}

// ───────────────────────── Iterator implementation ─────────────────────────

impl<'a> Iterator for Scanner<'a> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        loop {
            // Emit exactly one EOF then terminate.
            if self.is_at_end() {
                self.finished = true;

                return Some(Ok(Token::new(
                    TokenKind::EOF,
                    "",
                    None,
                    self.line,
                    self.column + 1,
                )));
            }

            self.start = self.curr;
            self.token_line = self.line;
            self.token_column = self.column + 1;
            self.pending = None;

            if let Err(e) = self.scan_token() {
                return Some(Err(e));
            }

            if let Some((kind, literal)) = self.pending.take() {
                let lexeme: &str = &self.src[self.start..self.curr];

                debug!("Scanned token ({:?}) on line {}", kind, self.token_line);

                return Some(Ok(Token::new(
                    kind,
                    lexeme,
                    literal,
                    self.token_line,
                    self.token_column,
                )));
            }
            // Whitespace / comment → keep going.
        }
    }
}

impl<'a> FusedIterator for Scanner<'a> {}

/// Scan all of `source`, reporting lexical errors to `diagnostics`.
///
/// Always terminates and always returns a sequence ending with `EOF`.
pub fn scan_tokens(
    source: &str,
    first_line: usize,
    diagnostics: &mut dyn Diagnostics,
) -> Vec<Token> {
    let mut tokens: Vec<Token> = Vec::new();

    for result in Scanner::with_line(source, first_line) {
        match result {
            Ok(token) => tokens.push(token),
            Err(e) => {
                debug!("Lexical error: {}", e);
                diagnostics.report_error(&e);
            }
        }
    }

    info!("Scanned {} tokens", tokens.len());

    tokens
}
