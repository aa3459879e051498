use log::debug;
use serde::Serialize;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// The different kinds of tokens recognized by the Wick scanner.
///
/// Literal payloads live in [`Token::literal`], so the kind itself is a plain
/// `Copy` tag that can be compared and hashed directly.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    /// '('
    LEFT_PAREN,

    /// ')'
    RIGHT_PAREN,

    /// '{'
    LEFT_BRACE,

    /// '}'
    RIGHT_BRACE,

    /// ','
    COMMA,

    /// '.'
    DOT,

    /// '-'
    MINUS,

    /// '->'
    ARROW,

    /// '+'
    PLUS,

    /// ';'
    SEMICOLON,

    /// '/'
    SLASH,

    /// '*'
    STAR,

    /// '%' or 'mod'
    PERCENT,

    /// '?'
    QUESTION,

    /// ':'
    COLON,

    /// '!'
    BANG,

    /// '!='
    BANG_EQUAL,

    /// '='
    EQUAL,

    /// '=='
    EQUAL_EQUAL,

    /// '>'
    GREATER,

    /// '>='
    GREATER_EQUAL,

    /// '<'
    LESS,

    /// '<='
    LESS_EQUAL,

    /// A user‑defined identifier
    IDENTIFIER,

    /// A string literal
    STRING,

    /// A numeric literal
    NUMBER,

    AND,
    CONST,
    ELSE,
    FALSE,
    FOR,
    FROM,
    IF,
    LAMBDA,
    NIL,
    OR,
    PRIVATE,
    PROTOTYPE,
    PUBLIC,
    RETURN,
    SUBROUTINE,
    THIS,
    TRUE,
    VAR,
    WHILE,

    /// End‑of‑file marker
    EOF,
}

impl TokenKind {
    /// Upper-case name used by the `tokenize` output.
    pub fn name(self) -> &'static str {
        match self {
            TokenKind::LEFT_PAREN => "LEFT_PAREN",
            TokenKind::RIGHT_PAREN => "RIGHT_PAREN",
            TokenKind::LEFT_BRACE => "LEFT_BRACE",
            TokenKind::RIGHT_BRACE => "RIGHT_BRACE",
            TokenKind::COMMA => "COMMA",
            TokenKind::DOT => "DOT",
            TokenKind::MINUS => "MINUS",
            TokenKind::ARROW => "ARROW",
            TokenKind::PLUS => "PLUS",
            TokenKind::SEMICOLON => "SEMICOLON",
            TokenKind::SLASH => "SLASH",
            TokenKind::STAR => "STAR",
            TokenKind::PERCENT => "PERCENT",
            TokenKind::QUESTION => "QUESTION",
            TokenKind::COLON => "COLON",
            TokenKind::BANG => "BANG",
            TokenKind::BANG_EQUAL => "BANG_EQUAL",
            TokenKind::EQUAL => "EQUAL",
            TokenKind::EQUAL_EQUAL => "EQUAL_EQUAL",
            TokenKind::GREATER => "GREATER",
            TokenKind::GREATER_EQUAL => "GREATER_EQUAL",
            TokenKind::LESS => "LESS",
            TokenKind::LESS_EQUAL => "LESS_EQUAL",
            TokenKind::IDENTIFIER => "IDENTIFIER",
            TokenKind::STRING => "STRING",
            TokenKind::NUMBER => "NUMBER",
            TokenKind::AND => "AND",
            TokenKind::CONST => "CONST",
            TokenKind::ELSE => "ELSE",
            TokenKind::FALSE => "FALSE",
            TokenKind::FOR => "FOR",
            TokenKind::FROM => "FROM",
            TokenKind::IF => "IF",
            TokenKind::LAMBDA => "LAMBDA",
            TokenKind::NIL => "NIL",
            TokenKind::OR => "OR",
            TokenKind::PRIVATE => "PRIVATE",
            TokenKind::PROTOTYPE => "PROTOTYPE",
            TokenKind::PUBLIC => "PUBLIC",
            TokenKind::RETURN => "RETURN",
            TokenKind::SUBROUTINE => "SUBROUTINE",
            TokenKind::THIS => "THIS",
            TokenKind::TRUE => "TRUE",
            TokenKind::VAR => "VAR",
            TokenKind::WHILE => "WHILE",
            TokenKind::EOF => "EOF",
        }
    }
}

/// Literal payload carried by `STRING` and `NUMBER` tokens.
#[derive(Debug, Clone, Serialize)]
pub enum Literal {
    Number(f64),
    Str(Rc<str>),
}

impl PartialEq for Literal {
    /// Numbers compare by bit pattern so that `Eq` and `Hash` agree.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Literal::Number(a), Literal::Number(b)) => a.to_bits() == b.to_bits(),
            (Literal::Str(a), Literal::Str(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Literal {}

impl Hash for Literal {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Literal::Number(n) => {
                0u8.hash(state);
                n.to_bits().hash(state);
            }
            Literal::Str(s) => {
                1u8.hash(state);
                s.hash(state);
            }
        }
    }
}

/// A scanned token: its kind, the exact source text, the literal value if any,
/// and where it was found.
///
/// Equality and hashing cover every field, so two tokens scanned from
/// different positions are different map keys even when their lexemes match.
/// Environments rely on this to key bindings by declaration site.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Token {
    /// The category of this token.
    pub kind: TokenKind,

    /// The exact substring from the source that produced this token.
    pub lexeme: Rc<str>,

    pub literal: Option<Literal>,

    /// 1‑based line number in the source.
    pub line: usize,

    /// 1‑based column of the first character.
    pub column: usize,
}

impl Token {
    pub fn new(
        kind: TokenKind,
        lexeme: &str,
        literal: Option<Literal>,
        line: usize,
        column: usize,
    ) -> Self {
        debug!(
            "Creating new token: kind={:?}, lexeme={}, line={}, column={}",
            kind, lexeme, line, column
        );

        Self {
            kind,
            lexeme: Rc::from(lexeme),
            literal,
            line,
            column,
        }
    }

    /// Position-less key under which a global named `name` is bound.
    pub fn global(name: &str) -> Self {
        Self {
            kind: TokenKind::IDENTIFIER,
            lexeme: Rc::from(name),
            literal: None,
            line: 0,
            column: 0,
        }
    }

    /// Key of the implicit receiver binding inside bound subroutines.
    pub fn this_key() -> Self {
        Self {
            kind: TokenKind::THIS,
            lexeme: Rc::from("this"),
            literal: None,
            line: 0,
            column: 0,
        }
    }

    /// The key this token's name would have as a global.
    pub fn to_global(&self) -> Self {
        Self::global(&self.lexeme)
    }

    /// Diagnostic location fragment: ` at 'lexeme'` or ` at end`.
    pub fn location(&self) -> String {
        match self.kind {
            TokenKind::EOF => " at end".to_owned(),
            _ => format!(" at '{}'", self.lexeme),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let variant: &'static str = self.kind.name();

        match &self.literal {
            Some(Literal::Str(s)) => write!(f, "{} {} {}", variant, self.lexeme, s),

            // 3 → "3.0", 3.14 → "3.14"
            Some(Literal::Number(n)) if n.fract() == 0.0 && n.abs() < i64::MAX as f64 => {
                let mut buf: itoa::Buffer = itoa::Buffer::new();
                write!(f, "{} {} {}.0", variant, self.lexeme, buf.format(*n as i64))
            }

            Some(Literal::Number(n)) => write!(f, "{} {} {}", variant, self.lexeme, n),

            None => write!(f, "{} {} null", variant, self.lexeme),
        }
    }
}
