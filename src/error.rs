//! Centralised error hierarchy for the **Wick interpreter**.
//!
//! Every stage (scanner, parser, resolver, runtime, CLI) converts its failure
//! modes into one of the variants defined here. Static stages never abort on
//! these errors; they hand them to a [`Diagnostics`](crate::diagnostics::Diagnostics)
//! sink and keep going.
//!
//! The module **does not** print diagnostics itself.

use std::io;
use thiserror::Error;

use log::info;

use crate::callable::Arity;

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WickError {
    /// Lexical (scanner) error with source line information.
    #[error("[line {line}] Error: {message}")]
    Lex {
        /// Human‑readable description.
        message: String,

        /// 1‑based line where the error occurred.
        line: usize,
    },

    /// Syntactic (parser) error. `location` is either ` at 'lexeme'` or ` at end`.
    #[error("[line {line}] Error{location}: {message}")]
    Parse {
        message: String,
        location: String,
        line: usize,
    },

    /// Static‑analysis failure (misplaced `return` or `this`).
    #[error("[line {line}] Error{location}: {message}")]
    Resolve {
        message: String,
        location: String,
        line: usize,
    },

    /// Runtime evaluation error.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    /// Wrapper around `std::io::Error` (transparent).  Enables `?` on I/O ops.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// UTF‑8 decoding failure when ingesting external text.
    #[error(transparent)]
    Utf8(#[from] std::str::Utf8Error),
}

impl WickError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Lex error: line={}, msg={}", line, message);

        WickError::Lex { message, line }
    }

    /// Helper constructor for the **parser**.
    pub fn parse<S: Into<String>>(line: usize, location: String, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Parse error: line={}, msg={}", line, message);

        WickError::Parse {
            message,
            location,
            line,
        }
    }

    /// Helper constructor for the **resolver**.
    pub fn resolve<S: Into<String>>(line: usize, location: String, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Resolve error: line={}, msg={}", line, message);

        WickError::Resolve {
            message,
            location,
            line,
        }
    }
}

/// A runtime failure together with the source line that triggered it.
#[derive(Debug, Error)]
#[error("[line {line}] Runtime error: {kind}")]
pub struct RuntimeError {
    pub line: usize,

    #[source]
    pub kind: RuntimeErrorKind,
}

impl RuntimeError {
    pub fn new(line: usize, kind: RuntimeErrorKind) -> Self {
        Self { line, kind }
    }
}

/// The runtime error classes of the language.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum RuntimeErrorKind {
    #[error("{0}")]
    TypeError(String),

    #[error("Can only call subroutines and prototypes.")]
    NotCallable,

    #[error("Expected {expected} arguments but got {got}.")]
    ArityMismatch { expected: Arity, got: usize },

    #[error("Undefined variable '{0}'.")]
    UndefinedVariable(String),

    #[error("Undefined property '{0}'.")]
    UndefinedProperty(String),

    #[error("Property '{0}' is private.")]
    PrivateProperty(String),

    #[error("Only objects have properties.")]
    NoProperties,

    #[error("Division by zero.")]
    DivisionByZero,

    #[error("Cannot assign to constant '{0}'.")]
    ConstantAssignment(String),

    #[error("Stack overflow: call depth exceeded {0}.")]
    StackOverflow(usize),

    /// Host failure inside a native subroutine (e.g. closed stdin).
    #[error("{0}")]
    Native(String),
}

impl RuntimeErrorKind {
    pub fn type_error<S: Into<String>>(msg: S) -> Self {
        RuntimeErrorKind::TypeError(msg.into())
    }

    /// Attach the line of the expression being evaluated.
    pub fn at(self, line: usize) -> RuntimeError {
        RuntimeError::new(line, self)
    }
}

/// Crate‑wide `Result` alias.
pub type Result<T> = std::result::Result<T, WickError>;
