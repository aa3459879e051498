//! The diagnostics sink shared by every stage.
//!
//! Scanner, parser, resolver and interpreter never print. They call
//! [`Diagnostics::report`] and carry on; the host decides what an error means
//! for the process (see [`RunReport`](crate::session::RunReport)).

use std::fmt;

use log::debug;

use crate::error::WickError;

/// Which stage produced a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Lexical,
    Syntax,
    Resolve,
    Runtime,
}

impl Stage {
    /// Lexical, syntax and resolve errors prevent execution.
    pub fn is_static(self) -> bool {
        !matches!(self, Stage::Runtime)
    }
}

/// One reported problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub stage: Stage,
    pub line: usize,

    /// ` at 'lexeme'`, ` at end`, or empty.
    pub location: String,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.stage {
            Stage::Runtime => write!(f, "[line {}] Runtime error: {}", self.line, self.message),
            _ => write!(
                f,
                "[line {}] Error{}: {}",
                self.line, self.location, self.message
            ),
        }
    }
}

/// Consumer of diagnostics. Implementations must not fail.
pub trait Diagnostics {
    fn report(&mut self, stage: Stage, line: usize, location: &str, message: &str);

    /// Route a [`WickError`] to the right stage.
    fn report_error(&mut self, error: &WickError) {
        match error {
            WickError::Lex { message, line } => self.report(Stage::Lexical, *line, "", message),
            WickError::Parse {
                message,
                location,
                line,
            } => self.report(Stage::Syntax, *line, location, message),
            WickError::Resolve {
                message,
                location,
                line,
            } => self.report(Stage::Resolve, *line, location, message),
            WickError::Runtime(err) => {
                self.report(Stage::Runtime, err.line, "", &err.kind.to_string())
            }
            other => self.report(Stage::Runtime, 0, "", &other.to_string()),
        }
    }
}

/// Records every diagnostic and optionally echoes it to stderr.
#[derive(Debug, Default)]
pub struct ErrorReporter {
    diagnostics: Vec<Diagnostic>,
    echo: bool,
}

impl ErrorReporter {
    /// A silent reporter that only accumulates.
    pub fn new() -> Self {
        Self::default()
    }

    /// A reporter that also writes each diagnostic to stderr as it arrives.
    pub fn stderr() -> Self {
        Self {
            diagnostics: Vec::new(),
            echo: true,
        }
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn count(&self, stage: Stage) -> usize {
        self.diagnostics.iter().filter(|d| d.stage == stage).count()
    }

    pub fn had_static_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.stage.is_static())
    }

    pub fn had_runtime_errors(&self) -> bool {
        self.count(Stage::Runtime) > 0
    }

    pub fn clear(&mut self) {
        self.diagnostics.clear();
    }
}

impl Diagnostics for ErrorReporter {
    fn report(&mut self, stage: Stage, line: usize, location: &str, message: &str) {
        let diagnostic = Diagnostic {
            stage,
            line,
            location: location.to_owned(),
            message: message.to_owned(),
        };

        debug!("Reported {:?} diagnostic: {}", stage, diagnostic);

        if self.echo {
            eprintln!("{}", diagnostic);
        }

        self.diagnostics.push(diagnostic);
    }
}
