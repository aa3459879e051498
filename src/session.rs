//! Host driver: one interpreter and one error reporter reused across runs.

use log::info;

use crate::diagnostics::{Diagnostics, ErrorReporter, Stage};
use crate::error::WickError;
use crate::interpreter::{Interpreter, Options};
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::scan_tokens;
use crate::value::Value;

use std::io::Write;

/// What happened during one [`Session::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunReport {
    pub lexical: usize,
    pub syntax: usize,
    /// Resolver errors (misplaced `return` / `this`).
    pub resolve: usize,
    pub runtime: usize,
    /// Whether the program was handed to the interpreter at all.
    pub executed: bool,
}

impl RunReport {
    pub fn had_static_errors(&self) -> bool {
        self.lexical + self.syntax + self.resolve > 0
    }

    pub fn is_clean(&self) -> bool {
        !self.had_static_errors() && self.runtime == 0
    }

    /// `sysexits`-style status: 65 for static errors, 70 for runtime errors.
    pub fn exit_code(&self) -> i32 {
        if self.had_static_errors() {
            65
        } else if self.runtime > 0 {
            70
        } else {
            0
        }
    }
}

pub struct Session {
    interpreter: Interpreter,
    reporter: ErrorReporter,
    next_line: usize,
}

impl Session {
    /// A session printing to stdout and echoing diagnostics to stderr.
    pub fn new(options: Options) -> Self {
        Self::with_parts(Interpreter::new(options), ErrorReporter::stderr())
    }

    /// A silent session writing program output to `output`.
    pub fn with_output(options: Options, output: Box<dyn Write>) -> Self {
        Self::with_parts(
            Interpreter::with_output(options, output),
            ErrorReporter::new(),
        )
    }

    pub fn with_parts(interpreter: Interpreter, reporter: ErrorReporter) -> Self {
        Self {
            interpreter,
            reporter,
            next_line: 1,
        }
    }

    pub fn interpreter(&mut self) -> &mut Interpreter {
        &mut self.interpreter
    }

    /// Diagnostics recorded so far, across runs.
    pub fn reporter(&self) -> &ErrorReporter {
        &self.reporter
    }

    /// Scan, parse, resolve, and execute `source` unless a static error
    /// occurred. Globals persist between runs.
    pub fn run(&mut self, source: &str) -> RunReport {
        let before = self.snapshot();

        let tokens = scan_tokens(source, self.next_line, &mut self.reporter);
        self.advance_lines(source);

        let statements = Parser::new(tokens, &mut self.reporter).parse();

        Resolver::new(&mut self.interpreter, &mut self.reporter).resolve(&statements);

        let mut report: RunReport = self.delta(before);

        if !report.had_static_errors() {
            report.runtime = self.interpreter.interpret(&statements, &mut self.reporter);
            report.executed = true;
        }

        info!("Run finished: {:?}", report);

        report
    }

    /// Evaluate a single expression. The value is `None` when any error was
    /// reported.
    pub fn evaluate(&mut self, source: &str) -> (Option<Value>, RunReport) {
        let before = self.snapshot();

        let tokens = scan_tokens(source, self.next_line, &mut self.reporter);
        self.advance_lines(source);

        let expr = Parser::new(tokens, &mut self.reporter).parse_expression();

        if let Some(expr) = &expr {
            Resolver::new(&mut self.interpreter, &mut self.reporter).resolve_expression(expr);
        }

        let mut report: RunReport = self.delta(before);

        let value: Option<Value> = match expr {
            Some(expr) if !report.had_static_errors() => {
                report.executed = true;

                match self.interpreter.evaluate(&expr) {
                    Ok(value) => Some(value),
                    Err(err) => {
                        self.reporter.report_error(&WickError::Runtime(err));
                        report.runtime = 1;
                        None
                    }
                }
            }
            _ => None,
        };

        (value, report)
    }

    fn snapshot(&self) -> [usize; 3] {
        [
            self.reporter.count(Stage::Lexical),
            self.reporter.count(Stage::Syntax),
            self.reporter.count(Stage::Resolve),
        ]
    }

    fn delta(&self, before: [usize; 3]) -> RunReport {
        let now = self.snapshot();

        RunReport {
            lexical: now[0] - before[0],
            syntax: now[1] - before[1],
            resolve: now[2] - before[2],
            ..RunReport::default()
        }
    }

    // Later runs start below this one, so their tokens never collide with
    // declarations already resolved.
    //
    // The interpreter's resolution table is never pruned: closures from
    // earlier runs can still be called, so it grows with every run of a
    // long REPL session.
    fn advance_lines(&mut self, source: &str) {
        self.next_line += source.matches('\n').count() + 1;
    }
}
