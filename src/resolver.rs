//! Static resolver pass for the **Wick** interpreter.
//!
//! This resolver does two things in one AST walk:
//! 1. Track lexical scopes as `name → declaration token` maps and tell the
//!    interpreter, for each local use, which declaration it denotes. Uses found
//!    in no local scope are left unresolved and become late-bound globals.
//! 2. Report static errors (`return` or `this` outside a subroutine) to the
//!    diagnostics sink, then keep walking.

use std::rc::Rc;

use log::{debug, info};
use rustc_hash::FxHashMap;

use crate::diagnostics::Diagnostics;
use crate::error::WickError;
use crate::expr::{Expr, Lambda};
use crate::interpreter::Interpreter;
use crate::stmt::Stmt;
use crate::token::{Token, TokenKind};

/// Are we inside a subroutine?  Used to validate `return` and `this`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FunctionType {
    None,
    Subroutine,
}

pub struct Resolver<'i, 'd> {
    interpreter: &'i mut Interpreter,
    diagnostics: &'d mut dyn Diagnostics,
    scopes: Vec<FxHashMap<Rc<str>, Token>>,
    current_function: FunctionType,
    errors: usize,
}

impl<'i, 'd> Resolver<'i, 'd> {
    pub fn new(interpreter: &'i mut Interpreter, diagnostics: &'d mut dyn Diagnostics) -> Self {
        info!("Resolver instantiated");

        Self {
            interpreter,
            diagnostics,
            scopes: Vec::new(),
            current_function: FunctionType::None,
            errors: 0,
        }
    }

    /// Walk all top‑level statements. Returns the number of errors reported.
    pub fn resolve(&mut self, statements: &[Stmt]) -> usize {
        info!(
            "Beginning resolve pass over {} statement(s)",
            statements.len()
        );

        for stmt in statements {
            self.resolve_stmt(stmt);
        }

        self.errors
    }

    /// Resolve a standalone expression, as evaluated at top level.
    pub fn resolve_expression(&mut self, expr: &Expr) -> usize {
        self.resolve_expr(expr);

        self.errors
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statement resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Expression(expr) => self.resolve_expr(expr),

            Stmt::Variable {
                name, initializer, ..
            } => {
                // Subroutines and prototypes may refer to themselves; any
                // other initializer still sees the outer binding of the name.
                let recursive: bool =
                    matches!(initializer, Some(Expr::Lambda(_) | Expr::Prototype(_)));

                if recursive {
                    self.declare(name);
                }

                if let Some(expr) = initializer {
                    self.resolve_expr(expr);
                }

                if !recursive {
                    self.declare(name);
                }
            }

            Stmt::Scope(statements) => {
                self.begin_scope();
                for s in statements {
                    self.resolve_stmt(s);
                }
                self.end_scope();
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition);
                self.resolve_stmt(then_branch);
                if let Some(eb) = else_branch.as_deref() {
                    self.resolve_stmt(eb);
                }
            }

            Stmt::For {
                initializer,
                condition,
                increment,
                body,
            } => {
                // The loop owns one scope for its initializer.
                self.begin_scope();
                if let Some(init) = initializer {
                    self.resolve_stmt(init);
                }
                if let Some(cond) = condition {
                    self.resolve_expr(cond);
                }
                if let Some(inc) = increment {
                    self.resolve_expr(inc);
                }
                self.resolve_stmt(body);
                self.end_scope();
            }

            Stmt::Return { keyword, value } => {
                if self.current_function == FunctionType::None {
                    self.error(keyword, "Can't return from top-level code.");
                }
                if let Some(expr) = value {
                    self.resolve_expr(expr);
                }
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expression resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Literal(_) => {}

            Expr::Group(inner) => self.resolve_expr(inner),

            Expr::Unary { right, .. } => self.resolve_expr(right),

            Expr::Binary { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }

            Expr::Ternary {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                self.resolve_expr(condition);
                self.resolve_expr(then_branch);
                self.resolve_expr(else_branch);
            }

            Expr::Variable(tok) if tok.kind == TokenKind::THIS => {
                if self.current_function == FunctionType::None {
                    self.error(tok, "Can't use 'this' outside of a subroutine.");
                }
            }

            Expr::Variable(tok) => self.resolve_local(tok),

            Expr::Assignment { name, value } => {
                // First resolve RHS, then bind LHS
                self.resolve_expr(value);
                self.resolve_local(name);
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                self.resolve_expr(callee);
                for arg in arguments {
                    self.resolve_expr(arg);
                }
            }

            Expr::Get { object, .. } => self.resolve_expr(object),

            Expr::Set { object, value, .. } => {
                self.resolve_expr(object);
                self.resolve_expr(value);
            }

            Expr::Lambda(lambda) => self.resolve_function(lambda),

            Expr::Prototype(prototype) => {
                if let Some(parent) = &prototype.parent {
                    self.resolve_expr(parent);
                }
                for member in &prototype.members {
                    self.resolve_expr(&member.value);
                }
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Function helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Parameters and body share one fresh scope. A default sees only the
    /// parameters before it.
    fn resolve_function(&mut self, lambda: &Lambda) {
        let enclosing = self.current_function;
        self.current_function = FunctionType::Subroutine;

        self.begin_scope();
        for param in &lambda.params {
            if let Some(default) = &param.default {
                self.resolve_expr(default);
            }
            self.declare(&param.name);
        }
        for stmt in &lambda.body {
            self.resolve_stmt(stmt);
        }
        self.end_scope();

        self.current_function = enclosing;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Scope management
    // ─────────────────────────────────────────────────────────────────────────

    #[inline]
    fn begin_scope(&mut self) {
        self.scopes.push(FxHashMap::default());
    }

    #[inline]
    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    /// Make `name` visible in the innermost scope. Top-level names are
    /// globals and are not recorded.
    fn declare(&mut self, name: &Token) {
        let Some(scope) = self.scopes.last_mut() else {
            return;
        };

        scope.insert(Rc::clone(&name.lexeme), name.clone());

        // A declaration resolves to itself; the interpreter reads this as "local".
        self.interpreter.resolve(name, name);
    }

    fn resolve_local(&mut self, name: &Token) {
        // innermost → outermost
        for scope in self.scopes.iter().rev() {
            if let Some(declaration) = scope.get(&name.lexeme) {
                debug!(
                    "Resolved '{}' at line {} to declaration at line {}",
                    name.lexeme, name.line, declaration.line
                );
                self.interpreter.resolve(name, declaration);
                return;
            }
        }

        debug!("Resolved '{}' as global", name.lexeme);
    }

    fn error(&mut self, token: &Token, message: &str) {
        let err = WickError::resolve(token.line, token.location(), message);

        self.diagnostics.report_error(&err);
        self.errors += 1;
    }
}
