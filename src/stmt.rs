use serde::Serialize;

use crate::expr::Expr;
use crate::token::Token;

/// Statement nodes. A program is a `Vec<Stmt>`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Stmt {
    /// Evaluate and discard.
    Expression(Expr),

    /// `for`, and `while` with no initializer or increment.
    For {
        initializer: Option<Box<Stmt>>, // var or expression statement
        condition: Option<Expr>,        // absent ⇒ loop forever
        increment: Option<Expr>,
        body: Box<Stmt>,
    },

    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },

    Return {
        /// The `return` keyword, for runtime error locations.
        keyword: Token,

        /// Absent ⇒ `nil` is returned.
        value: Option<Expr>,
    },

    /// Braced block with its own environment.
    Scope(Vec<Stmt>),

    /// `var`, `const`, and the `subroutine` / `prototype` declaration sugar.
    Variable {
        name: Token,
        initializer: Option<Expr>,
        constant: bool,
    },
}
