use std::rc::Rc;

use serde::Serialize;

use crate::stmt::Stmt;
use crate::token::Token;

/// A **literal constant** that appears directly in the source code.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum LiteralValue {
    /// Numeric literal, stored as IEEE‑754 `f64`.
    Number(f64),

    /// String literal without surrounding quotes.
    Str(Rc<str>),

    True,

    False,

    Nil,
}

/// A parameter of a lambda, optionally with a default value expression.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Param {
    pub name: Token,
    pub default: Option<Expr>,
}

/// Parameters and body of a subroutine.
///
/// Shared behind an `Rc` so that closures created at runtime can keep their
/// code alive after the program that defined them is dropped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Lambda {
    /// `lambda`, `subroutine` or `->` token, for diagnostics.
    pub keyword: Token,
    pub params: Vec<Param>,
    pub body: Vec<Stmt>,
}

impl Lambda {
    /// Number of parameters without a default.
    pub fn required(&self) -> usize {
        self.params.iter().take_while(|p| p.default.is_none()).count()
    }
}

/// One `name = value` entry of a prototype literal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Member {
    pub name: Token,
    pub value: Expr,
    /// Declared under `private:`; only reachable through `this`.
    pub private: bool,
}

/// `prototype from parent { members }`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prototype {
    pub keyword: Token,
    pub parent: Option<Expr>,
    pub members: Vec<Member>,
}

/// Expression nodes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Expr {
    /// `name = value`
    Assignment { name: Token, value: Box<Expr> },

    /// Infix operator, including the short‑circuiting `and` / `or`.
    Binary {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },

    Call {
        callee: Box<Expr>,
        /// The closing `)`, retained for error reporting.
        paren: Token,
        arguments: Vec<Expr>,
    },

    /// `object.name`
    Get { object: Box<Expr>, name: Token },

    /// `( inner )`
    Group(Box<Expr>),

    Lambda(Rc<Lambda>),

    Literal(LiteralValue),

    Prototype(Box<Prototype>),

    /// `object.name = value`
    Set {
        object: Box<Expr>,
        name: Token,
        value: Box<Expr>,
    },

    /// `condition ? then_branch : else_branch`
    Ternary {
        condition: Box<Expr>,
        question: Token,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },

    Unary { operator: Token, right: Box<Expr> },

    /// Identifier use, or `this`.
    Variable(Token),
}

impl Expr {
    /// Best source line for diagnostics about this expression.
    pub fn line(&self) -> usize {
        match self {
            Expr::Assignment { name, .. } => name.line,

            Expr::Binary { operator, .. } => operator.line,

            Expr::Call { paren, .. } => paren.line,

            Expr::Get { name, .. } => name.line,

            Expr::Group(expr) => expr.line(),

            Expr::Lambda(lambda) => lambda.keyword.line,

            Expr::Literal(_) => 0,

            Expr::Prototype(prototype) => prototype.keyword.line,

            Expr::Set { name, .. } => name.line,

            Expr::Ternary { question, .. } => question.line,

            Expr::Unary { operator, .. } => operator.line,

            Expr::Variable(token) => token.line,
        }
    }
}
