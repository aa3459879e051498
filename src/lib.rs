//! Wick: a tree-walking interpreter for a small dynamically typed language
//! with closures, first-class subroutines and prototype inheritance.
//!
//! Pipeline: [`scanner`] → [`parser`] → [`resolver`] → [`interpreter`], tied
//! together by [`session::Session`].

pub mod ast_printer;
pub mod callable;
pub mod diagnostics;
pub mod environment;
pub mod error;
pub mod expr;
pub mod interpreter;
pub mod native;
pub mod object;
pub mod parser;
pub mod persistent_map;
pub mod resolver;
pub mod scanner;
pub mod session;
pub mod stmt;
pub mod token;
pub mod value;
