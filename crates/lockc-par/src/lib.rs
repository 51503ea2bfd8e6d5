//! lockc-par — recursive-descent parser for Locks.
//!
//! Builds the AST defined in [`ast`] from the token stream produced by
//! `lockc-lex`, reporting `SyntaxErr` diagnostics and resynchronizing at
//! statement boundaries so one parse reports every syntax error in a file.

pub mod ast;
pub mod parser;

pub use ast::Program;
pub use parser::Parser;
