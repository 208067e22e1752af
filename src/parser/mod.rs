//! Source code parser
//!
//! This module transforms source text into an Abstract Syntax Tree (AST):
//! - [`lexer`]: Tokenization (source text → tokens)
//! - [`parse`]: Parser struct, errors and recovery (tokens → AST)
//! - [`ast`]: AST node definitions and canonical rendering
//!
//! # Parser Implementation
//!
//! Hand-written recursive descent for statements with Pratt precedence
//! climbing for expressions. One token of lookahead, no backtracking, no
//! external parser generator dependencies.

pub mod ast;
mod declarations;
mod expressions;
pub mod lexer;
pub mod parse;
mod statements;

use ast::Program;
pub use parse::{ParseError, Parser};

/// Parse `source`, returning the program or every diagnostic found
pub fn parse(source: &str) -> Result<Program, Vec<ParseError>> {
    let mut parser = Parser::new(source);
    let program = parser.parse_program();
    let errors = parser.into_errors();
    if errors.is_empty() {
        Ok(program)
    } else {
        Err(errors)
    }
}
