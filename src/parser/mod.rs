//! Toy C source code parser
//!
//! This module transforms source text into an Abstract Syntax Tree (AST):
//! - [`lexer`]: Tokenization (source text → tokens)
//! - [`parse`]: Parser struct, errors and helpers, with the grammar split across
//!   `declarations`, `statements` and `expressions`
//! - [`ast`]: AST node definitions
//! - [`printer`]: one-line textual form of a parsed program
//!
//! # Language
//!
//! - Types: `int`, `char`, `void`
//! - Declarations: global and block-local variables (no initializers), functions
//! - Statements: blocks, `if`/`else`, `while`, `return`, expression statements
//! - Expressions: arithmetic, comparison, assignment, unary minus, calls
//! - `#include` and other preprocessor lines are skipped
//!
//! # Parser Implementation
//!
//! Hand-written recursive descent parser, one method per precedence level.
//! No external parser generator dependencies.

pub mod ast;
mod declarations;
mod expressions;
pub mod lexer;
pub mod parse;
pub mod printer;
mod statements;

pub use parse::{ParseError, Parser};
